//! # Tactics Core
//!
//! Tactical board engine for football coaching sessions: a pitch with
//! draggable players, props, arrows and labels, stored in resolution
//! independent coordinates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                tactics-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Editor Session  │  Board (element arena)   │
//! │  - Active tool   │  - Z-ordered elements    │
//! │  - Pointer flow  │  - Hit testing           │
//! │  - Arrow gesture │  - Move / rotate / drop  │
//! ├─────────────────────────────────────────────┤
//! │  Field Geometry  │  Layout Records          │
//! │  - 105:68 pitch  │  - JSON wire format      │
//! │  - Normalization │  - Named layout store    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Positions are stored relative to the field rectangle, so a layout drawn
//! on one surface renders at the same spots on any other.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod board;
pub mod element;
pub mod error;
pub mod formation;
pub mod geometry;
pub mod players;
pub mod schema;
pub mod session;
pub mod store;

pub use board::{Board, LoadReport, Placement, HIT_TOLERANCE_PX};
pub use element::{Element, ElementId, ElementKind, PlayerId, Prop, Rotation, StrokeStyle, Team};
pub use error::{TacticsError, TacticsResult};
pub use formation::{Formation, FormationBook, Toggle};
pub use geometry::{FieldGeometry, NormPoint, PitchMarkings, Rect};
pub use players::{InMemoryDirectory, PlayerCard, PlayerDirectory};
pub use schema::{decode_layout, encode_layout, DecodedLayout, LayoutRecord, RecordType};
pub use session::{EditorSession, LineStyle, PressOutcome, SessionConfig, Tool};
pub use store::{LayoutId, LayoutStore, LayoutSummary, StoreError, StoredLayout};

/// Tactics core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
