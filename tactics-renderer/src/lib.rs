//! # Tactics Renderer
//!
//! Raster compositor for tactical boards: draws the pitch and every element
//! into an SVG frame and rasterizes it with resvg into a fixed-size bitmap.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ Board /      │──▶│ draw::Frame  │──▶│ usvg + resvg   │──▶│ PNG / JPEG / │
//! │ LayoutRecord │   │ (SVG text)   │   │ (tiny-skia)    │   │ SVG / PDF    │
//! └──────────────┘   └──────────────┘   └────────────────┘   └──────────────┘
//! ```
//!
//! The interactive view ([`Compositor::render_board`]) and stored layouts
//! ([`Compositor::render_layout`]) share the same drawing routines, so an
//! element looks identical in both.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compositor;
pub mod draw;
pub mod error;
pub mod export;
pub mod icons;

pub use compositor::{ComposedFrame, Compositor, RenderConfig};
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, LayoutExporter};
pub use icons::{IconKind, IconSet, IconSource};

/// Re-exported so callers can inspect rendered pixmaps without a direct
/// dependency.
pub use tiny_skia::Pixmap;
