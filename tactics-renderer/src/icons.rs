//! Icon artwork for player markers and props.
//!
//! Each icon is either drawn from vector primitives or taken from an image
//! file, which is resized to the icon's pixel size and embedded in the SVG
//! frame as a PNG data URI.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use tactics_core::element::{
    Prop, Team, BALL_SIZE, CONE_SIZE, GOAL_SIZE, PLAYER_FIGURE_SIZE,
};

use crate::error::{RenderError, RenderResult};

/// Artwork slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    /// Player figure for our own squad.
    OwnPlayer,
    /// Player figure for opponents.
    OpponentPlayer,
    /// Cone.
    Cone,
    /// Goal.
    Goal,
    /// Ball.
    Ball,
}

impl IconKind {
    /// Every slot.
    pub const ALL: [Self; 5] = [
        Self::OwnPlayer,
        Self::OpponentPlayer,
        Self::Cone,
        Self::Goal,
        Self::Ball,
    ];

    /// Slot for a player figure.
    #[must_use]
    pub fn for_team(team: Team) -> Self {
        match team {
            Team::Own => Self::OwnPlayer,
            Team::Opponent => Self::OpponentPlayer,
        }
    }

    /// Slot for a prop.
    #[must_use]
    pub fn for_prop(prop: Prop) -> Self {
        match prop {
            Prop::Cone => Self::Cone,
            Prop::Goal => Self::Goal,
            Prop::Ball => Self::Ball,
        }
    }

    /// File looked up by [`IconSet::from_dir`].
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::OwnPlayer => "player_red_base.png",
            Self::OpponentPlayer => "player_yellow_base.png",
            Self::Cone => "cone.png",
            Self::Goal => "porteria.png",
            Self::Ball => "ball.png",
        }
    }

    /// Drawn size in pixels. Player figures exclude the number label.
    #[must_use]
    pub fn size(self) -> (f64, f64) {
        match self {
            Self::OwnPlayer | Self::OpponentPlayer => PLAYER_FIGURE_SIZE,
            Self::Cone => CONE_SIZE,
            Self::Goal => GOAL_SIZE,
            Self::Ball => BALL_SIZE,
        }
    }
}

/// Where an icon's artwork comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// Vector drawing built into the renderer.
    Builtin,
    /// A PNG data URI, already at the icon's size.
    Image(String),
    /// Artwork was configured but could not be loaded; elements using it
    /// are left out.
    Unavailable(String),
}

/// Artwork for every [`IconKind`].
#[derive(Debug, Clone, Default)]
pub struct IconSet {
    sources: HashMap<IconKind, IconSource>,
}

impl IconSet {
    /// Use the built-in drawing for every icon.
    #[must_use]
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load artwork from the standard file names in `dir`.
    ///
    /// Missing files keep the built-in drawing. Files that exist but cannot
    /// be decoded mark the icon unavailable.
    #[must_use]
    pub fn from_dir(dir: &Path) -> Self {
        let mut icons = Self::builtin();
        for kind in IconKind::ALL {
            let path = dir.join(kind.file_name());
            if path.is_file() {
                if let Err(e) = icons.set_file(kind, &path) {
                    tracing::warn!("Icon {:?} unavailable: {e}", kind);
                }
            }
        }
        icons
    }

    /// Use the image at `path` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the file cannot be read or
    /// decoded. The icon is then marked unavailable.
    pub fn set_file(&mut self, kind: IconKind, path: &Path) -> RenderResult<()> {
        match load_data_uri(path, kind.size()) {
            Ok(uri) => {
                tracing::debug!("Loaded icon {:?} from {}", kind, path.display());
                self.sources.insert(kind, IconSource::Image(uri));
                Ok(())
            }
            Err(e) => {
                self.sources
                    .insert(kind, IconSource::Unavailable(e.to_string()));
                Err(e)
            }
        }
    }

    /// Replace the artwork for `kind`.
    pub fn set_source(&mut self, kind: IconKind, source: IconSource) {
        self.sources.insert(kind, source);
    }

    /// Artwork for `kind`.
    #[must_use]
    pub fn source(&self, kind: IconKind) -> &IconSource {
        self.sources.get(&kind).unwrap_or(&IconSource::Builtin)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn load_data_uri(path: &Path, (width, height): (f64, f64)) -> RenderResult<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))?;
    let resized = decoded.resize_exact(
        width as u32,
        height as u32,
        image::imageops::FilterType::Lanczos3,
    );

    let mut png = Cursor::new(Vec::new());
    resized
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());
    Ok(format!("data:image/png;base64,{encoded}"))
}
