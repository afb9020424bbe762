//! Raster compositor.
//!
//! Builds SVG frames through [`crate::draw`] and rasterizes them with the
//! resvg/tiny-skia pipeline into fixed-size pixmaps.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tactics_core::formation::Formation;
use tactics_core::geometry::FieldGeometry;
use tactics_core::players::PlayerDirectory;
use tactics_core::schema::LayoutRecord;
use tactics_core::session::EditorSession;
use tactics_core::{Board, ElementKind, StrokeStyle};

use crate::draw::{Drawn, Frame};
use crate::error::{RenderError, RenderResult};
use crate::icons::IconSet;

/// Appearance of rendered boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Default output width in pixels.
    pub width: u32,
    /// Default output height in pixels.
    pub height: u32,
    /// Grass colour.
    pub background: String,
    /// Pitch line colour.
    pub line_color: String,
    /// Pitch line width in pixels.
    pub line_width: f64,
    /// Font family for labels and text.
    pub font_family: String,
    /// Load the fonts installed on the system.
    pub load_system_fonts: bool,
    /// Extra directory of `.ttf`/`.otf`/`.ttc` files.
    pub font_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: "#2ECC71".to_string(),
            line_color: "white".to_string(),
            line_width: 3.0,
            font_family: "sans-serif".to_string(),
            load_system_fonts: true,
            font_dir: None,
        }
    }
}

impl RenderConfig {
    /// Parse settings from JSON; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] for malformed JSON.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An SVG frame and what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedFrame {
    /// SVG document.
    pub svg: String,
    /// Elements drawn.
    pub drawn: usize,
    /// Elements left out: unknown players, unavailable icons, bad records.
    pub skipped: usize,
}

/// Renders pitches and layouts to pixmaps.
pub struct Compositor {
    config: RenderConfig,
    icons: IconSet,
    options: usvg::Options<'static>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("config", &self.config)
            .field("icons", &self.icons)
            .field("font_faces", &self.options.fontdb.len())
            .finish()
    }
}

impl Compositor {
    /// Create a compositor with the given appearance and artwork.
    #[must_use]
    pub fn new(config: RenderConfig, icons: IconSet) -> Self {
        let options = usvg::Options {
            fontdb: build_fontdb(&config),
            ..Default::default()
        };
        Self {
            config,
            icons,
            options,
        }
    }

    /// Create a compositor with default appearance and built-in artwork.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RenderConfig::default(), IconSet::builtin())
    }

    /// Appearance settings.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Icon artwork.
    #[must_use]
    pub fn icons(&self) -> &IconSet {
        &self.icons
    }

    /// SVG of an empty pitch.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] for a zero-sized output.
    pub fn field_svg(&self, width: u32, height: u32) -> RenderResult<String> {
        let (frame, _) = self.pitch_frame(width, height)?;
        Ok(frame.finish())
    }

    /// SVG of stored records on a `width` x `height` pitch.
    ///
    /// Records that reference unknown players, use unavailable icons, or
    /// cannot be converted are left out.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] for a zero-sized output.
    pub fn layout_svg(
        &self,
        records: &[LayoutRecord],
        directory: &dyn PlayerDirectory,
        width: u32,
        height: u32,
    ) -> RenderResult<ComposedFrame> {
        let (mut frame, geometry) = self.pitch_frame(width, height)?;
        let mut drawn = 0;
        let mut skipped = 0;

        for record in records {
            let kind = match record.to_kind(&geometry) {
                Ok(kind) => kind,
                Err(e) => {
                    tracing::warn!("Skipping {:?} record: {e}", record.kind);
                    skipped += 1;
                    continue;
                }
            };
            if self.draw_kind(&mut frame, &kind, &geometry, directory) {
                drawn += 1;
            } else {
                skipped += 1;
            }
        }

        Ok(ComposedFrame {
            svg: frame.finish(),
            drawn,
            skipped,
        })
    }

    /// SVG of a live board at its own surface size, with the selection
    /// outlined.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] if the board has no surface.
    pub fn board_svg(
        &self,
        board: &Board,
        directory: &dyn PlayerDirectory,
    ) -> RenderResult<ComposedFrame> {
        self.board_frame(board, directory, None)
    }

    /// SVG of an editing session: its board plus the arrow being drawn.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] if the board has no surface.
    pub fn session_svg(
        &self,
        session: &EditorSession,
        directory: &dyn PlayerDirectory,
    ) -> RenderResult<ComposedFrame> {
        let preview = session
            .arrow_preview()
            .map(|(tail, tip)| (tail, tip, session.config().stroke()));
        self.board_frame(session.board(), directory, preview)
    }

    /// SVG of a pitch with formation guide circles.
    ///
    /// Guides are placed relative to the whole surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] for a zero-sized output.
    pub fn formation_svg(
        &self,
        formation: &Formation,
        width: u32,
        height: u32,
    ) -> RenderResult<String> {
        let (mut frame, _) = self.pitch_frame(width, height)?;
        frame.guides(&formation.guides(f64::from(width), f64::from(height)));
        Ok(frame.finish())
    }

    /// Render an empty pitch.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero-sized output or if rasterization fails.
    pub fn render_field(&self, width: u32, height: u32) -> RenderResult<tiny_skia::Pixmap> {
        self.rasterize(&self.field_svg(width, height)?)
    }

    /// Render stored records onto a `width` x `height` pitch.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero-sized output or if rasterization fails.
    pub fn render_layout(
        &self,
        records: &[LayoutRecord],
        directory: &dyn PlayerDirectory,
        width: u32,
        height: u32,
    ) -> RenderResult<tiny_skia::Pixmap> {
        let frame = self.layout_svg(records, directory, width, height)?;
        if frame.skipped > 0 {
            tracing::debug!("Rendered layout with {} elements left out", frame.skipped);
        }
        self.rasterize(&frame.svg)
    }

    /// Render a live board at its own surface size.
    ///
    /// # Errors
    ///
    /// Returns an error if the board has no surface or rasterization fails.
    pub fn render_board(
        &self,
        board: &Board,
        directory: &dyn PlayerDirectory,
    ) -> RenderResult<tiny_skia::Pixmap> {
        self.rasterize(&self.board_svg(board, directory)?.svg)
    }

    /// Render an editing session, including any arrow being drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if the board has no surface or rasterization fails.
    pub fn render_session(
        &self,
        session: &EditorSession,
        directory: &dyn PlayerDirectory,
    ) -> RenderResult<tiny_skia::Pixmap> {
        self.rasterize(&self.session_svg(session, directory)?.svg)
    }

    /// Render a pitch with formation guides.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero-sized output or if rasterization fails.
    pub fn render_formation(
        &self,
        formation: &Formation,
        width: u32,
        height: u32,
    ) -> RenderResult<tiny_skia::Pixmap> {
        self.rasterize(&self.formation_svg(formation, width, height)?)
    }

    /// Rasterize an SVG document to a pixmap of its declared size.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if the SVG cannot be parsed or the
    /// pixmap cannot be allocated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rasterize(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }

    fn pitch_frame(&self, width: u32, height: u32) -> RenderResult<(Frame, FieldGeometry)> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        let geometry = FieldGeometry::compute(f64::from(width), f64::from(height));
        let mut frame = Frame::new(width, height, &self.config.background);
        frame.pitch(&geometry, &self.config);
        Ok((frame, geometry))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn board_frame(
        &self,
        board: &Board,
        directory: &dyn PlayerDirectory,
        preview: Option<((f64, f64), (f64, f64), StrokeStyle)>,
    ) -> RenderResult<ComposedFrame> {
        let (surface_w, surface_h) = board.surface_size();
        let (width, height) = (surface_w.max(0.0).round() as u32, surface_h.max(0.0).round() as u32);
        let (mut frame, _) = self.pitch_frame(width, height)?;
        let geometry = board.geometry();
        let mut drawn = 0;
        let mut skipped = 0;

        for element in board.elements() {
            if self.draw_kind(&mut frame, &element.kind, &geometry, directory) {
                drawn += 1;
            } else {
                skipped += 1;
            }
        }

        if let Some(selected) = board.selected().and_then(|id| board.get_element(id)) {
            frame.selection(&selected.bounds(&geometry));
        }
        if let Some((tail, tip, style)) = preview {
            frame.arrow(tail, tip, &style);
        }

        Ok(ComposedFrame {
            svg: frame.finish(),
            drawn,
            skipped,
        })
    }

    fn draw_kind(
        &self,
        frame: &mut Frame,
        kind: &ElementKind,
        geometry: &FieldGeometry,
        directory: &dyn PlayerDirectory,
    ) -> bool {
        match frame.element(kind, geometry, &self.icons, directory, &self.config) {
            Drawn::Drawn => true,
            Drawn::MissingPlayer => {
                tracing::warn!("Skipping player marker: player not in directory");
                false
            }
            Drawn::IconUnavailable => {
                tracing::warn!("Skipping element: icon unavailable");
                false
            }
        }
    }
}

fn build_fontdb(config: &RenderConfig) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    if config.load_system_fonts {
        db.load_system_fonts();
    }
    if let Some(dir) = &config.font_dir {
        load_fonts_from_dir(&mut db, dir);
    }
    tracing::debug!("Font database has {} faces", db.len());
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!("Font directory {} not readable", dir.display());
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            if let Err(e) = db.load_font_file(&path) {
                tracing::warn!("Failed to load font {}: {e}", path.display());
            }
        }
    }
}
