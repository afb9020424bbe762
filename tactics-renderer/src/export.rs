//! Layout export to image and document formats.
//!
//! Encodes compositor output as PNG, JPEG, SVG or a single-page PDF. Raster
//! formats go through the same SVG frame and resvg/tiny-skia pipeline as
//! the on-screen view.

use std::path::Path;

use image::ImageEncoder;
use serde::{Deserialize, Serialize};
use tactics_core::formation::Formation;
use tactics_core::players::PlayerDirectory;
use tactics_core::schema::LayoutRecord;
use tactics_core::Board;

use crate::compositor::Compositor;
use crate::error::{RenderError, RenderResult};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// SVG vector graphics (the SVG XML string as UTF-8 bytes).
    Svg,
    /// PDF document with the rendered image on a single page.
    Pdf,
}

impl ExportFormat {
    /// Format for a file extension, case-insensitively.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "svg" => Some(Self::Svg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Format for the extension of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }
}

/// Configuration for layout export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// DPI used to size PDF pages (default: 96.0).
    pub dpi: f32,
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
    /// Colour JPEG pixels are flattened onto where the image is transparent.
    pub matte: [u8; 3],
    /// PDF document title.
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            jpeg_quality: 85,
            matte: [255, 255, 255],
            title: "Tactical Layout".to_string(),
        }
    }
}

/// Exports layouts and boards through a [`Compositor`].
#[derive(Debug)]
pub struct LayoutExporter {
    compositor: Compositor,
    config: ExportConfig,
}

impl LayoutExporter {
    /// Create an exporter.
    #[must_use]
    pub fn new(compositor: Compositor, config: ExportConfig) -> Self {
        Self { compositor, config }
    }

    /// Create an exporter with default compositor and export settings.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Compositor::with_defaults(), ExportConfig::default())
    }

    /// The compositor used for rendering.
    #[must_use]
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Export settings.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export stored records at the compositor's configured size.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be rendered or encoded.
    pub fn export_layout(
        &self,
        records: &[LayoutRecord],
        directory: &dyn PlayerDirectory,
        format: ExportFormat,
    ) -> RenderResult<Vec<u8>> {
        let config = self.compositor.config();
        self.export_layout_sized(records, directory, format, config.width, config.height)
    }

    /// Export stored records at `width` x `height`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be rendered or encoded.
    pub fn export_layout_sized(
        &self,
        records: &[LayoutRecord],
        directory: &dyn PlayerDirectory,
        format: ExportFormat,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<u8>> {
        let frame = self
            .compositor
            .layout_svg(records, directory, width, height)?;
        tracing::debug!(
            "Exporting layout as {:?}: {} drawn, {} left out",
            format,
            frame.drawn,
            frame.skipped
        );
        self.encode(&frame.svg, format)
    }

    /// Export a live board at its surface size, selection included.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be rendered or encoded.
    pub fn export_board(
        &self,
        board: &Board,
        directory: &dyn PlayerDirectory,
        format: ExportFormat,
    ) -> RenderResult<Vec<u8>> {
        let frame = self.compositor.board_svg(board, directory)?;
        self.encode(&frame.svg, format)
    }

    /// Export a formation's guide circles on an empty pitch.
    ///
    /// # Errors
    ///
    /// Returns an error if the pitch cannot be rendered or encoded.
    pub fn export_formation(
        &self,
        formation: &Formation,
        format: ExportFormat,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<u8>> {
        let svg = self.compositor.formation_svg(formation, width, height)?;
        self.encode(&svg, format)
    }

    /// Encode an SVG frame in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub fn encode(&self, svg: &str, format: ExportFormat) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Svg => Ok(svg.as_bytes().to_vec()),
            ExportFormat::Png => Self::to_png(&self.compositor.rasterize(svg)?),
            ExportFormat::Jpeg => self.to_jpeg(&self.compositor.rasterize(svg)?),
            ExportFormat::Pdf => self.to_pdf(&self.compositor.rasterize(svg)?),
        }
    }

    /// Encode a pixmap as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if encoding fails.
    pub fn to_png(pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Encode a pixmap as JPEG, flattened onto the matte colour.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if encoding fails.
    pub fn to_jpeg(&self, pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
        let (width, height) = (pixmap.width(), pixmap.height());
        let rgb = flatten(pixmap, self.config.matte);

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf,
            self.config.jpeg_quality.clamp(1, 100),
        );
        encoder
            .write_image(&rgb, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Embed a pixmap in a single-page PDF sized from the configured DPI.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if PDF generation fails, or if the
    /// crate was built without the `pdf` feature.
    #[cfg(feature = "pdf")]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_pdf(&self, pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
        let png_data = Self::to_png(pixmap)?;
        let (out_w, out_h) = (pixmap.width(), pixmap.height());
        let dpi = if self.config.dpi > 0.0 { self.config.dpi } else { 96.0 };

        // pixels / dpi * 25.4
        let page_width_mm = out_w as f32 / dpi * 25.4;
        let page_height_mm = out_h as f32 / dpi * 25.4;

        let (doc, page1, layer1) = printpdf::PdfDocument::new(
            &self.config.title,
            printpdf::Mm(page_width_mm),
            printpdf::Mm(page_height_mm),
            "Layout",
        );
        let current_layer = doc.get_page(page1).get_layer(layer1);

        let dynamic_image = printpdf::image_crate::load_from_memory(&png_data)
            .map_err(|e| RenderError::Export(format!("Failed to decode PNG for PDF: {e}")))?;
        let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

        let transform = printpdf::ImageTransform {
            translate_x: Some(printpdf::Mm(0.0)),
            translate_y: Some(printpdf::Mm(0.0)),
            dpi: Some(dpi),
            ..Default::default()
        };
        pdf_image.add_to_layer(current_layer, transform);

        doc.save_to_bytes()
            .map_err(|e| RenderError::Export(format!("PDF save failed: {e}")))
    }

    /// Embed a pixmap in a single-page PDF.
    ///
    /// # Errors
    ///
    /// Always returns [`RenderError::Export`]; built without the `pdf`
    /// feature.
    #[cfg(not(feature = "pdf"))]
    #[allow(clippy::unused_self)]
    pub fn to_pdf(&self, _pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
        Err(RenderError::Export(
            "PDF export requires the `pdf` feature".to_string(),
        ))
    }
}

/// Composite premultiplied RGBA over an opaque matte into packed RGB.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn flatten(pixmap: &tiny_skia::Pixmap, matte: [u8; 3]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixmap.data().len() / 4 * 3);
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 1.0 - f32::from(pixel[3]) / 255.0;
        for (&channel, &backdrop) in pixel[..3].iter().zip(&matte) {
            let value = f32::from(backdrop).mul_add(inv, f32::from(channel));
            rgb.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::RenderConfig;
    use crate::icons::IconSet;
    use tactics_core::players::InMemoryDirectory;
    use tactics_core::{Placement, Prop, Team};

    fn exporter() -> LayoutExporter {
        let compositor = Compositor::new(
            RenderConfig {
                load_system_fonts: false,
                ..RenderConfig::default()
            },
            IconSet::builtin(),
        );
        LayoutExporter::new(compositor, ExportConfig::default())
    }

    fn records() -> (Vec<LayoutRecord>, InMemoryDirectory) {
        let dir = InMemoryDirectory::new().with_player(9, Some(9), "Striker");
        let mut board = Board::new(800.0, 600.0);
        board
            .place(
                Placement::Player {
                    player_id: 9,
                    team: Team::Own,
                },
                500.0,
                300.0,
                &dir,
            )
            .expect("place");
        board
            .place(Placement::Prop(Prop::Ball), 520.0, 320.0, &dir)
            .expect("place");
        (board.to_records(), dir)
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_extension("PNG"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_extension("jpeg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_extension("jpg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_extension("gif"), None);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/board.pdf")),
            Some(ExportFormat::Pdf)
        );
        assert_eq!(ExportFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_svg_export() {
        let (records, dir) = records();
        let bytes = exporter()
            .export_layout(&records, &dir, ExportFormat::Svg)
            .expect("svg export");
        let svg = String::from_utf8(bytes).expect("utf8");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"800\""));
        assert!(svg.contains(">9</text>"));
    }

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let (records, dir) = records();
        let png = exporter()
            .export_layout_sized(&records, &dir, ExportFormat::Png, 320, 240)
            .expect("png export");
        // PNG magic bytes: \x89PNG
        assert!(png.len() > 8);
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);

        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_jpeg_export_produces_valid_bytes() {
        let (records, dir) = records();
        let jpeg = exporter()
            .export_layout(&records, &dir, ExportFormat::Jpeg)
            .expect("jpeg export");
        // JPEG SOI marker
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_export_produces_valid_bytes() {
        let (records, dir) = records();
        let pdf = exporter()
            .export_layout(&records, &dir, ExportFormat::Pdf)
            .expect("pdf export");
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_zero_size_export_fails() {
        let (records, dir) = records();
        let result = exporter().export_layout_sized(&records, &dir, ExportFormat::Png, 0, 10);
        assert!(matches!(result, Err(RenderError::InvalidSize { .. })));
    }

    #[test]
    fn test_flatten_premultiplied() {
        let mut pixmap = tiny_skia::Pixmap::new(2, 1).expect("pixmap");
        // Left pixel transparent, right pixel half-transparent red.
        pixmap.data_mut()[4..8].copy_from_slice(&[128, 0, 0, 128]);
        let rgb = flatten(&pixmap, [255, 255, 255]);
        assert_eq!(&rgb[0..3], &[255, 255, 255]);
        assert_eq!(rgb[3], 255);
        assert_eq!(rgb[4], 127);
        assert_eq!(rgb[5], 127);
    }
}
