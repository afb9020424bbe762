//! Per-element drawing, shared by every view of a board.
//!
//! Everything is drawn into an SVG [`Frame`] in surface pixels; the
//! compositor rasterizes finished frames with resvg. The interactive view and
//! exported images go through exactly the same routines, so an element looks
//! the same wherever it is shown.

use std::fmt::Write;

use tactics_core::element::{
    ElementKind, Rotation, StrokeStyle, Team, PLAYER_FIGURE_SIZE, PLAYER_LABEL_WIDTH,
    TEXT_FONT_PX,
};
use tactics_core::formation::GUIDE_RADIUS_PX;
use tactics_core::geometry::{FieldGeometry, Rect};
use tactics_core::players::PlayerDirectory;

use crate::compositor::RenderConfig;
use crate::icons::{IconKind, IconSet, IconSource};

/// Fill of our own players' built-in figure.
pub const OWN_PLAYER_COLOR: &str = "#C0392B";
/// Fill of opponents' built-in figure.
pub const OPPONENT_PLAYER_COLOR: &str = "#F1C40F";
/// Outline of the selected element.
pub const SELECTION_COLOR: &str = "red";
/// Dash pattern of dashed arrows.
pub const ARROW_DASH: &str = "5,3";
/// Angle between an arrowhead wing and the shaft.
pub const ARROWHEAD_ANGLE_DEG: f64 = 25.0;

const LABEL_FONT_PX: f64 = 14.0;
const GUIDE_COLOR: &str = "yellow";
const GUIDE_DASH: &str = "4,2";

/// What happened to an element handed to [`Frame::element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drawn {
    /// The element is in the frame.
    Drawn,
    /// The referenced player is not in the directory.
    MissingPlayer,
    /// The icon artwork could not be loaded.
    IconUnavailable,
}

/// An SVG document under construction.
#[derive(Debug, Clone)]
pub struct Frame {
    svg: String,
    width: u32,
    height: u32,
}

impl Frame {
    /// Start a `width` x `height` frame filled with `background`.
    #[must_use]
    pub fn new(width: u32, height: u32, background: &str) -> Self {
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        );
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(background),
        );
        Self { svg, width, height }
    }

    /// Frame size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Draw the pitch markings for `geometry`.
    pub fn pitch(&mut self, geometry: &FieldGeometry, config: &RenderConfig) {
        if !geometry.is_ready() {
            return;
        }
        let m = geometry.markings();
        let stroke = format!(
            "fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"",
            escape_xml(&config.line_color),
            config.line_width,
        );

        self.rect(&m.outline, &stroke);
        let ((hx1, hy1), (hx2, hy2)) = m.halfway;
        let _ = write!(
            self.svg,
            "<line x1=\"{hx1:.2}\" y1=\"{hy1:.2}\" x2=\"{hx2:.2}\" y2=\"{hy2:.2}\" {stroke}/>",
        );
        let (cx, cy) = m.centre;
        let _ = write!(
            self.svg,
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" {stroke}/>",
            m.centre_radius,
        );
        self.rect(&m.left_area, &stroke);
        self.rect(&m.right_area, &stroke);
    }

    /// Draw one element.
    ///
    /// Players not found in `directory`, and icons whose artwork is
    /// unavailable, are left out.
    pub fn element(
        &mut self,
        kind: &ElementKind,
        geometry: &FieldGeometry,
        icons: &IconSet,
        directory: &dyn PlayerDirectory,
        config: &RenderConfig,
    ) -> Drawn {
        match kind {
            ElementKind::Player {
                player_id,
                team,
                at,
                rotation,
            } => {
                let Some(card) = directory.lookup(*player_id) else {
                    return Drawn::MissingPlayer;
                };
                let source = icons.source(IconKind::for_team(*team));
                if matches!(source, IconSource::Unavailable(_)) {
                    return Drawn::IconUnavailable;
                }
                let (cx, cy) = geometry.to_absolute(*at);
                let (fig_w, fig_h) = PLAYER_FIGURE_SIZE;
                let (x0, y0) = (cx - (fig_w + PLAYER_LABEL_WIDTH) / 2.0, cy - fig_h / 2.0);

                let rotated = self.open_rotation(*rotation, cx, cy);
                match source {
                    IconSource::Image(uri) => self.image(uri, x0, y0, fig_w, fig_h),
                    _ => self.builtin_player(*team, x0, y0),
                }
                let _ = write!(
                    self.svg,
                    "<text x=\"{:.2}\" y=\"{cy:.2}\" dy=\"0.35em\" font-size=\"{LABEL_FONT_PX}\" font-weight=\"bold\" font-family=\"{}\" fill=\"black\">{}</text>",
                    x0 + fig_w + 3.0,
                    escape_xml(&config.font_family),
                    escape_xml(&card.jersey_label()),
                );
                self.close_rotation(rotated);
                Drawn::Drawn
            }

            ElementKind::Prop { prop, at, rotation } => {
                let kind = IconKind::for_prop(*prop);
                let source = icons.source(kind);
                if matches!(source, IconSource::Unavailable(_)) {
                    return Drawn::IconUnavailable;
                }
                let (cx, cy) = geometry.to_absolute(*at);
                let (w, h) = kind.size();
                let (x0, y0) = (cx - w / 2.0, cy - h / 2.0);

                let rotated = self.open_rotation(*rotation, cx, cy);
                match source {
                    IconSource::Image(uri) => self.image(uri, x0, y0, w, h),
                    _ => self.builtin_prop(kind, x0, y0),
                }
                self.close_rotation(rotated);
                Drawn::Drawn
            }

            ElementKind::Arrow { start, end, style } => {
                self.arrow(geometry.to_absolute(*start), geometry.to_absolute(*end), style);
                Drawn::Drawn
            }

            ElementKind::Text { content, color, at } => {
                let (x, y) = geometry.to_absolute(*at);
                let _ = write!(
                    self.svg,
                    "<text x=\"{x:.2}\" y=\"{y:.2}\" dy=\"0.35em\" text-anchor=\"middle\" font-size=\"{TEXT_FONT_PX}\" font-weight=\"bold\" font-family=\"{}\" fill=\"{}\">{}</text>",
                    escape_xml(&config.font_family),
                    escape_xml(color),
                    escape_xml(content),
                );
                Drawn::Drawn
            }
        }
    }

    /// Draw an arrow from `tail` to `tip` with a filled head at the tip.
    pub fn arrow(&mut self, tail: (f64, f64), tip: (f64, f64), style: &StrokeStyle) {
        let color = escape_xml(&style.color);
        let width = f64::from(style.width_px.max(1));
        let dash = if style.dashed {
            format!(" stroke-dasharray=\"{ARROW_DASH}\"")
        } else {
            String::new()
        };
        let _ = write!(
            self.svg,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{color}\" stroke-width=\"{width}\"{dash}/>",
            tail.0, tail.1, tip.0, tip.1,
        );

        if let Some([left, right]) = arrowhead(tail, tip, (width * 3.0).max(10.0), ARROWHEAD_ANGLE_DEG)
        {
            let _ = write!(
                self.svg,
                "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"{color}\"/>",
                tip.0, tip.1, left.0, left.1, right.0, right.1,
            );
        }
    }

    /// Outline `bounds` as the current selection.
    pub fn selection(&mut self, bounds: &Rect) {
        let stroke = format!("fill=\"none\" stroke=\"{SELECTION_COLOR}\" stroke-width=\"2\"");
        self.rect(&bounds.inflate(2.0), &stroke);
    }

    /// Dashed guide circles centred on `centres`.
    pub fn guides(&mut self, centres: &[(f64, f64)]) {
        for (cx, cy) in centres {
            let _ = write!(
                self.svg,
                "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{GUIDE_RADIUS_PX}\" fill=\"none\" stroke=\"{GUIDE_COLOR}\" stroke-width=\"2\" stroke-dasharray=\"{GUIDE_DASH}\"/>",
            );
        }
    }

    /// Close the document and return the SVG text.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.svg.push_str("</svg>");
        self.svg
    }

    fn rect(&mut self, r: &Rect, attrs: &str) {
        let _ = write!(
            self.svg,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {attrs}/>",
            r.x, r.y, r.width, r.height,
        );
    }

    fn image(&mut self, uri: &str, x: f64, y: f64, w: f64, h: f64) {
        let _ = write!(
            self.svg,
            "<image x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{uri}\"/>",
        );
    }

    /// Open a clockwise rotation group about `(cx, cy)` if needed.
    fn open_rotation(&mut self, rotation: Rotation, cx: f64, cy: f64) -> bool {
        if rotation == Rotation::ZERO {
            return false;
        }
        let _ = write!(
            self.svg,
            "<g transform=\"rotate({} {cx:.2} {cy:.2})\">",
            rotation.degrees(),
        );
        true
    }

    fn close_rotation(&mut self, opened: bool) {
        if opened {
            self.svg.push_str("</g>");
        }
    }

    fn builtin_player(&mut self, team: Team, x0: f64, y0: f64) {
        let fill = match team {
            Team::Own => OWN_PLAYER_COLOR,
            Team::Opponent => OPPONENT_PLAYER_COLOR,
        };
        let (fig_w, fig_h) = PLAYER_FIGURE_SIZE;
        // Body below, head on top.
        let _ = write!(
            self.svg,
            "<ellipse cx=\"{:.2}\" cy=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"{fill}\" stroke=\"black\"/>",
            x0 + fig_w / 2.0,
            y0 + (12.0 + fig_h - 2.0) / 2.0,
            fig_w / 2.0 - 2.0,
            (fig_h - 14.0) / 2.0,
        );
        let _ = write!(
            self.svg,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"7.5\" fill=\"gray\" stroke=\"black\"/>",
            x0 + fig_w / 2.0,
            y0 + 7.5,
        );
    }

    fn builtin_prop(&mut self, kind: IconKind, x0: f64, y0: f64) {
        let (w, h) = kind.size();
        match kind {
            IconKind::Ball => {
                let r = (w - 2.0) / 2.0;
                let _ = write!(
                    self.svg,
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{r}\" fill=\"white\" stroke=\"black\"/>",
                    x0 + r,
                    y0 + r,
                );
            }
            IconKind::Cone => {
                let _ = write!(
                    self.svg,
                    "<polygon points=\"{:.2},{y0:.2} {x0:.2},{:.2} {:.2},{:.2}\" fill=\"orange\"/>",
                    x0 + w / 2.0,
                    y0 + h,
                    x0 + w,
                    y0 + h,
                );
            }
            IconKind::Goal => {
                self.rect(
                    &Rect::new(x0 + 1.5, y0 + 1.5, w - 3.0, h - 3.0),
                    "fill=\"none\" stroke=\"white\" stroke-width=\"3\"",
                );
            }
            IconKind::OwnPlayer | IconKind::OpponentPlayer => {}
        }
    }
}

/// Wing points of an arrowhead at `tip`.
///
/// The head is at most 30% of the shaft; arrows shorter than a pixel get
/// no head.
#[must_use]
pub fn arrowhead(
    tail: (f64, f64),
    tip: (f64, f64),
    length: f64,
    angle_degrees: f64,
) -> Option<[(f64, f64); 2]> {
    let (dx, dy) = (tip.0 - tail.0, tip.1 - tail.1);
    let shaft = dx.hypot(dy);
    if shaft < 1.0 {
        return None;
    }

    let (ux, uy) = (dx / shaft, dy / shaft);
    let head = length.min(shaft * 0.3);
    let (sin_a, cos_a) = angle_degrees.to_radians().sin_cos();

    let left = (
        tip.0 - head * (ux * cos_a - uy * sin_a),
        tip.1 - head * (uy * cos_a + ux * sin_a),
    );
    let right = (
        tip.0 - head * (ux * cos_a + uy * sin_a),
        tip.1 - head * (uy * cos_a - ux * sin_a),
    );
    Some([left, right])
}

/// Escape special XML characters and drop those XML 1.0 does not allow.
#[must_use]
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < ' ' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}
