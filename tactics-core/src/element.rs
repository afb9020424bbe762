//! Board elements - the items placed on the tactical field.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{distance_to_segment, FieldGeometry, NormPoint, Rect};

/// Identifier of a player in the external player directory.
pub type PlayerId = i64;

/// Ball icon size in pixels.
pub const BALL_SIZE: (f64, f64) = (20.0, 20.0);
/// Cone icon size in pixels.
pub const CONE_SIZE: (f64, f64) = (25.0, 25.0);
/// Goal icon size in pixels.
pub const GOAL_SIZE: (f64, f64) = (60.0, 25.0);
/// Player figure size in pixels, without the number label.
pub const PLAYER_FIGURE_SIZE: (f64, f64) = (25.0, 50.0);
/// Width reserved to the right of the figure for the jersey number.
pub const PLAYER_LABEL_WIDTH: f64 = 25.0;
/// Font size used for free text and jersey numbers.
pub const TEXT_FONT_PX: f64 = 16.0;
/// Extra distance around an arrow's stroke that still counts as a hit.
pub const ARROW_HIT_SLOP_PX: f64 = 4.0;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side a player marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Our own squad.
    Own,
    /// Opponents, or players wearing training bibs.
    Opponent,
}

/// Static training props.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prop {
    /// Training cone.
    Cone,
    /// Portable goal.
    Goal,
    /// Ball.
    Ball,
}

impl Prop {
    /// Icon size in pixels before rotation.
    #[must_use]
    pub fn size(self) -> (f64, f64) {
        match self {
            Self::Cone => CONE_SIZE,
            Self::Goal => GOAL_SIZE,
            Self::Ball => BALL_SIZE,
        }
    }

    /// Whether rotating this prop changes anything.
    #[must_use]
    pub fn is_orientable(self) -> bool {
        !matches!(self, Self::Ball)
    }
}

/// Orientation in quarter turns, stored as degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Rotation(u16);

impl Rotation {
    /// No rotation.
    pub const ZERO: Self = Self(0);

    /// Snap an arbitrary angle to the nearest quarter turn in `0..360`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_degrees(degrees: i64) -> Self {
        // Reduce first; any i64 is accepted.
        let d = degrees.rem_euclid(360);
        Self(((d + 45) / 90 * 90 % 360) as u16)
    }

    /// Angle in degrees (0, 90, 180 or 270).
    #[must_use]
    pub fn degrees(self) -> u16 {
        self.0
    }

    /// The next quarter turn clockwise.
    #[must_use]
    pub fn advanced(self) -> Self {
        Self((self.0 + 90) % 360)
    }

    /// Whether width and height swap at this orientation.
    #[must_use]
    pub fn is_sideways(self) -> bool {
        self.0 == 90 || self.0 == 270
    }
}

impl From<i64> for Rotation {
    fn from(degrees: i64) -> Self {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        i64::from(rotation.0)
    }
}

/// Stroke options for arrows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Colour name or hex code.
    pub color: String,
    /// Line width in pixels.
    pub width_px: u32,
    /// Dashed rather than solid.
    pub dashed: bool,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "yellow".to_string(),
            width_px: 3,
            dashed: false,
        }
    }
}

/// What an element is, together with its normalized placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ElementKind {
    /// A player marker decorated from the player directory.
    Player {
        /// Directory reference.
        player_id: PlayerId,
        /// Side the player is on.
        team: Team,
        /// Anchor point (icon centre).
        at: NormPoint,
        /// Icon orientation.
        rotation: Rotation,
    },

    /// A cone, goal or ball.
    Prop {
        /// Which prop.
        prop: Prop,
        /// Anchor point (icon centre).
        at: NormPoint,
        /// Icon orientation.
        rotation: Rotation,
    },

    /// A straight arrow pointing from `start` to `end`.
    Arrow {
        /// Tail.
        start: NormPoint,
        /// Head.
        end: NormPoint,
        /// Stroke options.
        style: StrokeStyle,
    },

    /// A free text label.
    Text {
        /// Label text.
        content: String,
        /// Colour name or hex code.
        color: String,
        /// Anchor point (text centre).
        at: NormPoint,
    },
}

/// An element placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Element content and placement.
    pub kind: ElementKind,
}

impl Element {
    /// Create a new element with a fresh ID.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            kind,
        }
    }

    /// The point the element is dragged by: the icon/text centre, or the
    /// tail of an arrow.
    #[must_use]
    pub fn anchor(&self) -> NormPoint {
        match &self.kind {
            ElementKind::Player { at, .. }
            | ElementKind::Prop { at, .. }
            | ElementKind::Text { at, .. } => *at,
            ElementKind::Arrow { start, .. } => *start,
        }
    }

    /// Current orientation for elements that carry one.
    #[must_use]
    pub fn rotation(&self) -> Option<Rotation> {
        match &self.kind {
            ElementKind::Player { rotation, .. } | ElementKind::Prop { rotation, .. } => {
                Some(*rotation)
            }
            ElementKind::Arrow { .. } | ElementKind::Text { .. } => None,
        }
    }

    /// Whether [`Element::rotate`] has any effect.
    #[must_use]
    pub fn is_orientable(&self) -> bool {
        match &self.kind {
            ElementKind::Player { .. } => true,
            ElementKind::Prop { prop, .. } => prop.is_orientable(),
            ElementKind::Arrow { .. } | ElementKind::Text { .. } => false,
        }
    }

    /// Advance the orientation by a quarter turn.
    ///
    /// Returns `false` (and changes nothing) for elements without one.
    pub fn rotate(&mut self) -> bool {
        if !self.is_orientable() {
            return false;
        }
        match &mut self.kind {
            ElementKind::Player { rotation, .. } | ElementKind::Prop { rotation, .. } => {
                *rotation = rotation.advanced();
                true
            }
            ElementKind::Arrow { .. } | ElementKind::Text { .. } => false,
        }
    }

    /// Shift the element by a normalized offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        let shift = |p: &mut NormPoint| {
            p.x += dx;
            p.y += dy;
        };
        match &mut self.kind {
            ElementKind::Player { at, .. }
            | ElementKind::Prop { at, .. }
            | ElementKind::Text { at, .. } => shift(at),
            ElementKind::Arrow { start, end, .. } => {
                shift(start);
                shift(end);
            }
        }
    }

    /// Unrotated icon size in pixels, or `None` for arrows.
    #[must_use]
    pub fn icon_size(&self) -> Option<(f64, f64)> {
        match &self.kind {
            ElementKind::Player { .. } => Some((
                PLAYER_FIGURE_SIZE.0 + PLAYER_LABEL_WIDTH,
                PLAYER_FIGURE_SIZE.1,
            )),
            ElementKind::Prop { prop, .. } => Some(prop.size()),
            ElementKind::Text { content, .. } => Some(text_extent(content)),
            ElementKind::Arrow { .. } => None,
        }
    }

    /// The rendered bounding box in surface pixels.
    #[must_use]
    pub fn bounds(&self, geometry: &FieldGeometry) -> Rect {
        if let ElementKind::Arrow { start, end, style } = &self.kind {
            let (x1, y1) = geometry.to_absolute(*start);
            let (x2, y2) = geometry.to_absolute(*end);
            let rect = Rect::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs());
            return rect.inflate(f64::from(style.width_px) / 2.0);
        }

        let (cx, cy) = geometry.to_absolute(self.anchor());
        let (mut w, mut h) = self.icon_size().unwrap_or_default();
        if self.rotation().is_some_and(Rotation::is_sideways) {
            std::mem::swap(&mut w, &mut h);
        }
        Rect::centered(cx, cy, w, h)
    }

    /// Centre of the rendered element in surface pixels.
    #[must_use]
    pub fn center(&self, geometry: &FieldGeometry) -> (f64, f64) {
        self.bounds(geometry).center()
    }

    /// Check if a surface point is on the rendered element.
    #[must_use]
    pub fn contains_point(&self, px: f64, py: f64, geometry: &FieldGeometry) -> bool {
        match &self.kind {
            ElementKind::Arrow { start, end, style } => {
                let reach = (f64::from(style.width_px) / 2.0).max(ARROW_HIT_SLOP_PX);
                distance_to_segment(
                    px,
                    py,
                    geometry.to_absolute(*start),
                    geometry.to_absolute(*end),
                ) <= reach
            }
            _ => self.bounds(geometry).contains(px, py),
        }
    }

    /// Whether every stored coordinate is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match &self.kind {
            ElementKind::Arrow { start, end, .. } => start.is_finite() && end.is_finite(),
            _ => self.anchor().is_finite(),
        }
    }
}

/// Approximate rendered size of a text label.
#[allow(clippy::cast_precision_loss)]
fn text_extent(content: &str) -> (f64, f64) {
    let glyphs = content.chars().count().max(1) as f64;
    (glyphs * TEXT_FONT_PX * 0.6, TEXT_FONT_PX * 1.25)
}
