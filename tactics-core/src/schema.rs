//! Persisted layout record format.
//!
//! A layout is stored as a JSON array of flat records:
//!
//! ```json
//! [
//!   {"type": "player", "relX": 0.5, "relY": 0.25, "rotation": 90, "team": "own", "playerId": 7},
//!   {"type": "cono", "relX": 0.1, "relY": 0.9},
//!   {"type": "arrow", "relCoords": [0.1, 0.1, 0.4, 0.3], "options": {"fill": "yellow", "width": 3, "dash": true}},
//!   {"type": "text", "relX": 0.5, "relY": 0.5, "text": "Press!", "options": {"fill": "white"}}
//! ]
//! ```
//!
//! Records written by older editors use snake_case keys (`rel_x`,
//! `rel_coords`, `player_id`), dash patterns such as `[5, 3]`, or absolute
//! `x`/`y` pixels; all of these are still accepted on read.

use serde::{Deserialize, Deserializer, Serialize};

use crate::element::{Element, ElementKind, PlayerId, Prop, Rotation, StrokeStyle, Team};
use crate::error::{TacticsError, TacticsResult};
use crate::geometry::{FieldGeometry, NormPoint};

/// Default fill for text labels without a stored colour.
pub const DEFAULT_TEXT_COLOR: &str = "white";

/// The `type` tag of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Player marker.
    #[serde(rename = "player")]
    Player,
    /// Cone.
    #[serde(rename = "cono")]
    Cone,
    /// Goal.
    #[serde(rename = "porteria")]
    Goal,
    /// Ball.
    #[serde(rename = "ball")]
    Ball,
    /// Arrow.
    #[serde(rename = "arrow")]
    Arrow,
    /// Text label.
    #[serde(rename = "text")]
    Text,
}

impl From<Prop> for RecordType {
    fn from(prop: Prop) -> Self {
        match prop {
            Prop::Cone => Self::Cone,
            Prop::Goal => Self::Goal,
            Prop::Ball => Self::Ball,
        }
    }
}

/// Dash setting: a flag, or a legacy on/off pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dash {
    /// `true` for dashed.
    Flag(bool),
    /// Segment lengths; any non-empty pattern means dashed.
    Pattern(Vec<u32>),
}

impl Dash {
    /// Whether the stroke is dashed.
    #[must_use]
    pub fn is_dashed(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Pattern(pattern) => pattern.iter().any(|&len| len > 0),
        }
    }
}

/// Style map attached to arrows and text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOptions {
    /// Colour name or hex code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Stroke width in pixels.
    #[serde(
        default,
        deserialize_with = "lenient_width",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<u32>,
    /// Dash setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Dash>,
}

impl StyleOptions {
    fn is_empty(&self) -> bool {
        self.fill.is_none() && self.width.is_none() && self.dash.is_none()
    }
}

/// One persisted element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    /// Element type.
    #[serde(rename = "type")]
    pub kind: RecordType,
    /// Field-relative X of point elements.
    #[serde(
        rename = "relX",
        alias = "rel_x",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rel_x: Option<f64>,
    /// Field-relative Y of point elements.
    #[serde(
        rename = "relY",
        alias = "rel_y",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rel_y: Option<f64>,
    /// Legacy absolute X in pixels.
    #[serde(default, skip_serializing)]
    pub x: Option<f64>,
    /// Legacy absolute Y in pixels.
    #[serde(default, skip_serializing)]
    pub y: Option<f64>,
    /// Arrow endpoints `[x1, y1, x2, y2]`, field-relative.
    #[serde(
        rename = "relCoords",
        alias = "rel_coords",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rel_coords: Option<[f64; 4]>,
    /// Orientation in degrees.
    #[serde(default, skip_serializing_if = "is_unrotated")]
    pub rotation: Rotation,
    /// Player side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    /// Player directory reference.
    #[serde(
        rename = "playerId",
        alias = "player_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub player_id: Option<PlayerId>,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Style options.
    #[serde(default, skip_serializing_if = "StyleOptions::is_empty")]
    pub options: StyleOptions,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_unrotated(rotation: &Rotation) -> bool {
    *rotation == Rotation::ZERO
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_width<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let width = Option::<f64>::deserialize(deserializer)?;
    Ok(width
        .filter(|w| w.is_finite() && *w >= 0.0)
        .map(|w| w.round() as u32))
}

impl LayoutRecord {
    fn empty(kind: RecordType) -> Self {
        Self {
            kind,
            rel_x: None,
            rel_y: None,
            x: None,
            y: None,
            rel_coords: None,
            rotation: Rotation::ZERO,
            team: None,
            player_id: None,
            text: None,
            options: StyleOptions::default(),
        }
    }

    fn at(mut self, point: NormPoint) -> Self {
        self.rel_x = Some(point.x);
        self.rel_y = Some(point.y);
        self
    }

    /// Whether this record references the player directory.
    #[must_use]
    pub fn player_ref(&self) -> Option<PlayerId> {
        match self.kind {
            RecordType::Player => self.player_id,
            _ => None,
        }
    }

    /// Build the anchor point of a point element.
    ///
    /// Relative coordinates win; legacy absolute pixels are converted
    /// through `geometry`.
    fn anchor(&self, geometry: &FieldGeometry) -> TacticsResult<NormPoint> {
        let point = match (self.rel_x, self.rel_y, self.x, self.y) {
            (Some(x), Some(y), _, _) => NormPoint::new(x, y),
            (_, _, Some(px), Some(py)) => geometry
                .to_normalized(px, py)
                .ok_or(TacticsError::GeometryNotReady)?,
            _ => {
                return Err(TacticsError::MalformedRecord(
                    "point element without a position".to_string(),
                ))
            }
        };
        if point.is_finite() {
            Ok(point)
        } else {
            Err(TacticsError::MalformedRecord(
                "non-finite position".to_string(),
            ))
        }
    }

    /// Turn this record into an element description.
    ///
    /// `geometry` is only consulted for legacy absolute positions.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::MalformedRecord`] when a required field is
    /// missing, or [`TacticsError::GeometryNotReady`] when a legacy position
    /// cannot be converted yet.
    pub fn to_kind(&self, geometry: &FieldGeometry) -> TacticsResult<ElementKind> {
        let kind = match self.kind {
            RecordType::Player => {
                let player_id = self.player_id.ok_or_else(|| {
                    TacticsError::MalformedRecord("player without playerId".to_string())
                })?;
                let team = self.team.ok_or_else(|| {
                    TacticsError::MalformedRecord("player without team".to_string())
                })?;
                ElementKind::Player {
                    player_id,
                    team,
                    at: self.anchor(geometry)?,
                    rotation: self.rotation,
                }
            }
            RecordType::Cone | RecordType::Goal | RecordType::Ball => {
                let prop = match self.kind {
                    RecordType::Cone => Prop::Cone,
                    RecordType::Goal => Prop::Goal,
                    _ => Prop::Ball,
                };
                let rotation = if prop.is_orientable() {
                    self.rotation
                } else {
                    Rotation::ZERO
                };
                ElementKind::Prop {
                    prop,
                    at: self.anchor(geometry)?,
                    rotation,
                }
            }
            RecordType::Arrow => {
                let [x1, y1, x2, y2] = self.rel_coords.ok_or_else(|| {
                    TacticsError::MalformedRecord("arrow without relCoords".to_string())
                })?;
                let (start, end) = (NormPoint::new(x1, y1), NormPoint::new(x2, y2));
                if !(start.is_finite() && end.is_finite()) {
                    return Err(TacticsError::MalformedRecord(
                        "non-finite arrow endpoint".to_string(),
                    ));
                }
                let defaults = StrokeStyle::default();
                ElementKind::Arrow {
                    start,
                    end,
                    style: StrokeStyle {
                        color: self.options.fill.clone().unwrap_or(defaults.color),
                        width_px: self.options.width.unwrap_or(defaults.width_px).max(1),
                        dashed: self.options.dash.as_ref().is_some_and(Dash::is_dashed),
                    },
                }
            }
            RecordType::Text => {
                let content = self
                    .text
                    .clone()
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| TacticsError::MalformedRecord("empty text".to_string()))?;
                ElementKind::Text {
                    content,
                    color: self
                        .options
                        .fill
                        .clone()
                        .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
                    at: self.anchor(geometry)?,
                }
            }
        };
        Ok(kind)
    }
}

impl From<&ElementKind> for LayoutRecord {
    fn from(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Player {
                player_id,
                team,
                at,
                rotation,
            } => {
                let mut record = Self::empty(RecordType::Player).at(*at);
                record.rotation = *rotation;
                record.team = Some(*team);
                record.player_id = Some(*player_id);
                record
            }
            ElementKind::Prop { prop, at, rotation } => {
                let mut record = Self::empty(RecordType::from(*prop)).at(*at);
                record.rotation = *rotation;
                record
            }
            ElementKind::Arrow { start, end, style } => {
                let mut record = Self::empty(RecordType::Arrow);
                record.rel_coords = Some([start.x, start.y, end.x, end.y]);
                record.options = StyleOptions {
                    fill: Some(style.color.clone()),
                    width: Some(style.width_px),
                    dash: Some(Dash::Flag(style.dashed)),
                };
                record
            }
            ElementKind::Text { content, color, at } => {
                let mut record = Self::empty(RecordType::Text).at(*at);
                record.text = Some(content.clone());
                record.options.fill = Some(color.clone());
                record
            }
        }
    }
}

impl From<&Element> for LayoutRecord {
    fn from(element: &Element) -> Self {
        Self::from(&element.kind)
    }
}

/// Result of leniently decoding a stored layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedLayout {
    /// Records that parsed.
    pub records: Vec<LayoutRecord>,
    /// Entries that could not be parsed.
    pub skipped: usize,
}

/// Decode a JSON layout, skipping entries that do not parse.
///
/// A document that is not a JSON array yields no records and counts as one
/// skipped entry.
#[must_use]
pub fn decode_layout(json: &str) -> DecodedLayout {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(value) => decode_layout_value(value),
        Err(e) => {
            tracing::warn!("Layout is not valid JSON: {e}");
            DecodedLayout {
                records: Vec::new(),
                skipped: 1,
            }
        }
    }
}

/// Decode an already-parsed JSON layout, skipping entries that do not parse.
#[must_use]
pub fn decode_layout_value(value: serde_json::Value) -> DecodedLayout {
    let serde_json::Value::Array(items) = value else {
        tracing::warn!("Layout is not a JSON array");
        return DecodedLayout {
            records: Vec::new(),
            skipped: 1,
        };
    };

    let mut decoded = DecodedLayout::default();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<LayoutRecord>(item) {
            Ok(record) => decoded.records.push(record),
            Err(e) => {
                tracing::warn!("Skipping layout entry {index}: {e}");
                decoded.skipped += 1;
            }
        }
    }
    decoded
}

/// Encode records as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_layout(records: &[LayoutRecord]) -> TacticsResult<String> {
    serde_json::to_string(records).map_err(TacticsError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> FieldGeometry {
        FieldGeometry::compute(800.0, 600.0)
    }

    #[test]
    fn test_player_record_wire_format() {
        let kind = ElementKind::Player {
            player_id: 7,
            team: Team::Own,
            at: NormPoint::new(0.5, 0.25),
            rotation: Rotation::from_degrees(90),
        };
        let value = serde_json::to_value(LayoutRecord::from(&kind)).expect("serialize");
        assert_eq!(value["type"], "player");
        assert_eq!(value["relX"], 0.5);
        assert_eq!(value["relY"], 0.25);
        assert_eq!(value["rotation"], 90);
        assert_eq!(value["team"], "own");
        assert_eq!(value["playerId"], 7);
        assert!(value.get("options").is_none());
        assert!(value.get("x").is_none());
    }

    #[test]
    fn test_arrow_record_wire_format() {
        let kind = ElementKind::Arrow {
            start: NormPoint::new(0.1, 0.2),
            end: NormPoint::new(0.3, 0.4),
            style: StrokeStyle {
                color: "#ff0000".to_string(),
                width_px: 5,
                dashed: true,
            },
        };
        let value = serde_json::to_value(LayoutRecord::from(&kind)).expect("serialize");
        assert_eq!(value["type"], "arrow");
        assert_eq!(value["relCoords"], serde_json::json!([0.1, 0.2, 0.3, 0.4]));
        assert_eq!(value["options"]["fill"], "#ff0000");
        assert_eq!(value["options"]["width"], 5);
        assert_eq!(value["options"]["dash"], true);
        assert!(value.get("rotation").is_none());
    }

    #[test]
    fn test_record_round_trip_all_kinds() {
        let kinds = vec![
            ElementKind::Player {
                player_id: 3,
                team: Team::Opponent,
                at: NormPoint::new(0.1, 0.9),
                rotation: Rotation::from_degrees(270),
            },
            ElementKind::Prop {
                prop: Prop::Goal,
                at: NormPoint::new(0.0, 0.5),
                rotation: Rotation::from_degrees(90),
            },
            ElementKind::Prop {
                prop: Prop::Ball,
                at: NormPoint::new(0.5, 0.5),
                rotation: Rotation::ZERO,
            },
            ElementKind::Text {
                content: "Presión alta".to_string(),
                color: "red".to_string(),
                at: NormPoint::new(0.3, 0.3),
            },
            ElementKind::Arrow {
                start: NormPoint::new(0.25, 0.75),
                end: NormPoint::new(0.625, 0.5),
                style: StrokeStyle {
                    color: "#0000ff".to_string(),
                    width_px: 7,
                    dashed: true,
                },
            },
        ];
        let records: Vec<LayoutRecord> = kinds.iter().map(LayoutRecord::from).collect();
        let json = encode_layout(&records).expect("encode");
        let decoded = decode_layout(&json);
        assert_eq!(decoded.skipped, 0);
        let back: Vec<ElementKind> = decoded
            .records
            .iter()
            .map(|r| r.to_kind(&geometry()).expect("valid"))
            .collect();
        assert_eq!(back, kinds);
    }

    #[test]
    fn test_legacy_snake_case_keys() {
        let json = r#"[
            {"type": "player", "rel_x": 0.2, "rel_y": 0.4, "player_id": 11, "team": "opponent", "rotation": 180},
            {"type": "arrow", "rel_coords": [0, 0, 1, 1], "options": {"arrow": "last", "fill": "blue", "width": 4.0, "dash": [5, 3]}}
        ]"#;
        let decoded = decode_layout(json);
        assert_eq!(decoded.skipped, 0);
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.records[0].player_ref(), Some(11));

        let arrow = decoded.records[1].to_kind(&geometry()).expect("arrow");
        let ElementKind::Arrow { style, .. } = arrow else {
            panic!("expected arrow");
        };
        assert_eq!(style.color, "blue");
        assert_eq!(style.width_px, 4);
        assert!(style.dashed);
    }

    #[test]
    fn test_legacy_absolute_position() {
        let g = geometry();
        let json = r#"[{"type": "cono", "x": 400, "y": 300}]"#;
        let decoded = decode_layout(json);
        let kind = decoded.records[0].to_kind(&g).expect("cone");
        let ElementKind::Prop { at, .. } = kind else {
            panic!("expected prop");
        };
        let (px, py) = g.to_absolute(at);
        assert!((px - 400.0).abs() < 1e-9 && (py - 300.0).abs() < 1e-9);

        let not_ready = decoded.records[0].to_kind(&FieldGeometry::EMPTY);
        assert!(matches!(not_ready, Err(TacticsError::GeometryNotReady)));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let json = r#"[
            {"type": "ball", "relX": 0.5, "relY": 0.5},
            {"type": "trampoline", "relX": 0.5, "relY": 0.5},
            {"type": "player", "relX": 0.5, "relY": 0.5, "playerId": "nine", "team": "own"},
            42,
            {"type": "cono", "relX": 0.1, "relY": 0.1}
        ]"#;
        let decoded = decode_layout(json);
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.skipped, 3);
    }

    #[test]
    fn test_non_array_document() {
        assert_eq!(decode_layout("{\"type\": \"ball\"}").skipped, 1);
        assert_eq!(decode_layout("not json").skipped, 1);
        assert!(decode_layout("[]").records.is_empty());
    }

    #[test]
    fn test_structural_problems_surface_on_conversion() {
        let g = geometry();
        let no_team = decode_layout(r#"[{"type": "player", "relX": 0.5, "relY": 0.5, "playerId": 1}]"#);
        assert!(matches!(
            no_team.records[0].to_kind(&g),
            Err(TacticsError::MalformedRecord(_))
        ));
        let no_coords = decode_layout(r#"[{"type": "arrow"}]"#);
        assert!(matches!(
            no_coords.records[0].to_kind(&g),
            Err(TacticsError::MalformedRecord(_))
        ));
        let no_position = decode_layout(r#"[{"type": "text", "text": "hi"}]"#);
        assert!(no_position.records[0].to_kind(&g).is_err());
    }

    #[test]
    fn test_text_defaults_to_white() {
        let decoded = decode_layout(r#"[{"type": "text", "relX": 0.5, "relY": 0.5, "text": "A"}]"#);
        let ElementKind::Text { color, .. } = decoded.records[0].to_kind(&geometry()).expect("text")
        else {
            panic!("expected text");
        };
        assert_eq!(color, DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn test_ball_rotation_is_dropped() {
        let decoded = decode_layout(r#"[{"type": "ball", "relX": 0.5, "relY": 0.5, "rotation": 90}]"#);
        let kind = decoded.records[0].to_kind(&geometry()).expect("ball");
        assert!(matches!(
            kind,
            ElementKind::Prop {
                rotation: Rotation::ZERO,
                ..
            }
        ));
    }
}
