//! The board: an ordered arena of elements for one editing session.

use std::collections::HashMap;

use crate::element::{Element, ElementId, ElementKind, PlayerId, Prop, Rotation, StrokeStyle, Team};
use crate::error::{TacticsError, TacticsResult};
use crate::geometry::FieldGeometry;
use crate::players::PlayerDirectory;
use crate::schema::{decode_layout, encode_layout, LayoutRecord};

/// Radius around an element's centre that still selects it when the
/// pointer is not on the element itself.
pub const HIT_TOLERANCE_PX: f64 = 10.0;

/// Arrows shorter than this on release are discarded.
pub const MIN_ARROW_LENGTH_PX: f64 = 1.0;

/// What to put on the board at a pointer position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// A player marker.
    Player {
        /// Directory reference.
        player_id: PlayerId,
        /// Side.
        team: Team,
    },
    /// A cone, goal or ball.
    Prop(Prop),
    /// A text label.
    Text {
        /// Label text.
        content: String,
        /// Colour name or hex code.
        color: String,
    },
}

/// Outcome of replacing the board with stored records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Elements now on the board.
    pub loaded: usize,
    /// Player records whose id did not resolve.
    pub missing_players: usize,
    /// Records that could not be parsed or converted.
    pub malformed: usize,
}

impl LoadReport {
    /// Total number of dropped records.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.missing_players + self.malformed
    }
}

/// All elements of one editing session, in z-order.
#[derive(Debug, Clone)]
pub struct Board {
    /// All elements, indexed by ID.
    elements: HashMap<ElementId, Element>,
    /// Element IDs bottom to top; creation order.
    order: Vec<ElementId>,
    /// Currently highlighted element.
    selected: Option<ElementId>,
    /// Press position of an arrow gesture in progress.
    pending_arrow: Option<(f64, f64)>,
    /// Surface width in pixels.
    surface_width: f64,
    /// Surface height in pixels.
    surface_height: f64,
    geometry: FieldGeometry,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Board {
    /// Create an empty board for a surface of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            elements: HashMap::new(),
            order: Vec::new(),
            selected: None,
            pending_arrow: None,
            surface_width: width,
            surface_height: height,
            geometry: FieldGeometry::compute(width, height),
        }
    }

    /// Resize the surface. Stored positions are unaffected.
    pub fn set_surface(&mut self, width: f64, height: f64) {
        self.surface_width = width;
        self.surface_height = height;
        self.geometry = FieldGeometry::compute(width, height);
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn surface_size(&self) -> (f64, f64) {
        (self.surface_width, self.surface_height)
    }

    /// Field geometry for the current surface.
    #[must_use]
    pub fn geometry(&self) -> FieldGeometry {
        self.geometry
    }

    fn ready_geometry(&self) -> TacticsResult<FieldGeometry> {
        if self.geometry.is_ready() {
            Ok(self.geometry)
        } else {
            Err(TacticsError::GeometryNotReady)
        }
    }

    /// Append an element on top of the others.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = element.id;
        if self.elements.insert(id, element).is_none() {
            self.order.push(id);
        }
        id
    }

    /// Place a new element at surface pixels `(px, py)`.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::GeometryNotReady`] if the surface has no
    /// field yet, or [`TacticsError::MissingReference`] if a player marker
    /// references an unknown player. The board is unchanged on error.
    pub fn place(
        &mut self,
        placement: Placement,
        px: f64,
        py: f64,
        directory: &dyn PlayerDirectory,
    ) -> TacticsResult<ElementId> {
        let at = self
            .ready_geometry()?
            .to_normalized(px, py)
            .ok_or(TacticsError::GeometryNotReady)?;

        let kind = match placement {
            Placement::Player { player_id, team } => {
                if directory.lookup(player_id).is_none() {
                    return Err(TacticsError::MissingReference(format!(
                        "player {player_id}"
                    )));
                }
                ElementKind::Player {
                    player_id,
                    team,
                    at,
                    rotation: Rotation::ZERO,
                }
            }
            Placement::Prop(prop) => ElementKind::Prop {
                prop,
                at,
                rotation: Rotation::ZERO,
            },
            Placement::Text { content, color } => ElementKind::Text { content, color, at },
        };

        let id = self.add_element(Element::new(kind));
        tracing::debug!("Placed element {id} at ({px:.1}, {py:.1})");
        Ok(id)
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get_element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Elements bottom to top.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Get the number of elements on the board.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the board is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Find the element under surface pixels `(px, py)`.
    ///
    /// The topmost element whose rendered shape contains the point wins.
    /// Failing that, the element whose centre is nearest within
    /// [`HIT_TOLERANCE_PX`] wins, with ties going to the most recently added.
    #[must_use]
    pub fn hit_test(&self, px: f64, py: f64) -> Option<ElementId> {
        let geometry = self.ready_geometry().ok()?;

        let topmost_first = || self.order.iter().rev().filter_map(|id| self.elements.get(id));

        if let Some(hit) = topmost_first().find(|e| e.contains_point(px, py, &geometry)) {
            return Some(hit.id);
        }

        let mut nearest: Option<(f64, ElementId)> = None;
        for element in topmost_first() {
            let (cx, cy) = element.center(&geometry);
            let distance = (px - cx).hypot(py - cy);
            if distance <= HIT_TOLERANCE_PX && nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, element.id));
            }
        }
        nearest.map(|(_, id)| id)
    }

    /// Re-anchor an element at surface pixels `(px, py)`.
    ///
    /// Arrows keep their direction and length; their tail moves to the point.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::GeometryNotReady`] (leaving the stored
    /// position untouched) or [`TacticsError::ElementNotFound`].
    pub fn move_element(&mut self, id: ElementId, px: f64, py: f64) -> TacticsResult<()> {
        let target = self
            .ready_geometry()?
            .to_normalized(px, py)
            .ok_or(TacticsError::GeometryNotReady)?;
        let element = self
            .elements
            .get_mut(&id)
            .ok_or_else(|| TacticsError::ElementNotFound(id.to_string()))?;
        let anchor = element.anchor();
        element.translate(target.x - anchor.x, target.y - anchor.y);
        Ok(())
    }

    /// Shift an element by a pixel delta, as during a drag.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::GeometryNotReady`] or
    /// [`TacticsError::ElementNotFound`].
    pub fn translate_element(&mut self, id: ElementId, dx: f64, dy: f64) -> TacticsResult<()> {
        let geometry = self.ready_geometry()?;
        let element = self
            .elements
            .get_mut(&id)
            .ok_or_else(|| TacticsError::ElementNotFound(id.to_string()))?;
        element.translate(dx / geometry.field_w, dy / geometry.field_h);
        Ok(())
    }

    /// Turn an element a quarter turn clockwise.
    ///
    /// Returns `false` when the element does not exist or has no
    /// orientation.
    pub fn rotate_element(&mut self, id: ElementId) -> bool {
        self.elements.get_mut(&id).is_some_and(Element::rotate)
    }

    /// Remove an element. Unknown IDs are ignored.
    pub fn delete_element(&mut self, id: ElementId) -> Option<Element> {
        let removed = self.elements.remove(&id)?;
        self.order.retain(|&eid| eid != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::debug!("Deleted element {id}");
        Some(removed)
    }

    /// Remove every element and the selection.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
        self.selected = None;
        self.pending_arrow = None;
    }

    /// Record the press position of an arrow gesture.
    pub fn start_arrow(&mut self, px: f64, py: f64) {
        self.pending_arrow = Some((px, py));
    }

    /// Press position of the arrow gesture in progress, if any.
    #[must_use]
    pub fn pending_arrow(&self) -> Option<(f64, f64)> {
        self.pending_arrow
    }

    /// Abandon an arrow gesture in progress.
    pub fn cancel_arrow(&mut self) {
        self.pending_arrow = None;
    }

    /// Complete an arrow gesture at the release position.
    ///
    /// The arrow is discarded when no gesture is pending, the field geometry
    /// is not ready, or the arrow would be shorter than
    /// [`MIN_ARROW_LENGTH_PX`].
    pub fn finish_arrow(&mut self, px: f64, py: f64, style: StrokeStyle) -> Option<ElementId> {
        let (sx, sy) = self.pending_arrow.take()?;
        let geometry = self.ready_geometry().ok()?;
        if (px - sx).hypot(py - sy) < MIN_ARROW_LENGTH_PX {
            return None;
        }
        let start = geometry.to_normalized(sx, sy)?;
        let end = geometry.to_normalized(px, py)?;
        let id = self.add_element(Element::new(ElementKind::Arrow { start, end, style }));
        tracing::debug!("Placed arrow {id}");
        Some(id)
    }

    /// Highlight an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn select(&mut self, id: ElementId) -> TacticsResult<()> {
        if self.elements.contains_key(&id) {
            self.selected = Some(id);
            Ok(())
        } else {
            Err(TacticsError::ElementNotFound(id.to_string()))
        }
    }

    /// Currently highlighted element.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Remove the highlight.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Plain-data records for every element, bottom to top.
    #[must_use]
    pub fn to_records(&self) -> Vec<LayoutRecord> {
        self.elements().map(LayoutRecord::from).collect()
    }

    /// Replace the board contents with stored records.
    ///
    /// Player records whose id does not resolve, and records that cannot be
    /// turned into elements, are dropped; the rest are loaded in order.
    pub fn load_records(
        &mut self,
        records: &[LayoutRecord],
        directory: &dyn PlayerDirectory,
    ) -> LoadReport {
        self.clear();
        let mut report = LoadReport::default();

        for record in records {
            if let Some(player_id) = record.player_ref() {
                if directory.lookup(player_id).is_none() {
                    tracing::warn!("Skipping player {player_id}: not in directory");
                    report.missing_players += 1;
                    continue;
                }
            }
            match record.to_kind(&self.geometry) {
                Ok(kind) => {
                    self.add_element(Element::new(kind));
                    report.loaded += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?} record: {e}", record.kind);
                    report.malformed += 1;
                }
            }
        }
        report
    }

    /// Serialize the board as a JSON layout.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> TacticsResult<String> {
        encode_layout(&self.to_records())
    }

    /// Replace the board contents from a JSON layout, best effort.
    pub fn load_json(&mut self, json: &str, directory: &dyn PlayerDirectory) -> LoadReport {
        let decoded = decode_layout(json);
        let mut report = self.load_records(&decoded.records, directory);
        report.malformed += decoded.skipped;
        report
    }
}
