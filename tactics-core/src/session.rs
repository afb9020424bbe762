//! Editing session: the active tool, its options, and pointer handling.

use serde::{Deserialize, Serialize};

use crate::board::{Board, LoadReport, Placement};
use crate::element::{ElementId, PlayerId, Prop, StrokeStyle, Team};
use crate::error::{TacticsError, TacticsResult};
use crate::players::{PlayerCard, PlayerDirectory};

/// Narrowest arrow stroke.
pub const MIN_LINE_WIDTH: u32 = 1;
/// Widest arrow stroke.
pub const MAX_LINE_WIDTH: u32 = 10;

/// What a press on the board does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Select and drag elements.
    #[default]
    Move,
    /// Place one of our players.
    PlayerOwn,
    /// Place an opponent.
    PlayerOpponent,
    /// Place a cone.
    Cone,
    /// Place a goal.
    Goal,
    /// Place a ball.
    Ball,
    /// Draw an arrow by press and release.
    Arrow,
    /// Place a text label.
    Text,
    /// Turn the element under the pointer.
    Rotate,
    /// Remove the element under the pointer.
    Delete,
}

impl Tool {
    fn prop(self) -> Option<Prop> {
        match self {
            Self::Cone => Some(Prop::Cone),
            Self::Goal => Some(Prop::Goal),
            Self::Ball => Some(Prop::Ball),
            _ => None,
        }
    }

    fn team(self) -> Option<Team> {
        match self {
            Self::PlayerOwn => Some(Team::Own),
            Self::PlayerOpponent => Some(Team::Opponent),
            _ => None,
        }
    }
}

/// Arrow line style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    /// Continuous line.
    #[default]
    Solid,
    /// Dashed line.
    Dashed,
}

/// Tool options chosen in the editor toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Active tool.
    pub tool: Tool,
    /// Colour for arrows and text.
    pub color: String,
    /// Arrow width in pixels.
    pub width_px: u32,
    /// Arrow line style.
    pub line_style: LineStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tool: Tool::Move,
            color: "yellow".to_string(),
            width_px: 3,
            line_style: LineStyle::Solid,
        }
    }
}

impl SessionConfig {
    /// Set the arrow width, clamped to the supported range.
    pub fn set_width(&mut self, width_px: u32) {
        self.width_px = width_px.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH);
    }

    /// Stroke for the next arrow.
    #[must_use]
    pub fn stroke(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color.clone(),
            width_px: self.width_px.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH),
            dashed: self.line_style == LineStyle::Dashed,
        }
    }
}

/// Result of a press on the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressOutcome {
    /// Nothing under the pointer, or nothing to do.
    Nothing,
    /// A prop was placed.
    Placed(ElementId),
    /// An element was selected and a drag started.
    Selected(ElementId),
    /// An element was turned.
    Rotated(ElementId),
    /// An element was removed.
    Deleted(ElementId),
    /// An arrow gesture started; it completes on release.
    ArrowStarted,
    /// The host should pick a player and call [`EditorSession::place_player`].
    PlayerRequested {
        /// Side of the player to pick.
        team: Team,
        /// Press position.
        px: f64,
        /// Press position.
        py: f64,
    },
    /// The host should ask for text and call [`EditorSession::place_text`].
    TextRequested {
        /// Press position.
        px: f64,
        /// Press position.
        py: f64,
    },
    /// The surface has no field yet; retry once it is laid out.
    Deferred,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    id: ElementId,
    last: (f64, f64),
}

/// One user's editing session over a board.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    board: Board,
    config: SessionConfig,
    drag: Option<Drag>,
    pointer: Option<(f64, f64)>,
    /// Whether the board changed since the last save or load.
    has_unsaved_changes: bool,
}

impl EditorSession {
    /// Start a session on an empty board of the given surface size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_board(Board::new(width, height))
    }

    /// Start a session on an existing board.
    #[must_use]
    pub fn with_board(board: Board) -> Self {
        Self {
            board,
            config: SessionConfig::default(),
            drag: None,
            pointer: None,
            has_unsaved_changes: false,
        }
    }

    /// The board being edited.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the board. Marks the session as changed.
    pub fn board_mut(&mut self) -> &mut Board {
        self.has_unsaved_changes = true;
        &mut self.board
    }

    /// Current tool options.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Switch tools. Any selection or gesture in progress is dropped.
    pub fn set_tool(&mut self, tool: Tool) {
        self.config.tool = tool;
        self.board.clear_selection();
        self.board.cancel_arrow();
        self.drag = None;
        self.pointer = None;
    }

    /// Set the colour for new arrows and text.
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.config.color = color.into();
    }

    /// Set the width for new arrows.
    pub fn set_width(&mut self, width_px: u32) {
        self.config.set_width(width_px);
    }

    /// Set the line style for new arrows.
    pub fn set_line_style(&mut self, line_style: LineStyle) {
        self.config.line_style = line_style;
    }

    /// Whether the board changed since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Record that the board has been persisted.
    pub fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    /// Pointer pressed at surface pixels `(px, py)`.
    pub fn press(&mut self, px: f64, py: f64, directory: &dyn PlayerDirectory) -> PressOutcome {
        let tool = self.config.tool;

        if let Some(prop) = tool.prop() {
            return match self.board.place(Placement::Prop(prop), px, py, directory) {
                Ok(id) => {
                    self.has_unsaved_changes = true;
                    PressOutcome::Placed(id)
                }
                Err(e) => {
                    tracing::debug!("Placement deferred: {e}");
                    PressOutcome::from(e)
                }
            };
        }

        if let Some(team) = tool.team() {
            return if self.board.geometry().is_ready() {
                PressOutcome::PlayerRequested { team, px, py }
            } else {
                PressOutcome::Deferred
            };
        }

        match tool {
            Tool::Move => match self.board.hit_test(px, py) {
                Some(id) => match self.board.select(id) {
                    Ok(()) => {
                        self.drag = Some(Drag { id, last: (px, py) });
                        PressOutcome::Selected(id)
                    }
                    Err(e) => {
                        tracing::warn!("Cannot select {id}: {e}");
                        PressOutcome::Nothing
                    }
                },
                None => {
                    self.board.clear_selection();
                    PressOutcome::Nothing
                }
            },
            Tool::Rotate => match self.board.hit_test(px, py) {
                Some(id) if self.board.rotate_element(id) => {
                    self.has_unsaved_changes = true;
                    PressOutcome::Rotated(id)
                }
                _ => PressOutcome::Nothing,
            },
            Tool::Delete => match self.board.hit_test(px, py) {
                Some(id) => {
                    self.board.delete_element(id);
                    self.has_unsaved_changes = true;
                    PressOutcome::Deleted(id)
                }
                None => PressOutcome::Nothing,
            },
            Tool::Arrow => {
                self.board.start_arrow(px, py);
                self.pointer = Some((px, py));
                PressOutcome::ArrowStarted
            }
            Tool::Text => {
                if self.board.geometry().is_ready() {
                    PressOutcome::TextRequested { px, py }
                } else {
                    PressOutcome::Deferred
                }
            }
            Tool::PlayerOwn | Tool::PlayerOpponent | Tool::Cone | Tool::Goal | Tool::Ball => {
                PressOutcome::Nothing
            }
        }
    }

    /// Pointer moved with the button held.
    ///
    /// Returns `true` if an element moved.
    pub fn drag(&mut self, px: f64, py: f64) -> bool {
        if self.board.pending_arrow().is_some() {
            self.pointer = Some((px, py));
            return false;
        }

        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let (dx, dy) = (px - drag.last.0, py - drag.last.1);
        match self.board.translate_element(drag.id, dx, dy) {
            Ok(()) => {
                drag.last = (px, py);
                self.has_unsaved_changes = true;
                true
            }
            Err(e) => {
                tracing::debug!("Drag ignored: {e}");
                if !e.is_transient() {
                    self.drag = None;
                }
                false
            }
        }
    }

    /// Pointer released.
    ///
    /// Returns the arrow committed by the release, or the element whose
    /// drag ended.
    pub fn release(&mut self, px: f64, py: f64) -> Option<ElementId> {
        self.pointer = None;
        if self.board.pending_arrow().is_some() {
            let id = self.board.finish_arrow(px, py, self.config.stroke());
            if id.is_some() {
                self.has_unsaved_changes = true;
            }
            return id;
        }
        self.drag.take().map(|drag| drag.id)
    }

    /// Rubber band of the arrow gesture in progress, as press and current
    /// pointer positions.
    #[must_use]
    pub fn arrow_preview(&self) -> Option<((f64, f64), (f64, f64))> {
        Some((self.board.pending_arrow()?, self.pointer?))
    }

    /// Complete a [`PressOutcome::PlayerRequested`].
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::MissingReference`] for an unknown player, or
    /// [`TacticsError::GeometryNotReady`].
    pub fn place_player(
        &mut self,
        player_id: PlayerId,
        team: Team,
        px: f64,
        py: f64,
        directory: &dyn PlayerDirectory,
    ) -> TacticsResult<ElementId> {
        let id = self
            .board
            .place(Placement::Player { player_id, team }, px, py, directory)?;
        self.has_unsaved_changes = true;
        Ok(id)
    }

    /// Complete a [`PressOutcome::TextRequested`] using the session colour.
    ///
    /// Blank text places nothing and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::GeometryNotReady`].
    pub fn place_text(
        &mut self,
        content: &str,
        px: f64,
        py: f64,
    ) -> TacticsResult<Option<ElementId>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        let placement = Placement::Text {
            content: content.to_string(),
            color: self.config.color.clone(),
        };
        let id = self.board.place(placement, px, py, &NoPlayers)?;
        self.has_unsaved_changes = true;
        Ok(Some(id))
    }

    /// Replace the board from a JSON layout and reset the change flag.
    pub fn load_json(&mut self, json: &str, directory: &dyn PlayerDirectory) -> LoadReport {
        self.drag = None;
        self.pointer = None;
        let report = self.board.load_json(json, directory);
        self.has_unsaved_changes = false;
        report
    }

    /// Remove everything from the board.
    pub fn clear(&mut self) {
        self.drag = None;
        self.pointer = None;
        if !self.board.is_empty() {
            self.has_unsaved_changes = true;
        }
        self.board.clear();
    }
}

/// Directory for placements that never reference players.
struct NoPlayers;

impl PlayerDirectory for NoPlayers {
    fn lookup(&self, _id: PlayerId) -> Option<PlayerCard> {
        None
    }
}

impl From<TacticsError> for PressOutcome {
    fn from(e: TacticsError) -> Self {
        if e.is_transient() {
            Self::Deferred
        } else {
            Self::Nothing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind, Rotation};
    use crate::players::InMemoryDirectory;

    fn squad() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_player(7, Some(7), "Winger")
            .with_player(9, Some(9), "Striker")
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.tool, Tool::Move);
        assert_eq!(config.color, "yellow");
        assert_eq!(config.width_px, 3);
        assert_eq!(config.line_style, LineStyle::Solid);
    }

    #[test]
    fn test_width_is_clamped() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_width(0);
        assert_eq!(session.config().width_px, MIN_LINE_WIDTH);
        session.set_width(42);
        assert_eq!(session.config().width_px, MAX_LINE_WIDTH);
    }

    #[test]
    fn test_prop_tool_places_on_press() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Cone);
        let outcome = session.press(400.0, 300.0, &squad());
        assert!(matches!(outcome, PressOutcome::Placed(_)));
        assert_eq!(session.board().element_count(), 1);
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_prop_tool_deferred_without_geometry() {
        let mut session = EditorSession::new(0.0, 0.0);
        session.set_tool(Tool::Goal);
        assert_eq!(session.press(10.0, 10.0, &squad()), PressOutcome::Deferred);
        assert!(session.board().is_empty());
    }

    #[test]
    fn test_player_tool_requests_player() {
        let dir = squad();
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::PlayerOpponent);
        let outcome = session.press(200.0, 250.0, &dir);
        let PressOutcome::PlayerRequested { team, px, py } = outcome else {
            panic!("expected a player request, got {outcome:?}");
        };
        assert_eq!(team, Team::Opponent);

        let id = session
            .place_player(9, team, px, py, &dir)
            .expect("should place");
        let element = session.board().get_element(id).expect("exists");
        assert!(matches!(
            element.kind,
            ElementKind::Player {
                player_id: 9,
                team: Team::Opponent,
                ..
            }
        ));

        assert!(matches!(
            session.place_player(3, team, px, py, &dir),
            Err(TacticsError::MissingReference(_))
        ));
    }

    #[test]
    fn test_text_tool_uses_session_color() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Text);
        session.set_color("red");
        let PressOutcome::TextRequested { px, py } = session.press(100.0, 100.0, &squad()) else {
            panic!("expected a text request");
        };
        assert_eq!(session.place_text("   ", px, py).expect("ok"), None);
        let id = session
            .place_text(" Press here ", px, py)
            .expect("ok")
            .expect("placed");
        let element = session.board().get_element(id).expect("exists");
        let ElementKind::Text { content, color, .. } = &element.kind else {
            panic!("expected text");
        };
        assert_eq!(content, "Press here");
        assert_eq!(color, "red");
    }

    #[test]
    fn test_move_tool_drags_element() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Ball);
        let PressOutcome::Placed(id) = session.press(400.0, 300.0, &squad()) else {
            panic!("expected placement");
        };

        session.set_tool(Tool::Move);
        assert_eq!(session.press(402.0, 301.0, &squad()), PressOutcome::Selected(id));
        assert_eq!(session.board().selected(), Some(id));
        assert!(session.drag(440.0, 301.0));
        assert!(session.drag(478.0, 301.0));
        assert_eq!(session.release(478.0, 301.0), Some(id));
        assert!(!session.drag(500.0, 301.0));

        let at = session.board().get_element(id).map(Element::anchor).expect("exists");
        assert!((at.x - 0.6).abs() < 1e-9);
        assert!((at.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_move_tool_on_empty_space_clears_selection() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Cone);
        let PressOutcome::Placed(id) = session.press(400.0, 300.0, &squad()) else {
            panic!("expected placement");
        };
        session.set_tool(Tool::Move);
        session.press(400.0, 300.0, &squad());
        assert_eq!(session.board().selected(), Some(id));
        assert_eq!(session.press(20.0, 20.0, &squad()), PressOutcome::Nothing);
        assert_eq!(session.board().selected(), None);
    }

    #[test]
    fn test_rotate_and_delete_tools() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Goal);
        let PressOutcome::Placed(id) = session.press(400.0, 300.0, &squad()) else {
            panic!("expected placement");
        };

        session.set_tool(Tool::Rotate);
        assert_eq!(session.press(400.0, 300.0, &squad()), PressOutcome::Rotated(id));
        assert_eq!(
            session.board().get_element(id).and_then(Element::rotation),
            Some(Rotation::from_degrees(90))
        );
        assert_eq!(session.press(10.0, 10.0, &squad()), PressOutcome::Nothing);

        session.set_tool(Tool::Delete);
        assert_eq!(session.press(400.0, 300.0, &squad()), PressOutcome::Deleted(id));
        assert!(session.board().is_empty());
        assert_eq!(session.press(400.0, 300.0, &squad()), PressOutcome::Nothing);
    }

    #[test]
    fn test_arrow_tool_gesture() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Arrow);
        session.set_color("#ff0000");
        session.set_width(5);
        session.set_line_style(LineStyle::Dashed);

        assert_eq!(session.press(100.0, 100.0, &squad()), PressOutcome::ArrowStarted);
        assert!(!session.drag(150.0, 120.0));
        assert_eq!(
            session.arrow_preview(),
            Some(((100.0, 100.0), (150.0, 120.0)))
        );

        let id = session.release(200.0, 150.0).expect("committed");
        assert_eq!(session.arrow_preview(), None);
        let element = session.board().get_element(id).expect("exists");
        let ElementKind::Arrow { style, .. } = &element.kind else {
            panic!("expected arrow");
        };
        assert_eq!(
            *style,
            StrokeStyle {
                color: "#ff0000".to_string(),
                width_px: 5,
                dashed: true,
            }
        );
    }

    #[test]
    fn test_switching_tool_cancels_arrow() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Arrow);
        session.press(100.0, 100.0, &squad());
        session.set_tool(Tool::Move);
        assert_eq!(session.release(300.0, 300.0), None);
        assert!(session.board().is_empty());
    }

    #[test]
    fn test_load_resets_change_flag() {
        let mut session = EditorSession::new(800.0, 600.0);
        session.set_tool(Tool::Cone);
        session.press(400.0, 300.0, &squad());
        let json = session.board().to_json().expect("serialize");
        assert!(session.has_unsaved_changes());

        session.clear();
        let report = session.load_json(&json, &squad());
        assert_eq!(report.loaded, 1);
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_press_outcome_from_error() {
        assert_eq!(
            PressOutcome::from(TacticsError::GeometryNotReady),
            PressOutcome::Deferred
        );
        assert_eq!(
            PressOutcome::from(TacticsError::ElementNotFound("x".to_string())),
            PressOutcome::Nothing
        );
    }
}
