//! Formations: named sets of guide points for the call-up board.
//!
//! Unlike board elements, formation points are normalized to the whole
//! surface rather than to the field rectangle.

use serde::{Deserialize, Serialize};

use crate::error::TacticsResult;
use crate::geometry::NormPoint;
use crate::store::{valid_name, StoreError};

/// Most points a formation can hold.
pub const MAX_POSITIONS: usize = 11;

/// A press this close to an existing point removes it.
pub const REMOVE_RADIUS_PX: f64 = 10.0;

/// Radius of a guide circle drawn on the board.
pub const GUIDE_RADIUS_PX: f64 = 15.0;

/// Surface size assumed when the board has not been laid out yet.
pub const FALLBACK_SURFACE: (f64, f64) = (450.0, 650.0);

/// What [`Formation::toggle_point`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// A point was appended.
    Added,
    /// The point at this index was removed.
    Removed(usize),
    /// Already at [`MAX_POSITIONS`]; nothing changed.
    Full,
    /// The surface has no size; nothing changed.
    Ignored,
}

/// A named set of up to eleven guide points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    /// Unique name.
    pub name: String,
    /// Surface-relative points as `[x, y]` pairs.
    positions: Vec<(f64, f64)>,
}

impl Formation {
    /// Create an empty formation.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positions: Vec::new(),
        }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the formation has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The points in the order they were added.
    pub fn points(&self) -> impl Iterator<Item = NormPoint> + '_ {
        self.positions.iter().map(|&(x, y)| NormPoint::new(x, y))
    }

    /// Remove every point.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Handle a click at `(px, py)` on a `width` x `height` editor surface.
    ///
    /// A click within [`REMOVE_RADIUS_PX`] of an existing point removes the
    /// first such point; otherwise a point is added if there is room.
    pub fn toggle_point(&mut self, px: f64, py: f64, width: f64, height: f64) -> Toggle {
        if !(width >= 1.0 && height >= 1.0) {
            return Toggle::Ignored;
        }

        let hit = self.positions.iter().position(|&(x, y)| {
            (px - x * width).hypot(py - y * height) < REMOVE_RADIUS_PX
        });
        if let Some(index) = hit {
            self.positions.remove(index);
            return Toggle::Removed(index);
        }

        if self.positions.len() >= MAX_POSITIONS {
            return Toggle::Full;
        }
        self.positions.push((px / width, py / height));
        Toggle::Added
    }

    /// Guide circle centres for a `width` x `height` surface.
    ///
    /// Zero sizes fall back to [`FALLBACK_SURFACE`].
    #[must_use]
    pub fn guides(&self, width: f64, height: f64) -> Vec<(f64, f64)> {
        let width = if width >= 1.0 { width } else { FALLBACK_SURFACE.0 };
        let height = if height >= 1.0 { height } else { FALLBACK_SURFACE.1 };
        self.positions
            .iter()
            .map(|&(x, y)| (x * width, y * height))
            .collect()
    }
}

/// A collection of formations with unique names, kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormationBook {
    formations: Vec<Formation>,
}

impl FormationBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of formations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formations.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formations.is_empty()
    }

    /// Formations ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Formation> {
        self.formations.iter()
    }

    /// Look up a formation by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Formation> {
        self.formations.iter().find(|f| f.name == name.trim())
    }

    /// Add a new formation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] for a blank name or
    /// [`StoreError::Conflict`] if the name is taken.
    pub fn insert(&mut self, mut formation: Formation) -> Result<(), StoreError> {
        formation.name = valid_name(&formation.name)?;
        if self.get(&formation.name).is_some() {
            return Err(StoreError::Conflict(formation.name));
        }
        self.formations.push(formation);
        self.sort();
        Ok(())
    }

    /// Replace the formation called `name`, possibly under a new name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `name` does not exist,
    /// [`StoreError::InvalidName`] for a blank new name, or
    /// [`StoreError::Conflict`] if the new name belongs to another formation.
    pub fn update(&mut self, name: &str, mut formation: Formation) -> Result<(), StoreError> {
        formation.name = valid_name(&formation.name)?;
        let index = self
            .formations
            .iter()
            .position(|f| f.name == name.trim())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        if self
            .formations
            .iter()
            .enumerate()
            .any(|(i, f)| i != index && f.name == formation.name)
        {
            return Err(StoreError::Conflict(formation.name));
        }
        self.formations[index] = formation;
        self.sort();
        Ok(())
    }

    /// Remove a formation by name.
    pub fn remove(&mut self, name: &str) -> Option<Formation> {
        let index = self.formations.iter().position(|f| f.name == name.trim())?;
        Some(self.formations.remove(index))
    }

    /// Parse a book from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an array of formations.
    pub fn from_json(json: &str) -> TacticsResult<Self> {
        let mut book: Self = serde_json::from_str(json)?;
        book.formations.retain(|f| !f.name.trim().is_empty());
        book.formations
            .iter_mut()
            .for_each(|f| f.positions.truncate(MAX_POSITIONS));
        book.sort();
        book.formations.dedup_by(|a, b| a.name == b.name);
        Ok(book)
    }

    /// Serialize the book to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> TacticsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn sort(&mut self) {
        self.formations.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut formation = Formation::new("4-4-2");
        assert_eq!(formation.toggle_point(100.0, 200.0, 400.0, 600.0), Toggle::Added);
        let first = formation.points().next().expect("one point");
        assert!((first.x - 0.25).abs() < 1e-12);
        assert!((first.y - 1.0 / 3.0).abs() < 1e-12);

        // 9px away removes, 10px away adds.
        assert_eq!(formation.toggle_point(109.0, 200.0, 400.0, 600.0), Toggle::Removed(0));
        assert!(formation.is_empty());
        formation.toggle_point(100.0, 200.0, 400.0, 600.0);
        assert_eq!(formation.toggle_point(110.0, 200.0, 400.0, 600.0), Toggle::Added);
        assert_eq!(formation.len(), 2);
    }

    #[test]
    fn test_toggle_caps_at_eleven() {
        let mut formation = Formation::new("full");
        for i in 0..11_u32 {
            let x = 20.0 + 30.0 * f64::from(i);
            assert_eq!(formation.toggle_point(x, 100.0, 400.0, 600.0), Toggle::Added);
        }
        assert_eq!(formation.toggle_point(200.0, 500.0, 400.0, 600.0), Toggle::Full);
        assert_eq!(formation.len(), MAX_POSITIONS);
        // Removing still works when full.
        assert_eq!(formation.toggle_point(20.0, 100.0, 400.0, 600.0), Toggle::Removed(0));
    }

    #[test]
    fn test_toggle_ignored_without_surface() {
        let mut formation = Formation::new("x");
        assert_eq!(formation.toggle_point(1.0, 1.0, 0.0, 600.0), Toggle::Ignored);
        assert!(formation.is_empty());
    }

    #[test]
    fn test_guides_scale_to_surface() {
        let mut formation = Formation::new("x");
        formation.toggle_point(200.0, 300.0, 400.0, 600.0);
        assert_eq!(formation.guides(800.0, 1200.0), vec![(400.0, 600.0)]);
        assert_eq!(formation.guides(0.0, 0.0), vec![(225.0, 325.0)]);
    }

    #[test]
    fn test_book_unique_names() {
        let mut book = FormationBook::new();
        book.insert(Formation::new("4-4-2")).expect("insert");
        book.insert(Formation::new(" 3-5-2 ")).expect("insert");
        assert!(matches!(
            book.insert(Formation::new("4-4-2")),
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            book.insert(Formation::new("  ")),
            Err(StoreError::InvalidName(_))
        ));
        let names: Vec<_> = book.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["3-5-2", "4-4-2"]);
    }

    #[test]
    fn test_book_update_and_remove() {
        let mut book = FormationBook::new();
        book.insert(Formation::new("A")).expect("insert");
        book.insert(Formation::new("B")).expect("insert");

        assert!(matches!(
            book.update("A", Formation::new("B")),
            Err(StoreError::Conflict(_))
        ));
        let mut renamed = Formation::new("C");
        renamed.toggle_point(10.0, 10.0, 100.0, 100.0);
        book.update("A", renamed).expect("update");
        assert!(book.get("A").is_none());
        assert_eq!(book.get("C").map(Formation::len), Some(1));

        assert!(book.remove("B").is_some());
        assert!(book.remove("B").is_none());
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_book_json() {
        let json = r#"[
            {"name": "4-3-3", "positions": [[0.5, 0.9], [0.2, 0.7]]},
            {"name": "4-3-3", "positions": []},
            {"name": "", "positions": []}
        ]"#;
        let book = FormationBook::from_json(json).expect("parse");
        assert_eq!(book.len(), 1);
        let formation = book.get("4-3-3").expect("present");
        assert_eq!(formation.len(), 2);

        let again = FormationBook::from_json(&book.to_json().expect("serialize")).expect("parse");
        assert_eq!(again, book);
    }
}
