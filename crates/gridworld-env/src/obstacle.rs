//! Rectangular obstacles and segment blocking
//!
//! Corners are `[row, column]` pairs given in the order bottom-left,
//! top-left, top-right, bottom-right. A move is blocked when the segment from
//! its start to its destination crosses a face of an obstacle while the
//! *start* point's transverse coordinate lies within that face's span.
//! Both span checks are inclusive, so grazing a corner counts as blocked.

use serde::{Deserialize, Serialize};

use gridworld_core::{GridState, RLError, Result};

/// Corner list in bottom-left, top-left, top-right, bottom-right order
pub type Corners = [[f64; 2]; 4];

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Corners", into = "Corners")]
pub struct Obstacle {
    bottom: f64,
    top: f64,
    left: f64,
    right: f64,
}

impl Obstacle {
    /// Create an obstacle from its row and column extents
    pub fn new(bottom: f64, top: f64, left: f64, right: f64) -> Result<Self> {
        let finite = [bottom, top, left, right].iter().all(|v| v.is_finite());
        if !finite || bottom > top || left > right {
            return Err(RLError::Config(format!(
                "obstacle rows [{bottom}, {top}] x columns [{left}, {right}] is empty or not finite"
            )));
        }
        Ok(Self { bottom, top, left, right })
    }

    /// Create an obstacle from its four corners
    pub fn from_corners(corners: Corners) -> Result<Self> {
        let [bottom_left, top_left, top_right, bottom_right] = corners;
        let aligned = bottom_left[0] == bottom_right[0]
            && top_left[0] == top_right[0]
            && bottom_left[1] == top_left[1]
            && bottom_right[1] == top_right[1];
        if !aligned {
            return Err(RLError::Config(format!(
                "obstacle corners {corners:?} do not form an axis-aligned rectangle"
            )));
        }
        Self::new(bottom_left[0], top_left[0], bottom_left[1], bottom_right[1])
    }

    /// The four corners, bottom-left first, clockwise
    #[must_use]
    pub fn corners(&self) -> Corners {
        [
            [self.bottom, self.left],
            [self.top, self.left],
            [self.top, self.right],
            [self.bottom, self.right],
        ]
    }

    fn spans_column(&self, column: f64) -> bool {
        column >= self.left && column <= self.right
    }

    fn spans_row(&self, row: f64) -> bool {
        row >= self.bottom && row <= self.top
    }

    /// Whether the segment crosses the bottom face going up or the top face going down
    #[must_use]
    pub fn blocks_vertical(&self, start: &GridState, destination: &GridState) -> bool {
        if !self.spans_column(start.column) {
            return false;
        }
        let through_bottom = start.row < self.bottom && destination.row >= self.bottom;
        let through_top = start.row > self.top && destination.row <= self.top;
        through_bottom || through_top
    }

    /// Whether the segment crosses the left face going east or the right face going west
    #[must_use]
    pub fn blocks_horizontal(&self, start: &GridState, destination: &GridState) -> bool {
        if !self.spans_row(start.row) {
            return false;
        }
        let through_left = start.column < self.left && destination.column >= self.left;
        let through_right = start.column > self.right && destination.column <= self.right;
        through_left || through_right
    }
}

impl TryFrom<Corners> for Obstacle {
    type Error = RLError;

    fn try_from(corners: Corners) -> Result<Self> {
        Self::from_corners(corners)
    }
}

impl From<Obstacle> for Corners {
    fn from(obstacle: Obstacle) -> Self {
        obstacle.corners()
    }
}

/// The obstacles of an environment, split by the crossing they block.
///
/// Usually the same rectangles appear in both sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleMap {
    /// Checked against row-wise crossings
    pub vertical: Vec<Obstacle>,
    /// Checked against column-wise crossings
    pub horizontal: Vec<Obstacle>,
}

impl ObstacleMap {
    /// Use the same rectangles for both crossing directions
    #[must_use]
    pub fn symmetric(obstacles: Vec<Obstacle>) -> Self {
        Self {
            horizontal: obstacles.clone(),
            vertical: obstacles,
        }
    }

    /// Whether any vertical obstacle blocks the segment
    #[must_use]
    pub fn is_blocked_vertically(&self, start: &GridState, destination: &GridState) -> bool {
        self.vertical.iter().any(|o| o.blocks_vertical(start, destination))
    }

    /// Whether any horizontal obstacle blocks the segment
    #[must_use]
    pub fn is_blocked_horizontally(&self, start: &GridState, destination: &GridState) -> bool {
        self.horizontal.iter().any(|o| o.blocks_horizontal(start, destination))
    }

    /// Whether the move is blocked; independent of which action produced it
    #[must_use]
    pub fn is_blocked(&self, start: &GridState, destination: &GridState) -> bool {
        self.is_blocked_vertically(start, destination) || self.is_blocked_horizontally(start, destination)
    }

    /// Whether there are no obstacles at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wall() -> Obstacle {
        // rows 2..4, columns 1.5..2.5
        Obstacle::from_corners([[2.0, 1.5], [4.0, 1.5], [4.0, 2.5], [2.0, 2.5]]).unwrap()
    }

    fn s(row: f64, column: f64) -> GridState {
        GridState::new(row, column)
    }

    #[test]
    fn test_corners_round_trip() {
        let corners = wall().corners();
        assert_eq!(Obstacle::from_corners(corners).unwrap(), wall());
    }

    #[test]
    fn test_skewed_corners_rejected() {
        let skewed = [[2.0, 1.5], [4.0, 1.6], [4.0, 2.5], [2.0, 2.5]];
        assert!(matches!(Obstacle::from_corners(skewed), Err(RLError::Config(_))));
        assert!(Obstacle::new(4.0, 2.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_vertical_crossings() {
        let o = wall();
        // from below through the bottom face
        assert!(o.blocks_vertical(&s(1.0, 2.0), &s(2.0, 2.0)));
        // from above through the top face
        assert!(o.blocks_vertical(&s(5.0, 2.0), &s(4.0, 2.0)));
        // stopping short of the bottom face
        assert!(!o.blocks_vertical(&s(1.0, 2.0), &s(1.9, 2.0)));
        // column outside the span
        assert!(!o.blocks_vertical(&s(1.0, 3.0), &s(5.0, 3.0)));
    }

    #[test]
    fn test_horizontal_crossings() {
        let o = wall();
        assert!(o.blocks_horizontal(&s(3.0, 1.0), &s(3.0, 1.5)));
        assert!(o.blocks_horizontal(&s(3.0, 3.0), &s(3.0, 2.5)));
        assert!(!o.blocks_horizontal(&s(3.0, 0.0), &s(3.0, 1.0)));
        assert!(!o.blocks_horizontal(&s(4.5, 0.0), &s(4.5, 3.0)));
    }

    #[test]
    fn test_corner_graze_is_blocked() {
        let o = wall();
        // start column sits exactly on the left edge
        assert!(o.blocks_vertical(&s(1.0, 1.5), &s(2.5, 1.5)));
        // start row sits exactly on the top edge
        assert!(o.blocks_horizontal(&s(4.0, 0.0), &s(4.0, 2.0)));
    }

    #[test]
    fn test_map_checks_both_sets() {
        let map = ObstacleMap {
            vertical: vec![wall()],
            horizontal: vec![],
        };
        assert!(map.is_blocked(&s(1.0, 2.0), &s(3.0, 2.0)));
        assert!(!map.is_blocked(&s(3.0, 1.0), &s(3.0, 2.0)));

        let map = ObstacleMap::symmetric(vec![wall()]);
        assert!(map.is_blocked(&s(3.0, 1.0), &s(3.0, 2.0)));
        assert!(!ObstacleMap::default().is_blocked(&s(1.0, 2.0), &s(3.0, 2.0)));
    }

    #[test]
    fn test_serde_uses_corner_order() {
        let json = serde_json::to_string(&wall()).unwrap();
        assert_eq!(json, "[[2.0,1.5],[4.0,1.5],[4.0,2.5],[2.0,2.5]]");
        let parsed: Obstacle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, wall());
    }

    proptest! {
        #[test]
        fn prop_full_crossing_blocked_both_ways(
            below in -10.0f64..1.99,
            above in 4.01f64..10.0,
            column in 1.5f64..=2.5,
        ) {
            let map = ObstacleMap::symmetric(vec![wall()]);
            let a = s(below, column);
            let b = s(above, column);
            prop_assert!(map.is_blocked(&a, &b));
            prop_assert!(map.is_blocked(&b, &a));
        }

        #[test]
        fn prop_full_horizontal_crossing_blocked_both_ways(
            left in -10.0f64..1.49,
            right in 2.51f64..10.0,
            row in 2.0f64..=4.0,
        ) {
            let map = ObstacleMap::symmetric(vec![wall()]);
            let a = s(row, left);
            let b = s(row, right);
            prop_assert!(map.is_blocked(&a, &b));
            prop_assert!(map.is_blocked(&b, &a));
        }

        #[test]
        fn prop_moves_outside_span_never_blocked(
            start in -10.0f64..10.0,
            end in -10.0f64..10.0,
            column in 2.51f64..10.0,
        ) {
            let map = ObstacleMap::symmetric(vec![wall()]);
            prop_assert!(!map.is_blocked_vertically(&s(start, column), &s(end, column)));
        }
    }
}
