//! Actions and action spaces

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

use crate::RLError;

/// Trait for actions in an RL environment
pub trait Action: Copy + Debug + Send + Sync {
    /// Integer encoding of the action
    fn index(&self) -> usize;
}

/// Trait for defining action spaces
pub trait ActionSpace: Send + Sync {
    /// The type of actions in this space
    type Action: Action;

    /// Sample an action uniformly at random
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Action;

    /// Check if a raw action id is valid within this space
    fn contains(&self, id: usize) -> bool;

    /// Number of actions in the space
    fn n(&self) -> usize;
}

/// The four compass moves of the gridworld.
///
/// `North` increases the row coordinate, `South` decreases it; `East`
/// increases the column coordinate, `West` decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum GridAction {
    /// row + displacement
    North = 0,
    /// column + displacement
    East = 1,
    /// row - displacement
    South = 2,
    /// column - displacement
    West = 3,
}

impl GridAction {
    /// Number of actions
    pub const COUNT: usize = 4;

    /// All actions ordered by their integer encoding
    pub const ALL: [GridAction; Self::COUNT] = [
        GridAction::North,
        GridAction::East,
        GridAction::South,
        GridAction::West,
    ];

    /// Signed unit displacement along (row, column)
    #[must_use]
    pub fn direction(self) -> (f64, f64) {
        match self {
            Self::North => (1.0, 0.0),
            Self::East => (0.0, 1.0),
            Self::South => (-1.0, 0.0),
            Self::West => (0.0, -1.0),
        }
    }
}

impl Action for GridAction {
    fn index(&self) -> usize {
        *self as usize
    }
}

impl TryFrom<usize> for GridAction {
    type Error = RLError;

    fn try_from(id: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(id)
            .copied()
            .ok_or_else(|| RLError::InvalidAction(format!("action id {id} is not one of 0..{}", Self::COUNT)))
    }
}

impl From<GridAction> for usize {
    fn from(action: GridAction) -> Self {
        action.index()
    }
}

impl fmt::Display for GridAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "NORTH",
            Self::East => "EAST",
            Self::South => "SOUTH",
            Self::West => "WEST",
        };
        f.write_str(name)
    }
}

/// The discrete compass action space
#[derive(Debug, Clone, Copy, Default)]
pub struct CompassSpace;

impl ActionSpace for CompassSpace {
    type Action = GridAction;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Action {
        GridAction::ALL[rng.gen_range(0..GridAction::COUNT)]
    }

    fn contains(&self, id: usize) -> bool {
        id < GridAction::COUNT
    }

    fn n(&self) -> usize {
        GridAction::COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_encoding_round_trips() {
        for (i, action) in GridAction::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(GridAction::try_from(i).unwrap(), *action);
        }
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        let err = GridAction::try_from(4).unwrap_err();
        assert!(matches!(err, RLError::InvalidAction(_)));
        assert!(!CompassSpace.contains(4));
    }

    #[test]
    fn test_opposite_directions_cancel() {
        let (nr, nc) = GridAction::North.direction();
        let (sr, sc) = GridAction::South.direction();
        assert_eq!((nr + sr, nc + sc), (0.0, 0.0));
        let (er, ec) = GridAction::East.direction();
        let (wr, wc) = GridAction::West.direction();
        assert_eq!((er + wr, ec + wc), (0.0, 0.0));
    }

    #[test]
    fn test_sample_covers_space() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; GridAction::COUNT];
        for _ in 0..200 {
            seen[CompassSpace.sample(&mut rng).index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&GridAction::West).unwrap(), "3");
        let action: GridAction = serde_json::from_str("1").unwrap();
        assert_eq!(action, GridAction::East);
        assert!(serde_json::from_str::<GridAction>("9").is_err());
    }
}
