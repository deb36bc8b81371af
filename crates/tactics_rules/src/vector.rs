//! Grid coordinates.
//!
//! Maps are addressed with 1-based `(x, y)` coordinates. [`Vector`] is
//! ordered by `x` first, which keeps every `BTreeMap<Vector, _>` iteration
//! deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position on the map grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Vector {
    /// Column, starting at 1.
    pub x: i32,
    /// Row, starting at 1.
    pub y: i32,
}

impl Vector {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The vector one row above.
    #[must_use]
    pub const fn up(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    /// The vector one column to the right.
    #[must_use]
    pub const fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    /// The vector one row below.
    #[must_use]
    pub const fn down(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    /// The vector one column to the left.
    #[must_use]
    pub const fn left(self) -> Self {
        Self::new(self.x - 1, self.y)
    }

    /// Move one step in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => self.up(),
            Direction::Right => self.right(),
            Direction::Down => self.down(),
            Direction::Left => self.left(),
        }
    }

    /// The four orthogonal neighbours, clockwise starting at the top.
    #[must_use]
    pub const fn adjacent(self) -> [Self; 4] {
        [self.up(), self.right(), self.down(), self.left()]
    }

    /// Manhattan distance.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Whether `other` is an orthogonal neighbour.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }

    /// All vectors within `radius` (manhattan), excluding `self`.
    #[must_use]
    pub fn within(self, min: u32, max: u32) -> Vec<Self> {
        let max_i = i32::try_from(max).unwrap_or(i32::MAX);
        let mut result = Vec::new();
        for dx in -max_i..=max_i {
            for dy in -max_i..=max_i {
                let candidate = Self::new(self.x + dx, self.y + dy);
                let distance = self.distance(candidate);
                if distance >= min.max(1) && distance <= max {
                    result.push(candidate);
                }
            }
        }
        result
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Vector {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Orthogonal direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards row 1.
    Up,
    /// Towards higher columns.
    Right,
    /// Towards higher rows.
    Down,
    /// Towards column 1.
    Left,
}

impl Direction {
    /// The dominant direction from `from` towards `to`.
    ///
    /// Returns `None` when both vectors are equal.
    #[must_use]
    pub fn between(from: Vector, to: Vector) -> Option<Self> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx == 0 && dy == 0 {
            return None;
        }
        Some(if dx.abs() >= dy.abs() {
            if dx > 0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if dy > 0 {
            Self::Down
        } else {
            Self::Up
        })
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }
}

/// Serde support for maps keyed by [`Vector`].
///
/// JSON only allows string keys, so vector-keyed maps are serialized as a
/// list of `(vector, value)` pairs in key order.
pub mod vector_map_serde {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Vector;

    /// Serialize a vector-keyed map as an ordered list of pairs.
    pub fn serialize<S, T>(value: &BTreeMap<Vector, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(value.iter())
    }

    /// Deserialize a vector-keyed map from a list of pairs.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<Vector, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let pairs = Vec::<(Vector, T)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
