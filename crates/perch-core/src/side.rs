#![forbid(unsafe_code)]

//! Anchor sides and the ordered priority in which they are tried.
//!
//! # Invariants
//!
//! 1. A [`SidePriority`] holds between one and four sides.
//! 2. No side appears twice in a [`SidePriority`].
//! 3. The first side is the initial placement; the last side is the
//!    fallback when nothing fits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side of the container the floating content is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// All sides in declaration order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    fn parse(value: &str) -> Option<Side> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Side::Top),
            "bottom" => Some(Side::Bottom),
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = SidePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::parse(s).ok_or_else(|| SidePriorityError::UnknownSide(s.trim().to_string()))
    }
}

/// Why a side list was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidePriorityError {
    /// No sides given.
    Empty,
    /// More than four sides given.
    TooMany(usize),
    /// The same side listed twice.
    Duplicate(Side),
    /// A name that is not `top`, `bottom`, `left` or `right`.
    UnknownSide(String),
}

impl fmt::Display for SidePriorityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "side priority needs at least one side"),
            Self::TooMany(n) => write!(f, "side priority holds at most 4 sides, got {n}"),
            Self::Duplicate(side) => write!(f, "side '{side}' listed more than once"),
            Self::UnknownSide(name) => {
                write!(f, "unknown side '{name}' (expected top|bottom|left|right)")
            }
        }
    }
}

impl std::error::Error for SidePriorityError {}

/// Ordered list of 1–4 distinct sides, tried first to last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Side>", into = "Vec<Side>")]
pub struct SidePriority {
    sides: [Side; 4],
    len: usize,
}

impl SidePriority {
    /// Build a priority from a slice of sides.
    pub fn new(sides: &[Side]) -> Result<Self, SidePriorityError> {
        if sides.is_empty() {
            return Err(SidePriorityError::Empty);
        }
        if sides.len() > 4 {
            return Err(SidePriorityError::TooMany(sides.len()));
        }
        // Unused slots hold the first side, matching `only`.
        let mut out = [sides[0]; 4];
        for (i, &side) in sides.iter().enumerate() {
            if out[..i].contains(&side) {
                return Err(SidePriorityError::Duplicate(side));
            }
            out[i] = side;
        }
        Ok(Self {
            sides: out,
            len: sides.len(),
        })
    }

    /// A priority with a single side; that side is always committed.
    #[must_use]
    pub const fn only(side: Side) -> Self {
        Self {
            sides: [side; 4],
            len: 1,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Side] {
        &self.sides[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = Side> + '_ {
        self.as_slice().iter().copied()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false; kept for API symmetry with slices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The preferred side, used as the initial placement.
    #[must_use]
    pub const fn first(&self) -> Side {
        self.sides[0]
    }

    /// The lowest-priority side.
    #[must_use]
    pub const fn last(&self) -> Side {
        self.sides[self.len - 1]
    }

    #[must_use]
    pub fn contains(&self, side: Side) -> bool {
        self.as_slice().contains(&side)
    }
}

impl Default for SidePriority {
    fn default() -> Self {
        Self {
            sides: [Side::Bottom, Side::Top, Side::Right, Side::Left],
            len: 4,
        }
    }
}

impl TryFrom<Vec<Side>> for SidePriority {
    type Error = SidePriorityError;

    fn try_from(value: Vec<Side>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<SidePriority> for Vec<Side> {
    fn from(value: SidePriority) -> Self {
        value.as_slice().to_vec()
    }
}

impl FromStr for SidePriority {
    type Err = SidePriorityError;

    /// Parse a comma separated list such as `"bottom, top"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sides = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Side::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&sides)
    }
}

impl fmt::Display for SidePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, side) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(side.as_str())?;
        }
        Ok(())
    }
}
