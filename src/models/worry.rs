use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::palette::MonsterColor;

/// Identity of a worry within a store.
///
/// Ids are derived from the creation time in milliseconds and are strictly
/// increasing within a store; see [`crate::store::WorryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorryId(pub u64);

impl fmt::Display for WorryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a monster hangs on the tree.
///
/// `top` and `left` are percentages of the tree area, `rotation` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
    pub rotation: f64,
}

impl Position {
    pub const TOP_RANGE: std::ops::Range<f64> = 15.0..60.0;
    pub const LEFT_RANGE: std::ops::Range<f64> = 10.0..90.0;
    pub const ROTATION_RANGE: std::ops::Range<f64> = -15.0..15.0;

    pub fn new(top: f64, left: f64, rotation: f64) -> Self {
        Self {
            top,
            left,
            rotation,
        }
    }

    /// Pick a random spot among the branches.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            top: rng.gen_range(Self::TOP_RANGE),
            left: rng.gen_range(Self::LEFT_RANGE),
            rotation: rng.gen_range(Self::ROTATION_RANGE),
        }
    }

    /// Same position with every field rounded to one decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            top: round_tenth(self.top),
            left: round_tenth(self.left),
            rotation: round_tenth(self.rotation),
        }
    }

    pub fn top_css(&self) -> String {
        format!("{}%", self.top)
    }

    pub fn left_css(&self) -> String {
        format!("{}%", self.left)
    }

    pub fn transform_css(&self) -> String {
        format!("rotate({}deg)", self.rotation)
    }
}

/// Round half-up to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// Lifecycle state of a worry still present in the store.
///
/// A removed worry is simply absent from the store, so there is no
/// `Removed` variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorryState {
    /// Hanging on the tree, can be selected in comfort mode.
    Pending,
    /// Comforted and animating away; removal is already scheduled.
    Falling { comfort_text: String },
}

impl WorryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Falling { .. } => "falling",
        }
    }
}

/// A single user-submitted concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worry {
    pub id: WorryId,
    pub text: String,
    pub position: Position,
    pub color: MonsterColor,
    #[serde(flatten)]
    pub state: WorryState,
}

impl Worry {
    pub fn is_pending(&self) -> bool {
        matches!(self.state, WorryState::Pending)
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.state, WorryState::Falling { .. })
    }
}
