use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Monster colors, in share-payload index order.
pub const MONSTER_COLORS: [&str; 9] = [
    "#ff7b7b", "#ffb07b", "#ffd97b", "#a6ff7b", "#7bffb0", "#7bffff", "#7ba6ff", "#b07bff",
    "#ff7bff",
];

/// A color from the fixed monster palette, stored as its hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonsterColor(String);

impl MonsterColor {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonsterColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup between palette colors and their indices.
pub struct Palette;

impl Palette {
    pub fn len() -> usize {
        MONSTER_COLORS.len()
    }

    /// Index of `color` in the palette, or 0 when it is not a palette color.
    pub fn index_of(color: &MonsterColor) -> usize {
        MONSTER_COLORS
            .iter()
            .position(|c| c.eq_ignore_ascii_case(color.as_str()))
            .unwrap_or(0)
    }

    /// Color at `index`. Out-of-range (and negative) indices map to entry 0.
    pub fn color_at(index: i64) -> MonsterColor {
        let idx = usize::try_from(index)
            .ok()
            .filter(|i| *i < MONSTER_COLORS.len())
            .unwrap_or(0);
        MonsterColor::new(MONSTER_COLORS[idx])
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> MonsterColor {
        let hex = MONSTER_COLORS.choose(rng).copied().unwrap_or(MONSTER_COLORS[0]);
        MonsterColor::new(hex)
    }
}
