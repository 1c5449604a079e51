use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::palette::Palette;
use super::worry::{round_tenth, Position, Worry, WorryId, WorryState};

/// Reasons a share payload cannot be turned back into worries.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not a valid worry list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload contains no worries")]
    Empty,

    #[error("worry #{0} in payload has no text")]
    BlankText(usize),

    #[error("worry #{0} in payload has an out-of-range id")]
    InvalidId(usize),
}

/// Largest id a payload may carry: `Number.MAX_SAFE_INTEGER`, the ceiling of
/// a millisecond timestamp id produced by the web front-end.
pub const MAX_SHARED_ID: u64 = (1 << 53) - 1;

/// One worry in wire form: `[id, text, top, left, rotation, colorIndex]`.
///
/// Field order is the only schema; both ends must agree on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareTuple(pub u64, pub String, pub f64, pub f64, pub f64, pub i64);

impl ShareTuple {
    pub fn from_worry(worry: &Worry) -> Self {
        let pos = worry.position.rounded();
        Self(
            worry.id.0,
            worry.text.clone(),
            pos.top,
            pos.left,
            pos.rotation,
            Palette::index_of(&worry.color) as i64,
        )
    }

    /// Rebuild a pending worry. Out-of-range color indices fall back to entry 0.
    pub fn into_worry(self) -> Worry {
        let Self(id, text, top, left, rotation, color_index) = self;
        Worry {
            id: WorryId(id),
            text,
            position: Position::new(round_tenth(top), round_tenth(left), round_tenth(rotation)),
            color: Palette::color_at(color_index),
            state: WorryState::Pending,
        }
    }
}

/// The flattened worry set carried by a share link.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharePayload(pub Vec<ShareTuple>);

impl SharePayload {
    pub fn from_worries<'a>(worries: impl IntoIterator<Item = &'a Worry>) -> Self {
        Self(worries.into_iter().map(ShareTuple::from_worry).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> String {
        // A Vec of tuples of plain scalars always serializes.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse and validate. Either every worry is valid or nothing is returned.
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let payload: SharePayload = serde_json::from_str(json)?;
        if payload.is_empty() {
            return Err(PayloadError::Empty);
        }
        if let Some(idx) = payload.0.iter().position(|t| t.1.trim().is_empty()) {
            return Err(PayloadError::BlankText(idx));
        }
        if let Some(idx) = payload.0.iter().position(|t| t.0 > MAX_SHARED_ID) {
            return Err(PayloadError::InvalidId(idx));
        }
        Ok(payload)
    }

    pub fn into_worries(self) -> Vec<Worry> {
        self.0.into_iter().map(ShareTuple::into_worry).collect()
    }
}
