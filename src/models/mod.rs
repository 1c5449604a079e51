//! Domain models for the worry tree.
//!
//! # Core Concepts
//!
//! - [`Worry`]: A user-submitted concern hanging on the tree as a monster.
//!   Worries are **ephemeral**: once comforted they fall and are removed.
//! - [`ClearedWorry`]: A resolved worry paired with the comfort it received,
//!   kept only for the summary.
//! - [`SharePayload`]: The flattened wire form of a worry set used in share links.
//! - [`Palette`]: The fixed set of monster colors.

mod cleared;
mod palette;
mod payload;
mod worry;

pub use cleared::*;
pub use palette::*;
pub use payload::*;
pub use worry::*;
