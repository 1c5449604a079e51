//! Worry Tree: hang worries on a tree, share the tree as a link, and comfort
//! the worries away.
//!
//! - [`store`] and [`lifecycle`] hold the tree and drive each worry from
//!   pending to fallen.
//! - [`share`] turns a tree into a link (and QR code) and back.
//! - [`comfort`] asks a generative-text service for comforting words.
//! - [`summary`] lists what was comforted.
//! - [`api`] and [`db`] are a self-hostable blob store for short links.

pub mod api;
pub mod comfort;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod share;
pub mod store;
pub mod summary;
