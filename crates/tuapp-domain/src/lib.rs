//! Domain types shared across tuAPP crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Ids and card vocabulary travel through every layer of a service unchanged.

pub mod card;
pub mod id;
pub mod pagination;
