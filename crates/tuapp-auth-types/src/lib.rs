//! Session-credential types shared across tuAPP services.
//!
//! Provides bearer-header extraction and JWT session validation. Two subject
//! universes exist (passengers and administrative users); the claims carry an
//! explicit `kind` so one can never be decoded as the other.

pub mod bearer;
pub mod token;
