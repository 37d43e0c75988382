//! Service plumbing shared by tuAPP binaries: tracing setup, request ids,
//! health probes and serde helpers.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
