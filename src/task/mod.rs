//! Task tracking for Chronicle.
//!
//! Tasks carry a closed status state machine (`todo` ⇄ `in-progress`, both
//! to terminal `done`) driven by progress updates, each of which appends a
//! worklog. Daily summaries, statistics, and Markdown exports aggregate
//! worklogs by local calendar day. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
