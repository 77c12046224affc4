//! Step definitions for progress update scenarios.

mod given;
mod then;
mod when;
