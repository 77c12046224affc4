//! Chronicle: a personal task tracker.
//!
//! Tasks move through `todo`, `in-progress`, and `done` as progress is
//! logged against them. Worklogs roll up into daily summaries, trailing
//! statistics, and Markdown exports. The same operations are exposed through
//! a command-line interface and a small HTTP JSON API over a single-file
//! `SQLite` store.
//!
//! # Architecture
//!
//! Chronicle follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: `SQLite` and in-memory implementations of the ports
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle, worklogs, and reporting
//! - [`api`]: HTTP JSON API
//! - [`cli`]: Command-line interface
//! - [`config`]: Layered configuration

pub mod api;
pub mod cli;
pub mod config;
pub mod task;
