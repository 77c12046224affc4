//! Unit tests for the task domain, reports, and services.
