//! Reprise End-to-End Test Support
//!
//! Shared harness and fixtures for the journey tests:
//! - `harness`: an engine over a throwaway SQLite database with a settable clock
//! - `mocks`: factories for learners, units and crowded calendars

pub mod harness;
pub mod mocks;

pub use harness::TestEngine;
pub use mocks::{BatchConfig, TestDataFactory};
