//! Core domain types and utilities for deep-research.
//!
//! This crate provides the error handling alias and the identifier types
//! shared by the research crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ActivityId, CallId, ParseIdError, ResearchSessionId};
