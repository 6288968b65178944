//! dojo-core: Exam configuration, document parsing, scoring and session state.
//!
//! This crate holds everything the exam simulator computes: per-exam settings,
//! question/solution records parsed from the authoring documents, score results
//! parsed from the evaluation script output, and the timed practice session.

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod score_output;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod traits;
