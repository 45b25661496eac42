//! vjour - Visual journal
//!
//! Dated entries of text and images, kept consistent across a record store
//! (entry, image and profile rows) and a blob store (image bytes). Local
//! filesystem and in-memory backends are included.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::VjourError;
