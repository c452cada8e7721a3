//! Medical information extraction service
//!
//! Accepts drug leaflets (PDF URLs), drug pairs, drug/side-effect pairs and prescription
//! images over HTTP, turns each into a structured prompt and relays the answer produced
//! by a Gemini model back to the caller.

pub mod acquire;
pub mod ai;
pub mod api;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompts;

pub use error::{Error, Result};
