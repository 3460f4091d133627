//! Questionnaire submission schema
//!
//! This module defines the form body accepted at the boundary and converts it
//! into the `RawSubmission` the encoder works on.

mod adapter;
mod submission;

pub use adapter::*;
pub use submission::*;
