//! Sleepwise - Sleep-quality feature encoding and interpretation engine
//!
//! Sleepwise turns a lifestyle questionnaire into the numeric feature vector a
//! sleep-quality model expects, sends it to a prediction service, and explains
//! the returned score: submission → encoding → prediction → interpretation.
//!
//! ## Modules
//!
//! - **Encoding**: Questionnaire answers into the fixed-order `FeatureVector`
//! - **Interpretation**: Score band message plus deduplicated recommendations
//! - **Accounts**: Registration, login and session tokens for submission history

pub mod accounts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod interpret;
pub mod pipeline;
pub mod predictor;
pub mod schema;
pub mod session;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use encoder::{encode, FeatureEncoder};
pub use error::SleepwiseError;
pub use interpret::interpret;
pub use pipeline::{submission_to_report, SleepwiseProcessor, SubmissionOutcome};
pub use predictor::{FixedPredictor, Predictor, PredictorConfig};
pub use types::{FeatureVector, Interpretation, PredictionResult, RawSubmission};

#[cfg(feature = "http")]
pub use predictor::HttpPredictor;

// Schema exports
pub use schema::{SubmissionAdapter, SubmissionForm, SCHEMA_VERSION};

/// Sleepwise version reported by the CLI and FFI
pub const SLEEPWISE_VERSION: &str = env!("CARGO_PKG_VERSION");
