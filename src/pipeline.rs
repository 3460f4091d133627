//! Pipeline orchestration
//!
//! This module provides the public API for Sleepwise.
//! It orchestrates a submission from the posted form through encoding,
//! storage, prediction, and interpretation.

use crate::encoder::FeatureEncoder;
use crate::error::SleepwiseError;
use crate::interpret::interpret;
use crate::predictor::Predictor;
use crate::schema::{SubmissionAdapter, SubmissionForm};
use crate::session::SessionContext;
use crate::store::{MemoryStore, StoredSubmission, SubmissionStore};
use crate::types::Interpretation;
use serde::Serialize;
use uuid::Uuid;

/// Result of processing one submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub record: StoredSubmission,
    pub score: f64,
    pub interpretation: Interpretation,
}

/// Score a single form JSON body and return the report as JSON.
///
/// Nothing is persisted beyond the call.
///
/// # Arguments
/// * `form_json` - Questionnaire body as posted by the form
/// * `predictor` - Prediction backend
///
/// # Example
/// ```ignore
/// let report = submission_to_report(form_json, &FixedPredictor::new(7.0))?;
/// ```
pub fn submission_to_report(
    form_json: &str,
    predictor: &dyn Predictor,
) -> Result<String, SleepwiseError> {
    let form = SubmissionAdapter::parse_form(form_json)?;
    let processor = SleepwiseProcessor::new(MemoryStore::new(), predictor);
    let outcome = processor.submit(&form)?;
    serde_json::to_string_pretty(&outcome).map_err(SleepwiseError::JsonError)
}

/// Recompute the interpretation for a stored submission
pub fn interpret_stored<S: SubmissionStore>(
    store: &S,
    id: Uuid,
) -> Result<Interpretation, SleepwiseError> {
    let record = store
        .get(id)?
        .ok_or_else(|| SleepwiseError::SubmissionNotFound(id.to_string()))?;
    Ok(interpret(record.prediction, Some(&record.submission)))
}

/// A user's submissions with their interpretations, oldest first
pub fn history<S: SubmissionStore>(
    store: &S,
    user_id: &str,
) -> Result<Vec<(StoredSubmission, Interpretation)>, SleepwiseError> {
    Ok(store
        .list_for_user(user_id)?
        .into_iter()
        .map(|record| {
            let interpretation = interpret(record.prediction, Some(&record.submission));
            (record, interpretation)
        })
        .collect())
}

/// Processor wiring the encoder to a store and a predictor
pub struct SleepwiseProcessor<S, P> {
    store: S,
    predictor: P,
    encoder: FeatureEncoder,
}

impl<S, P> SleepwiseProcessor<S, P>
where
    S: SubmissionStore,
    P: Predictor,
{
    pub fn new(store: S, predictor: P) -> Self {
        Self {
            store,
            predictor,
            encoder: FeatureEncoder::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one submission.
    ///
    /// Pipeline stages:
    /// 1. Convert yes/no answers into a `RawSubmission`
    /// 2. FeatureEncoder - reject invalid categories before anything is stored
    /// 3. SubmissionStore - persist the submission
    /// 4. Predictor - score the vector, then record the score
    /// 5. Interpretation - band message and recommendations
    pub fn submit(&self, form: &SubmissionForm) -> Result<SubmissionOutcome, SleepwiseError> {
        let raw = form.to_raw();

        let vector = self.encoder.encode(&raw).map_err(|e| {
            tracing::warn!(error = %e, "submission rejected");
            e
        })?;

        let record = self.store.insert(form.user_id.as_deref(), &raw)?;
        tracing::debug!(id = %record.id, "submission encoded and stored");

        let prediction = self.predictor.predict(&vector)?;
        let record = self.store.set_prediction(record.id, prediction.score)?;

        let interpretation = interpret(Some(prediction.score), Some(&record.submission));
        tracing::debug!(
            id = %record.id,
            score = prediction.score,
            recommendations = interpretation.recommendations.len(),
            "submission interpreted"
        );

        Ok(SubmissionOutcome {
            score: prediction.score,
            record,
            interpretation,
        })
    }

    /// Process a submission on behalf of the signed-in account.
    ///
    /// The account's user id replaces whatever the form carried. Fails with
    /// `SessionExpired` before anything is stored when nobody is signed in.
    pub fn submit_as(
        &self,
        session: &SessionContext,
        form: &SubmissionForm,
    ) -> Result<SubmissionOutcome, SleepwiseError> {
        let account = session.account().ok_or(SleepwiseError::SessionExpired)?;
        let form = SubmissionForm {
            user_id: Some(account.user_id.clone()),
            ..form.clone()
        };
        self.submit(&form)
    }

    pub fn interpret_stored(&self, id: Uuid) -> Result<Interpretation, SleepwiseError> {
        interpret_stored(&self.store, id)
    }

    pub fn history(
        &self,
        user_id: &str,
    ) -> Result<Vec<(StoredSubmission, Interpretation)>, SleepwiseError> {
        history(&self.store, user_id)
    }
}
