//! Submission storage
//!
//! This module persists submissions and the score later returned for them.
//! Interpretations are never stored; they are recomputed from the record.

use crate::error::SleepwiseError;
use crate::types::RawSubmission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// A persisted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub submission: RawSubmission,
    /// Score returned by the predictor, once known
    pub prediction: Option<f64>,
}

/// Trait for submission persistence backends
pub trait SubmissionStore: Send + Sync {
    /// Persist a new submission without a prediction
    fn insert(
        &self,
        user_id: Option<&str>,
        submission: &RawSubmission,
    ) -> Result<StoredSubmission, SleepwiseError>;

    /// Record the predicted score for a stored submission
    fn set_prediction(&self, id: Uuid, score: f64) -> Result<StoredSubmission, SleepwiseError>;

    /// Look up a submission by id
    fn get(&self, id: Uuid) -> Result<Option<StoredSubmission>, SleepwiseError>;

    /// All submissions for a user, oldest first
    fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredSubmission>, SleepwiseError>;
}

impl<T: SubmissionStore + ?Sized> SubmissionStore for &T {
    fn insert(
        &self,
        user_id: Option<&str>,
        submission: &RawSubmission,
    ) -> Result<StoredSubmission, SleepwiseError> {
        (**self).insert(user_id, submission)
    }

    fn set_prediction(&self, id: Uuid, score: f64) -> Result<StoredSubmission, SleepwiseError> {
        (**self).set_prediction(id, score)
    }

    fn get(&self, id: Uuid) -> Result<Option<StoredSubmission>, SleepwiseError> {
        (**self).get(id)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredSubmission>, SleepwiseError> {
        (**self).list_for_user(user_id)
    }
}

/// In-memory store with JSON snapshots
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredSubmission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load store contents from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<StoredSubmission> = serde_json::from_str(json)?;
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    /// Save store contents to a JSON snapshot
    pub fn to_json(&self) -> Result<String, SleepwiseError> {
        let records = self.read()?;
        Ok(serde_json::to_string_pretty(&*records)?)
    }

    pub fn len(&self) -> Result<usize, SleepwiseError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SleepwiseError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<StoredSubmission>>, SleepwiseError> {
        self.records
            .read()
            .map_err(|_| SleepwiseError::StorageError("submission store lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Vec<StoredSubmission>>, SleepwiseError> {
        self.records
            .write()
            .map_err(|_| SleepwiseError::StorageError("submission store lock poisoned".into()))
    }
}

impl SubmissionStore for MemoryStore {
    fn insert(
        &self,
        user_id: Option<&str>,
        submission: &RawSubmission,
    ) -> Result<StoredSubmission, SleepwiseError> {
        let record = StoredSubmission {
            id: Uuid::new_v4(),
            user_id: user_id.map(str::to_string),
            created_at: Utc::now(),
            submission: submission.clone(),
            prediction: None,
        };

        self.write()?.push(record.clone());
        tracing::debug!(id = %record.id, "submission stored");
        Ok(record)
    }

    fn set_prediction(&self, id: Uuid, score: f64) -> Result<StoredSubmission, SleepwiseError> {
        let mut records = self.write()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| SleepwiseError::SubmissionNotFound(id.to_string()))?;

        record.prediction = Some(score);
        Ok(record.clone())
    }

    fn get(&self, id: Uuid) -> Result<Option<StoredSubmission>, SleepwiseError> {
        Ok(self.read()?.iter().find(|r| r.id == id).cloned())
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredSubmission>, SleepwiseError> {
        Ok(self
            .read()?
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawSubmission {
        RawSubmission {
            age: 28,
            gender: "Male".to_string(),
            bedtime: Some("23:00".to_string()),
            wakeup_time: Some("07:00".to_string()),
            daily_steps: 8500,
            calories_burned: 2550,
            activity_level: "Medium".to_string(),
            dietary_habits: "Medium".to_string(),
            sleep_disorders: false,
            medication_usage: false,
        }
    }

    #[test]
    fn test_insert_then_set_prediction() {
        let store = MemoryStore::new();
        let record = store.insert(Some("user-1"), &sample()).unwrap();
        assert_eq!(record.prediction, None);

        let updated = store.set_prediction(record.id, 6.8).unwrap();
        assert_eq!(updated.prediction, Some(6.8));
        assert_eq!(store.get(record.id).unwrap().unwrap().prediction, Some(6.8));
    }

    #[test]
    fn test_set_prediction_unknown_id() {
        let store = MemoryStore::new();
        let err = store.set_prediction(Uuid::new_v4(), 5.0).unwrap_err();
        assert!(matches!(err, SleepwiseError::SubmissionNotFound(_)));
    }

    #[test]
    fn test_list_for_user_filters_and_keeps_order() {
        let store = MemoryStore::new();
        let first = store.insert(Some("a"), &sample()).unwrap();
        store.insert(Some("b"), &sample()).unwrap();
        let third = store.insert(Some("a"), &sample()).unwrap();
        store.insert(None, &sample()).unwrap();

        let ids: Vec<Uuid> = store
            .list_for_user("a")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first.id, third.id]);
        assert_eq!(store.len().unwrap(), 4);
    }

    #[test]
    fn test_poisoned_lock_is_a_storage_error() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store.insert(None, &sample()).unwrap();

        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.records.write().unwrap();
            panic!("poison the submission lock");
        })
        .join();

        assert!(matches!(store.len(), Err(SleepwiseError::StorageError(_))));
        assert!(matches!(store.is_empty(), Err(SleepwiseError::StorageError(_))));
        assert!(matches!(
            store.insert(None, &sample()),
            Err(SleepwiseError::StorageError(_))
        ));
    }

    #[test]
    fn test_json_snapshot_roundtrip_preserves_predictions() {
        let store = MemoryStore::new();
        let record = store.insert(Some("a"), &sample()).unwrap();
        store.set_prediction(record.id, 8.1).unwrap();

        let restored = MemoryStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(restored.get(record.id).unwrap(), store.get(record.id).unwrap());
    }
}
