//! Engineered model features
//!
//! The model was trained on four columns derived from the feature vector:
//! - Energy balance (calories burned minus a step-based estimate)
//! - Time between bedtime and wake-up, wrapping past midnight
//! - Activity/diet interaction
//! - Age/sleep-disorder interaction

use crate::types::FeatureVector;
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Calories attributed to each step when estimating energy balance
pub const CALORIES_PER_STEP: f64 = 0.03;

/// Columns derived from a feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineeredFeatures {
    #[serde(rename = "EnergyBalance")]
    pub energy_balance: f64,
    /// Minutes from bedtime to wake-up (0-1439)
    #[serde(rename = "BedtimeWakeupDiff")]
    pub bedtime_wakeup_diff: i64,
    #[serde(rename = "ActivityDietInteraction")]
    pub activity_diet_interaction: i8,
    #[serde(rename = "AgeSleepInteraction")]
    pub age_sleep_interaction: u32,
}

/// The full 14-column row the model scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRow {
    #[serde(flatten)]
    pub vector: FeatureVector,
    #[serde(flatten)]
    pub engineered: EngineeredFeatures,
}

/// Feature deriver for computing engineered columns
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive engineered features from an encoded vector
    pub fn derive(vector: &FeatureVector) -> EngineeredFeatures {
        EngineeredFeatures {
            energy_balance: compute_energy_balance(vector),
            bedtime_wakeup_diff: compute_bedtime_wakeup_diff(vector),
            activity_diet_interaction: vector.activity_level * vector.dietary_habits,
            age_sleep_interaction: vector.age * u32::from(vector.sleep_disorders),
        }
    }

    /// Build the full model row
    pub fn model_row(vector: FeatureVector) -> ModelRow {
        ModelRow {
            engineered: Self::derive(&vector),
            vector,
        }
    }
}

fn compute_energy_balance(vector: &FeatureVector) -> f64 {
    f64::from(vector.calories_burned) - f64::from(vector.daily_steps) * CALORIES_PER_STEP
}

/// Wake-up minus bedtime; a negative gap means the night crossed midnight
fn compute_bedtime_wakeup_diff(vector: &FeatureVector) -> i64 {
    let diff = vector.wakeup_time.saturating_sub(vector.bedtime);
    if diff < 0 {
        diff.saturating_add(MINUTES_PER_DAY)
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vector() -> FeatureVector {
        FeatureVector {
            age: 55,
            gender: 0,
            bedtime: 1425,
            wakeup_time: 390,
            daily_steps: 9000,
            calories_burned: 2600,
            activity_level: -1,
            dietary_habits: 1,
            sleep_disorders: 1,
            medication_usage: 0,
        }
    }

    #[test]
    fn test_energy_balance() {
        let features = FeatureDeriver::derive(&make_vector());
        // 2600 - 9000 * 0.03 = 2330
        assert!((features.energy_balance - 2330.0).abs() < 1e-9);
    }

    #[test]
    fn test_bedtime_wakeup_diff_wraps_midnight() {
        let features = FeatureDeriver::derive(&make_vector());
        // 390 - 1425 + 1440 = 405
        assert_eq!(features.bedtime_wakeup_diff, 405);

        let mut same_day = make_vector();
        same_day.bedtime = 60;
        same_day.wakeup_time = 480;
        assert_eq!(FeatureDeriver::derive(&same_day).bedtime_wakeup_diff, 420);
    }

    #[test]
    fn test_bedtime_wakeup_diff_saturates_on_extreme_times() {
        let mut vector = make_vector();
        vector.bedtime = i64::MIN;
        vector.wakeup_time = i64::MAX;
        assert_eq!(FeatureDeriver::derive(&vector).bedtime_wakeup_diff, i64::MAX);

        vector.bedtime = i64::MAX;
        vector.wakeup_time = i64::MIN;
        assert_eq!(
            FeatureDeriver::derive(&vector).bedtime_wakeup_diff,
            i64::MIN + MINUTES_PER_DAY
        );
    }

    #[test]
    fn test_interactions() {
        let features = FeatureDeriver::derive(&make_vector());
        assert_eq!(features.activity_diet_interaction, -1);
        assert_eq!(features.age_sleep_interaction, 55);

        let mut no_disorder = make_vector();
        no_disorder.sleep_disorders = 0;
        assert_eq!(FeatureDeriver::derive(&no_disorder).age_sleep_interaction, 0);
    }

    #[test]
    fn test_model_row_has_fourteen_columns() {
        let row = FeatureDeriver::model_row(make_vector());
        let value = serde_json::to_value(row).unwrap();

        assert_eq!(value.as_object().unwrap().len(), 14);
        assert_eq!(value["BedtimeWakeupDiff"], 405);
        assert_eq!(value["Age"], 55);
    }
}
