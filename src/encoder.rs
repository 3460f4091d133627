//! Feature encoding
//!
//! This module encodes a raw submission into the numeric feature vector the
//! prediction service expects. Encoding is deterministic and side-effect free.
//!
//! Several fields are read leniently on purpose so vectors stay identical to
//! those already stored alongside past predictions:
//! - a missing or empty time encodes as midnight (0 minutes)
//! - any gender other than "male" encodes as 1
//! - any yes/no answer other than "yes" encodes as 0
//!
//! Only activity level and dietary habits are closed enumerations; anything
//! else is rejected with `InvalidFeatureValue`.

use crate::error::SleepwiseError;
use crate::types::{ActivityLevel, DietaryHabits, FeatureVector, RawSubmission};

/// Encoder producing predictor-ready feature vectors
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a submission into a feature vector
    pub fn encode(&self, raw: &RawSubmission) -> Result<FeatureVector, SleepwiseError> {
        Ok(FeatureVector {
            age: raw.age,
            gender: map_gender(&raw.gender),
            bedtime: convert_to_minutes(raw.bedtime.as_deref()),
            wakeup_time: convert_to_minutes(raw.wakeup_time.as_deref()),
            daily_steps: raw.daily_steps,
            calories_burned: raw.calories_burned,
            activity_level: map_activity(&raw.activity_level)?,
            dietary_habits: map_diet(&raw.dietary_habits)?,
            sleep_disorders: u8::from(raw.sleep_disorders),
            medication_usage: u8::from(raw.medication_usage),
        })
    }

    /// Encode to the JSON request body sent to the predictor
    pub fn encode_to_json(&self, raw: &RawSubmission) -> Result<String, SleepwiseError> {
        let vector = self.encode(raw)?;
        serde_json::to_string(&vector).map_err(SleepwiseError::JsonError)
    }
}

/// Convenience wrapper around [`FeatureEncoder::encode`]
pub fn encode(raw: &RawSubmission) -> Result<FeatureVector, SleepwiseError> {
    FeatureEncoder::new().encode(raw)
}

/// Convert "HH:MM" into minutes since midnight.
///
/// Absent or empty input yields 0. A component that does not parse as an
/// integer also counts as 0, and so does a time whose minute count does not
/// fit in an `i64`.
pub fn convert_to_minutes(time: Option<&str>) -> i64 {
    let time = match time {
        Some(t) if !t.is_empty() => t,
        _ => return 0,
    };

    let mut parts = time.split(':');
    let hours = parse_component(parts.next());
    let minutes = parse_component(parts.next());
    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .unwrap_or(0)
}

fn parse_component(part: Option<&str>) -> i64 {
    part.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(0)
}

/// "male" (any case) is 0, everything else is 1
pub fn map_gender(gender: &str) -> u8 {
    if gender.to_lowercase() == "male" {
        0
    } else {
        1
    }
}

/// low/medium/high to -1/0/1
pub fn map_activity(level: &str) -> Result<i8, SleepwiseError> {
    ActivityLevel::from_label(level)
        .map(|l| l.code())
        .ok_or_else(|| SleepwiseError::invalid_feature("activityLevel", level))
}

/// unhealthy/medium/healthy to -1/0/1
pub fn map_diet(diet: &str) -> Result<i8, SleepwiseError> {
    DietaryHabits::from_label(diet)
        .map(|d| d.code())
        .ok_or_else(|| SleepwiseError::invalid_feature("dietaryHabits", diet))
}

/// "yes" (any case) is true; anything else, including malformed input, is false
pub fn yes_no_to_bool(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}
