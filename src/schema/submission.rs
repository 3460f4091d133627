//! Sleep questionnaire form schema
//!
//! The JSON body posted by the questionnaire. Yes/no questions arrive either as
//! "yes"/"no" strings (any case) or as JSON booleans.

use crate::encoder::yes_no_to_bool;
use crate::types::{ActivityLevel, DietaryHabits, RawSubmission};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Current form schema identifier
pub const SCHEMA_VERSION: &str = "sleep.submission.v1";

/// Answer to a yes/no question as it crosses the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Text(String),
}

impl Answer {
    /// "yes" (any case) or `true`; everything else reads as no
    pub fn is_yes(&self) -> bool {
        match self {
            Answer::Flag(flag) => *flag,
            Answer::Text(text) => yes_no_to_bool(text),
        }
    }

    /// Whether the answer is one of the accepted spellings
    fn is_recognized(&self) -> bool {
        match self {
            Answer::Flag(_) => true,
            Answer::Text(text) => matches!(text.trim().to_lowercase().as_str(), "yes" | "no"),
        }
    }

    fn display(&self) -> String {
        match self {
            Answer::Flag(flag) => flag.to_string(),
            Answer::Text(text) => text.clone(),
        }
    }
}

impl Default for Answer {
    fn default() -> Self {
        Answer::Text("no".to_string())
    }
}

/// Serde helper: read a yes/no string or a boolean into `bool`
pub fn yes_no_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Answer::deserialize(deserializer).map(|answer| answer.is_yes())
}

/// One questionnaire submission as posted by the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionForm {
    /// Submitting account, if signed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub bedtime: Option<String>,
    #[serde(default)]
    pub wakeup_time: Option<String>,
    pub daily_steps: u32,
    pub calories_burned: u32,
    pub activity_level: String,
    pub dietary_habits: String,
    #[serde(default)]
    pub sleep_disorders: Answer,
    #[serde(default)]
    pub medication_usage: Answer,
}

impl SubmissionForm {
    /// Convert yes/no answers and build the submission handed to the encoder
    pub fn to_raw(&self) -> RawSubmission {
        RawSubmission {
            age: self.age,
            gender: self.gender.clone(),
            bedtime: self.bedtime.clone(),
            wakeup_time: self.wakeup_time.clone(),
            daily_steps: self.daily_steps,
            calories_burned: self.calories_burned,
            activity_level: self.activity_level.clone(),
            dietary_habits: self.dietary_habits.clone(),
            sleep_disorders: self.sleep_disorders.is_yes(),
            medication_usage: self.medication_usage.is_yes(),
        }
    }

    /// Strict boundary check.
    ///
    /// The encoder tolerates unknown genders, missing times and odd yes/no
    /// spellings; this reports every one of them so a caller can refuse the
    /// request instead.
    pub fn issues(&self) -> Vec<ValidationError> {
        let mut issues = Vec::new();

        if !matches!(self.gender.as_str(), "Male" | "Female") {
            issues.push(ValidationError::UnknownGender(self.gender.clone()));
        }

        for (field, value) in [("bedtime", &self.bedtime), ("wakeupTime", &self.wakeup_time)] {
            match value.as_deref() {
                None | Some("") => issues.push(ValidationError::MissingTime(field)),
                Some(time) if !is_clock_time(time) => issues.push(ValidationError::InvalidTime {
                    field,
                    value: time.to_string(),
                }),
                Some(_) => {}
            }
        }

        if ActivityLevel::from_label(&self.activity_level).is_none() {
            issues.push(ValidationError::OutOfEnumeration {
                field: "activityLevel",
                value: self.activity_level.clone(),
            });
        }

        if DietaryHabits::from_label(&self.dietary_habits).is_none() {
            issues.push(ValidationError::OutOfEnumeration {
                field: "dietaryHabits",
                value: self.dietary_habits.clone(),
            });
        }

        for (field, answer) in [
            ("sleepDisorders", &self.sleep_disorders),
            ("medicationUsage", &self.medication_usage),
        ] {
            if !answer.is_recognized() {
                issues.push(ValidationError::UnrecognizedAnswer {
                    field,
                    value: answer.display(),
                });
            }
        }

        issues
    }

    /// First strict-validation failure, if any
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.issues().into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }
}

/// Exactly "HH:MM" within 00:00-23:59
fn is_clock_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hours = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minutes = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hours < 24 && minutes < 60
}

/// Strict validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown gender: {0} (expected Male or Female)")]
    UnknownGender(String),

    #[error("Missing {0}")]
    MissingTime(&'static str),

    #[error("Invalid {field}: {value} (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },

    #[error("Invalid {field} value: {value}")]
    OutOfEnumeration { field: &'static str, value: String },

    #[error("Unrecognized {field} answer: {value} (expected yes or no)")]
    UnrecognizedAnswer { field: &'static str, value: String },
}
