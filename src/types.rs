//! Core types for the Sleepwise pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the raw submission, the encoded feature vector sent to the
//! predictor, the returned score, and the interpretation shown to the user.

use serde::{Deserialize, Serialize};

/// Self-reported physical activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    /// Case-insensitive parse of a form label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "low" => Some(ActivityLevel::Low),
            "medium" => Some(ActivityLevel::Medium),
            "high" => Some(ActivityLevel::High),
            _ => None,
        }
    }

    /// Numeric code expected by the predictor
    pub fn code(&self) -> i8 {
        match self {
            ActivityLevel::Low => -1,
            ActivityLevel::Medium => 0,
            ActivityLevel::High => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "Low",
            ActivityLevel::Medium => "Medium",
            ActivityLevel::High => "High",
        }
    }
}

/// Self-reported dietary habits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietaryHabits {
    Unhealthy,
    Medium,
    Healthy,
}

impl DietaryHabits {
    /// Case-insensitive parse of a form label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "unhealthy" => Some(DietaryHabits::Unhealthy),
            "medium" => Some(DietaryHabits::Medium),
            "healthy" => Some(DietaryHabits::Healthy),
            _ => None,
        }
    }

    /// Numeric code expected by the predictor
    pub fn code(&self) -> i8 {
        match self {
            DietaryHabits::Unhealthy => -1,
            DietaryHabits::Medium => 0,
            DietaryHabits::Healthy => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DietaryHabits::Unhealthy => "Unhealthy",
            DietaryHabits::Medium => "Medium",
            DietaryHabits::Healthy => "Healthy",
        }
    }
}

/// A single form submission after yes/no answers have been converted to booleans.
///
/// Categorical answers stay as the strings the user sent; the encoder decides
/// how strictly to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    pub age: u32,
    pub gender: String,
    /// Bedtime as "HH:MM" (24h)
    #[serde(default)]
    pub bedtime: Option<String>,
    /// Wake-up time as "HH:MM" (24h)
    #[serde(default)]
    pub wakeup_time: Option<String>,
    pub daily_steps: u32,
    pub calories_burned: u32,
    pub activity_level: String,
    pub dietary_habits: String,
    #[serde(deserialize_with = "crate::schema::yes_no_or_bool")]
    pub sleep_disorders: bool,
    #[serde(deserialize_with = "crate::schema::yes_no_or_bool")]
    pub medication_usage: bool,
}

/// Numeric model input, one per submission.
///
/// Field order and serialized keys are the predictor's request schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Age")]
    pub age: u32,
    /// 0 = male, 1 = anything else
    #[serde(rename = "Gender")]
    pub gender: u8,
    /// Minutes since midnight
    #[serde(rename = "Bedtime")]
    pub bedtime: i64,
    /// Minutes since midnight
    #[serde(rename = "Wake-up Time")]
    pub wakeup_time: i64,
    #[serde(rename = "Daily Steps")]
    pub daily_steps: u32,
    #[serde(rename = "Calories Burned")]
    pub calories_burned: u32,
    /// -1 low, 0 medium, 1 high
    #[serde(rename = "Physical Activity Level")]
    pub activity_level: i8,
    /// -1 unhealthy, 0 medium, 1 healthy
    #[serde(rename = "Dietary Habits")]
    pub dietary_habits: i8,
    #[serde(rename = "Sleep Disorders")]
    pub sleep_disorders: u8,
    #[serde(rename = "Medication Usage")]
    pub medication_usage: u8,
}

impl FeatureVector {
    /// Wire keys in schema order
    pub const KEYS: [&'static str; 10] = [
        "Age",
        "Gender",
        "Bedtime",
        "Wake-up Time",
        "Daily Steps",
        "Calories Burned",
        "Physical Activity Level",
        "Dietary Habits",
        "Sleep Disorders",
        "Medication Usage",
    ];
}

/// Score returned by the prediction service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted sleep quality, conventionally 1-10 (not enforced)
    #[serde(rename = "Predicted Sleep Quality")]
    pub score: f64,
}

/// Semantic category used to suppress overlapping advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Schedule,
    Activity,
    Meditation,
    Screen,
    SleepSpace,
}

/// A recommendation template with its topic tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub topics: &'static [Topic],
    pub text: &'static str,
}

impl Recommendation {
    pub const fn new(topics: &'static [Topic], text: &'static str) -> Self {
        Self { topics, text }
    }

    pub fn covers(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }
}

/// Human-readable report derived from a score and the originating submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub message: Option<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_feature_vector_serializes_in_schema_order() {
        let vector = FeatureVector {
            age: 30,
            gender: 0,
            bedtime: 1380,
            wakeup_time: 420,
            daily_steps: 8000,
            calories_burned: 2500,
            activity_level: 0,
            dietary_habits: 1,
            sleep_disorders: 0,
            medication_usage: 1,
        };

        let json = serde_json::to_string(&vector).unwrap();
        let mut last = 0;
        for key in FeatureVector::KEYS {
            let pos = json.find(&format!("\"{key}\"")).unwrap();
            assert!(pos >= last, "{key} out of order");
            last = pos;
        }

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_object().unwrap().len(), FeatureVector::KEYS.len());
        assert_eq!(value["Wake-up Time"], 420);
    }

    #[test]
    fn test_labels_parse_case_insensitively() {
        assert_eq!(ActivityLevel::from_label("HIGH"), Some(ActivityLevel::High));
        assert_eq!(ActivityLevel::from_label("moderate"), None);
        assert_eq!(DietaryHabits::from_label("Unhealthy"), Some(DietaryHabits::Unhealthy));
        assert_eq!(DietaryHabits::Healthy.code(), 1);
    }

    #[test]
    fn test_raw_submission_accepts_yes_no_answers() {
        let raw: RawSubmission = serde_json::from_str(
            r#"{
                "age": 41, "gender": "Male", "bedtime": "22:30", "wakeupTime": "06:45",
                "dailySteps": 7000, "caloriesBurned": 2100,
                "activityLevel": "Low", "dietaryHabits": "Medium",
                "sleepDisorders": "Yes", "medicationUsage": false
            }"#,
        )
        .unwrap();

        assert!(raw.sleep_disorders);
        assert!(!raw.medication_usage);
        assert_eq!(raw.wakeup_time.as_deref(), Some("06:45"));
    }
}
