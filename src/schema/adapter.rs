//! Parsing helpers for batches of questionnaire submissions

use crate::error::SleepwiseError;
use crate::schema::submission::*;

/// Adapter for reading submission forms from JSON input
pub struct SubmissionAdapter;

impl SubmissionAdapter {
    /// Parse a single JSON form body
    pub fn parse_form(json: &str) -> Result<SubmissionForm, SleepwiseError> {
        let form: SubmissionForm = serde_json::from_str(json)?;
        Ok(form)
    }

    /// Parse a JSON string containing an array of forms
    pub fn parse_array(json: &str) -> Result<Vec<SubmissionForm>, SleepwiseError> {
        let forms: Vec<SubmissionForm> = serde_json::from_str(json)?;
        Ok(forms)
    }

    /// Parse NDJSON (newline-delimited JSON), one form per line
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SubmissionForm>, SleepwiseError> {
        let mut forms = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SubmissionForm>(trimmed) {
                Ok(form) => forms.push(form),
                Err(e) => {
                    return Err(SleepwiseError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(forms)
    }

    /// Strictly validate a batch of forms, returning only the failing ones
    pub fn validate_forms(forms: &[SubmissionForm]) -> Vec<ValidationResult> {
        forms
            .iter()
            .enumerate()
            .map(|(idx, form)| ValidationResult {
                index: idx,
                user_id: form.user_id.clone(),
                issues: form.issues(),
            })
            .filter(|r| !r.issues.is_empty())
            .collect()
    }
}

/// Result of form validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub user_id: Option<String>,
    pub issues: Vec<ValidationError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"{"age": 30, "gender": "Male", "bedtime": "22:00", "wakeupTime": "06:00", "dailySteps": 9000, "caloriesBurned": 2600, "activityLevel": "High", "dietaryHabits": "Healthy", "sleepDisorders": "no", "medicationUsage": "no"}"#;
    const BAD: &str = r#"{"userId": "u-9", "age": 30, "gender": "Male", "bedtime": "", "wakeupTime": "06:00", "dailySteps": 9000, "caloriesBurned": 2600, "activityLevel": "High", "dietaryHabits": "Junk", "sleepDisorders": "no", "medicationUsage": "no"}"#;

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = format!("{GOOD}\n\n{BAD}\n");
        let forms = SubmissionAdapter::parse_ndjson(&input).unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let input = format!("{GOOD}\nnot json\n");
        let err = SubmissionAdapter::parse_ndjson(&input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let forms = SubmissionAdapter::parse_array(&format!("[{GOOD},{BAD}]")).unwrap();
        assert_eq!(forms[1].user_id.as_deref(), Some("u-9"));
    }

    #[test]
    fn test_validate_forms_returns_failures_only() {
        let forms = SubmissionAdapter::parse_array(&format!("[{GOOD},{BAD}]")).unwrap();
        let results = SubmissionAdapter::validate_forms(&forms);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 1);
        assert_eq!(results[0].issues.len(), 2);
    }
}
