//! Score interpretation
//!
//! Turns a predicted score and the originating submission into a band message
//! and an ordered, deduplicated list of recommendations. Interpretation is a
//! pure function of its inputs and never fails.

pub mod bands;
pub mod rules;

pub use bands::{band_for, ScoreBand, SleepQuality, SCORE_BANDS, UNINTERPRETABLE_MESSAGE};
pub use rules::{recommend, RecommendationSet, GENERAL_ACTIONS};

use crate::types::{Interpretation, RawSubmission};

/// Interpret a score for a submission.
///
/// - no submission: no message, no recommendations
/// - no score (or a non-finite one): the uninterpretable message, no recommendations
/// - a finite score outside [1, 10]: the uninterpretable message, recommendations as usual
pub fn interpret(score: Option<f64>, raw: Option<&RawSubmission>) -> Interpretation {
    let raw = match raw {
        Some(raw) => raw,
        None => return Interpretation::default(),
    };

    let score = match score.filter(|s| s.is_finite()) {
        Some(score) => score,
        None => {
            return Interpretation {
                message: Some(UNINTERPRETABLE_MESSAGE.to_string()),
                recommendations: Vec::new(),
            }
        }
    };

    let message = band_for(score)
        .map(|band| band.message)
        .unwrap_or(UNINTERPRETABLE_MESSAGE);

    Interpretation {
        message: Some(message.to_string()),
        recommendations: recommend(raw),
    }
}

/// Quality level for a score, if it falls inside a band
pub fn quality_for(score: f64) -> Option<SleepQuality> {
    band_for(score).map(|band| band.quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::rules::EARLIER_BEDTIME;
    use pretty_assertions::assert_eq;

    fn scenario_raw() -> RawSubmission {
        RawSubmission {
            age: 22,
            gender: "Female".to_string(),
            bedtime: Some("23:45".to_string()),
            wakeup_time: Some("06:30".to_string()),
            daily_steps: 9000,
            calories_burned: 2600,
            activity_level: "High".to_string(),
            dietary_habits: "Healthy".to_string(),
            sleep_disorders: false,
            medication_usage: false,
        }
    }

    #[test]
    fn test_band_messages() {
        let raw = scenario_raw();
        assert_eq!(
            interpret(Some(1.0), Some(&raw)).message.as_deref(),
            Some(SCORE_BANDS[0].message)
        );
        assert_eq!(
            interpret(Some(10.0), Some(&raw)).message.as_deref(),
            Some(SCORE_BANDS[8].message)
        );
        assert_eq!(quality_for(5.999), Some(SleepQuality::Moderate));
        assert_eq!(quality_for(6.0), Some(SleepQuality::FairlyGood));
    }

    #[test]
    fn test_out_of_range_score_keeps_recommendations() {
        let result = interpret(Some(11.5), Some(&scenario_raw()));
        assert_eq!(result.message.as_deref(), Some(UNINTERPRETABLE_MESSAGE));
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn test_missing_score_yields_sentinel_only() {
        for score in [None, Some(f64::NAN)] {
            let result = interpret(score, Some(&scenario_raw()));
            assert_eq!(result.message.as_deref(), Some(UNINTERPRETABLE_MESSAGE));
            assert!(result.recommendations.is_empty());
        }
    }

    #[test]
    fn test_missing_submission_yields_nothing() {
        assert_eq!(interpret(Some(7.0), None), Interpretation::default());
    }

    #[test]
    fn test_out_of_range_times_do_not_panic() {
        let mut raw = scenario_raw();
        raw.bedtime = Some("9223372036854775807:00".to_string());
        raw.wakeup_time = Some("-9223372036854775808:30".to_string());

        let result = interpret(Some(7.2), Some(&raw));
        assert!(!result
            .recommendations
            .contains(&EARLIER_BEDTIME.text.to_string()));
        assert!(!result
            .recommendations
            .contains(&rules::EARLIER_WAKE.text.to_string()));
    }

    #[test]
    fn test_interpret_is_idempotent() {
        let raw = scenario_raw();
        assert_eq!(interpret(Some(6.4), Some(&raw)), interpret(Some(6.4), Some(&raw)));
    }

    #[test]
    fn test_scenario_only_late_bedtime_timing_tip() {
        let result = interpret(Some(7.2), Some(&scenario_raw()));

        assert!(result.recommendations.contains(&EARLIER_BEDTIME.text.to_string()));
        assert!(!result
            .recommendations
            .contains(&rules::EARLIER_WAKE.text.to_string()));
        assert_eq!(
            result.recommendations,
            vec![
                rules::CONSISTENT_TIMES.text.to_string(),
                EARLIER_BEDTIME.text.to_string(),
                GENERAL_ACTIONS[1].text.to_string(),
                GENERAL_ACTIONS[2].text.to_string(),
                GENERAL_ACTIONS[3].text.to_string(),
                GENERAL_ACTIONS[4].text.to_string(),
            ]
        );
    }
}
