//! Score banding
//!
//! Nine contiguous bands cover [1, 10]. Every band is half-open except the
//! last, which also includes 10. Bands are checked in ascending order and the
//! first match wins, so an exact integer score belongs to the higher band.

use serde::{Deserialize, Serialize};

/// Message used when a score cannot be placed in any band
pub const UNINTERPRETABLE_MESSAGE: &str = "We couldn't interpret the sleep score this time.";

/// Qualitative sleep quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    VeryPoor,
    Poor,
    BelowAverage,
    SlightlyBelowAverage,
    Moderate,
    FairlyGood,
    Good,
    VeryGood,
    Excellent,
}

/// A score interval and its message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBand {
    pub min: f64,
    pub max: f64,
    pub quality: SleepQuality,
    pub message: &'static str,
}

pub const SCORE_BANDS: [ScoreBand; 9] = [
    ScoreBand {
        min: 1.0,
        max: 2.0,
        quality: SleepQuality::VeryPoor,
        message: "Very poor sleep. Your rest patterns seem highly irregular or insufficient. Try to prioritise rest and establish a consistent schedule.",
    },
    ScoreBand {
        min: 2.0,
        max: 3.0,
        quality: SleepQuality::Poor,
        message: "Poor sleep quality. Your sleep is below the healthy range. Focus on building a calming bedtime routine to counter stress and late-night stimulation.",
    },
    ScoreBand {
        min: 3.0,
        max: 4.0,
        quality: SleepQuality::BelowAverage,
        message: "Below average sleep. You're getting some rest, but inconsistency or lifestyle factors are affecting recovery. Tighten your sleep timing and reduce evening screen exposure.",
    },
    ScoreBand {
        min: 4.0,
        max: 5.0,
        quality: SleepQuality::SlightlyBelowAverage,
        message: "Slightly below average sleep. Your habits are fair, yet there is clear room for improvement, especially in routine consistency and activity levels.",
    },
    ScoreBand {
        min: 5.0,
        max: 6.0,
        quality: SleepQuality::Moderate,
        message: "Moderate sleep quality. You're doing okay, but modest tweaks, like heading to bed 30 minutes earlier or adding light exercise, could elevate your rest.",
    },
    ScoreBand {
        min: 6.0,
        max: 7.0,
        quality: SleepQuality::FairlyGood,
        message: "Fairly good sleep. You are close to an optimal range. Fine-tune diet, bedtime, or wake consistency to unlock even better recovery.",
    },
    ScoreBand {
        min: 7.0,
        max: 8.0,
        quality: SleepQuality::Good,
        message: "Good sleep. Healthy habits are in place. Keep your routine steady and consider mindfulness or recovery practices to raise the bar.",
    },
    ScoreBand {
        min: 8.0,
        max: 9.0,
        quality: SleepQuality::VeryGood,
        message: "Very good sleep. Your lifestyle strongly supports energy and recovery. Maintain your diet, activity, and bedtime rhythm, you're on the right track.",
    },
    ScoreBand {
        min: 9.0,
        max: 10.0,
        quality: SleepQuality::Excellent,
        message: "Excellent sleep quality! Consistent, restorative rest like yours drives better mood, focus, and long-term health. Keep up the great work.",
    },
];

impl ScoreBand {
    fn contains(&self, score: f64, closed: bool) -> bool {
        if closed {
            score >= self.min && score <= self.max
        } else {
            score >= self.min && score < self.max
        }
    }
}

/// Find the band for a score; `None` for non-finite or out-of-range scores
pub fn band_for(score: f64) -> Option<&'static ScoreBand> {
    if !score.is_finite() {
        return None;
    }

    let last = SCORE_BANDS.len() - 1;
    SCORE_BANDS
        .iter()
        .enumerate()
        .find(|(idx, band)| band.contains(score, *idx == last))
        .map(|(_, band)| band)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_contiguous() {
        for pair in SCORE_BANDS.windows(2) {
            assert_eq!(pair[0].max, pair[1].min);
        }
        assert_eq!(SCORE_BANDS[0].min, 1.0);
        assert_eq!(SCORE_BANDS[8].max, 10.0);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(band_for(1.0).unwrap().quality, SleepQuality::VeryPoor);
        assert_eq!(band_for(10.0).unwrap().quality, SleepQuality::Excellent);
        assert_eq!(band_for(5.999).unwrap().quality, SleepQuality::Moderate);
        assert_eq!(band_for(6.0).unwrap().quality, SleepQuality::FairlyGood);
        assert_eq!(band_for(9.0).unwrap().quality, SleepQuality::Excellent);
    }

    #[test]
    fn test_out_of_range_scores_have_no_band() {
        assert!(band_for(0.999).is_none());
        assert!(band_for(10.001).is_none());
        assert!(band_for(-3.0).is_none());
        assert!(band_for(f64::NAN).is_none());
        assert!(band_for(f64::INFINITY).is_none());
    }
}
