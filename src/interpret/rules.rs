//! Recommendation rules
//!
//! Each rule tests one field of the submission and contributes a fixed
//! recommendation. General sleep-hygiene tips are appended afterwards unless a
//! recommendation already present shares one of their topics.

use crate::encoder::convert_to_minutes;
use crate::types::{ActivityLevel, DietaryHabits, RawSubmission, Recommendation, Topic};

pub const MIN_DAILY_STEPS: u32 = 8000;
pub const MIN_CALORIES_BURNED: u32 = 2500;
pub const OLDER_ADULT_AGE: u32 = 50;
/// 23:30
pub const LATEST_BEDTIME_MINUTES: i64 = 23 * 60 + 30;
/// 07:30
pub const LATEST_WAKE_MINUTES: i64 = 7 * 60 + 30;

pub const INCREASE_STEPS: Recommendation = Recommendation::new(
    &[],
    "Increase your step count to around 8,000-10,000 per day to support better sleep recovery.",
);
pub const INCREASE_EXPENDITURE: Recommendation = Recommendation::new(
    &[],
    "Incorporate more movement or workouts so your daily energy expenditure reaches 2,500+ calories.",
);
pub const IMPROVE_DIET: Recommendation = Recommendation::new(
    &[],
    "Your diet seems less supportive of sleep - add fruits, vegetables, whole grains, and sources of magnesium or tryptophan to promote melatonin production.",
);
pub const INCREASE_ACTIVITY: Recommendation = Recommendation::new(
    &[Topic::Activity],
    "Try increasing your daily physical activity - aim for at least 30 minutes of moderate movement each day.",
);
pub const SEE_SLEEP_SPECIALIST: Recommendation = Recommendation::new(
    &[],
    "Since you indicated a sleep disorder, consider consulting a sleep specialist to address the underlying causes.",
);
pub const REVIEW_MEDICATION: Recommendation = Recommendation::new(
    &[],
    "Because you're using medication, check with your doctor whether it may affect your sleep cycles or timing.",
);
pub const CALMING_RITUAL: Recommendation = Recommendation::new(
    &[Topic::Meditation],
    "Because you're 50+, add calming pre-sleep rituals such as meditation or gentle stretching to promote deeper sleep.",
);
pub const DARK_COOL_ROOM: Recommendation = Recommendation::new(
    &[Topic::SleepSpace],
    "Ensure your bedroom stays dark, quiet, and cool - sleep tends to become lighter with age.",
);
pub const DAYLIGHT_EXPOSURE: Recommendation = Recommendation::new(
    &[Topic::Schedule, Topic::Screen],
    "Seek bright daylight exposure during the day and reduce blue-light exposure in the evening to support circadian rhythms.",
);
pub const CONSISTENT_TIMES: Recommendation = Recommendation::new(
    &[Topic::Schedule],
    "For your age group, consistent bed and wake times are key to sustaining strong sleep quality.",
);
pub const EARLIER_BEDTIME: Recommendation = Recommendation::new(
    &[],
    "Shift your bedtime closer to 22:00-23:00 to align with deeper restorative sleep cycles.",
);
pub const EARLIER_WAKE: Recommendation = Recommendation::new(
    &[Topic::Schedule],
    "Try waking up before 07:30 and keep that schedule steady to reinforce your circadian rhythm.",
);

/// General sleep-hygiene tips, in display order
pub const GENERAL_ACTIONS: [Recommendation; 5] = [
    Recommendation::new(
        &[Topic::Schedule],
        "Stick to a consistent sleep schedule every day, even on weekends, to reinforce your sleep-wake rhythm (Mayo Clinic).",
    ),
    Recommendation::new(
        &[Topic::SleepSpace, Topic::Screen],
        "Optimize your sleep space by keeping it cool, dark, quiet, and screen free before bed so you fall asleep faster (Harvard Health).",
    ),
    Recommendation::new(
        &[Topic::Activity],
        "Stay physically active with regular moderate exercise, which improves sleep quality and reduces disturbances (PMC).",
    ),
    Recommendation::new(
        &[],
        "Limit heavy meals, caffeine, nicotine, and alcohol close to bedtime to avoid disrupting sleep architecture (Mayo Clinic).",
    ),
    Recommendation::new(
        &[Topic::Meditation],
        "Wind down with relaxing rituals such as reading, light stretching, or meditation to lower stress before bed (NHS).",
    ),
];

/// Insertion-ordered recommendation set; re-inserting the same text is a no-op
#[derive(Debug, Default)]
pub struct RecommendationSet {
    items: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recommendation: Recommendation) {
        if !self.items.iter().any(|r| r.text == recommendation.text) {
            self.items.push(recommendation);
        }
    }

    /// Whether any recommendation already present shares a topic with `candidate`
    pub fn overlaps(&self, candidate: &Recommendation) -> bool {
        candidate
            .topics
            .iter()
            .any(|topic| self.items.iter().any(|r| r.covers(*topic)))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.items.iter()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.items.into_iter().map(|r| r.text.to_string()).collect()
    }
}

/// Evaluate the conditional rules in their fixed order
pub fn conditional_recommendations(raw: &RawSubmission) -> RecommendationSet {
    let mut set = RecommendationSet::new();

    if raw.daily_steps < MIN_DAILY_STEPS {
        set.push(INCREASE_STEPS);
    }

    if raw.calories_burned < MIN_CALORIES_BURNED {
        set.push(INCREASE_EXPENDITURE);
    }

    if !matches!(
        DietaryHabits::from_label(&raw.dietary_habits),
        Some(DietaryHabits::Healthy | DietaryHabits::Medium)
    ) {
        set.push(IMPROVE_DIET);
    }

    if !matches!(
        ActivityLevel::from_label(&raw.activity_level),
        Some(ActivityLevel::Medium | ActivityLevel::High)
    ) {
        set.push(INCREASE_ACTIVITY);
    }

    if raw.sleep_disorders {
        set.push(SEE_SLEEP_SPECIALIST);
    }

    if raw.medication_usage {
        set.push(REVIEW_MEDICATION);
    }

    if raw.age >= OLDER_ADULT_AGE {
        set.push(CALMING_RITUAL);
        set.push(DARK_COOL_ROOM);
        set.push(DAYLIGHT_EXPOSURE);
    } else {
        set.push(CONSISTENT_TIMES);
    }

    if convert_to_minutes(raw.bedtime.as_deref()) > LATEST_BEDTIME_MINUTES {
        set.push(EARLIER_BEDTIME);
    }

    if convert_to_minutes(raw.wakeup_time.as_deref()) > LATEST_WAKE_MINUTES {
        set.push(EARLIER_WAKE);
    }

    set
}

/// Append general tips whose topics are not already covered
pub fn backfill_general_actions(set: &mut RecommendationSet) {
    for action in GENERAL_ACTIONS {
        if !set.overlaps(&action) {
            set.push(action);
        }
    }
}

/// Full recommendation list for a submission
pub fn recommend(raw: &RawSubmission) -> Vec<String> {
    let mut set = conditional_recommendations(raw);
    backfill_general_actions(&mut set);
    set.into_texts()
}
