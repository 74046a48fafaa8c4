use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::core::person::{FieldPredicate, NICKNAME, PERSON_NAME, RELATIONSHIP_VALUE};
use crate::core::{MoodState, PersonRecord, PersonRef, PersonStore, Result};
use crate::emotion::{Emotion, Polarity, Stance};

pub const VALUE_MIN: f64 = -1000.0;
pub const VALUE_MAX: f64 = 1000.0;

/// Gain applied for a streak of |n| same-polarity reactions.
pub const GAIN_COEFFICIENT: [f64; 8] = [1.0, 1.0, 1.1, 1.2, 1.4, 1.7, 1.9, 2.0];
const MAX_STREAK: i32 = 7;

/// Persons above this value count toward the crowding factor.
const CROWDED_VALUE: f64 = 700.0;
/// Positive gains above this value are slowed by the crowding factor.
const CROWDING_ONSET: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationshipLevel {
    Disgust,
    Cold,
    Normal,
    Friendly,
    Fond,
    Intimate,
}

impl RelationshipLevel {
    pub fn from_value(value: f64) -> Self {
        if value < -227.0 {
            RelationshipLevel::Disgust
        } else if value < -73.0 {
            RelationshipLevel::Cold
        } else if value < 227.0 {
            RelationshipLevel::Normal
        } else if value < 587.0 {
            RelationshipLevel::Friendly
        } else if value < 900.0 {
            RelationshipLevel::Fond
        } else {
            RelationshipLevel::Intimate
        }
    }

    /// Level number, 0..=5
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Level centred on `Normal`: -2..=3
    pub fn signed(&self) -> i32 {
        self.index() as i32 - 2
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelationshipLevel::Disgust => "厌恶",
            RelationshipLevel::Cold => "冷漠",
            RelationshipLevel::Normal => "一般",
            RelationshipLevel::Friendly => "友好",
            RelationshipLevel::Fond => "喜欢",
            RelationshipLevel::Intimate => "暧昧",
        }
    }

    /// How replies to this person should sound
    pub fn reply_posture(&self) -> &'static str {
        match self {
            RelationshipLevel::Disgust => "厌恶回应",
            RelationshipLevel::Cold => "冷淡回复",
            RelationshipLevel::Normal => "保持理性",
            RelationshipLevel::Friendly => "愿意回复",
            RelationshipLevel::Fond => "积极回复",
            RelationshipLevel::Intimate => "无条件支持",
        }
    }
}

impl std::fmt::Display for RelationshipLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map a relationship value to its level. Out-of-range values land on the
/// nearest terminal level.
pub fn level_of(value: f64) -> RelationshipLevel {
    RelationshipLevel::from_value(value)
}

pub fn clamp_value(value: f64) -> f64 {
    value.clamp(VALUE_MIN, VALUE_MAX)
}

/// Read a stored relationship value as a float. Unset is 0.0; anything
/// that cannot be read as a number is 0.0 with a warning.
pub fn ensure_float(value: Option<&Value>, person_id: &str) -> f64 {
    let parsed = match value {
        None | Some(Value::Null) => return 0.0,
        Some(value) => numeric_value(value),
    };

    match parsed {
        Some(v) => v,
        None => {
            warn!(
                "relationship value for {} could not be read (raw: {:?}), using 0",
                person_id, value
            );
            0.0
        }
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Emotion-driven change before crowding and mood coupling.
///
/// Moves toward the bound on the current side are flattened by a cosine,
/// moves back toward zero are scaled by an exponential of the old value.
/// A stance that contradicts the emotion cancels the change.
pub fn damped_change(old: f64, emotion: Emotion, stance: Stance) -> f64 {
    let base = emotion.base_value();
    let rising = base >= 0.0;

    if (rising && stance == Stance::Opposing) || (!rising && stance == Stance::Supporting) {
        return 0.0;
    }

    let toward_bound = (PI * old / 2000.0).cos();
    let away_from_bound = (old / 2000.0).exp();

    match (old >= 0.0, rising) {
        (true, true) | (false, false) => base * toward_bound,
        (true, false) | (false, true) => base * away_from_bound,
    }
}

/// Slowdown for gains above 500 given how many persons sit above 700.
/// `crowded` includes the person being updated when their own value is
/// above 700, which the smaller offset compensates for.
pub fn crowding_factor(old: f64, crowded: usize) -> f64 {
    if old > CROWDED_VALUE {
        3.0 / (crowded as f64 + 2.0)
    } else {
        3.0 / (crowded as f64 + 3.0)
    }
}

/// Result of one relationship update
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipUpdate {
    pub nickname: String,
    pub old_value: f64,
    pub delta: f64,
    pub new_value: f64,
    pub level: RelationshipLevel,
}

/// Relationship value update law plus the cross-person streak counter
pub struct RelationshipEngine {
    store: Arc<dyn PersonStore>,
    mood: Arc<dyn MoodState>,
    positive_feedback: AtomicI32,
}

impl RelationshipEngine {
    pub fn new(store: Arc<dyn PersonStore>, mood: Arc<dyn MoodState>) -> Self {
        Self {
            store,
            mood,
            positive_feedback: AtomicI32::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn PersonStore> {
        &self.store
    }

    /// Current streak, -7..=7
    pub fn streak(&self) -> i32 {
        self.positive_feedback.load(Ordering::SeqCst)
    }

    /// Gain coefficient for the current streak
    pub fn gain(&self) -> f64 {
        GAIN_COEFFICIENT[self.streak().unsigned_abs() as usize]
    }

    /// Stored value for the person, clamped to the valid range
    pub async fn stored_value(&self, person_id: &str) -> Result<f64> {
        let raw = self.store.get_value(person_id, RELATIONSHIP_VALUE).await?;
        Ok(clamp_value(ensure_float(raw.as_ref(), person_id)))
    }

    pub async fn level_for(&self, person_id: &str) -> Result<RelationshipLevel> {
        Ok(level_of(self.stored_value(person_id).await?))
    }

    /// Advance the streak counter for one observed emotion
    pub fn record_polarity(&self, emotion: Emotion) -> i32 {
        let step = |v: i32| match emotion.polarity() {
            Polarity::Positive if (0..MAX_STREAK).contains(&v) => v + 1,
            Polarity::Positive if v < 0 => 0,
            Polarity::Negative if (-MAX_STREAK + 1..=0).contains(&v) => v - 1,
            Polarity::Negative if v > 0 => 0,
            _ => v,
        };

        let previous = self
            .positive_feedback
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(step(v)))
            .unwrap_or_else(|v| v);
        let current = step(previous);

        if current.abs() > 1 {
            info!(
                "streak gain active, coefficient {}",
                GAIN_COEFFICIENT[current.unsigned_abs() as usize]
            );
        }
        current
    }

    /// Amplify or damp a change depending on whether it agrees with the
    /// agent's current mood.
    pub fn mood_feedback(&self, value: f64) -> f64 {
        let valence = self.mood.current_valence();
        let mood_gain = valence.powi(2) * 1f64.copysign(value * valence);
        info!("relationship mood gain {:.3}", mood_gain);
        value + value * mood_gain
    }

    /// Scale a mood change by the streak gain: amplified when the streak
    /// runs the same way, damped otherwise.
    pub fn feedback_to_mood(&self, mood_value: f64) -> f64 {
        let streak = self.streak();
        let coefficient = GAIN_COEFFICIENT[streak.unsigned_abs() as usize];
        if (mood_value > 0.0 && streak > 0) || (mood_value < 0.0 && streak < 0) {
            mood_value * coefficient
        } else {
            mood_value / coefficient
        }
    }

    async fn crowded_count(&self) -> Result<usize> {
        let above: FieldPredicate<'_> =
            &|v: &Value| numeric_value(v).map_or(false, |x| x > CROWDED_VALUE);
        Ok(self.store.values_matching(RELATIONSHIP_VALUE, above).await?.len())
    }

    /// Apply one emotion/stance observation to the person's relationship value
    pub async fn update_relationship(
        &self,
        person: &PersonRef,
        emotion: Emotion,
        stance: Stance,
    ) -> Result<RelationshipUpdate> {
        self.apply_update(person, emotion, stance, None).await
    }

    pub async fn update_relationship_with_reason(
        &self,
        person: &PersonRef,
        emotion: Emotion,
        stance: Stance,
        reason: &str,
    ) -> Result<RelationshipUpdate> {
        self.apply_update(person, emotion, stance, Some(reason)).await
    }

    async fn apply_update(
        &self,
        person: &PersonRef,
        emotion: Emotion,
        stance: Stance,
        reason: Option<&str>,
    ) -> Result<RelationshipUpdate> {
        let person_id = self.store.person_id(&person.platform, &person.user_id);
        let old_value = self.stored_value(&person_id).await?;

        let mut value = damped_change(old_value, emotion, stance);
        if old_value > CROWDING_ONSET && value > 0.0 {
            value *= crowding_factor(old_value, self.crowded_count().await?);
        }

        self.record_polarity(emotion);
        let value = self.mood_feedback(value);

        let new_value = old_value + value;
        let level = level_of(new_value);

        info!(
            "user: {}, relation: {}, value: {:.2}, stance-emotion: {}-{}, change: {:+.5}{}",
            person.nickname,
            level.label(),
            old_value,
            stance,
            emotion,
            value,
            reason.map(|r| format!(", reason: {}", r)).unwrap_or_default()
        );

        self.store
            .update_field(
                &person_id,
                RELATIONSHIP_VALUE,
                Value::from(new_value),
                Some(PersonRecord::for_person(person)),
            )
            .await?;

        Ok(RelationshipUpdate {
            nickname: person.nickname.clone(),
            old_value,
            delta: value,
            new_value,
            level,
        })
    }

    /// Attitude line for the reply prompt
    pub async fn build_relationship_summary(&self, person: &PersonRef) -> Result<String> {
        let person_id = self.store.person_id(&person.platform, &person.user_id);
        let level = self.level_for(&person_id).await?;

        Ok(format!(
            "你对昵称为'({}){}'的用户的态度为{}，回复态度为{}，关系等级为{}。",
            person.user_id,
            person.nickname,
            level.label(),
            level.reply_posture(),
            level.index()
        ))
    }

    pub async fn is_known(&self, platform: &str, user_id: &str) -> Result<bool> {
        let person_id = self.store.person_id(platform, user_id);
        self.store.is_known(&person_id).await
    }

    /// Whether the agent already has a name for this person
    pub async fn is_named(&self, platform: &str, user_id: &str) -> Result<bool> {
        let person_id = self.store.person_id(platform, user_id);
        if !self.store.has_field(&person_id, PERSON_NAME).await? {
            return Ok(false);
        }
        let name = self.store.get_value(&person_id, PERSON_NAME).await?;
        Ok(!matches!(name, None | Some(Value::Null)))
    }

    /// Record a newly met person: nickname, plus a name if none is set
    pub async fn first_knowing(&self, person: &PersonRef) -> Result<()> {
        let person_id = self.store.person_id(&person.platform, &person.user_id);
        let seed = PersonRecord::for_person(person);

        self.store
            .update_field(&person_id, NICKNAME, Value::from(person.nickname.clone()), Some(seed))
            .await?;

        if !self.is_named(&person.platform, &person.user_id).await? {
            let name = display_name(&person.nickname, person.cardname.as_deref().unwrap_or(""));
            self.store
                .update_field(&person_id, PERSON_NAME, Value::from(name), None)
                .await?;
        }
        Ok(())
    }

    /// Replace every `<platform:user_id:nickname:cardname>` token with the
    /// person's name. Returns the input unchanged if names cannot be read.
    pub async fn convert_person_signs(&self, input: &str) -> String {
        let Some(pattern) = person_sign_pattern() else {
            return input.to_string();
        };
        if !pattern.is_match(input) {
            return input.to_string();
        }

        let named: FieldPredicate<'_> = &|v: &Value| v.is_string();
        let names: HashMap<String, Value> = match self.store.values_matching(PERSON_NAME, named).await {
            Ok(names) => names,
            Err(e) => {
                warn!("failed to load person names: {}", e);
                return input.to_string();
            }
        };

        let mut result = input.to_string();
        for caps in pattern.captures_iter(input) {
            let (platform, user_id, nickname, cardname) = (&caps[1], &caps[2], &caps[3], &caps[4]);
            let person_id = self.store.person_id(platform, user_id);
            let name = names
                .get(&person_id)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| display_name(nickname, cardname));
            result = result.replace(&caps[0], &name);
        }
        result
    }
}

fn display_name(nickname: &str, cardname: &str) -> String {
    if nickname.trim().is_empty() {
        cardname.trim().to_string()
    } else {
        nickname.trim().to_string()
    }
}

fn person_sign_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"<([^:]+):(\d+):([^:]+):([^>]+)>").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MemoryPersonStore, MoodHandle};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Mutex;

    fn engine_with_mood(valence: f64) -> (RelationshipEngine, Arc<MemoryPersonStore>) {
        let store = Arc::new(MemoryPersonStore::new());
        let mood = Arc::new(MoodHandle::new(valence));
        (RelationshipEngine::new(store.clone(), mood), store)
    }

    fn alice() -> PersonRef {
        PersonRef::new("qq", "10001", "alice")
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_of(-1000.0).index(), 0);
        assert_eq!(level_of(-227.0).index(), 1);
        assert_eq!(level_of(-227.001).index(), 0);
        assert_eq!(level_of(-73.0).index(), 2);
        assert_eq!(level_of(226.999).index(), 2);
        assert_eq!(level_of(227.0).index(), 3);
        assert_eq!(level_of(587.0).index(), 4);
        assert_eq!(level_of(900.0).index(), 5);
        assert_eq!(level_of(1000.0).index(), 5);
        assert_eq!(level_of(5000.0), RelationshipLevel::Intimate);
        assert_eq!(level_of(-5000.0), RelationshipLevel::Disgust);
    }

    #[test]
    fn test_signed_level() {
        assert_eq!(RelationshipLevel::Normal.signed(), 0);
        assert_eq!(RelationshipLevel::Disgust.signed(), -2);
        assert_eq!(RelationshipLevel::Intimate.signed(), 3);
    }

    proptest! {
        #[test]
        fn level_is_monotonic(a in -1200.0f64..1200.0, b in -1200.0f64..1200.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_of(lo) <= level_of(hi));
        }
    }

    #[test]
    fn test_ensure_float() {
        assert_eq!(ensure_float(None, "p"), 0.0);
        assert_eq!(ensure_float(Some(&json!(12.5)), "p"), 12.5);
        assert_eq!(ensure_float(Some(&json!("-3.5")), "p"), -3.5);
        assert_eq!(ensure_float(Some(&json!("abc")), "p"), 0.0);
        assert_eq!(ensure_float(Some(&json!({"v": 1})), "p"), 0.0);
    }

    #[test]
    fn test_damping_zones() {
        // flattening toward +1000
        assert!(close(damped_change(0.0, Emotion::Joy, Stance::Supporting), 1.5));
        assert!(damped_change(999.0, Emotion::Joy, Stance::Neutral) < 0.01);
        // worsening accelerates when high
        assert!(close(
            damped_change(1000.0, Emotion::Anger, Stance::Neutral),
            -2.0 * 0.5f64.exp()
        ));
        // recovering is slow when very negative
        assert!(close(
            damped_change(-1000.0, Emotion::Joy, Stance::Neutral),
            1.5 * (-0.5f64).exp()
        ));
        // worsening flattens toward -1000
        assert!(damped_change(-999.0, Emotion::Anger, Stance::Opposing).abs() < 0.01);
    }

    #[test]
    fn test_stance_conflict_cancels() {
        assert_eq!(damped_change(100.0, Emotion::Joy, Stance::Opposing), 0.0);
        assert_eq!(damped_change(100.0, Emotion::Anger, Stance::Supporting), 0.0);
        assert_eq!(damped_change(-100.0, Emotion::Shyness, Stance::Opposing), 0.0);
        assert_eq!(damped_change(-100.0, Emotion::Fear, Stance::Supporting), 0.0);
    }

    #[test]
    fn test_crowding_factor() {
        assert!(close(crowding_factor(600.0, 0), 1.0));
        assert!(close(crowding_factor(600.0, 3), 0.5));
        assert!(close(crowding_factor(800.0, 1), 1.0));
        assert!(close(crowding_factor(800.0, 4), 0.5));
    }

    #[tokio::test]
    async fn test_neutral_mood_joy_from_zero() {
        let (engine, store) = engine_with_mood(0.0);
        let update = engine
            .update_relationship(&alice(), Emotion::Joy, Stance::Supporting)
            .await
            .unwrap();

        assert!(close(update.delta, 1.5));
        assert_eq!(update.level, RelationshipLevel::Normal);
        assert_eq!(update.level.index(), 2);

        let stored = store
            .get_value(&alice().person_id(), RELATIONSHIP_VALUE)
            .await
            .unwrap();
        assert_eq!(stored.and_then(|v| v.as_f64()), Some(1.5));
        assert!(store.has_field(&alice().person_id(), NICKNAME).await.unwrap());
    }

    #[tokio::test]
    async fn test_crowding_slows_high_values() {
        let (engine, store) = engine_with_mood(0.0);
        let id = alice().person_id();
        store.update_field(&id, RELATIONSHIP_VALUE, json!(800.0), None).await.unwrap();
        store.update_field("other1", RELATIONSHIP_VALUE, json!(750.0), None).await.unwrap();
        store.update_field("other2", RELATIONSHIP_VALUE, json!(910.0), None).await.unwrap();
        store.update_field("other3", RELATIONSHIP_VALUE, json!(650.0), None).await.unwrap();

        let update = engine
            .update_relationship(&alice(), Emotion::Joy, Stance::Neutral)
            .await
            .unwrap();

        let expected = 1.5 * (PI * 800.0 / 2000.0).cos() * 3.0 / 5.0;
        assert!(close(update.delta, expected));
    }

    #[tokio::test]
    async fn test_crowding_counts_numeric_strings() {
        let (engine, store) = engine_with_mood(0.0);
        let id = alice().person_id();
        store.update_field(&id, RELATIONSHIP_VALUE, json!(800.0), None).await.unwrap();
        store.update_field("other1", RELATIONSHIP_VALUE, json!("750"), None).await.unwrap();
        store.update_field("other2", RELATIONSHIP_VALUE, json!(" 910.5 "), None).await.unwrap();
        store.update_field("other3", RELATIONSHIP_VALUE, json!("lots"), None).await.unwrap();

        let update = engine
            .update_relationship(&alice(), Emotion::Joy, Stance::Neutral)
            .await
            .unwrap();

        let expected = 1.5 * (PI * 800.0 / 2000.0).cos() * 3.0 / 5.0;
        assert!(close(update.delta, expected));
    }

    #[tokio::test]
    async fn test_clamped_on_read() {
        let (engine, store) = engine_with_mood(0.0);
        let id = alice().person_id();
        store.update_field(&id, RELATIONSHIP_VALUE, json!(1000.5), None).await.unwrap();

        assert_eq!(engine.stored_value(&id).await.unwrap(), 1000.0);

        let update = engine
            .update_relationship(&alice(), Emotion::Anger, Stance::Neutral)
            .await
            .unwrap();
        assert_eq!(update.old_value, 1000.0);
        assert!(close(update.new_value, 1000.0 - 2.0 * 0.5f64.exp()));
    }

    #[tokio::test]
    async fn test_non_numeric_value_treated_as_zero() {
        let (engine, store) = engine_with_mood(0.0);
        let id = alice().person_id();
        store.update_field(&id, RELATIONSHIP_VALUE, json!("lots"), None).await.unwrap();

        let update = engine
            .update_relationship(&alice(), Emotion::Calm, Stance::Neutral)
            .await
            .unwrap();
        assert_eq!(update.old_value, 0.0);
        assert!(close(update.new_value, 0.3));
    }

    #[tokio::test]
    async fn test_mood_coupling() {
        let (happy, _) = engine_with_mood(1.0);
        assert!(close(happy.mood_feedback(1.5), 3.0));
        assert!(close(happy.mood_feedback(-1.0), 0.0));

        let (sad, _) = engine_with_mood(-1.0);
        assert!(close(sad.mood_feedback(-1.0), -2.0));
        assert!(close(sad.mood_feedback(1.5), 0.0));

        let (calm, _) = engine_with_mood(0.0);
        assert!(close(calm.mood_feedback(1.5), 1.5));

        let (mild, _) = engine_with_mood(0.5);
        assert!(close(mild.mood_feedback(2.0), 2.5));
    }

    #[tokio::test]
    async fn test_streak_saturates_and_resets() {
        let (engine, _) = engine_with_mood(0.0);
        for _ in 0..9 {
            engine.record_polarity(Emotion::Joy);
        }
        assert_eq!(engine.streak(), 7);
        assert_eq!(engine.gain(), 2.0);

        engine.record_polarity(Emotion::Calm);
        assert_eq!(engine.streak(), 7);

        engine.record_polarity(Emotion::Anger);
        assert_eq!(engine.streak(), 0);

        for _ in 0..10 {
            engine.record_polarity(Emotion::Fear);
        }
        assert_eq!(engine.streak(), -7);

        engine.record_polarity(Emotion::Surprise);
        assert_eq!(engine.streak(), 0);
    }

    #[tokio::test]
    async fn test_streak_is_shared_across_persons() {
        let (engine, _) = engine_with_mood(0.0);
        let bob = PersonRef::new("qq", "10002", "bob");

        engine.update_relationship(&alice(), Emotion::Joy, Stance::Neutral).await.unwrap();
        engine.update_relationship(&bob, Emotion::Shyness, Stance::Neutral).await.unwrap();
        assert_eq!(engine.streak(), 2);
    }

    #[tokio::test]
    async fn test_feedback_to_mood() {
        let (engine, _) = engine_with_mood(0.0);
        for _ in 0..4 {
            engine.record_polarity(Emotion::Joy);
        }
        // streak 4 -> gain 1.4
        assert!(close(engine.feedback_to_mood(1.0), 1.4));
        assert!(close(engine.feedback_to_mood(-1.4), -1.0));
    }

    #[tokio::test]
    async fn test_summary() {
        let (engine, store) = engine_with_mood(0.0);
        store
            .update_field(&alice().person_id(), RELATIONSHIP_VALUE, json!(950.0), None)
            .await
            .unwrap();

        let summary = engine.build_relationship_summary(&alice()).await.unwrap();
        assert!(summary.contains("(10001)alice"));
        assert!(summary.contains("暧昧"));
        assert!(summary.contains("无条件支持"));
        assert!(summary.contains("关系等级为5"));
    }

    #[tokio::test]
    async fn test_first_knowing_and_names() {
        let (engine, _) = engine_with_mood(0.0);
        assert!(!engine.is_known("qq", "10001").await.unwrap());
        assert!(!engine.is_named("qq", "10001").await.unwrap());

        engine.first_knowing(&alice()).await.unwrap();
        assert!(engine.is_known("qq", "10001").await.unwrap());
        assert!(engine.is_named("qq", "10001").await.unwrap());
    }

    /// Store that derives its own person ids
    #[derive(Default)]
    struct PrefixedStore {
        inner: MemoryPersonStore,
    }

    #[async_trait]
    impl PersonStore for PrefixedStore {
        fn person_id(&self, platform: &str, user_id: &str) -> String {
            format!("{}-{}", platform, user_id)
        }

        async fn is_known(&self, person_id: &str) -> Result<bool> {
            self.inner.is_known(person_id).await
        }

        async fn get_value(&self, person_id: &str, field: &str) -> Result<Option<Value>> {
            self.inner.get_value(person_id, field).await
        }

        async fn update_field(
            &self,
            person_id: &str,
            field: &str,
            value: Value,
            seed: Option<PersonRecord>,
        ) -> Result<()> {
            self.inner.update_field(person_id, field, value, seed).await
        }

        async fn values_matching(
            &self,
            field: &str,
            predicate: FieldPredicate<'_>,
        ) -> Result<HashMap<String, Value>> {
            self.inner.values_matching(field, predicate).await
        }

        async fn has_field(&self, person_id: &str, field: &str) -> Result<bool> {
            self.inner.has_field(person_id, field).await
        }
    }

    #[tokio::test]
    async fn test_first_knowing_uses_store_ids() {
        let store = Arc::new(PrefixedStore::default());
        let engine = RelationshipEngine::new(store.clone(), Arc::new(MoodHandle::new(0.0)));

        engine.first_knowing(&alice()).await.unwrap();

        assert!(engine.is_known("qq", "10001").await.unwrap());
        assert!(engine.is_named("qq", "10001").await.unwrap());
        assert_eq!(
            store.get_value("qq-10001", NICKNAME).await.unwrap(),
            Some(json!("alice"))
        );
        assert!(!store.is_known(&alice().person_id()).await.unwrap());
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mood_gain_logged_at_info() {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let (engine, _) = engine_with_mood(0.5);
        tracing::subscriber::with_default(subscriber, || {
            engine.mood_feedback(1.0);
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("INFO"));
        assert!(output.contains("relationship mood gain 0.250"));
    }

    #[tokio::test]
    async fn test_convert_person_signs() {
        let (engine, store) = engine_with_mood(0.0);
        store
            .update_field(&alice().person_id(), PERSON_NAME, json!("小爱"), None)
            .await
            .unwrap();

        let text = "<qq:10001:alice:card> said hi to <qq:20002:bob:bobcard>";
        let converted = engine.convert_person_signs(text).await;
        assert_eq!(converted, "小爱 said hi to bob");

        let plain = "nothing to replace";
        assert_eq!(engine.convert_person_signs(plain).await, plain);
    }
}
