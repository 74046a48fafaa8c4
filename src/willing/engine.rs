use chrono::{DateTime, Local, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::context::{ChatMessage, ChatStream, WillingInfo};
use super::params::WillingParams;
use crate::relationship::{RelationshipEngine, RelationshipLevel};

/// Baseline recomputation interval for quiet chats
pub const DEFAULT_BASELINE_INTERVAL: Duration = Duration::from_secs(20);
/// Willingness decay tick
pub const DECAY_INTERVAL: Duration = Duration::from_secs(3);

const MAX_RESPONDER_STREAK: u32 = 3;

/// Map willingness to a reply probability in [0, 1).
///
/// Two arctan regimes; past the knee at 2.0 the curve steepens again.
pub fn willing_to_probability(willing: f64) -> f64 {
    let willing = willing.max(0.0);
    if willing < 2.0 {
        (willing * 2.0).atan() / PI * 2.0
    } else {
        (willing * 4.0).atan() / PI * 2.0
    }
}

/// Who the agent replied to most recently, and how many times in a row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastResponder {
    pub chat_id: String,
    pub person_id: String,
    pub streak: u32,
}

impl LastResponder {
    fn matches(&self, info: &WillingInfo) -> bool {
        info.is_same_speaker(&self.chat_id, &self.person_id)
    }
}

#[derive(Debug, Default)]
struct WillingState {
    ongoing: HashMap<String, WillingInfo>,
    chat_reply_willing: HashMap<String, f64>,
    chat_person_reply_willing: HashMap<String, HashMap<String, f64>>,
    chat_new_message_time: HashMap<String, VecDeque<DateTime<Utc>>>,
    last_responder: LastResponder,
    params: WillingParams,
}

impl WillingState {
    fn baseline(&mut self, chat_id: &str) -> f64 {
        let default = self.params.basic_maximum_willing;
        *self
            .chat_reply_willing
            .entry(chat_id.to_string())
            .or_insert(default)
    }

    fn willing_mut(&mut self, chat_id: &str, person_id: &str) -> &mut f64 {
        let baseline = self.baseline(chat_id);
        self.chat_person_reply_willing
            .entry(chat_id.to_string())
            .or_default()
            .entry(person_id.to_string())
            .or_insert(baseline)
    }

    fn context(&self, message_id: &str) -> Option<WillingInfo> {
        let info = self.ongoing.get(message_id).cloned();
        if info.is_none() {
            warn!("no scoring context for message {}", message_id);
        }
        info
    }
}

/// Per-chat, per-person reply willingness
pub struct WillingEngine {
    relationship: Arc<RelationshipEngine>,
    down_frequency_groups: HashSet<String>,
    state: Mutex<WillingState>,
}

impl WillingEngine {
    pub fn new(
        relationship: Arc<RelationshipEngine>,
        params: WillingParams,
        down_frequency_groups: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            relationship,
            down_frequency_groups: down_frequency_groups.into_iter().collect(),
            state: Mutex::new(WillingState {
                params,
                ..Default::default()
            }),
        }
    }

    pub async fn params(&self) -> WillingParams {
        self.state.lock().await.params.clone()
    }

    pub async fn set_parameter(&self, key: &str, value: f64) -> bool {
        self.state.lock().await.params.set(key, value)
    }

    pub async fn set_variable_parameters(&self, parameters: &HashMap<String, f64>) {
        let mut state = self.state.lock().await;
        for (key, value) in parameters {
            state.params.set(key, *value);
        }
    }

    pub async fn chat_baseline(&self, chat_id: &str) -> Option<f64> {
        self.state.lock().await.chat_reply_willing.get(chat_id).copied()
    }

    pub async fn person_willing(&self, chat_id: &str, person_id: &str) -> Option<f64> {
        self.state
            .lock()
            .await
            .chat_person_reply_willing
            .get(chat_id)
            .and_then(|persons| persons.get(person_id))
            .copied()
    }

    pub async fn last_responder(&self) -> LastResponder {
        self.state.lock().await.last_responder.clone()
    }

    /// Number of in-flight scoring contexts
    pub async fn ongoing_count(&self) -> usize {
        self.state.lock().await.ongoing.len()
    }

    /// Register a new message for scoring
    pub async fn setup(
        &self,
        message: ChatMessage,
        chat: ChatStream,
        is_mentioned: bool,
        interested_rate: f64,
    ) {
        let person_id = self
            .relationship
            .store()
            .person_id(&chat.user.platform, &chat.user.user_id);
        let message_id = message.message_id.clone();
        let info = WillingInfo::new(message, chat, person_id, is_mentioned, interested_rate);

        let mut state = self.state.lock().await;
        state.willing_mut(&info.chat_id, &info.person_id);

        let storage = state.params.number_of_message_storage;
        let times = state
            .chat_new_message_time
            .entry(info.chat_id.clone())
            .or_default();
        times.push_back(Utc::now());
        while times.len() > storage {
            times.pop_front();
        }
        debug!("chat {} holds {} recent message times", info.chat_id, times.len());

        state.ongoing.insert(message_id, info);
    }

    pub async fn before_generate_reply(&self, message_id: &str) {
        let state = self.state.lock().await;
        state.context(message_id);
    }

    /// Bookkeeping after the agent replied to `message_id`
    pub async fn after_generate_reply(&self, message_id: &str) {
        let mut state = self.state.lock().await;
        let Some(info) = state.context(message_id) else {
            return;
        };

        let level = self.relationship_level(&info.person_id).await;
        *state.willing_mut(&info.chat_id, &info.person_id) += level.signed() as f64 * 0.05;

        let last = &mut state.last_responder;
        if last.matches(&info) && last.streak < MAX_RESPONDER_STREAK {
            last.streak += 1;
        } else {
            *last = LastResponder {
                chat_id: info.chat_id.clone(),
                person_id: info.person_id.clone(),
                streak: 0,
            };
        }

        state.ongoing.remove(message_id);
    }

    /// Bookkeeping after the agent decided not to reply to `message_id`
    pub async fn not_reply(&self, message_id: &str) {
        let mut state = self.state.lock().await;
        let Some(info) = state.context(message_id) else {
            return;
        };

        if info.is_mentioned {
            *state.willing_mut(&info.chat_id, &info.person_id) += 0.2;
        }
        if state.last_responder.matches(&info) {
            let bonus = state.params.single_chat_gain * state.last_responder.streak as f64;
            *state.willing_mut(&info.chat_id, &info.person_id) += bonus;
        }

        state.ongoing.remove(message_id);
    }

    /// Small nudge for messages arriving in a burst
    pub async fn bombing_buffer_message(&self, message_id: &str) {
        let mut state = self.state.lock().await;
        if let Some(info) = state.context(message_id) {
            *state.willing_mut(&info.chat_id, &info.person_id) += 0.1;
        }
    }

    /// Drop a scoring context without touching willingness
    pub async fn delete(&self, message_id: &str) -> bool {
        self.state.lock().await.ongoing.remove(message_id).is_some()
    }

    pub async fn get_reply_probability(&self, message_id: &str) -> f64 {
        let mut state = self.state.lock().await;
        let Some(info) = state.context(message_id) else {
            return 0.0;
        };
        let params = state.params.clone();

        let mut current_willing = *state.willing_mut(&info.chat_id, &info.person_id);

        if info.is_mentioned {
            current_willing += params.mention_willing_gain / (current_willing.max(0.0).floor() + 1.0);
        }

        if info.interested_rate > 0.0 {
            current_willing +=
                (info.interested_rate / 2.0).atan() / PI * 2.0 * params.interest_willing_gain;
        }

        *state.willing_mut(&info.chat_id, &info.person_id) = current_willing;

        let level = self.relationship_level(&info.person_id).await;
        current_willing += level.signed() as f64 * 0.1;

        if state.last_responder.matches(&info) {
            current_willing += params.single_chat_gain * state.last_responder.streak as f64;
        }

        let chat_ongoing = state
            .ongoing
            .values()
            .filter(|other| other.chat_id == info.chat_id)
            .count();
        let person_ongoing = state
            .ongoing
            .values()
            .filter(|other| other.is_same_speaker(&info.chat_id, &info.person_id))
            .count();

        if person_ongoing >= 2 {
            current_willing = 0.0;
        } else if chat_ongoing == 2 {
            current_willing -= 0.5;
        } else if chat_ongoing == 3 {
            current_willing -= 1.5;
        } else if chat_ongoing >= 4 {
            current_willing = 0.0;
        }

        let mut probability = willing_to_probability(current_willing);

        if info.is_emoji {
            probability *= params.emoji_response_penalty;
        }

        if let Some(group) = &info.group_info {
            if self.down_frequency_groups.contains(&group.group_id) {
                probability /= params.down_frequency_rate;
            }
        }

        info!(
            "[{}][{}]{}:{}[willing:{:.2}][probability:{:.1}%]",
            info.message.time.with_timezone(&Local).format("%H:%M:%S"),
            info.chat.display_name(),
            info.chat.user.nickname,
            info.message.processed_plain_text,
            current_willing,
            probability * 100.0
        );

        probability
    }

    /// Move every person's willingness one step toward its chat baseline
    pub async fn decay_tick(&self) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let rate = state.params.intention_decay_rate;

        for (chat_id, persons) in state.chat_person_reply_willing.iter_mut() {
            let Some(&baseline) = state.chat_reply_willing.get(chat_id) else {
                debug!("chat {} has no baseline, skipping decay", chat_id);
                continue;
            };
            for willing in persons.values_mut() {
                *willing = baseline + (*willing - baseline) * rate;
            }
        }
    }

    /// Recompute chat baselines from recent traffic as of `now`.
    ///
    /// Returns how long to wait before the next recomputation: the
    /// shortest interval wanted by any chat.
    pub async fn adapt_baselines_at(&self, now: DateTime<Utc>) -> Duration {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let params = &state.params;
        let expiration_secs = params.message_expiration_time;
        let expiration = chrono::Duration::milliseconds((expiration_secs * 1000.0) as i64);

        let mut next: Option<f64> = None;
        for (chat_id, times) in state.chat_new_message_time.iter_mut() {
            times.retain(|t| now - *t < expiration);

            let (baseline, interval) = if times.len() < params.number_of_message_storage {
                (params.basic_maximum_willing, DEFAULT_BASELINE_INTERVAL.as_secs_f64())
            } else if times.len() == params.number_of_message_storage {
                let span = match (times.front(), times.back()) {
                    (Some(oldest), Some(newest)) => {
                        (*newest - *oldest).num_milliseconds() as f64 / 1000.0
                    }
                    _ => 0.0,
                };
                let ratio = (span / expiration_secs).max(0.0).sqrt();
                (params.basic_maximum_willing * ratio, 17.0 * ratio + 3.0)
            } else {
                debug!("chat {} holds an unexpected {} message times", chat_id, times.len());
                (0.0, DEFAULT_BASELINE_INTERVAL.as_secs_f64())
            };

            state.chat_reply_willing.insert(chat_id.clone(), baseline);
            next = Some(next.map_or(interval, |n: f64| n.min(interval)));
        }

        next.map(Duration::from_secs_f64)
            .unwrap_or(DEFAULT_BASELINE_INTERVAL)
    }

    async fn relationship_level(&self, person_id: &str) -> RelationshipLevel {
        match self.relationship.level_for(person_id).await {
            Ok(level) => level,
            Err(e) => {
                warn!("failed to read relationship for {}: {}", person_id, e);
                RelationshipLevel::Normal
            }
        }
    }
}
