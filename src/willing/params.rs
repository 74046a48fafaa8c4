use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Tunables of the willingness engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WillingParams {
    pub intention_decay_rate: f64,
    /// Seconds a message timestamp counts toward traffic density
    pub message_expiration_time: f64,
    pub number_of_message_storage: usize,
    pub basic_maximum_willing: f64,
    pub mention_willing_gain: f64,
    pub interest_willing_gain: f64,
    pub emoji_response_penalty: f64,
    pub down_frequency_rate: f64,
    pub single_chat_gain: f64,
}

impl Default for WillingParams {
    fn default() -> Self {
        Self {
            intention_decay_rate: 0.93,
            message_expiration_time: 120.0,
            number_of_message_storage: 10,
            basic_maximum_willing: 0.5,
            mention_willing_gain: 0.6,
            interest_willing_gain: 0.3,
            emoji_response_penalty: 0.1,
            down_frequency_rate: 3.0,
            single_chat_gain: 0.15,
        }
    }
}

impl WillingParams {
    /// Adjustable keys with a short description of each
    pub fn variable_parameters() -> BTreeMap<&'static str, &'static str> {
        BTreeMap::from([
            ("intention_decay_rate", "willingness decay rate per tick"),
            ("message_expiration_time", "message expiration time (seconds)"),
            ("number_of_message_storage", "number of message times kept per chat"),
            ("basic_maximum_willing", "maximum chat baseline willingness"),
            ("mention_willing_gain", "willingness gain when mentioned"),
            ("interest_willing_gain", "willingness gain from interest"),
            ("emoji_response_penalty", "probability factor for emoji-only messages"),
            ("down_frequency_rate", "probability divisor for low-frequency groups"),
            ("single_chat_gain", "repeat-speaker gain per streak step"),
        ])
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "intention_decay_rate" => Some(self.intention_decay_rate),
            "message_expiration_time" => Some(self.message_expiration_time),
            "number_of_message_storage" => Some(self.number_of_message_storage as f64),
            "basic_maximum_willing" => Some(self.basic_maximum_willing),
            "mention_willing_gain" => Some(self.mention_willing_gain),
            "interest_willing_gain" => Some(self.interest_willing_gain),
            "emoji_response_penalty" => Some(self.emoji_response_penalty),
            "down_frequency_rate" => Some(self.down_frequency_rate),
            "single_chat_gain" => Some(self.single_chat_gain),
            _ => None,
        }
    }

    /// Set one tunable. Unknown keys are logged and ignored.
    pub fn set(&mut self, key: &str, value: f64) -> bool {
        match key {
            "intention_decay_rate" => self.intention_decay_rate = value,
            "message_expiration_time" => self.message_expiration_time = value,
            "number_of_message_storage" => {
                self.number_of_message_storage = value.max(1.0).round() as usize
            }
            "basic_maximum_willing" => self.basic_maximum_willing = value,
            "mention_willing_gain" => self.mention_willing_gain = value,
            "interest_willing_gain" => self.interest_willing_gain = value,
            "emoji_response_penalty" => self.emoji_response_penalty = value,
            "down_frequency_rate" => self.down_frequency_rate = value,
            "single_chat_gain" => self.single_chat_gain = value,
            _ => {
                debug!("ignoring unknown parameter {}", key);
                return false;
            }
        }
        debug!("parameter {} set to {}", key, value);
        true
    }
}
