//! Scoring core for a social chat agent: relationship values per contact
//! and reply willingness per chat.

pub mod config;
pub mod core;
pub mod emotion;
pub mod logging;
pub mod relationship;
pub mod willing;

pub use crate::core::{AffinityError, MoodHandle, MoodState, PersonRef, PersonStore, Result};
pub use emotion::{Emotion, Stance};
pub use relationship::{level_of, RelationshipEngine, RelationshipLevel, RelationshipUpdate};
pub use willing::{willing_to_probability, WillingEngine, WillingParams};
