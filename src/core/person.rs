use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::error::Result;

/// Field holding the persisted relationship score.
pub const RELATIONSHIP_VALUE: &str = "relationship_value";
/// Field holding the name the agent uses for a person.
pub const PERSON_NAME: &str = "person_name";
pub const NICKNAME: &str = "nickname";

/// Predicate applied to stored field values by [`PersonStore::values_matching`].
pub type FieldPredicate<'a> = &'a (dyn Fn(&Value) -> bool + Send + Sync);

/// Derive the stable person id for a platform account.
pub fn person_id_for(platform: &str, user_id: &str) -> String {
    let name = format!("{}_{}", platform, user_id);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
        .simple()
        .to_string()
}

/// A chat participant as seen by the platform adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub platform: String,
    pub user_id: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardname: Option<String>,
}

impl PersonRef {
    pub fn new(platform: impl Into<String>, user_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            user_id: user_id.into(),
            nickname: nickname.into(),
            cardname: None,
        }
    }

    pub fn person_id(&self) -> String {
        person_id_for(&self.platform, &self.user_id)
    }
}

/// Bookkeeping fields written when a person is first stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub platform: String,
    pub user_id: String,
    pub nickname: String,
    /// Unix seconds of the first write for this person.
    pub know_time: i64,
}

impl PersonRecord {
    pub fn for_person(person: &PersonRef) -> Self {
        Self {
            platform: person.platform.clone(),
            user_id: person.user_id.clone(),
            nickname: person.nickname.clone(),
            know_time: Utc::now().timestamp(),
        }
    }
}

/// Per-person key/value facts.
///
/// The scoring engines only ever read and write individual fields; how
/// the records are laid out on disk is up to the implementation.
#[async_trait]
pub trait PersonStore: Send + Sync {
    fn person_id(&self, platform: &str, user_id: &str) -> String {
        person_id_for(platform, user_id)
    }

    /// Whether any record exists for the person.
    async fn is_known(&self, person_id: &str) -> Result<bool>;

    async fn get_value(&self, person_id: &str, field: &str) -> Result<Option<Value>>;

    /// Set one field. When the person has no record yet, `seed` provides
    /// the initial bookkeeping fields.
    async fn update_field(
        &self,
        person_id: &str,
        field: &str,
        value: Value,
        seed: Option<PersonRecord>,
    ) -> Result<()>;

    /// Every person whose `field` satisfies `predicate`, keyed by person id.
    async fn values_matching(
        &self,
        field: &str,
        predicate: FieldPredicate<'_>,
    ) -> Result<HashMap<String, Value>>;

    async fn has_field(&self, person_id: &str, field: &str) -> Result<bool>;
}
