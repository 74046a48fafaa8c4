use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::error::Result;
use super::person::{FieldPredicate, PersonRecord, PersonStore};

type Records = HashMap<String, Map<String, Value>>;

fn seed_fields(seed: Option<PersonRecord>) -> Result<Map<String, Value>> {
    match seed.map(serde_json::to_value).transpose()? {
        Some(Value::Object(fields)) => Ok(fields),
        _ => Ok(Map::new()),
    }
}

fn write_field(
    records: &mut Records,
    person_id: &str,
    field: &str,
    value: Value,
    seed: Option<PersonRecord>,
) -> Result<()> {
    let record = match records.entry(person_id.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => entry.insert(seed_fields(seed)?),
    };
    record.insert(field.to_string(), value);
    Ok(())
}

fn matching(records: &Records, field: &str, predicate: FieldPredicate<'_>) -> HashMap<String, Value> {
    records
        .iter()
        .filter_map(|(id, record)| {
            record
                .get(field)
                .filter(|value| predicate(*value))
                .map(|value| (id.clone(), value.clone()))
        })
        .collect()
}

/// In-memory person store
#[derive(Debug, Default)]
pub struct MemoryPersonStore {
    records: RwLock<Records>,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    async fn is_known(&self, person_id: &str) -> Result<bool> {
        Ok(self.records.read().await.contains_key(person_id))
    }

    async fn get_value(&self, person_id: &str, field: &str) -> Result<Option<Value>> {
        Ok(self
            .records
            .read()
            .await
            .get(person_id)
            .and_then(|record| record.get(field))
            .cloned())
    }

    async fn update_field(
        &self,
        person_id: &str,
        field: &str,
        value: Value,
        seed: Option<PersonRecord>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        write_field(&mut records, person_id, field, value, seed)
    }

    async fn values_matching(
        &self,
        field: &str,
        predicate: FieldPredicate<'_>,
    ) -> Result<HashMap<String, Value>> {
        Ok(matching(&*self.records.read().await, field, predicate))
    }

    async fn has_field(&self, person_id: &str, field: &str) -> Result<bool> {
        Ok(self
            .records
            .read()
            .await
            .get(person_id)
            .map_or(false, |record| record.contains_key(field)))
    }
}

/// JSON-file person store
///
/// Keeps the whole person map in memory and rewrites the file after every
/// field update.
#[derive(Debug)]
pub struct JsonPersonStore {
    path: PathBuf,
    records: RwLock<Records>,
}

impl JsonPersonStore {
    /// Open the store at `path`, loading existing records if the file exists
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Records::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Records::new()
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    async fn save(&self, records: &Records) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl PersonStore for JsonPersonStore {
    async fn is_known(&self, person_id: &str) -> Result<bool> {
        Ok(self.records.read().await.contains_key(person_id))
    }

    async fn get_value(&self, person_id: &str, field: &str) -> Result<Option<Value>> {
        Ok(self
            .records
            .read()
            .await
            .get(person_id)
            .and_then(|record| record.get(field))
            .cloned())
    }

    async fn update_field(
        &self,
        person_id: &str,
        field: &str,
        value: Value,
        seed: Option<PersonRecord>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let mut updated = records.clone();
        write_field(&mut updated, person_id, field, value, seed)?;
        self.save(&updated).await?;
        *records = updated;
        Ok(())
    }

    async fn values_matching(
        &self,
        field: &str,
        predicate: FieldPredicate<'_>,
    ) -> Result<HashMap<String, Value>> {
        Ok(matching(&*self.records.read().await, field, predicate))
    }

    async fn has_field(&self, person_id: &str, field: &str) -> Result<bool> {
        Ok(self
            .records
            .read()
            .await
            .get(person_id)
            .map_or(false, |record| record.contains_key(field)))
    }
}
