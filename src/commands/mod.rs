use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use affinity::config::Config;
use affinity::core::JsonPersonStore;
use affinity::{MoodHandle, PersonRef, RelationshipEngine, WillingParams};

mod relationship;
mod simulate;

pub use relationship::{handle_level, handle_summary, handle_update};
pub use simulate::handle_simulate;

fn relationship_engine(config: &Config) -> Result<RelationshipEngine> {
    let store = JsonPersonStore::open(config.relationships_file())
        .context("Failed to open person store")?;
    let mood = MoodHandle::new(config.mood_valence);
    Ok(RelationshipEngine::new(Arc::new(store), Arc::new(mood)))
}

fn person(platform: String, user_id: String, nickname: Option<String>) -> PersonRef {
    let nickname = nickname.unwrap_or_else(|| user_id.clone());
    PersonRef::new(platform, user_id, nickname)
}

pub fn handle_params(data_dir: Option<PathBuf>, set: Vec<String>) -> Result<()> {
    let mut config = Config::new(data_dir)?;

    if !set.is_empty() {
        for pair in &set {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected key=value, got '{}'", pair))?;
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid number for {}", key))?;
            if !config.willing.set(key.trim(), value) {
                eprintln!("⚠️ unknown parameter {}", key.trim());
            }
        }
        config.save()?;
    }

    for (key, description) in WillingParams::variable_parameters() {
        let value = config.willing.get(key).unwrap_or_default();
        println!("{:<28} {:>8.3}  {}", key, value, description);
    }
    if !config.talk_frequency_down_groups.is_empty() {
        println!("low-frequency groups: {}", config.talk_frequency_down_groups.join(", "));
    }

    Ok(())
}
