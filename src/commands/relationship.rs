use anyhow::Result;
use std::path::PathBuf;

use affinity::config::Config;
use affinity::{level_of, Emotion, Stance};

use super::{person, relationship_engine};

pub fn handle_level(value: f64) {
    let level = level_of(value);
    println!("{:.2} → level {} ({}, {})", value, level.index(), level.label(), level.reply_posture());
}

pub async fn handle_update(
    data_dir: Option<PathBuf>,
    platform: String,
    user_id: String,
    nickname: Option<String>,
    label: String,
    stance: String,
    reason: Option<String>,
) -> Result<()> {
    let emotion: Emotion = label.parse()?;
    let stance: Stance = stance.parse()?;

    let config = Config::new(data_dir)?;
    let engine = relationship_engine(&config)?;
    let person = person(platform, user_id, nickname);

    let update = match reason {
        Some(reason) => {
            engine
                .update_relationship_with_reason(&person, emotion, stance, &reason)
                .await?
        }
        None => engine.update_relationship(&person, emotion, stance).await?,
    };

    println!("👤 {}", update.nickname);
    println!("Relationship Change: {:+.5}", update.delta);
    println!("Value: {:.2} → {:.2}", update.old_value, update.new_value);
    println!("Level: {} ({})", update.level.index(), update.level.label());

    Ok(())
}

pub async fn handle_summary(
    data_dir: Option<PathBuf>,
    platform: String,
    user_id: String,
    nickname: Option<String>,
) -> Result<()> {
    let config = Config::new(data_dir)?;
    let engine = relationship_engine(&config)?;
    let person = person(platform, user_id, nickname);

    println!("{}", engine.build_relationship_summary(&person).await?);
    Ok(())
}
