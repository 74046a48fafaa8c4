use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use affinity::config::Config;
use affinity::core::MemoryPersonStore;
use affinity::willing::{ChatMessage, ChatStream, GroupInfo};
use affinity::{Emotion, MoodHandle, MoodState, PersonRef, RelationshipEngine, Stance, WillingEngine};

const STANCES: [Stance; 3] = [Stance::Supporting, Stance::Neutral, Stance::Opposing];
const INTEREST: [f64; 4] = [0.0, 0.5, 1.5, 3.0];

pub async fn handle_simulate(
    data_dir: Option<PathBuf>,
    messages: usize,
    speakers: usize,
    mention_every: usize,
    threshold: f64,
) -> Result<()> {
    let config = Config::new(data_dir)?;
    let speakers = speakers.max(1);

    let store = Arc::new(MemoryPersonStore::new());
    let mood = Arc::new(MoodHandle::new(config.mood_valence));
    let relationship = Arc::new(RelationshipEngine::new(store, mood.clone()));
    let willing = WillingEngine::new(
        relationship.clone(),
        config.willing.clone(),
        config.talk_frequency_down_groups.clone(),
    );

    let chat_for = |speaker: usize| ChatStream {
        stream_id: "simulation".to_string(),
        user: PersonRef::new("sim", format!("{}", 1000 + speaker), format!("speaker{}", speaker)),
        group: Some(GroupInfo {
            group_id: "simulation".to_string(),
            group_name: Some("simulation".to_string()),
        }),
    };

    let mut replies = 0;
    for i in 0..messages {
        let speaker = i % speakers;
        let chat = chat_for(speaker);
        let person = chat.user.clone();
        let mentioned = mention_every > 0 && (i + 1) % mention_every == 0;
        let message_id = format!("sim-{}", i);
        let message = ChatMessage::new(message_id.clone(), format!("message {} from {}", i, person.nickname));

        willing
            .setup(message, chat, mentioned, INTEREST[i % INTEREST.len()])
            .await;
        let probability = willing.get_reply_probability(&message_id).await;

        let outcome = if probability >= threshold {
            replies += 1;
            willing.before_generate_reply(&message_id).await;
            willing.after_generate_reply(&message_id).await;

            let emotion = Emotion::ALL[i % Emotion::ALL.len()];
            let stance = STANCES[i % STANCES.len()];
            let update = relationship.update_relationship(&person, emotion, stance).await?;
            mood.nudge(relationship.feedback_to_mood(emotion.base_value() * 0.05));

            format!("reply ({}-{} {:+.3}, level {})", stance, emotion, update.delta, update.level)
        } else {
            willing.not_reply(&message_id).await;
            "skip".to_string()
        };

        println!(
            "{:>3} {:<10} mention={:<5} p={:>5.1}% {}",
            i,
            person.nickname,
            mentioned,
            probability * 100.0,
            outcome
        );

        willing.decay_tick().await;
        if (i + 1) % 5 == 0 {
            willing.adapt_baselines_at(Utc::now()).await;
        }
    }

    println!(
        "replied to {}/{} messages, streak {}, mood {:.2}",
        replies,
        messages,
        relationship.streak(),
        mood.current_valence()
    );

    Ok(())
}
