use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "affinity")]
#[command(about = "Relationship scoring and reply willingness for chat agents")]
#[command(version)]
pub struct Args {
    /// Data directory (defaults to the user config dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the relationship level for a value
    Level {
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
    /// Apply an emotion/stance observation to a person
    Update {
        /// User id on the platform
        user_id: String,
        /// Emotion label (开心, 愤怒, ... or joy, anger, ...)
        label: String,
        /// Stance (支持/中立/反对 or supporting/neutral/opposing)
        stance: String,
        #[arg(long, default_value = "qq")]
        platform: String,
        #[arg(long)]
        nickname: Option<String>,
        /// Why the change happened, logged alongside it
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show the prompt summary for a person
    Summary {
        user_id: String,
        #[arg(long, default_value = "qq")]
        platform: String,
        #[arg(long)]
        nickname: Option<String>,
    },
    /// Replay a scripted group conversation through both engines
    Simulate {
        /// Number of messages to replay
        #[arg(long, default_value = "12")]
        messages: usize,
        /// Number of distinct speakers
        #[arg(long, default_value = "3")]
        speakers: usize,
        /// Mention the agent every N messages (0 = never)
        #[arg(long, default_value = "4")]
        mention_every: usize,
        /// Reply when probability reaches this threshold
        #[arg(long, default_value = "0.5")]
        threshold: f64,
    },
    /// List willingness parameters
    Params {
        /// Set a parameter, as key=value
        #[arg(long)]
        set: Vec<String>,
    },
}
