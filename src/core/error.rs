use thiserror::Error;

#[derive(Error, Debug)]
pub enum AffinityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown emotion label: {0}")]
    UnknownEmotion(String),

    #[error("Unknown stance: {0}")]
    UnknownStance(String),
}

pub type Result<T> = std::result::Result<T, AffinityError>;
