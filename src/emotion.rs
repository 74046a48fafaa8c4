use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::AffinityError;

/// Emotion label detected in an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Joy,
    Anger,
    Sadness,
    Surprise,
    Shyness,
    Calm,
    Fear,
    Disgust,
    Confusion,
}

/// Which way an emotion pushes the streak counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 9] = [
        Emotion::Joy,
        Emotion::Anger,
        Emotion::Sadness,
        Emotion::Surprise,
        Emotion::Shyness,
        Emotion::Calm,
        Emotion::Fear,
        Emotion::Disgust,
        Emotion::Confusion,
    ];

    /// Base relationship change before damping and mood coupling
    pub fn base_value(&self) -> f64 {
        match self {
            Emotion::Joy => 1.5,
            Emotion::Anger => -2.0,
            Emotion::Sadness => -0.5,
            Emotion::Surprise => 0.6,
            Emotion::Shyness => 2.0,
            Emotion::Calm => 0.3,
            Emotion::Fear => -1.5,
            Emotion::Disgust => -1.0,
            Emotion::Confusion => 0.5,
        }
    }

    /// Calm and confusion leave the streak untouched.
    pub fn polarity(&self) -> Polarity {
        match self {
            Emotion::Joy | Emotion::Surprise | Emotion::Shyness => Polarity::Positive,
            Emotion::Anger | Emotion::Sadness | Emotion::Fear | Emotion::Disgust => Polarity::Negative,
            Emotion::Calm | Emotion::Confusion => Polarity::Neutral,
        }
    }

    /// Label as produced by the emotion classifier
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Joy => "开心",
            Emotion::Anger => "愤怒",
            Emotion::Sadness => "悲伤",
            Emotion::Surprise => "惊讶",
            Emotion::Shyness => "害羞",
            Emotion::Calm => "平静",
            Emotion::Fear => "恐惧",
            Emotion::Disgust => "厌恶",
            Emotion::Confusion => "困惑",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Emotion {
    type Err = AffinityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "开心" | "joy" => Ok(Emotion::Joy),
            "愤怒" | "anger" => Ok(Emotion::Anger),
            "悲伤" | "sadness" => Ok(Emotion::Sadness),
            "惊讶" | "surprise" => Ok(Emotion::Surprise),
            "害羞" | "shyness" => Ok(Emotion::Shyness),
            "平静" | "calm" => Ok(Emotion::Calm),
            "恐惧" | "fear" => Ok(Emotion::Fear),
            "厌恶" | "disgust" => Ok(Emotion::Disgust),
            "困惑" | "confusion" => Ok(Emotion::Confusion),
            other => Err(AffinityError::UnknownEmotion(other.to_string())),
        }
    }
}

/// Conversational stance paired with an emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    Supporting,
    Neutral,
    Opposing,
}

impl Stance {
    pub fn label(&self) -> &'static str {
        match self {
            Stance::Supporting => "支持",
            Stance::Neutral => "中立",
            Stance::Opposing => "反对",
        }
    }
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Stance {
    type Err = AffinityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "支持" | "supporting" => Ok(Stance::Supporting),
            "中立" | "neutral" => Ok(Stance::Neutral),
            "反对" | "opposing" => Ok(Stance::Opposing),
            other => Err(AffinityError::UnknownStance(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.label().parse::<Emotion>().unwrap(), emotion);
        }
        assert_eq!("反对".parse::<Stance>().unwrap(), Stance::Opposing);
        assert_eq!("supporting".parse::<Stance>().unwrap(), Stance::Supporting);
    }

    #[test]
    fn test_unknown_labels_rejected() {
        assert!(matches!(
            "无聊".parse::<Emotion>(),
            Err(AffinityError::UnknownEmotion(_))
        ));
        assert!(matches!(
            "maybe".parse::<Stance>(),
            Err(AffinityError::UnknownStance(_))
        ));
    }

    #[test]
    fn test_polarity_matches_sign_for_streak_labels() {
        for emotion in Emotion::ALL {
            match emotion.polarity() {
                Polarity::Positive => assert!(emotion.base_value() > 0.0),
                Polarity::Negative => assert!(emotion.base_value() < 0.0),
                Polarity::Neutral => {}
            }
        }
    }
}
