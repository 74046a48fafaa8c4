use std::sync::RwLock;

/// The agent's current emotional state, reduced to one valence scalar.
pub trait MoodState: Send + Sync {
    /// Valence in [-1, 1].
    fn current_valence(&self) -> f64;
}

/// Shared mood holder
#[derive(Debug, Default)]
pub struct MoodHandle {
    valence: RwLock<f64>,
}

impl MoodHandle {
    pub fn new(valence: f64) -> Self {
        Self {
            valence: RwLock::new(valence.clamp(-1.0, 1.0)),
        }
    }

    pub fn set_valence(&self, valence: f64) {
        if let Ok(mut current) = self.valence.write() {
            *current = valence.clamp(-1.0, 1.0);
        }
    }

    /// Shift valence by `delta`, returning the new value
    pub fn nudge(&self, delta: f64) -> f64 {
        match self.valence.write() {
            Ok(mut current) => {
                *current = (*current + delta).clamp(-1.0, 1.0);
                *current
            }
            Err(_) => 0.0,
        }
    }
}

impl MoodState for MoodHandle {
    fn current_valence(&self) -> f64 {
        self.valence.read().map(|v| *v).unwrap_or(0.0)
    }
}
