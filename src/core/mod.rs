pub mod error;
pub mod mood;
pub mod person;
pub mod store;

pub use error::{AffinityError, Result};
pub use mood::{MoodHandle, MoodState};
pub use person::{person_id_for, PersonRecord, PersonRef, PersonStore};
pub use store::{JsonPersonStore, MemoryPersonStore};
