//! Reply willingness: per-person decaying willingness, traffic-adapted
//! chat baselines, and the reply probability built from them.

pub mod context;
pub mod engine;
pub mod params;
mod tasks;

pub use context::{ChatMessage, ChatStream, GroupInfo, WillingInfo};
pub use engine::{willing_to_probability, LastResponder, WillingEngine};
pub use params::WillingParams;
