use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::engine::{WillingEngine, DECAY_INTERVAL, DEFAULT_BASELINE_INTERVAL};

impl WillingEngine {
    /// Spawn the decay and baseline loops. They run until the runtime
    /// shuts down or the handles are aborted.
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(return_to_basic_willing(Arc::clone(self))),
            tokio::spawn(adapt_basic_willing(Arc::clone(self))),
        ]
    }
}

async fn return_to_basic_willing(engine: Arc<WillingEngine>) {
    loop {
        tokio::time::sleep(DECAY_INTERVAL).await;
        engine.decay_tick().await;
    }
}

async fn adapt_basic_willing(engine: Arc<WillingEngine>) {
    let mut interval = DEFAULT_BASELINE_INTERVAL;
    loop {
        tokio::time::sleep(interval).await;
        interval = engine.adapt_baselines_at(Utc::now()).await;
        debug!("next baseline update in {:.1}s", interval.as_secs_f64());
    }
}
