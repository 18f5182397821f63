//! Copy feedback - "copied!" flag that clears itself
//!
//! A new copy before expiry replaces the pending timer. The generation check
//! keeps a timer that already woke up from clearing a newer value.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct CopyState {
    value: Option<String>,
    generation: u64,
}

pub struct CopyFeedback {
    ttl: Duration,
    state: Arc<RwLock<CopyState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl CopyFeedback {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, state: Arc::new(RwLock::new(CopyState::default())), timer: Mutex::new(None) }
    }

    pub async fn copy(&self, value: impl Into<String>) {
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.value = Some(value.into());
            state.generation
        };

        let (state, ttl) = (self.state.clone(), self.ttl);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = state.write().await;
            if state.generation == generation {
                state.value = None;
            }
        });
        self.replace_timer(Some(handle));
    }

    pub async fn current(&self) -> Option<String> {
        self.state.read().await.value.clone()
    }

    pub async fn clear(&self) {
        self.replace_timer(None);
        let mut state = self.state.write().await;
        state.generation += 1;
        state.value = None;
    }

    fn replace_timer(&self, next: Option<JoinHandle<()>>) {
        let mut timer = self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = std::mem::replace(&mut *timer, next) {
            previous.abort();
        }
    }
}

impl Drop for CopyFeedback {
    fn drop(&mut self) {
        self.replace_timer(None);
    }
}
