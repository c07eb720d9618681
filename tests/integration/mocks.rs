//! Test doubles for feeds and notifiers.
//!
//! `RecordingNotifier` keeps every delivered message in memory; the
//! mockall feed covers failure paths.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mockall::mock;
use std::sync::{Arc, Mutex};

use odds_signal::feed::{OddsEvent, OddsFeed};
use odds_signal::notify::Notifier;

mock! {
    pub Feed {}

    #[async_trait]
    impl OddsFeed for Feed {
        async fn fetch_events(&self) -> Result<Vec<OddsEvent>>;
        fn name(&self) -> String;
    }
}

/// In-memory notifier that records messages, optionally failing.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    force_error: Arc<Mutex<Option<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force all subsequent sends to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> String {
        "recording".to_string()
    }
}
