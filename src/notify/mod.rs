//! Report delivery.
//!
//! Defines the `Notifier` trait and provides implementations for:
//! - Discord webhooks (chunked messages)
//! - stdout (dry runs without a webhook)

pub mod discord;
pub mod render;

use anyhow::Result;
use async_trait::async_trait;

/// Delivers rendered report text somewhere a human will read it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;

    /// Notifier name for logging and identification.
    fn name(&self) -> String;
}

/// Prints reports to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }

    fn name(&self) -> String {
        "console".to_string()
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Splits fall on char boundaries and prefer the last line break inside
/// the window; a single line longer than `max_chars` is cut mid-line.
/// Concatenating the chunks gives back `text` exactly.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past the first `max_chars` chars
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        if window_end == rest.len() {
            chunks.push(rest.to_string());
            break;
        }

        let cut = match rest[..window_end].rfind('\n') {
            Some(nl) if nl > 0 => nl + 1,
            _ => window_end,
        };
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    chunks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
