//! Typed errors raised by the signal engine.
//!
//! Collaborators (feeds, notifiers, config) use `anyhow`; only the pure
//! engine path needs errors a caller can match on.

use thiserror::Error;

use crate::types::MarketKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    /// Structurally invalid input. Aborts analysis of that single game.
    #[error("Malformed quote: {0}")]
    MalformedQuote(String),

    /// A market kind is present but one side has no usable quotes.
    /// Downgrades that market to "not analyzed" for the game.
    #[error("Insufficient quote data for {market} side '{side}'")]
    InsufficientQuoteData { market: MarketKind, side: String },
}

impl QuoteError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        QuoteError::MalformedQuote(reason.into())
    }
}
