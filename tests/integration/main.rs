//! Integration tests: snapshot feed → engine → renderer → notifier.

mod mocks;
mod pipeline;
