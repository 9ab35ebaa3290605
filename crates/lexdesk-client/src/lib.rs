//! Client layer: chat session state machine over a pluggable backend, plus the
//! reqwest-backed HTTP backend for the AI chat endpoints.

mod backend;
pub mod config;
mod error;
pub mod session;

#[cfg(feature = "http")]
pub mod http;

pub use backend::ChatBackend;
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{ChatSession, Conversation, SendOutcome, SessionEvent, SessionSnapshot};

#[cfg(feature = "http")]
pub use http::HttpChatBackend;
