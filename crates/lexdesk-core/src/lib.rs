pub mod chat;
pub mod html;
pub mod search;
pub mod viewer;

pub use chat::{CaseId, ChatMessage, Role};
pub use search::{Match, SearchState, SearchStatus};
pub use viewer::DocumentViewer;
