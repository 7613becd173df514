//! # copilot-history-sessions
//!
//! Read-only queries over Copilot CLI session logs: one append-only JSONL
//! event log per session, under `~/.copilot/session-state` by default.
//!
//! ## Key Types
//!
//! - [`SessionStore`] - Enumerates logs and runs the queries
//! - [`EventReader`] - Lazy, fault-tolerant event iteration over one log
//! - [`QueryOutcome`] - Found / nothing found / failed
//! - [`TitleCache`] - Memoized session titles, invalidated by mtime
//! - [`SessionHistory`] - The operations flattened to plain JSON

pub mod conversation;
pub mod error;
pub mod extract;
pub mod history;
pub mod outcome;
pub mod parser;
pub mod search;
pub mod stats;
pub mod store;
pub mod title;
pub mod types;

pub use error::{DecodeError, HistoryError};
pub use extract::searchable_text;
pub use history::SessionHistory;
pub use outcome::QueryOutcome;
pub use parser::{decode_line, EventReader};
pub use search::{SearchQuery, DEFAULT_MAX_RESULTS};
pub use store::{
    default_session_dir, list_session_files, resolve_session_dir, SessionStore, SESSION_DIR_ENV,
};
pub use title::{
    format_timestamp, parse_timestamp, session_title, TitleCache, TitleCacheEntry, DEFAULT_LIST_LIMIT,
    DEFAULT_TITLE_LENGTH, UNTITLED,
};
pub use types::{
    Attachment, AssistantMessageData, ConversationMessage, DateRange, Event, EventData,
    EventKind, Role, SearchResult, SessionListing, SessionLogFile, SessionStartData,
    SessionStats, ToolCall, ToolRequest, ToolResultData, ToolUsage, UserMessageData,
};
