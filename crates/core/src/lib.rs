//! # SOR Core
//!
//! The engine behind the standing-orders reference app.
//!
//! This crate contains pure, synchronous transformations over an in-memory
//! [`sor_book::Book`]:
//! - Flattening the chapter hierarchy into a linear page sequence
//! - Full-text content search with word-boundary excerpts
//! - The clinical decision-flow evaluator and its case-matching rules
//! - Shaping completed flows into the backend submission contract
//! - Quiz scoring and restart-surviving wizard sessions
//!
//! **No API concerns**: HTTP transport, authentication, push notifications
//! and rendering belong to the app shell, not here. The only I/O in this
//! crate is the best-effort key-value session persistence in [`storage`].

pub mod decision;
pub mod flatten;
pub mod quiz;
pub mod search;
pub mod storage;
pub mod submission;

pub use decision::{DecisionFlow, FlowError, FlowState, Response, UserSelections};
pub use flatten::{first_page_index, flatten_pages, FlattenedPage};
pub use search::{search, ItemMatch, MatchKind, SearchResult};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use submission::{DecisionSink, DecisionSubmission, SubmissionError, SubmissionReason};
