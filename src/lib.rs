//! # corpus-sync
//!
//! Content-acquisition front end for a question-answering pipeline.
//!
//! corpus-sync keeps local checkouts of externally version-controlled content
//! sources fresh on per-source refresh schedules, filters each checked-out
//! tree with include/exclude glob patterns, and emits a normalized document
//! stream (path, text, metadata) for a downstream indexing consumer.
//!
//! ```text
//! ┌─────────────────┐   ┌────────────────┐   ┌────────────────┐
//! │ ContentSource×N │──▶│ ContentManager │──▶│ DocumentLoader │──▶ downstream
//! │  git + globs    │   │ refresh/collect│   │ text + metadata│
//! └─────────────────┘   └────────────────┘   └────────────────┘
//! ```
//!
//! Fetches are fail-soft: one broken source never stops the others, and a
//! source that fails to refresh keeps serving its last good checkout.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | YAML source configuration |
//! | [`freshness`] | Refresh-cadence staleness policy |
//! | [`filter`] | Include/exclude glob file selection |
//! | [`source`] | Per-source git fetch and sync marker |
//! | [`manager`] | Bounded-concurrency refresh and aggregation |
//! | [`extract`] | Jupyter notebook text extraction |
//! | [`loader`] | Document stream production |
//! | [`models`] | Core data types |
//! | [`interaction_log`] | Sibling Q&A interaction store |

pub mod config;
pub mod extract;
pub mod filter;
pub mod freshness;
pub mod interaction_log;
pub mod loader;
pub mod manager;
pub mod models;
pub mod source;
