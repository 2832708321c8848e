//! Storage Layer - SQLite-backed knowledge base
//!
//! System of record is SQLite with tables:
//! - contacts(name, email, role, context, tags, timestamps)
//! - snippets(text, tags, source, created_at)
//! - projects(name, status, description, lead, tags)
//! - abbreviations(abbr, full, definition, category, examples, related, links)
//! - relationships(from_type, from_id, to_type, to_id, kind, strength)
//! - embeddings(entity_type, entity_id, vector, text)
//!
//! One connection sits behind a mutex; every write goes through it, so the
//! shared `StoreHandle` gives a single writer across threads.

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, SqliteStore, StoreHandle, StoreTx, StoredEmbedding};
