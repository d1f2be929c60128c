//! Document store clients.
//!
//! The journal trusts a hosted document database for all persistence; this
//! module defines the client surface (insert, owner-equality query, delete)
//! and two implementations: a JSON-over-HTTP client for the hosted service
//! and an in-memory store for tests and offline experiments. Entries are
//! never cached locally; every calendar view is a fresh query.

mod http;
mod memory;

pub use http::HttpDocumentStore;
pub use memory::MemoryStore;

use crate::entry::JournalEntry;
use crate::error::Result;

/// A client of the hosted document database.
///
/// The only query the journal ever issues is an equality match on the owner
/// identity; there is no time-range filter, pagination, or server-side
/// ordering contract. Records are immutable after insertion; the only other
/// operation is deletion by id.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one entry record and return the store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if the record cannot be written.
    async fn insert(&self, collection: &str, entry: &JournalEntry) -> Result<String>;

    /// Fetch all entries owned by `owner`, in whatever order the store
    /// returns them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::QueryFailed`] if the query cannot be run.
    async fn query_by_owner(&self, collection: &str, owner: &str) -> Result<Vec<JournalEntry>>;

    /// Delete the record with the given id.
    ///
    /// Only the metadata record is removed; any uploaded image it referenced
    /// stays at the media host.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DeleteFailed`] if the record cannot be
    /// deleted (including when no record has that id).
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
