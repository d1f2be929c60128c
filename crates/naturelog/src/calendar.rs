//! Calendar query, grouping, and deletion.
//!
//! Fetches every entry the current identity owns (a single equality query,
//! no paging, no server-side ordering) and groups them by the calendar-day
//! truncation of the client timestamp. Store order is never relied on:
//! entries within a day are explicitly sorted by `createdAt`. Deletion is a
//! confirmed two-step interaction followed by a full re-fetch; the uploaded
//! image behind a deleted record stays at the media host.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::entry::JournalEntry;
use crate::error::Result;
use crate::session::Identity;
use crate::store::DocumentStore;

/// Journal entries grouped by calendar day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayGroups {
    groups: BTreeMap<NaiveDate, Vec<JournalEntry>>,
}

impl DayGroups {
    /// Group entries by their day key, sorting each day by `createdAt`.
    #[must_use]
    pub fn from_entries(entries: Vec<JournalEntry>) -> Self {
        let mut groups: BTreeMap<NaiveDate, Vec<JournalEntry>> = BTreeMap::new();
        for entry in entries {
            groups.entry(entry.day_key()).or_default().push(entry);
        }
        for day in groups.values_mut() {
            day.sort_by_key(|entry| entry.created_at);
        }
        Self { groups }
    }

    /// The days that carry at least one entry, ascending.
    #[must_use]
    pub fn marked_days(&self) -> Vec<NaiveDate> {
        self.groups.keys().copied().collect()
    }

    /// The entries for one day, oldest first. Empty for unmarked days.
    #[must_use]
    pub fn entries_for(&self, day: NaiveDate) -> &[JournalEntry] {
        self.groups.get(&day).map_or(&[], Vec::as_slice)
    }

    /// Iterate days and their entries, ascending by day.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[JournalEntry])> {
        self.groups.iter().map(|(day, entries)| (*day, entries.as_slice()))
    }

    /// Number of days carrying entries.
    #[must_use]
    pub fn day_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of entries across all days.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Whether there are no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Fetch all entries for `owner` and group them by day.
///
/// Always a full reload; there is no incremental fetch.
///
/// # Errors
///
/// Returns [`crate::Error::QueryFailed`] if the store query fails.
pub async fn fetch_day_groups(
    store: &dyn DocumentStore,
    collection: &str,
    owner: &Identity,
) -> Result<DayGroups> {
    let entries = store.query_by_owner(collection, owner.as_str()).await?;
    debug!("fetched {} entries for {owner}", entries.len());
    Ok(DayGroups::from_entries(entries))
}

/// The user's answer to a delete confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Go ahead and delete.
    Confirmed,
    /// Keep the entry; cancelling is a no-op.
    Cancelled,
}

/// Outcome of a delete interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The record was deleted; carries the refreshed day groups.
    Deleted(DayGroups),
    /// The user cancelled; nothing changed.
    Cancelled,
}

/// Delete one entry after explicit confirmation, then re-fetch.
///
/// Only the metadata record is removed; the uploaded image it referenced
/// becomes a permanent orphan at the media host. On failure the caller's
/// previous groups remain valid (there is no optimistic removal).
///
/// # Errors
///
/// Returns [`crate::Error::DeleteFailed`] if the delete fails, or
/// [`crate::Error::QueryFailed`] if the follow-up re-fetch fails.
pub async fn delete_entry(
    store: &dyn DocumentStore,
    collection: &str,
    owner: &Identity,
    id: &str,
    confirmation: Confirmation,
) -> Result<DeleteOutcome> {
    if confirmation == Confirmation::Cancelled {
        debug!("delete of {id} cancelled");
        return Ok(DeleteOutcome::Cancelled);
    }

    store.delete(collection, id).await?;
    info!("deleted entry {id}");

    let refreshed = fetch_day_groups(store, collection, owner).await?;
    Ok(DeleteOutcome::Deleted(refreshed))
}
