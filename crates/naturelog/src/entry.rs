//! The journal entry record.
//!
//! This module defines the single domain entity: one captured moment, made of
//! an uploaded image reference, a caption, timestamps, and the owning
//! identity. Entries are immutable after creation; the only mutation the
//! system knows is deletion.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Identity;

/// A persisted journal entry.
///
/// Field names follow the stored record shape:
/// `{ownerId, imageRef, caption, createdAt, serverTimestamp}`.
///
/// Two timestamps are written but only one is read: `created_at` is the
/// client clock at write time and is canonical for grouping and display;
/// `server_timestamp` is assigned by the document store and retained only
/// for service-side ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Unique key assigned by the document store on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Identity token of the creator; the sole query predicate.
    pub owner_id: String,

    /// Resolvable URL of the uploaded image.
    pub image_ref: String,

    /// Free-text caption; may be empty.
    pub caption: String,

    /// Client-generated timestamp captured at write time.
    pub created_at: DateTime<Utc>,

    /// Service-assigned ordering timestamp. Written by the store, never
    /// used for client logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Create a new, not-yet-persisted entry owned by `identity`.
    ///
    /// The caption is trimmed and `created_at` is set to now; the id and
    /// server timestamp are left for the store to assign.
    #[must_use]
    pub fn new(identity: &Identity, image_ref: impl Into<String>, caption: &str) -> Self {
        Self {
            id: None,
            owner_id: identity.as_str().to_string(),
            image_ref: image_ref.into(),
            caption: caption.trim().to_string(),
            created_at: Utc::now(),
            server_timestamp: None,
        }
    }

    /// The calendar day this entry belongs to.
    ///
    /// Always derived from `created_at`, never from the server timestamp.
    #[must_use]
    pub fn day_key(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Whether this entry has been persisted (has a store-assigned id).
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
