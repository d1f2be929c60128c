//! `naturelog` - A photo journal client
//!
//! This library provides the core functionality for a hosted photo journal:
//! establishing an anonymous session, staging and uploading photos, writing
//! entry records to a document store, and browsing entries by calendar day.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod acquire;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod journal;
pub mod logging;
pub mod session;
pub mod store;
pub mod upload;

#[cfg(test)]
pub(crate) mod testsupport;

pub use acquire::{AcquisitionMode, LocalMediaPicker, MediaPicker, PickerOutcome};
pub use calendar::{Confirmation, DayGroups, DeleteOutcome};
pub use config::Config;
pub use entry::JournalEntry;
pub use error::{Error, Result};
pub use journal::{Composer, SaveState};
pub use logging::init_logging;
pub use session::{Identity, IdentityProvider, SessionHandle, SessionState};
pub use store::{DocumentStore, HttpDocumentStore, MemoryStore};
pub use upload::{ImageUploader, MediaUploader};
