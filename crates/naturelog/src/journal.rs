//! Capture-upload-persist pipeline.
//!
//! [`Composer`] holds the staged (unsaved) photo and caption and drives the
//! save sequence through an explicit state machine:
//! `Idle -> Uploading -> Writing -> Idle` (and `Idle -> Acquiring -> Idle`
//! for picking). The transitions are the only legal entry points to each
//! step; attempting to start a step while another is in flight is an error,
//! not a silently ignored gesture.
//!
//! A save that fails at any step preserves the staged photo and caption so
//! the user can retry manually. Retrying after the upload already succeeded
//! re-uploads the image and strands the earlier object at the media host;
//! that orphan is accepted and goes undetected, matching the system design.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::acquire::{acquire, AcquisitionMode, MediaPicker, PickerOutcome};
use crate::entry::JournalEntry;
use crate::error::{Error, Result};
use crate::session::Identity;
use crate::store::DocumentStore;
use crate::upload::ImageUploader;

/// Where the save pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A picker invocation is in flight.
    Acquiring,
    /// The staged image is being transmitted to the media host.
    Uploading,
    /// The entry record is being written to the document store.
    Writing,
}

impl std::fmt::Display for SaveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Acquiring => write!(f, "acquiring"),
            Self::Uploading => write!(f, "uploading"),
            Self::Writing => write!(f, "writing"),
        }
    }
}

/// The composing surface: one staged photo, one caption, one pipeline.
#[derive(Debug, Default)]
pub struct Composer {
    staged: Option<PathBuf>,
    caption: String,
    state: SaveState,
}

impl Composer {
    /// Create an empty composer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently staged photo, if any.
    #[must_use]
    pub fn staged_photo(&self) -> Option<&Path> {
        self.staged.as_deref()
    }

    /// The current caption text.
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Replace the caption text.
    pub fn set_caption(&mut self, caption: &str) {
        self.caption = caption.to_string();
    }

    /// The pipeline state.
    #[must_use]
    pub fn state(&self) -> SaveState {
        self.state
    }

    fn enter(&mut self, next: SaveState) -> Result<()> {
        if self.state != SaveState::Idle {
            return Err(Error::SaveInProgress { state: self.state });
        }
        self.state = next;
        Ok(())
    }

    /// Acquire a photo and stage it.
    ///
    /// A cancelled pick is a normal outcome and leaves the previously staged
    /// photo and caption untouched; a selected image replaces any previously
    /// staged one.
    ///
    /// # Errors
    ///
    /// Returns an error if a save is in flight, the permission is denied, or
    /// the pick itself fails. Staged state is untouched on every error.
    pub async fn acquire_photo(
        &mut self,
        picker: &dyn MediaPicker,
        mode: AcquisitionMode,
    ) -> Result<PickerOutcome> {
        self.enter(SaveState::Acquiring)?;

        let outcome = acquire(picker, mode).await;
        self.state = SaveState::Idle;

        let outcome = outcome?;
        if let PickerOutcome::Selected(path) = &outcome {
            self.staged = Some(path.clone());
        }
        Ok(outcome)
    }

    /// Run the upload-then-write save sequence.
    ///
    /// Preconditions are explicit hard stops: a photo must be staged and an
    /// identity must be present. On success the staged photo and caption are
    /// cleared; on any failure they are preserved for a manual retry, and no
    /// record is written unless the upload succeeded first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SaveInProgress`], [`Error::NoPhotoStaged`],
    /// [`Error::IdentityUnavailable`], [`Error::UploadFailed`], or
    /// [`Error::WriteFailed`].
    pub async fn save(
        &mut self,
        identity: Option<&Identity>,
        uploader: &dyn ImageUploader,
        store: &dyn DocumentStore,
        collection: &str,
    ) -> Result<JournalEntry> {
        if self.state != SaveState::Idle {
            return Err(Error::SaveInProgress { state: self.state });
        }
        let Some(photo) = self.staged.clone() else {
            return Err(Error::NoPhotoStaged);
        };
        let Some(identity) = identity else {
            return Err(Error::identity_unavailable("not signed in"));
        };

        self.state = SaveState::Uploading;
        let image_ref = match uploader.upload(&photo).await {
            Ok(url) => url,
            Err(err) => {
                // Staged photo and caption stay put for a manual retry.
                warn!("upload failed, keeping staged photo: {err}");
                self.state = SaveState::Idle;
                return Err(err);
            }
        };

        self.state = SaveState::Writing;
        let mut entry = JournalEntry::new(identity, image_ref, &self.caption);
        match store.insert(collection, &entry).await {
            Ok(id) => {
                entry.id = Some(id);
                // Back to the initial composing state.
                self.staged = None;
                self.caption.clear();
                self.state = SaveState::Idle;
                info!("saved entry {} for {}", entry.id.as_deref().unwrap_or("?"), identity);
                Ok(entry)
            }
            Err(err) => {
                // The uploaded image is now an unreferenced remote object;
                // nothing tracks it.
                warn!("write failed after upload, keeping staged photo: {err}");
                self.state = SaveState::Idle;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::LocalMediaPicker;
    use crate::config::CaptureConfig;
    use crate::store::MemoryStore;

    const COLLECTION: &str = "entries";

    /// Uploader double returning a fixed URL or a fixed failure.
    struct StubUploader {
        result: std::result::Result<String, String>,
    }

    impl StubUploader {
        fn ok() -> Self {
            Self {
                result: Ok("https://res.example/p.jpg".to_string()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ImageUploader for StubUploader {
        async fn upload(&self, _path: &Path) -> Result<String> {
            match &self.result {
                Ok(url) => Ok(url.clone()),
                Err(message) => Err(Error::upload_failed(message.clone())),
            }
        }
    }

    /// Store double that refuses every write.
    struct FailingStore;

    #[async_trait::async_trait]
    impl DocumentStore for FailingStore {
        async fn insert(&self, _collection: &str, _entry: &JournalEntry) -> Result<String> {
            Err(Error::write_failed("quota exceeded"))
        }

        async fn query_by_owner(
            &self,
            _collection: &str,
            _owner: &str,
        ) -> Result<Vec<JournalEntry>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _collection: &str, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn temp_image(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("naturelog_j_{}_{name}", std::process::id()));
        std::fs::write(&path, b"\xff\xd8\xff\xe0fake-jpeg").unwrap();
        path
    }

    fn staged_composer(photo: &Path, caption: &str) -> Composer {
        let mut composer = Composer::new();
        composer.staged = Some(photo.to_path_buf());
        composer.set_caption(caption);
        composer
    }

    #[test]
    fn test_save_state_display() {
        assert_eq!(SaveState::Idle.to_string(), "idle");
        assert_eq!(SaveState::Acquiring.to_string(), "acquiring");
        assert_eq!(SaveState::Uploading.to_string(), "uploading");
        assert_eq!(SaveState::Writing.to_string(), "writing");
    }

    #[tokio::test]
    async fn test_acquire_stages_photo() {
        let image = temp_image("stage.jpg");
        let picker = LocalMediaPicker::new(CaptureConfig::default(), Some(image.clone()));
        let mut composer = Composer::new();

        let outcome = composer
            .acquire_photo(&picker, AcquisitionMode::Gallery)
            .await
            .unwrap();
        assert_eq!(outcome, PickerOutcome::Selected(image.clone()));
        assert_eq!(composer.staged_photo(), Some(image.as_path()));
        assert_eq!(composer.state(), SaveState::Idle);

        let _ = std::fs::remove_file(&image);
    }

    #[tokio::test]
    async fn test_acquire_replaces_previous_photo() {
        let first = temp_image("first.jpg");
        let second = temp_image("second.jpg");
        let mut composer = staged_composer(&first, "unchanged");

        let picker = LocalMediaPicker::new(CaptureConfig::default(), Some(second.clone()));
        composer
            .acquire_photo(&picker, AcquisitionMode::Camera)
            .await
            .unwrap();

        assert_eq!(composer.staged_photo(), Some(second.as_path()));
        // A new photo does not clear the caption being typed.
        assert_eq!(composer.caption(), "unchanged");

        let _ = std::fs::remove_file(&first);
        let _ = std::fs::remove_file(&second);
    }

    #[tokio::test]
    async fn test_cancelled_pick_leaves_staged_state() {
        let image = temp_image("keep.jpg");
        let mut composer = staged_composer(&image, "my caption");

        let picker = LocalMediaPicker::new(CaptureConfig::default(), None);
        let outcome = composer
            .acquire_photo(&picker, AcquisitionMode::Gallery)
            .await
            .unwrap();

        assert_eq!(outcome, PickerOutcome::Cancelled);
        assert_eq!(composer.staged_photo(), Some(image.as_path()));
        assert_eq!(composer.caption(), "my caption");

        let _ = std::fs::remove_file(&image);
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_staged_state() {
        let image = temp_image("denied.jpg");
        let mut composer = staged_composer(&image, "my caption");

        let capture = CaptureConfig {
            camera_allowed: false,
            gallery_allowed: true,
        };
        let picker = LocalMediaPicker::new(capture, None);
        let err = composer
            .acquire_photo(&picker, AcquisitionMode::Camera)
            .await
            .unwrap_err();

        assert!(err.is_permission_error());
        assert_eq!(composer.staged_photo(), Some(image.as_path()));
        assert_eq!(composer.state(), SaveState::Idle);

        let _ = std::fs::remove_file(&image);
    }

    #[tokio::test]
    async fn test_save_success_resets_composer() {
        let image = temp_image("save.jpg");
        let mut composer = staged_composer(&image, "  oak leaf  ");
        let store = MemoryStore::new();
        let identity = Identity::new("u1");

        let entry = composer
            .save(Some(&identity), &StubUploader::ok(), &store, COLLECTION)
            .await
            .unwrap();

        assert!(entry.is_persisted());
        assert_eq!(entry.owner_id, "u1");
        assert_eq!(entry.image_ref, "https://res.example/p.jpg");
        assert_eq!(entry.caption, "oak leaf");

        // Back to the initial composing state.
        assert!(composer.staged_photo().is_none());
        assert_eq!(composer.caption(), "");
        assert_eq!(composer.state(), SaveState::Idle);

        // Exactly one record landed in the store.
        let stored = store.query_by_owner(COLLECTION, "u1").await.unwrap();
        assert_eq!(stored.len(), 1);

        let _ = std::fs::remove_file(&image);
    }

    #[tokio::test]
    async fn test_save_without_photo() {
        let mut composer = Composer::new();
        let store = MemoryStore::new();
        let identity = Identity::new("u1");

        let err = composer
            .save(Some(&identity), &StubUploader::ok(), &store, COLLECTION)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoPhotoStaged));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_without_identity() {
        let image = temp_image("noid.jpg");
        let mut composer = staged_composer(&image, "caption");
        let store = MemoryStore::new();

        let err = composer
            .save(None, &StubUploader::ok(), &store, COLLECTION)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IdentityUnavailable { .. }));
        assert!(store.is_empty());
        // Nothing was consumed.
        assert_eq!(composer.staged_photo(), Some(image.as_path()));

        let _ = std::fs::remove_file(&image);
    }

    #[tokio::test]
    async fn test_failed_upload_prevents_write_and_preserves_staging() {
        let image = temp_image("upfail.jpg");
        let mut composer = staged_composer(&image, "my caption");
        let store = MemoryStore::new();
        let identity = Identity::new("u1");

        let err = composer
            .save(
                Some(&identity),
                &StubUploader::failing("503 from host"),
                &store,
                COLLECTION,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UploadFailed { .. }));
        // No record was written and the staging survives for a retry.
        assert!(store.is_empty());
        assert_eq!(composer.staged_photo(), Some(image.as_path()));
        assert_eq!(composer.caption(), "my caption");
        assert_eq!(composer.state(), SaveState::Idle);

        let _ = std::fs::remove_file(&image);
    }

    #[tokio::test]
    async fn test_failed_write_preserves_staging() {
        let image = temp_image("wrfail.jpg");
        let mut composer = staged_composer(&image, "my caption");
        let identity = Identity::new("u1");

        let err = composer
            .save(Some(&identity), &StubUploader::ok(), &FailingStore, COLLECTION)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WriteFailed { .. }));
        assert_eq!(composer.staged_photo(), Some(image.as_path()));
        assert_eq!(composer.caption(), "my caption");
        assert_eq!(composer.state(), SaveState::Idle);

        let _ = std::fs::remove_file(&image);
    }

    #[tokio::test]
    async fn test_reentry_while_busy_is_rejected() {
        let image = temp_image("busy.jpg");
        let mut composer = staged_composer(&image, "caption");
        composer.state = SaveState::Uploading;

        let store = MemoryStore::new();
        let identity = Identity::new("u1");
        let err = composer
            .save(Some(&identity), &StubUploader::ok(), &store, COLLECTION)
            .await
            .unwrap_err();
        assert!(err.is_save_in_progress());

        let picker = LocalMediaPicker::new(CaptureConfig::default(), None);
        let err = composer
            .acquire_photo(&picker, AcquisitionMode::Gallery)
            .await
            .unwrap_err();
        assert!(err.is_save_in_progress());

        let _ = std::fs::remove_file(&image);
    }
}
