//! Image acquisition.
//!
//! Obtaining a single image from the device, either by live capture or
//! gallery selection, gated by a permission check. Cancelling the picker is
//! a normal outcome and must leave any previously staged image untouched;
//! a denied permission is a hard error surfaced to the user.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CaptureConfig;
use crate::error::{Error, Result};

/// How the image is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Live capture with the device camera.
    Camera,
    /// Selection from the device gallery.
    Gallery,
}

impl std::fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::Gallery => write!(f, "gallery"),
        }
    }
}

/// Result of a runtime permission query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The permission is granted; the picker may be invoked.
    Granted,
    /// The permission was refused.
    Denied,
}

/// Outcome of a picker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    /// The user dismissed the picker without choosing an image.
    Cancelled,
    /// An image was chosen; the path is a local resolvable locator.
    Selected(PathBuf),
}

/// A source of device images.
///
/// Implementors wrap whatever the platform offers (a camera, a gallery
/// picker, or a plain file path on a headless host) behind the same
/// permission-then-pick sequence.
#[async_trait::async_trait]
pub trait MediaPicker: Send + Sync {
    /// Query the permission state for the given acquisition mode.
    fn permission(&self, mode: AcquisitionMode) -> PermissionStatus;

    /// Invoke the picker.
    ///
    /// # Errors
    ///
    /// Returns an error if the pick fails for a reason other than the user
    /// cancelling (cancellation is reported as [`PickerOutcome::Cancelled`]).
    async fn pick(&self, mode: AcquisitionMode) -> Result<PickerOutcome>;
}

/// Acquire an image, enforcing the permission gate.
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] if the mode's permission is not
/// granted, or the picker's own error if the pick fails.
pub async fn acquire(picker: &dyn MediaPicker, mode: AcquisitionMode) -> Result<PickerOutcome> {
    if picker.permission(mode) != PermissionStatus::Granted {
        return Err(Error::PermissionDenied { mode });
    }

    let outcome = picker.pick(mode).await?;
    match &outcome {
        PickerOutcome::Cancelled => debug!("{mode} pick cancelled"),
        PickerOutcome::Selected(path) => debug!("{mode} picked {}", path.display()),
    }
    Ok(outcome)
}

/// Headless stand-in for the device picker.
///
/// Permissions come from configuration and the "picker" resolves a local
/// file path supplied up front; no path means the user cancelled.
#[derive(Debug)]
pub struct LocalMediaPicker {
    capture: CaptureConfig,
    source: Option<PathBuf>,
}

impl LocalMediaPicker {
    /// Create a picker that will offer the given path, or cancel if `None`.
    #[must_use]
    pub fn new(capture: CaptureConfig, source: Option<PathBuf>) -> Self {
        Self { capture, source }
    }

    fn resolve(&self, path: &Path) -> Result<PickerOutcome> {
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("image not found: {}", path.display()),
            )));
        }
        Ok(PickerOutcome::Selected(path.to_path_buf()))
    }
}

#[async_trait::async_trait]
impl MediaPicker for LocalMediaPicker {
    fn permission(&self, mode: AcquisitionMode) -> PermissionStatus {
        let allowed = match mode {
            AcquisitionMode::Camera => self.capture.camera_allowed,
            AcquisitionMode::Gallery => self.capture.gallery_allowed,
        };
        if allowed {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn pick(&self, _mode: AcquisitionMode) -> Result<PickerOutcome> {
        match &self.source {
            Some(path) => self.resolve(path),
            None => Ok(PickerOutcome::Cancelled),
        }
    }
}
