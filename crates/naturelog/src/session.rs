//! Anonymous session bootstrap.
//!
//! On startup the app establishes an anonymous identity and subscribes to
//! identity-change notifications. The subscription, not the sign-in call, is
//! the source of truth for being `Ready`; a change that carries no identity
//! routes to the blocked `SignedOut` state rather than an error. There is no
//! retry: a failed bootstrap stays failed until the process restarts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// An opaque identity token issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Wrap a raw identity token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observable state of the session bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Bootstrap is still in flight.
    Loading,
    /// Establishing the identity failed; no retry is attempted.
    Failed(String),
    /// The subscription reported no identity (signed out or revoked).
    SignedOut,
    /// A valid identity is available.
    Ready(Identity),
}

impl SessionState {
    /// Whether this state carries a usable identity.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// A client of the identity service.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Establish an anonymous identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity service cannot issue an identity.
    async fn establish_anonymous(&self) -> Result<Identity>;

    /// Subscribe to identity-change notifications.
    ///
    /// The receiver's current value is the latest known identity; `None`
    /// means no identity (not yet established, or signed out).
    fn changes(&self) -> watch::Receiver<Option<Identity>>;
}

/// A running session bootstrap.
///
/// Holds the identity-change subscription for its whole lifetime and
/// releases it on drop, so no callback can outlive the component that
/// started the bootstrap.
#[derive(Debug)]
pub struct SessionHandle {
    rx: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Start the session bootstrap.
    ///
    /// Establishes an anonymous identity in the background while observing
    /// the provider's identity-change stream. The handle starts in
    /// [`SessionState::Loading`].
    #[must_use]
    pub fn bootstrap(provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, rx) = watch::channel(SessionState::Loading);

        let task = tokio::spawn(async move {
            let mut changes = provider.changes();

            if let Err(err) = provider.establish_anonymous().await {
                warn!("identity bootstrap failed: {err}");
                let _ = tx.send(SessionState::Failed(err.to_string()));
                return;
            }

            // The subscription, not the sign-in result, decides readiness.
            let state = Self::state_of(changes.borrow_and_update().clone());
            if tx.send(state).is_err() {
                return;
            }

            while changes.changed().await.is_ok() {
                let state = Self::state_of(changes.borrow_and_update().clone());
                debug!("identity changed: {state:?}");
                if tx.send(state).is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    fn state_of(identity: Option<Identity>) -> SessionState {
        match identity {
            Some(identity) => SessionState::Ready(identity),
            None => SessionState::SignedOut,
        }
    }

    /// The current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Wait until the bootstrap has settled into a non-loading state.
    pub async fn wait_settled(&mut self) -> SessionState {
        loop {
            let state = self.rx.borrow_and_update().clone();
            if state != SessionState::Loading {
                return state;
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }

    /// Wait for the bootstrap to settle and return the identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdentityUnavailable`] if the bootstrap failed or the
    /// session is signed out.
    pub async fn identity(&mut self) -> Result<Identity> {
        match self.wait_settled().await {
            SessionState::Ready(identity) => Ok(identity),
            SessionState::Failed(message) => Err(Error::identity_unavailable(message)),
            SessionState::SignedOut => Err(Error::identity_unavailable("signed out")),
            SessionState::Loading => Err(Error::identity_unavailable("bootstrap interrupted")),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // Releases the identity-change subscription with the handle.
        self.task.abort();
    }
}

/// On-disk shape of the cached anonymous identity.
#[derive(Debug, Serialize, Deserialize)]
struct CachedIdentity {
    identity: String,
}

/// Response body of an anonymous sign-up call.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(rename = "localId")]
    local_id: String,
}

/// Identity service client speaking an identity-toolkit style REST API.
///
/// The issued identity is cached in the data directory so it survives
/// restarts, the way the mobile SDKs persist an anonymous session on-device.
/// Deleting the cache file yields a fresh identity on the next start.
#[derive(Debug)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cache_path: PathBuf,
    tx: watch::Sender<Option<Identity>>,
}

impl HttpIdentityProvider {
    /// Create a provider from the application configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.auth.base_url,
            &config.auth.api_key,
            config.identity_cache_path(),
        )
    }

    /// Create a provider for the given endpoint, key, and cache location.
    #[must_use]
    pub fn new(base_url: &str, api_key: &str, cache_path: PathBuf) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cache_path,
            tx,
        }
    }

    fn load_cached(&self) -> Option<Identity> {
        let bytes = std::fs::read(&self.cache_path).ok()?;
        match serde_json::from_slice::<CachedIdentity>(&bytes) {
            Ok(cached) => Some(Identity::new(cached.identity)),
            Err(err) => {
                warn!(
                    "ignoring unreadable identity cache at {}: {err}",
                    self.cache_path.display()
                );
                None
            }
        }
    }

    fn store_cached(&self, identity: &Identity) {
        let cached = CachedIdentity {
            identity: identity.as_str().to_string(),
        };
        let write = || -> Result<()> {
            if let Some(parent) = self.cache_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.cache_path, serde_json::to_vec_pretty(&cached)?)?;
            Ok(())
        };
        if let Err(err) = write() {
            // A missing cache only costs a fresh identity next start.
            warn!(
                "could not cache identity at {}: {err}",
                self.cache_path.display()
            );
        }
    }

    async fn sign_up(&self) -> Result<Identity> {
        let url = format!("{}/v1/accounts:signUp?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "returnSecureToken": true }))
            .send()
            .await
            .map_err(|err| Error::identity_unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| Error::identity_unavailable(err.to_string()))?;

        if !status.is_success() {
            let message = service_error_message(&body)
                .unwrap_or_else(|| format!("identity service returned {status}"));
            return Err(Error::identity_unavailable(message));
        }

        let parsed: SignUpResponse = serde_json::from_str(&body)
            .map_err(|err| Error::identity_unavailable(format!("malformed response: {err}")))?;
        Ok(Identity::new(parsed.local_id))
    }

    /// Path of the identity cache file.
    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn establish_anonymous(&self) -> Result<Identity> {
        if let Some(identity) = self.load_cached() {
            debug!("restored cached identity {identity}");
            self.tx.send_replace(Some(identity.clone()));
            return Ok(identity);
        }

        let identity = self.sign_up().await?;
        info!("established anonymous identity {identity}");
        self.store_cached(&identity);
        self.tx.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    fn changes(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

/// Extract the `error.message` field from a service error body, if present.
pub(crate) fn service_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(ToString::to_string)
}
