// ── Hub: session facade ──
//
// Owns the backend client and the per-session like store. Signing in
// resets the store for the new user; signing out cancels every mounted
// toggle, ends the remote session and clears the store.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sheetly_api::transport::{TlsMode, TransportConfig};
use sheetly_api::{BackendClient, NewPlaylist, SheetFilter};

use crate::config::{HubConfig, TlsVerification};
use crate::convert::{sheets_from_items, sheets_from_rows};
use crate::error::{CoreError, FOREIGN_KEY_VIOLATION};
use crate::model::{
    Playlist, PlaylistAdd, PlaylistDetail, PlaylistDraft, PlaylistId, Sheet, SheetId, SheetPage,
    SheetQuery, UserId,
};
use crate::store::LikeStore;
use crate::toggle::LikeToggle;

/// Refresh the access token when it expires within this window.
const REFRESH_SKEW_SECS: i64 = 60;

// ── SessionState ─────────────────────────────────────────────────

/// Session state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SigningIn,
    SignedIn { user: UserId },
    Failed,
}

// ── Hub ──────────────────────────────────────────────────────────

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<HubInner>`. Does not sign in on
/// construction; call [`sign_in()`](Self::sign_in) or use
/// [`oneshot()`](Self::oneshot).
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    client: Arc<BackendClient>,
    likes: Arc<LikeStore<BackendClient>>,
    session_state: watch::Sender<SessionState>,
    /// Parent token of every toggle created during the current session.
    /// Replaced with a fresh token on sign-out.
    session_cancel: watch::Sender<CancellationToken>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = Arc::new(BackendClient::new(
            config.url.clone(),
            config.anon_key.clone(),
            &transport,
        )?);
        let likes = Arc::new(LikeStore::new(Arc::clone(&client)));
        let (session_state, _) = watch::channel(SessionState::SignedOut);
        let (session_cancel, _) = watch::channel(CancellationToken::new());

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                client,
                likes,
                session_state,
                session_cancel,
            }),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<BackendClient> {
        &self.inner.client
    }

    /// The like store for the current session.
    pub fn likes(&self) -> &Arc<LikeStore<BackendClient>> {
        &self.inner.likes
    }

    /// Subscribe to session state changes.
    pub fn session_state(&self) -> watch::Receiver<SessionState> {
        self.inner.session_state.subscribe()
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Sign in with the configured credentials.
    pub async fn sign_in(&self) -> Result<UserId, CoreError> {
        let Some(creds) = &self.inner.config.credentials else {
            return Err(CoreError::Config {
                message: "no sign-in credentials configured".into(),
            });
        };

        self.inner.session_state.send_replace(SessionState::SigningIn);
        // A new identity never inherits the previous user's likes.
        self.inner.likes.clear_likes();

        match self
            .inner
            .client
            .sign_in_with_password(&creds.email, &creds.password)
            .await
        {
            Ok(user) => {
                let user = UserId::new(user.id);
                info!(user_id = %user, "signed in");
                self.inner
                    .session_state
                    .send_replace(SessionState::SignedIn { user: user.clone() });
                Ok(user)
            }
            Err(e) => {
                self.inner.session_state.send_replace(SessionState::Failed);
                Err(e.into())
            }
        }
    }

    /// End the session: unmount toggles, log out remotely (best effort),
    /// and clear cached likes.
    pub async fn sign_out(&self) {
        let previous = self
            .inner
            .session_cancel
            .send_replace(CancellationToken::new());
        previous.cancel();

        if let Err(e) = self.inner.client.sign_out().await {
            warn!(error = %e, "sign-out request failed (non-fatal)");
        }
        self.inner.likes.clear_likes();
        self.inner.session_state.send_replace(SessionState::SignedOut);
        info!("signed out");
    }

    /// Sign in (when credentials are configured), run `f`, sign out.
    ///
    /// Built for single CLI invocations. Anonymous configs skip both
    /// sign-in and sign-out and can only read the public catalog.
    pub async fn oneshot<F, Fut, T, E>(config: HubConfig, f: F) -> Result<T, E>
    where
        F: FnOnce(Hub) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let hub = Hub::new(config)?;
        let signed_in = hub.inner.config.credentials.is_some();
        if signed_in {
            hub.sign_in().await?;
        }
        let result = f(hub.clone()).await;
        if signed_in {
            hub.sign_out().await;
        }
        result
    }

    /// The signed-in user, without a network round trip.
    pub fn current_user(&self) -> Option<UserId> {
        self.inner.client.current_user().map(|u| UserId::new(u.id))
    }

    /// Ask the auth service who the session belongs to.
    pub async fn fetch_user(&self) -> Result<(UserId, Option<String>), CoreError> {
        self.ensure_fresh_session().await?;
        let user = self.inner.client.fetch_user().await?;
        Ok((UserId::new(user.id), user.email))
    }

    // ── Likes ────────────────────────────────────────────────────

    /// A like button for one sheet, unmounted automatically on sign-out.
    pub fn like_toggle(&self, sheet_id: SheetId) -> LikeToggle<BackendClient> {
        let parent = self.inner.session_cancel.borrow().clone();
        LikeToggle::new(
            sheet_id,
            Arc::clone(&self.inner.likes),
            self.inner.config.like_pacing,
            &parent,
        )
    }

    /// The current user's liked sheets, most recently learned last.
    pub async fn liked_sheets(&self) -> Result<Vec<Sheet>, CoreError> {
        if self.current_user().is_none() {
            return Err(CoreError::NotAuthenticated);
        }
        self.ensure_fresh_session().await?;
        if !self.inner.likes.ensure_loaded().await {
            let message = self
                .inner
                .likes
                .status()
                .error
                .unwrap_or_else(|| "liked sheets unavailable".into());
            return Err(CoreError::Internal(message));
        }

        let order = self.inner.likes.snapshot();
        if order.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = order.iter().map(|id| id.as_str().to_owned()).collect();
        let mut sheets = sheets_from_rows(self.inner.client.sheets_by_ids(&ids).await?);
        sheets.sort_by_key(|s| order.get_index_of(s.id.as_str()).unwrap_or(usize::MAX));
        Ok(sheets)
    }

    // ── Catalog ──────────────────────────────────────────────────

    /// One page of public sheets matching `query`.
    pub async fn browse(&self, query: &SheetQuery) -> Result<SheetPage, CoreError> {
        self.ensure_fresh_session().await?;
        let filter = SheetFilter::from(query);
        let page = self.inner.client.list_sheets(&filter).await?;
        debug!(rows = page.rows.len(), total = page.total, "catalog page fetched");
        Ok(SheetPage {
            sheets: sheets_from_rows(page.rows),
            total: page.total,
            page: query.page.max(1),
            per_page: query.per_page.max(1),
        })
    }

    /// A single sheet by id.
    pub async fn sheet(&self, sheet_id: &SheetId) -> Result<Sheet, CoreError> {
        self.ensure_fresh_session().await?;
        let row = self
            .inner
            .client
            .get_sheet(sheet_id.as_str())
            .await?
            .ok_or_else(|| CoreError::SheetNotFound {
                id: sheet_id.to_string(),
            })?;
        Sheet::try_from(row)
    }

    // ── Playlists ────────────────────────────────────────────────

    /// The signed-in user's playlists, most recently updated first.
    pub async fn playlists(&self) -> Result<Vec<Playlist>, CoreError> {
        let user = self.require_user().await?;
        let rows = self.inner.client.list_playlists(user.as_str()).await?;
        Ok(rows.into_iter().map(Playlist::from).collect())
    }

    /// Create a playlist owned by the signed-in user.
    pub async fn create_playlist(&self, draft: &PlaylistDraft) -> Result<Playlist, CoreError> {
        let draft = draft.normalized()?;
        let user = self.require_user().await?;
        let row = self
            .inner
            .client
            .create_playlist(&NewPlaylist {
                user_id: user.as_str(),
                title: &draft.title,
                description: draft.description.as_deref(),
                is_public: draft.is_public,
            })
            .await?;
        let playlist = Playlist::from(row);
        info!(playlist_id = %playlist.id, "playlist created");
        Ok(playlist)
    }

    /// A playlist with its sheets in position order.
    pub async fn playlist(&self, id: PlaylistId) -> Result<PlaylistDetail, CoreError> {
        self.ensure_fresh_session().await?;
        let playlist = self.find_playlist(id).await?;
        let items = self.inner.client.playlist_items(id.get()).await?;
        Ok(PlaylistDetail {
            playlist,
            sheets: sheets_from_items(items),
        })
    }

    /// Delete one of the signed-in user's playlists.
    pub async fn delete_playlist(&self, id: PlaylistId) -> Result<(), CoreError> {
        self.require_user().await?;
        if self.inner.client.delete_playlist(id.get()).await? == 0 {
            return Err(CoreError::PlaylistNotFound { id: id.to_string() });
        }
        info!(playlist_id = %id, "playlist deleted");
        Ok(())
    }

    /// Append a sheet to a playlist. Adding a sheet twice is not an error.
    pub async fn add_to_playlist(
        &self,
        id: PlaylistId,
        sheet_id: &SheetId,
    ) -> Result<PlaylistAdd, CoreError> {
        self.require_user().await?;
        self.find_playlist(id).await?;
        match self
            .inner
            .client
            .add_playlist_item(id.get(), sheet_id.as_str())
            .await
        {
            Ok(position) => Ok(PlaylistAdd::Added {
                position: u64::try_from(position).unwrap_or(0),
            }),
            Err(e) if e.is_unique_violation() => {
                debug!(playlist_id = %id, sheet_id = %sheet_id, "sheet already in playlist");
                Ok(PlaylistAdd::AlreadyPresent)
            }
            Err(e) if e.api_error_code() == Some(FOREIGN_KEY_VIOLATION) => {
                Err(CoreError::SheetNotFound {
                    id: sheet_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a sheet from a playlist. Returns `false` when it was not there.
    pub async fn remove_from_playlist(
        &self,
        id: PlaylistId,
        sheet_id: &SheetId,
    ) -> Result<bool, CoreError> {
        self.require_user().await?;
        let removed = self
            .inner
            .client
            .remove_playlist_item(id.get(), sheet_id.as_str())
            .await?;
        Ok(removed > 0)
    }

    // ── Internals ────────────────────────────────────────────────

    async fn require_user(&self) -> Result<UserId, CoreError> {
        let user = self.current_user().ok_or(CoreError::NotAuthenticated)?;
        self.ensure_fresh_session().await?;
        Ok(user)
    }

    async fn find_playlist(&self, id: PlaylistId) -> Result<Playlist, CoreError> {
        self.inner
            .client
            .get_playlist(id.get())
            .await?
            .map(Playlist::from)
            .ok_or_else(|| CoreError::PlaylistNotFound { id: id.to_string() })
    }

    async fn ensure_fresh_session(&self) -> Result<(), CoreError> {
        let Some(session) = self.inner.client.session() else {
            return Ok(());
        };
        if !session.is_expired(chrono::Duration::seconds(REFRESH_SKEW_SECS)) {
            return Ok(());
        }
        debug!("access token expiring, refreshing");
        match self.inner.client.refresh_session().await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "session refresh failed");
                self.inner.session_state.send_replace(SessionState::Failed);
                Err(e.into())
            }
        }
    }
}

fn build_transport(config: &HubConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}
