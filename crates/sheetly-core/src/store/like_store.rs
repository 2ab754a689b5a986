// ── Like store ──
//
// Per-session cache of the current user's liked sheet ids. Every cache
// write goes through the methods below; reads are synchronous. Changes
// are published on a `watch` channel so mounted consumers can re-render.
//
// Loads race with mutations: a list fetched before a like landed must not
// wipe that like out. While a load is in flight every cache change is
// journaled, and the loaded list is merged with the journal and with the
// mutations still awaiting the backend before it replaces the cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::LikeBackend;
use crate::error::CoreError;
use crate::model::{SheetId, UserId};

/// Immutable view of the cached liked ids, in the order they were learned.
pub type LikeSnapshot = Arc<IndexSet<SheetId>>;

/// Load status of the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeStatus {
    /// A `fetch_user_likes` call is in flight.
    pub loading: bool,
    /// Message of the last failed fetch, cleared by the next attempt.
    pub error: Option<String>,
    /// User whose likes the cache currently holds; `None` until loaded.
    pub owner: Option<UserId>,
}

/// What a successful like/unlike did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    /// The remote row and counter were changed.
    Applied,
    /// The cache already agreed; nothing was sent.
    Unchanged,
    /// The cache disagreed but the remote row was already in the target
    /// state (lost race). Cache converged, counter untouched.
    Converged,
}

// ── Journal ─────────────────────────────────────────────────────────

/// One cache change: `liked` is the state the sheet was moved to.
#[derive(Debug, Clone)]
struct Entry {
    epoch: u64,
    sheet_id: SheetId,
    liked: bool,
}

/// Cache changes made while loads are in flight, plus the mutations whose
/// remote write has not settled yet.
#[derive(Debug, Default)]
struct Journal {
    /// Bumped by every cache change.
    epoch: u64,
    /// Loads in flight; entries are kept only while this is non-zero.
    loads: usize,
    entries: Vec<Entry>,
    /// Optimistic changes awaiting the backend, keyed by their epoch.
    pending: Vec<Entry>,
}

impl Journal {
    fn record(&mut self, sheet_id: &SheetId, liked: bool) -> u64 {
        self.epoch += 1;
        if self.loads > 0 {
            self.entries.push(Entry {
                epoch: self.epoch,
                sheet_id: sheet_id.clone(),
                liked,
            });
        }
        self.epoch
    }

    fn take_pending(&mut self, ticket: u64) {
        self.pending.retain(|p| p.epoch != ticket);
    }

    /// Apply everything that happened after `since` on top of `loaded`.
    fn merge_into(&self, since: u64, loaded: &mut IndexSet<SheetId>) {
        let after = self.entries.iter().filter(|e| e.epoch > since);
        for entry in after.chain(self.pending.iter()) {
            apply(loaded, &entry.sheet_id, entry.liked);
        }
    }
}

/// Marks a load in flight for as long as it lives, dropped futures included.
struct LoadGuard<'a> {
    journal: &'a Mutex<Journal>,
    since: u64,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let mut journal = lock(self.journal);
        journal.loads = journal.loads.saturating_sub(1);
        if journal.loads == 0 {
            journal.entries.clear();
        }
    }
}

fn lock(journal: &Mutex<Journal>) -> MutexGuard<'_, Journal> {
    journal.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply(set: &mut IndexSet<SheetId>, sheet_id: &SheetId, liked: bool) -> bool {
    if liked {
        set.insert(sheet_id.clone())
    } else {
        set.shift_remove(sheet_id)
    }
}

// ── LikeStore ───────────────────────────────────────────────────────

/// Shared view of "does the current user like sheet X".
///
/// Construct one per signed-in session and share it behind an `Arc`.
/// Mutations are optimistic: the cache changes first, and is reverted if
/// the remote write fails, so a failed call always leaves the cache where
/// it started.
pub struct LikeStore<B: LikeBackend> {
    backend: Arc<B>,
    likes: watch::Sender<LikeSnapshot>,
    status: watch::Sender<LikeStatus>,
    /// Bumped by `clear_likes`; results started under an older generation
    /// are dropped instead of applied.
    generation: AtomicU64,
    /// Held while the cache is written.
    journal: Mutex<Journal>,
}

impl<B: LikeBackend> LikeStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (likes, _) = watch::channel(Arc::new(IndexSet::new()));
        let (status, _) = watch::channel(LikeStatus::default());
        Self {
            backend,
            likes,
            status,
            generation: AtomicU64::new(0),
            journal: Mutex::new(Journal::default()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Synchronous cache lookup; never touches the network.
    pub fn is_sheet_liked(&self, sheet_id: &str) -> bool {
        self.likes.borrow().contains(sheet_id)
    }

    /// Cached liked ids, oldest first.
    pub fn liked_sheet_ids(&self) -> Vec<SheetId> {
        self.likes.borrow().iter().cloned().collect()
    }

    pub fn snapshot(&self) -> LikeSnapshot {
        Arc::clone(&self.likes.borrow())
    }

    pub fn status(&self) -> LikeStatus {
        self.status.borrow().clone()
    }

    /// Receive every new cache snapshot.
    pub fn subscribe(&self) -> watch::Receiver<LikeSnapshot> {
        self.likes.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<LikeStatus> {
        self.status.subscribe()
    }

    /// Authoritative like total for a sheet. Always remote, never cached.
    pub async fn like_count(&self, sheet_id: &SheetId) -> Result<u64, CoreError> {
        self.backend.count_likes(sheet_id).await
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Replace the cache with the user's remote likes.
    ///
    /// Likes and unlikes made while the fetch was in flight are kept.
    /// Failures (signed out, network, backend) are contained: the result
    /// is an empty list and the message lands in [`LikeStatus::error`].
    /// When signed out, or when the cache belongs to a different user, the
    /// cache is emptied; otherwise it keeps its last known good contents.
    pub async fn fetch_user_likes(&self) -> Vec<SheetId> {
        let generation = self.generation.load(Ordering::Acquire);
        self.status.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let load = self.begin_load();
        match self.load_remote().await {
            Ok((user, ids)) => match self.apply_loaded(generation, &load, user, ids) {
                Some(merged) => merged,
                None => {
                    debug!("likes fetched before clear_likes; discarding");
                    self.status.send_modify(|s| s.loading = false);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to fetch liked sheets");
                self.forget_foreign_likes(matches!(e, CoreError::NotAuthenticated));
                self.status.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                Vec::new()
            }
        }
    }

    /// Fetch only if the cache is not already loaded for the signed-in
    /// user. Returns `true` when the cache is loaded afterwards.
    pub async fn ensure_loaded(&self) -> bool {
        let Some(user) = self.backend.current_user() else {
            return false;
        };
        if self.is_loaded_for(&user) {
            return true;
        }
        self.fetch_user_likes().await;
        self.is_loaded_for(&user)
    }

    /// Forget every cached like. Called on sign-out.
    pub fn clear_likes(&self) {
        {
            let mut journal = lock(&self.journal);
            self.generation.fetch_add(1, Ordering::AcqRel);
            journal.entries.clear();
            journal.pending.clear();
            self.likes.send_replace(Arc::new(IndexSet::new()));
        }
        self.status.send_replace(LikeStatus::default());
        debug!("like cache cleared");
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Like a sheet. Returns `true` on success (including "already
    /// liked"); failures are logged and reported as `false`.
    pub async fn like_sheet(&self, sheet_id: &str) -> bool {
        let result = match SheetId::new(sheet_id) {
            Ok(id) => self.try_like_sheet(&id).await,
            Err(e) => Err(e),
        };
        report("like", sheet_id, result)
    }

    /// Unlike a sheet. Same contract as [`like_sheet`](Self::like_sheet).
    pub async fn unlike_sheet(&self, sheet_id: &str) -> bool {
        let result = match SheetId::new(sheet_id) {
            Ok(id) => self.try_unlike_sheet(&id).await,
            Err(e) => Err(e),
        };
        report("unlike", sheet_id, result)
    }

    /// Like a sheet, reporting the error on failure.
    pub async fn try_like_sheet(&self, sheet_id: &SheetId) -> Result<LikeChange, CoreError> {
        self.mutate(sheet_id, true).await
    }

    /// Unlike a sheet, reporting the error on failure.
    pub async fn try_unlike_sheet(&self, sheet_id: &SheetId) -> Result<LikeChange, CoreError> {
        self.mutate(sheet_id, false).await
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn mutate(&self, sheet_id: &SheetId, like: bool) -> Result<LikeChange, CoreError> {
        let user = self.prepare_mutation().await?;
        let generation = self.generation.load(Ordering::Acquire);

        let Some(ticket) = self.apply_optimistic(sheet_id, like) else {
            return Ok(LikeChange::Unchanged);
        };
        let result = if like {
            self.write_like(&user, sheet_id).await
        } else {
            self.write_unlike(&user, sheet_id).await
        };
        self.settle(generation, ticket, sheet_id, like, result.is_ok());
        result
    }

    async fn write_like(
        &self,
        user: &UserId,
        sheet_id: &SheetId,
    ) -> Result<LikeChange, CoreError> {
        if !self.backend.insert_like(user, sheet_id).await? {
            debug!(sheet_id = %sheet_id, "like already registered remotely");
            return Ok(LikeChange::Converged);
        }
        if let Err(e) = self.backend.increment_likes(sheet_id).await {
            // Undo the row so the like and the counter stay in step.
            if let Err(undo) = self.backend.delete_like(user, sheet_id).await {
                warn!(sheet_id = %sheet_id, error = %undo, "could not undo like after counter failure");
                self.mark_stale();
            }
            return Err(e);
        }
        Ok(LikeChange::Applied)
    }

    async fn write_unlike(
        &self,
        user: &UserId,
        sheet_id: &SheetId,
    ) -> Result<LikeChange, CoreError> {
        if !self.backend.delete_like(user, sheet_id).await? {
            debug!(sheet_id = %sheet_id, "like already gone remotely");
            return Ok(LikeChange::Converged);
        }
        if let Err(e) = self.backend.decrement_likes(sheet_id).await {
            if let Err(undo) = self.backend.insert_like(user, sheet_id).await {
                warn!(sheet_id = %sheet_id, error = %undo, "could not undo unlike after counter failure");
                self.mark_stale();
            }
            return Err(e);
        }
        Ok(LikeChange::Applied)
    }

    async fn load_remote(&self) -> Result<(UserId, Vec<SheetId>), CoreError> {
        let user = self
            .backend
            .current_user()
            .ok_or(CoreError::NotAuthenticated)?;
        let mut ids = self.backend.liked_sheet_ids(&user).await?;
        let mut seen = IndexSet::with_capacity(ids.len());
        ids.retain(|id| seen.insert(id.clone()));
        Ok((user, ids))
    }

    fn begin_load(&self) -> LoadGuard<'_> {
        let mut journal = lock(&self.journal);
        journal.loads += 1;
        LoadGuard {
            journal: &self.journal,
            since: journal.epoch,
        }
    }

    /// Install a loaded list merged with the changes made since the load
    /// began. `None` when the cache was cleared meanwhile.
    fn apply_loaded(
        &self,
        generation: u64,
        load: &LoadGuard<'_>,
        user: UserId,
        ids: Vec<SheetId>,
    ) -> Option<Vec<SheetId>> {
        let merged = {
            let journal = lock(&self.journal);
            if self.generation.load(Ordering::Acquire) != generation {
                return None;
            }
            let mut loaded: IndexSet<SheetId> = ids.into_iter().collect();
            journal.merge_into(load.since, &mut loaded);
            let merged: Vec<SheetId> = loaded.iter().cloned().collect();
            self.likes.send_replace(Arc::new(loaded));
            merged
        };
        debug!(user_id = %user, count = merged.len(), "like cache loaded");
        self.status.send_modify(|s| {
            s.loading = false;
            s.error = None;
            s.owner = Some(user);
        });
        Some(merged)
    }

    fn is_loaded_for(&self, user: &UserId) -> bool {
        self.status.borrow().owner.as_ref() == Some(user)
    }

    /// Empty the cache after a failed load when it can no longer be
    /// trusted: signed out, or still holding another user's likes.
    fn forget_foreign_likes(&self, signed_out: bool) {
        let current = self.backend.current_user();
        let foreign = self
            .status
            .borrow()
            .owner
            .as_ref()
            .is_some_and(|owner| Some(owner) != current.as_ref());
        if !(signed_out || foreign) {
            return;
        }
        debug!(signed_out, "dropping likes that do not belong to the current user");
        {
            let mut journal = lock(&self.journal);
            journal.pending.clear();
            self.likes.send_replace(Arc::new(IndexSet::new()));
        }
        self.status.send_modify(|s| s.owner = None);
    }

    /// The remote rows no longer match the cache; reload on next use.
    fn mark_stale(&self) {
        self.status.send_modify(|s| s.owner = None);
    }

    /// Resolve the acting user and make sure the cache belongs to them, so
    /// the idempotency check below runs against real data.
    async fn prepare_mutation(&self) -> Result<UserId, CoreError> {
        let user = self
            .backend
            .current_user()
            .ok_or(CoreError::NotAuthenticated)?;
        if !self.is_loaded_for(&user) {
            info!(user_id = %user, "loading likes before first mutation");
            let generation = self.generation.load(Ordering::Acquire);
            let load = self.begin_load();
            let (owner, ids) = match self.load_remote().await {
                Ok(loaded) => loaded,
                Err(e) => {
                    self.forget_foreign_likes(matches!(e, CoreError::NotAuthenticated));
                    return Err(e);
                }
            };
            if self.apply_loaded(generation, &load, owner, ids).is_none() {
                return Err(CoreError::Cancelled);
            }
        }
        Ok(user)
    }

    /// Move the cache to the target state. Returns the pending ticket, or
    /// `None` when the cache already agreed.
    fn apply_optimistic(&self, sheet_id: &SheetId, liked: bool) -> Option<u64> {
        let mut journal = lock(&self.journal);
        if !self.write_cache(sheet_id, liked) {
            return None;
        }
        let ticket = journal.record(sheet_id, liked);
        journal.pending.push(Entry {
            epoch: ticket,
            sheet_id: sheet_id.clone(),
            liked,
        });
        Some(ticket)
    }

    /// Close out an optimistic change: keep it on success, undo it on
    /// failure unless the cache was cleared meanwhile.
    fn settle(&self, generation: u64, ticket: u64, sheet_id: &SheetId, liked: bool, ok: bool) {
        let mut journal = lock(&self.journal);
        journal.take_pending(ticket);
        if self.generation.load(Ordering::Acquire) != generation {
            return;
        }
        let state = if ok { liked } else { !liked };
        if !ok {
            self.write_cache(sheet_id, state);
        }
        journal.record(sheet_id, state);
    }

    /// Callers hold the journal lock.
    fn write_cache(&self, sheet_id: &SheetId, liked: bool) -> bool {
        self.likes.send_if_modified(|set| {
            if set.contains(sheet_id) == liked {
                return false;
            }
            apply(Arc::make_mut(set), sheet_id, liked)
        })
    }
}

fn report(action: &str, sheet_id: &str, result: Result<LikeChange, CoreError>) -> bool {
    match result {
        Ok(change) => {
            debug!(action, sheet_id, ?change, "like mutation settled");
            true
        }
        Err(e) => {
            warn!(action, sheet_id, error = %e, "like mutation failed");
            false
        }
    }
}
