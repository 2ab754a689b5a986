// ── Like toggle ──
//
// The like button on a sheet card or detail page. Holds a view of one
// sheet (liked flag, authoritative count, pending flag, notice) and drives
// the shared `LikeStore` when clicked. Unmounting cancels its token; from
// then on no view updates are applied.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::LikeBackend;
use crate::model::SheetId;
use crate::store::LikeStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TogglePhase {
    #[default]
    Idle,
    /// A click is being processed; further clicks are ignored.
    Pending,
}

/// What a consumer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleView {
    pub liked: bool,
    /// Remote like total; `None` until the first successful count.
    pub count: Option<u64>,
    pub phase: TogglePhase,
    /// Transient failure message, cleared by the next click.
    pub notice: Option<String>,
}

/// Result of one click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Liked,
    Unliked,
    /// A previous click was still pending.
    Ignored,
    Failed(String),
    /// Unmounted before the click settled.
    Cancelled,
}

pub struct LikeToggle<B: LikeBackend> {
    sheet_id: SheetId,
    store: Arc<LikeStore<B>>,
    pacing: Duration,
    view: watch::Sender<ToggleView>,
    cancel: CancellationToken,
}

impl<B: LikeBackend> LikeToggle<B> {
    /// Create a toggle bound to `parent`; cancelling the parent (sign-out)
    /// unmounts every toggle created from it.
    pub fn new(
        sheet_id: SheetId,
        store: Arc<LikeStore<B>>,
        pacing: Duration,
        parent: &CancellationToken,
    ) -> Self {
        let (view, _) = watch::channel(ToggleView {
            liked: store.is_sheet_liked(sheet_id.as_str()),
            ..ToggleView::default()
        });
        Self {
            sheet_id,
            store,
            pacing,
            view,
            cancel: parent.child_token(),
        }
    }

    pub fn sheet_id(&self) -> &SheetId {
        &self.sheet_id
    }

    pub fn view(&self) -> ToggleView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ToggleView> {
        self.view.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Load the authoritative count and reconcile the liked flag with the
    /// store (loading the store for the current user if needed).
    pub async fn mount(&self) {
        let loaded = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return,
            loaded = async {
                tokio::join!(
                    self.store.like_count(&self.sheet_id),
                    self.store.ensure_loaded(),
                )
            } => loaded,
        };

        let (count, _) = loaded;
        let count = count
            .map_err(|e| warn!(sheet_id = %self.sheet_id, error = %e, "failed to count likes"))
            .ok();
        let liked = self.store.is_sheet_liked(self.sheet_id.as_str());
        self.view.send_modify(|v| {
            v.liked = liked;
            if count.is_some() {
                v.count = count;
            }
        });
    }

    /// Handle a click: pace, flip the like, refresh the count.
    pub async fn toggle(&self) -> ToggleOutcome {
        if self.cancel.is_cancelled() {
            return ToggleOutcome::Cancelled;
        }
        let Some(want_like) = self.begin() else {
            debug!(sheet_id = %self.sheet_id, "click ignored while pending");
            return ToggleOutcome::Ignored;
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return ToggleOutcome::Cancelled,
            () = tokio::time::sleep(self.pacing) => {}
        }

        // Runs to completion even if unmounted meanwhile so the store's
        // cache and the remote rows stay in step.
        let result = if want_like {
            self.store.try_like_sheet(&self.sheet_id).await
        } else {
            self.store.try_unlike_sheet(&self.sheet_id).await
        };

        let count = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return ToggleOutcome::Cancelled,
            count = self.store.like_count(&self.sheet_id) => count,
        };
        let count = count
            .map_err(|e| warn!(sheet_id = %self.sheet_id, error = %e, "failed to refresh like count"))
            .ok();

        let liked = self.store.is_sheet_liked(self.sheet_id.as_str());
        let notice = result.as_ref().err().map(ToString::to_string);
        self.view.send_modify(|v| {
            v.liked = liked;
            if count.is_some() {
                v.count = count;
            }
            v.phase = TogglePhase::Idle;
            v.notice.clone_from(&notice);
        });

        match result {
            Ok(_) if want_like => ToggleOutcome::Liked,
            Ok(_) => ToggleOutcome::Unliked,
            Err(e) => ToggleOutcome::Failed(e.to_string()),
        }
    }

    /// Stop applying updates. In-flight store writes still finish.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    /// Move idle -> pending, returning the action the click asks for.
    ///
    /// The shared store decides, so a view left stale by another toggle
    /// on the same sheet still does the right thing.
    fn begin(&self) -> Option<bool> {
        let mut want_like = None;
        self.view.send_if_modified(|v| {
            if v.phase == TogglePhase::Pending {
                return false;
            }
            let liked = self.store.is_sheet_liked(self.sheet_id.as_str());
            v.phase = TogglePhase::Pending;
            v.notice = None;
            v.liked = liked;
            want_like = Some(!liked);
            true
        });
        want_like
    }
}

impl<B: LikeBackend> Drop for LikeToggle<B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;
    use crate::config::DEFAULT_LIKE_PACING;
    use crate::test_support::{FakeBackend, Op};

    fn toggle_for(
        fake: FakeBackend,
        sheet: &str,
    ) -> (Arc<FakeBackend>, LikeToggle<FakeBackend>, CancellationToken) {
        let backend = Arc::new(fake);
        let store = Arc::new(LikeStore::new(Arc::clone(&backend)));
        let parent = CancellationToken::new();
        let toggle = LikeToggle::new(
            SheetId::new(sheet).unwrap(),
            store,
            DEFAULT_LIKE_PACING,
            &parent,
        );
        (backend, toggle, parent)
    }

    #[tokio::test(start_paused = true)]
    async fn mount_reconciles_flag_and_count() {
        let fake = FakeBackend::signed_in("u1");
        fake.seed_like("u1", "sheet-1");
        fake.seed_like("u2", "sheet-1");
        let (_, toggle, _parent) = toggle_for(fake, "sheet-1");
        assert!(!toggle.view().liked);

        toggle.mount().await;

        let view = toggle.view();
        assert!(view.liked);
        assert_eq!(view.count, Some(2));
        assert_eq!(view.phase, TogglePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn click_waits_for_pacing_then_likes() {
        let (backend, toggle, _parent) = toggle_for(FakeBackend::signed_in("u1"), "sheet-42");
        toggle.mount().await;

        let started = Instant::now();
        assert_eq!(toggle.toggle().await, ToggleOutcome::Liked);
        assert!(started.elapsed() >= DEFAULT_LIKE_PACING);

        let view = toggle.view();
        assert!(view.liked);
        assert_eq!(view.count, Some(1));
        assert_eq!(view.notice, None);
        assert_eq!(backend.calls(Op::Increment), 1);

        assert_eq!(toggle.toggle().await, ToggleOutcome::Unliked);
        assert!(!toggle.view().liked);
        assert_eq!(toggle.view().count, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn clicks_while_pending_are_ignored() {
        let (backend, toggle, _parent) = toggle_for(FakeBackend::signed_in("u1"), "sheet-1");
        let toggle = Arc::new(toggle);

        let first = tokio::spawn({
            let toggle = Arc::clone(&toggle);
            async move { toggle.toggle().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(toggle.view().phase, TogglePhase::Pending);
        assert_eq!(toggle.toggle().await, ToggleOutcome::Ignored);

        assert_eq!(first.await.unwrap(), ToggleOutcome::Liked);
        assert_eq!(toggle.view().phase, TogglePhase::Idle);
        assert_eq!(backend.calls(Op::Insert), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_shows_notice_until_next_click() {
        let fake = FakeBackend::signed_in("u1");
        fake.fail(Op::Insert);
        let (backend, toggle, _parent) = toggle_for(fake, "sheet-1");

        let outcome = toggle.toggle().await;
        assert!(matches!(outcome, ToggleOutcome::Failed(_)));
        let view = toggle.view();
        assert!(!view.liked);
        assert_eq!(view.phase, TogglePhase::Idle);
        assert!(view.notice.is_some());

        backend.heal(Op::Insert);
        assert_eq!(toggle.toggle().await, ToggleOutcome::Liked);
        assert_eq!(toggle.view().notice, None);
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_during_pacing_skips_mutation() {
        let (backend, toggle, _parent) = toggle_for(FakeBackend::signed_in("u1"), "sheet-1");
        let toggle = Arc::new(toggle);

        let click = tokio::spawn({
            let toggle = Arc::clone(&toggle);
            async move { toggle.toggle().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        toggle.unmount();

        assert_eq!(click.await.unwrap(), ToggleOutcome::Cancelled);
        assert!(!toggle.is_mounted());
        assert_eq!(backend.calls(Op::Insert), 0);
        assert_eq!(toggle.toggle().await, ToggleOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancel_unmounts() {
        let (_, toggle, parent) = toggle_for(FakeBackend::signed_in("u1"), "sheet-1");
        parent.cancel();
        assert!(!toggle.is_mounted());
        toggle.mount().await;
        assert_eq!(toggle.view().count, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_view_follows_shared_store() {
        let backend = Arc::new(FakeBackend::signed_in("u1"));
        let store = Arc::new(LikeStore::new(Arc::clone(&backend)));
        let parent = CancellationToken::new();
        let card = |s: &Arc<LikeStore<FakeBackend>>| {
            LikeToggle::new(
                SheetId::new("sheet-1").unwrap(),
                Arc::clone(s),
                DEFAULT_LIKE_PACING,
                &parent,
            )
        };
        let grid_card = card(&store);
        let detail = card(&store);
        grid_card.mount().await;
        detail.mount().await;

        assert_eq!(grid_card.toggle().await, ToggleOutcome::Liked);
        // The detail view never saw that click.
        assert!(!detail.view().liked);

        assert_eq!(detail.toggle().await, ToggleOutcome::Unliked);
        assert!(!store.is_sheet_liked("sheet-1"));
        assert!(!backend.has_row("u1", "sheet-1"));
        assert_eq!(backend.calls(Op::Insert), 1);
        assert_eq!(backend.calls(Op::Delete), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn signed_out_click_fails() {
        let (_, toggle, _parent) = toggle_for(FakeBackend::default(), "sheet-1");
        assert!(matches!(toggle.toggle().await, ToggleOutcome::Failed(_)));
        assert!(!toggle.view().liked);
        assert_eq!(toggle.view().count, Some(0));
    }
}
