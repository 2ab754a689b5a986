// In-memory like table for store and toggle tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::LikeBackend;
use crate::error::CoreError;
use crate::model::{SheetId, UserId};

/// Remote operations a test can make fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    List,
    Insert,
    Delete,
    Increment,
    Decrement,
    Count,
}

#[derive(Default)]
struct State {
    user: Option<UserId>,
    rows: HashSet<(UserId, SheetId)>,
    counters: HashMap<SheetId, i64>,
    calls: HashMap<Op, usize>,
    failing: HashSet<Op>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<State>,
    /// Simulated network latency for every remote call.
    latency: Option<Duration>,
}

impl FakeBackend {
    pub(crate) fn signed_in(user: &str) -> Self {
        let fake = Self::default();
        fake.set_user(Some(user));
        fake
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn set_user(&self, user: Option<&str>) {
        self.state.lock().unwrap().user = user.map(UserId::new);
    }

    /// Seed a remote like row without touching the counter.
    pub(crate) fn seed_like(&self, user: &str, sheet: &str) {
        self.state
            .lock()
            .unwrap()
            .rows
            .insert((UserId::new(user), SheetId::new(sheet).unwrap()));
    }

    pub(crate) fn fail(&self, op: Op) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub(crate) fn heal(&self, op: Op) {
        self.state.lock().unwrap().failing.remove(&op);
    }

    pub(crate) fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn counter(&self, sheet: &str) -> i64 {
        let id = SheetId::new(sheet).unwrap();
        self.state
            .lock()
            .unwrap()
            .counters
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn has_row(&self, user: &str, sheet: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .rows
            .contains(&(UserId::new(user), SheetId::new(sheet).unwrap()))
    }

    async fn enter(&self, op: Op) -> Result<(), CoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(op).or_default() += 1;
        if state.failing.contains(&op) {
            return Err(CoreError::ConnectionFailed {
                url: "memory://likes".into(),
                reason: format!("{op:?} unavailable"),
            });
        }
        Ok(())
    }
}

impl LikeBackend for FakeBackend {
    fn current_user(&self) -> Option<UserId> {
        self.state.lock().unwrap().user.clone()
    }

    async fn liked_sheet_ids(&self, user: &UserId) -> Result<Vec<SheetId>, CoreError> {
        self.enter(Op::List).await?;
        let state = self.state.lock().unwrap();
        let mut ids: Vec<SheetId> = state
            .rows
            .iter()
            .filter(|(u, _)| u == user)
            .map(|(_, s)| s.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn insert_like(&self, user: &UserId, sheet: &SheetId) -> Result<bool, CoreError> {
        self.enter(Op::Insert).await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .insert((user.clone(), sheet.clone())))
    }

    async fn delete_like(&self, user: &UserId, sheet: &SheetId) -> Result<bool, CoreError> {
        self.enter(Op::Delete).await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .remove(&(user.clone(), sheet.clone())))
    }

    async fn increment_likes(&self, sheet: &SheetId) -> Result<(), CoreError> {
        self.enter(Op::Increment).await?;
        *self
            .state
            .lock()
            .unwrap()
            .counters
            .entry(sheet.clone())
            .or_default() += 1;
        Ok(())
    }

    async fn decrement_likes(&self, sheet: &SheetId) -> Result<(), CoreError> {
        self.enter(Op::Decrement).await?;
        *self
            .state
            .lock()
            .unwrap()
            .counters
            .entry(sheet.clone())
            .or_default() -= 1;
        Ok(())
    }

    async fn count_likes(&self, sheet: &SheetId) -> Result<u64, CoreError> {
        self.enter(Op::Count).await?;
        let state = self.state.lock().unwrap();
        Ok(state.rows.iter().filter(|(_, s)| s == sheet).count() as u64)
    }
}
