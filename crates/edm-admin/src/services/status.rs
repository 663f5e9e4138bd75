//! Observable orchestration state

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::AdminResult;

/// UI-facing outcome of an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<&AdminResult<T>> for ActionResult {
    fn from(result: &AdminResult<T>) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                error: None,
            },
            Err(err) => Self {
                success: false,
                error: Some(err.user_message()),
            },
        }
    }
}

/// Snapshot published to observers of one orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionState {
    pub loading: bool,
    pub error: Option<String>,
    pub confirmation_pending: bool,
}

/// `loading` / `error` / `confirmation_pending` on a watch channel
#[derive(Clone)]
pub struct ActionStatus {
    tx: Arc<watch::Sender<ActionState>>,
}

impl Default for ActionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionStatus {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ActionState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ActionState {
        self.tx.borrow().clone()
    }

    pub fn begin(&self) {
        self.tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    pub fn finish<T>(&self, result: &AdminResult<T>) {
        let outcome = ActionResult::from(result);
        self.tx.send_modify(|state| {
            state.loading = false;
            state.error = outcome.error;
        });
    }

    pub fn set_confirmation_pending(&self, pending: bool) {
        self.tx.send_modify(|state| state.confirmation_pending = pending);
    }
}

/// Monotonic counter bumped after every successful mutation; the navigation
/// tree rebuilds when it changes
#[derive(Clone)]
pub struct RefreshSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_modify(|counter| *counter += 1);
    }

    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}
