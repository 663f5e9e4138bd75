//! Step bookkeeping for multi-step orchestrations
//!
//! Orchestrations are sequences of idempotent side effects with no rollback.
//! When a step fails after others were applied, the caller gets a
//! [`PartialFailure`] naming what already happened and what broke.

use serde::Serialize;
use std::future::Future;

use crate::error::{AdminError, AdminResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    Applied,
    /// Not found or already present; the step was treated as done
    Tolerated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Failure after one or more side effects were already applied
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialFailure {
    pub operation: String,
    pub completed: Vec<StepRecord>,
    pub failed_step: String,
    pub cause: String,
    pub remediation: String,
}

impl PartialFailure {
    pub fn user_message(&self) -> String {
        format!(
            "The operation failed while trying to {} after {} step(s) had been applied. {}",
            self.failed_step,
            self.completed.len(),
            self.remediation
        )
    }
}

/// Steps performed so far by one orchestration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub operation: String,
    pub steps: Vec<StepRecord>,
}

impl OperationReport {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            steps: Vec::new(),
        }
    }

    pub fn applied(&mut self, step: impl Into<String>) {
        self.steps.push(StepRecord {
            step: step.into(),
            status: StepStatus::Applied,
            note: None,
        });
    }

    pub fn tolerated(&mut self, step: impl Into<String>, note: impl Into<String>) {
        let step = step.into();
        let note = note.into();
        tracing::warn!(operation = %self.operation, step = %step, "{}", note);
        self.steps.push(StepRecord {
            step,
            status: StepStatus::Tolerated,
            note: Some(note),
        });
    }

    /// Whether any side effect has been recorded
    pub fn has_side_effects(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Tolerated)
    }

    /// Wrap `err` raised by `step`. Before any side effect the error is
    /// returned as is; afterwards it becomes a partial-failure report.
    pub fn fail(&self, step: &str, err: AdminError) -> AdminError {
        if !self.has_side_effects() || matches!(err, AdminError::PartialFailure(_)) {
            return err;
        }

        tracing::error!(
            operation = %self.operation,
            failed_step = %step,
            completed = self.steps.len(),
            error = %err,
            "Orchestration stopped part-way"
        );

        AdminError::PartialFailure(Box::new(PartialFailure {
            operation: self.operation.clone(),
            completed: self.steps.clone(),
            failed_step: step.to_string(),
            cause: err.user_message(),
            remediation: format!(
                "Every step is safe to repeat: run '{}' again to finish it.",
                self.operation
            ),
        }))
    }

    /// Run one side effect, recording it on success
    pub async fn step<T, F>(&mut self, step: &str, effect: F) -> AdminResult<T>
    where
        F: Future<Output = AdminResult<T>>,
    {
        match effect.await {
            Ok(value) => {
                tracing::debug!(operation = %self.operation, step = %step, "Step applied");
                self.applied(step);
                Ok(value)
            }
            Err(err) => Err(self.fail(step, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_step_failure_is_not_partial() {
        let mut report = OperationReport::new("create company");
        let result: AdminResult<()> = report
            .step("upsert admin", async { Err(AdminError::Transport("down".into())) })
            .await;
        assert!(matches!(result, Err(AdminError::Transport(_))));
    }

    #[tokio::test]
    async fn test_later_failure_carries_completed_steps() {
        let mut report = OperationReport::new("create company");
        report.step("upsert admin", async { Ok(()) }).await.unwrap();
        report.tolerated("create root folder", "already existed");

        let err = report
            .step("patch record", async {
                Err::<(), _>(AdminError::Transport("timeout".into()))
            })
            .await
            .unwrap_err();

        let AdminError::PartialFailure(failure) = err else {
            panic!("expected partial failure");
        };
        assert_eq!(failure.failed_step, "patch record");
        assert_eq!(failure.completed.len(), 2);
        assert_eq!(failure.completed[1].status, StepStatus::Tolerated);
        assert!(failure.user_message().contains("patch record"));
    }
}
