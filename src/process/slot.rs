use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::task::TaskHandle;

/// Kinds of long-running child processes. At most one of each may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Training,
    Download,
    Prediction,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Training => write!(f, "training"),
            TaskKind::Download => write!(f, "download"),
            TaskKind::Prediction => write!(f, "prediction"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("A {0} process is already running")]
pub struct SlotBusy(pub TaskKind);

/// Registry of in-flight tasks, one per [`TaskKind`].
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct TaskSlot {
    active: Arc<Mutex<HashMap<TaskKind, Option<TaskHandle>>>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskKind, Option<TaskHandle>>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve the slot for `kind`. The reservation is released when the
    /// returned claim is dropped.
    pub fn claim(&self, kind: TaskKind) -> Result<SlotClaim, SlotBusy> {
        let mut active = self.lock();
        if active.contains_key(&kind) {
            return Err(SlotBusy(kind));
        }
        active.insert(kind, None);
        tracing::debug!(kind = %kind, "Claimed task slot");
        Ok(SlotClaim {
            slot: self.clone(),
            kind,
        })
    }

    pub fn release(&self, kind: TaskKind) {
        if self.lock().remove(&kind).is_some() {
            tracing::debug!(kind = %kind, "Released task slot");
        }
    }

    /// Handle of the running task of `kind`, if one is attached.
    pub fn active(&self, kind: TaskKind) -> Option<TaskHandle> {
        self.lock().get(&kind).cloned().flatten()
    }

    pub fn is_claimed(&self, kind: TaskKind) -> bool {
        self.lock().contains_key(&kind)
    }

    /// Stop every attached task. Returns how many were signalled.
    pub fn stop_all(&self) -> usize {
        let handles: Vec<TaskHandle> = self.lock().values().flatten().cloned().collect();
        handles.iter().filter(|h| h.stop().is_done()).count()
    }
}

/// A held reservation in a [`TaskSlot`].
#[derive(Debug)]
pub struct SlotClaim {
    slot: TaskSlot,
    kind: TaskKind,
}

impl SlotClaim {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Make the spawned task reachable through [`TaskSlot::active`].
    pub fn attach(&self, handle: TaskHandle) {
        self.slot.lock().insert(self.kind, Some(handle));
    }
}

impl Drop for SlotClaim {
    fn drop(&mut self) {
        self.slot.release(self.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_exclusive_per_kind() {
        let slot = TaskSlot::new();
        let claim = slot.claim(TaskKind::Training).unwrap();
        assert!(matches!(
            slot.claim(TaskKind::Training),
            Err(SlotBusy(TaskKind::Training))
        ));
        let _download = slot.claim(TaskKind::Download).unwrap();

        drop(claim);
        assert!(slot.claim(TaskKind::Training).is_ok());
    }

    #[test]
    fn test_clones_share_registry() {
        let slot = TaskSlot::new();
        let other = slot.clone();
        let _claim = slot.claim(TaskKind::Download).unwrap();
        assert!(other.is_claimed(TaskKind::Download));
        assert!(other.claim(TaskKind::Download).is_err());
    }

    #[test]
    fn test_active_empty_until_attached() {
        let slot = TaskSlot::new();
        let _claim = slot.claim(TaskKind::Download).unwrap();
        assert!(slot.active(TaskKind::Download).is_none());
        assert!(slot.active(TaskKind::Training).is_none());
    }

    #[test]
    fn test_release_frees_slot() {
        let slot = TaskSlot::new();
        let claim = slot.claim(TaskKind::Prediction).unwrap();
        slot.release(TaskKind::Prediction);
        assert!(!slot.is_claimed(TaskKind::Prediction));
        drop(claim);
        assert!(!slot.is_claimed(TaskKind::Prediction));
    }

    #[test]
    fn test_stop_all_skips_unattached_claims() {
        let slot = TaskSlot::new();
        assert_eq!(slot.stop_all(), 0);
        let _claim = slot.claim(TaskKind::Training).unwrap();
        assert_eq!(slot.stop_all(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_attached_handle_is_reachable() {
        use super::super::task::ProcessTask;
        use std::process::Command;
        use std::time::Duration;

        let slot = TaskSlot::new();
        let claim = slot.claim(TaskKind::Download).unwrap();
        let mut command = Command::new("sh");
        command.arg("-c").arg("true");
        let task = ProcessTask::spawn(command, Duration::from_secs(1)).unwrap();
        claim.attach(task.handle());

        let handle = slot.active(TaskKind::Download).unwrap();
        assert_eq!(handle.pid(), task.handle().pid());
        task.wait(|_| {}).unwrap();
        drop(claim);
        assert!(slot.active(TaskKind::Download).is_none());
    }
}
