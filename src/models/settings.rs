use serde::{Deserialize, Serialize};

use super::classes::ClassList;
use super::session::WorkflowSession;

/// Cumulative counters shown on the home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub datasets: u64,
    #[serde(default)]
    pub images: u64,
    #[serde(default)]
    pub models: u64,
}

impl Statistics {
    pub fn record_download(&mut self, images: u64) {
        self.datasets += 1;
        self.images += images;
    }

    pub fn record_model(&mut self) {
        self.models += 1;
    }

    /// Add what `ours` counted beyond `base`.
    fn add_delta(&mut self, base: &Statistics, ours: &Statistics) {
        self.datasets += ours.datasets.saturating_sub(base.datasets);
        self.images += ours.images.saturating_sub(base.images);
        self.models += ours.models.saturating_sub(base.models);
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub session: WorkflowSession,
    #[serde(default)]
    pub classes: ClassList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_class: Option<String>,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default = "default_language")]
    pub language: String,
    /// Hidden fast-test mode: shrinks the three-step download quota.
    #[serde(default)]
    pub admin_mode: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            session: WorkflowSession::default(),
            classes: ClassList::default(),
            selected_class: None,
            statistics: Statistics::default(),
            language: default_language(),
            admin_mode: false,
        }
    }
}

impl PersistedState {
    /// Selected class, falling back to the first class when the saved
    /// selection no longer exists.
    pub fn selected_class(&self) -> Option<&str> {
        self.classes.resolve_selected(self.selected_class.as_deref())
    }

    /// Fold the fields `ours` changed since `base` into `self`, the copy
    /// currently on disk. Fields `ours` left alone keep the disk value; class
    /// names merge one by one and statistics add up.
    pub fn merge_changes(&mut self, base: &PersistedState, ours: &PersistedState) {
        if ours.session != base.session {
            self.session = ours.session.clone();
        }
        self.classes.apply_changes(&base.classes, &ours.classes);
        if ours.selected_class != base.selected_class {
            self.selected_class = ours.selected_class.clone();
        }
        if ours.language != base.language {
            self.language = ours.language.clone();
        }
        if ours.admin_mode != base.admin_mode {
            self.admin_mode = ours.admin_mode;
        }
        self.statistics.add_delta(&base.statistics, &ours.statistics);
    }
}
