use std::collections::HashMap;

use tracing::debug;

use crate::ids::{FileId, ProjectId};
use crate::model::{Project, Tab};

/// Result of a tab transition, telling the caller what to show in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabChange {
    /// The referenced file became the active file.
    Activated(FileId),
    /// The last open tab was closed; nothing is active anymore.
    Cleared,
    Unchanged,
}

/// Ordered, id-unique tabs of one project together with its active tab.
/// 單一專案的分頁序列（依 id 去重）與目前作用中的分頁。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabStrip {
    tabs: Vec<Tab>,
    active: Option<FileId>,
}

impl TabStrip {
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn active(&self) -> Option<&FileId> {
        self.active.as_ref()
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.tabs.iter().any(|tab| tab.id == *id)
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    fn push_unique(&mut self, tab: Tab) -> bool {
        if self.contains(&tab.id) {
            return false;
        }
        self.tabs.push(tab);
        true
    }

    fn remove(&mut self, id: &FileId) -> bool {
        let before = self.tabs.len();
        self.tabs.retain(|tab| tab.id != *id);
        self.tabs.len() != before
    }
}

/// Tab state machine, scoped per project.
/// 依專案區分的分頁狀態機。
///
/// Each project keeps its own strip, so switching projects never leaves tabs
/// pointing at another project's files, and switching back restores the strip.
#[derive(Debug, Default)]
pub struct TabController {
    strips: HashMap<ProjectId, TabStrip>,
}

impl TabController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strip(&self, project: &ProjectId) -> Option<&TabStrip> {
        self.strips.get(project)
    }

    pub(crate) fn strips(&self) -> impl Iterator<Item = (&ProjectId, &TabStrip)> {
        self.strips.iter()
    }

    pub fn open_tabs(&self, project: &ProjectId) -> &[Tab] {
        self.strips
            .get(project)
            .map(TabStrip::tabs)
            .unwrap_or_default()
    }

    pub fn active_file(&self, project: &ProjectId) -> Option<&FileId> {
        self.strips.get(project).and_then(TabStrip::active)
    }

    /// Opens `file_id` from `project` in a tab (appending it if absent) and activates it.
    pub fn open_file(&mut self, project: &Project, file_id: &FileId) -> TabChange {
        let Some(file) = project.file(file_id) else {
            debug!(project = %project.id, file = %file_id, "open of unknown file ignored");
            return TabChange::Unchanged;
        };
        let strip = self.strips.entry(project.id.clone()).or_default();
        if strip.push_unique(Tab::for_file(file)) {
            debug!(project = %project.id, file = %file.id, tabs = strip.len(), "tab opened");
        }
        self.activate_tab(project, file_id)
    }

    /// Makes `tab_id` the active file when both the tab and its file exist.
    pub fn activate_tab(&mut self, project: &Project, tab_id: &FileId) -> TabChange {
        let Some(strip) = self.strips.get_mut(&project.id) else {
            return TabChange::Unchanged;
        };
        if !strip.contains(tab_id) || !project.contains_file(tab_id) {
            debug!(project = %project.id, tab = %tab_id, "activation of unknown tab ignored");
            return TabChange::Unchanged;
        }
        strip.active = Some(tab_id.clone());
        TabChange::Activated(tab_id.clone())
    }

    /// Closes `tab_id`. Closing the active tab activates the tab now last in
    /// order, or clears the selection when none remain.
    pub fn close_tab(&mut self, project: &Project, tab_id: &FileId) -> TabChange {
        let Some(strip) = self.strips.get_mut(&project.id) else {
            return TabChange::Unchanged;
        };
        if !strip.remove(tab_id) {
            return TabChange::Unchanged;
        }
        if strip.active.as_ref() != Some(tab_id) {
            return TabChange::Unchanged;
        }
        strip.active = None;
        let next = strip.tabs.last().map(|tab| tab.id.clone());
        match next {
            Some(next) => match self.activate_tab(project, &next) {
                TabChange::Unchanged => TabChange::Cleared,
                change => change,
            },
            None => TabChange::Cleared,
        }
    }
}
