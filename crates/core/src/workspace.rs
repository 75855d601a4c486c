use std::collections::HashSet;

use thiserror::Error;
use tracing::trace;

use crate::ids::{FileId, ProjectId};
use crate::intent::{Intent, Outcome};
use crate::model::{File, Project, Tab};
use crate::storage::StorageAdapter;
use crate::store::{WorkspaceError, WorkspaceStore};
use crate::sync::{self, EditorSurface};
use crate::tabs::{TabChange, TabController};
use crate::view::{FileRow, ProjectRow, TabRow, WorkspaceView};

/// Consistency rule broken between tabs, selection and the editor surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("tabs are kept for unknown project {0}")]
    UnknownProject(ProjectId),
    #[error("tab {tab} is open twice in project {project}")]
    DuplicateTab { project: ProjectId, tab: FileId },
    #[error("tab {tab} does not reference a file of project {project}")]
    ForeignTab { project: ProjectId, tab: FileId },
    #[error("active file {file} of project {project} has no open tab")]
    ActiveWithoutTab { project: ProjectId, file: FileId },
    #[error("editor text differs from active file {0}")]
    EditorOutOfSync(FileId),
}

/// Workspace session: the store, its per-project tabs and the editor surface.
/// 工作區工作階段：資料存放區、各專案分頁與編輯區。
///
/// All user actions go through this type, either as direct method calls or as
/// [`Intent`]s via [`Workspace::dispatch`].
#[derive(Debug)]
pub struct Workspace<S> {
    store: WorkspaceStore<S>,
    tabs: TabController,
    editor: EditorSurface,
}

impl<S: StorageAdapter> Workspace<S> {
    /// Loads from `storage`; the first project is selected and no file is open.
    pub fn open(storage: S) -> Self {
        Self::from_store(WorkspaceStore::open(storage))
    }

    pub fn from_store(store: WorkspaceStore<S>) -> Self {
        Self {
            store,
            tabs: TabController::new(),
            editor: EditorSurface::default(),
        }
    }

    pub fn store(&self) -> &WorkspaceStore<S> {
        &self.store
    }

    pub fn into_store(self) -> WorkspaceStore<S> {
        self.store
    }

    pub fn tabs(&self) -> &TabController {
        &self.tabs
    }

    pub fn editor(&self) -> &EditorSurface {
        &self.editor
    }

    pub fn projects(&self) -> &[Project] {
        self.store.projects()
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.store.current_project()
    }

    /// Tabs of the current project, in opening order.
    pub fn open_tabs(&self) -> &[Tab] {
        match self.store.current_project_id() {
            Some(project) => self.tabs.open_tabs(project),
            None => &[],
        }
    }

    pub fn current_file(&self) -> Option<&File> {
        let project = self.store.current_project()?;
        let active = self.tabs.active_file(&project.id)?;
        project.file(active)
    }

    /// Creates a project and switches to it.
    pub fn create_project(&mut self, name: &str) -> Result<Option<ProjectId>, WorkspaceError> {
        let Some(id) = self.store.create_project(name)?.map(|p| p.id.clone()) else {
            return Ok(None);
        };
        self.switch_project(&id);
        Ok(Some(id))
    }

    /// Selects another project and shows its active file, if it has one.
    pub fn switch_project(&mut self, id: &ProjectId) -> Option<ProjectId> {
        let selected = self.store.select_project(id).map(|p| p.id.clone());
        self.refresh_editor();
        selected
    }

    /// Creates a file in the current project and opens it.
    ///
    /// Fails with [`WorkspaceError::NoProjectSelected`] when no project is selected.
    pub fn create_file(&mut self, name: &str) -> Result<Option<FileId>, WorkspaceError> {
        let Some(project) = self.store.current_project_id().cloned() else {
            return Err(WorkspaceError::NoProjectSelected);
        };
        let Some(id) = self
            .store
            .create_file(&project, name)?
            .map(|f| f.id.clone())
        else {
            return Ok(None);
        };
        self.open_file(&id);
        Ok(Some(id))
    }

    pub fn open_file(&mut self, id: &FileId) -> TabChange {
        let change = match self.store.current_project() {
            Some(project) => self.tabs.open_file(project, id),
            None => TabChange::Unchanged,
        };
        self.apply(change)
    }

    pub fn activate_tab(&mut self, id: &FileId) -> TabChange {
        let change = match self.store.current_project() {
            Some(project) => self.tabs.activate_tab(project, id),
            None => TabChange::Unchanged,
        };
        self.apply(change)
    }

    pub fn close_tab(&mut self, id: &FileId) -> TabChange {
        let change = match self.store.current_project() {
            Some(project) => self.tabs.close_tab(project, id),
            None => TabChange::Unchanged,
        };
        self.apply(change)
    }

    /// Feeds an editor change event through content sync.
    pub fn edit_content(&mut self, text: &str) -> Result<bool, WorkspaceError> {
        let project = self.store.current_project_id().cloned();
        let file = project
            .as_ref()
            .and_then(|project| self.tabs.active_file(project))
            .cloned();
        let active = project.as_ref().zip(file.as_ref());
        sync::apply_edit(&mut self.store, &mut self.editor, active, text)
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<Outcome, WorkspaceError> {
        trace!(?intent, "dispatch");
        let outcome = match intent {
            Intent::CreateProject { name } => self
                .create_project(&name)?
                .map_or(Outcome::Declined, Outcome::ProjectCreated),
            Intent::SelectProject { project } => {
                Outcome::ProjectSelected(self.switch_project(&project))
            }
            Intent::CreateFile { name } => self
                .create_file(&name)?
                .map_or(Outcome::Declined, Outcome::FileCreated),
            Intent::OpenFile { file } => Outcome::Tabs(self.open_file(&file)),
            Intent::ActivateTab { tab } => Outcome::Tabs(self.activate_tab(&tab)),
            Intent::CloseTab { tab } => Outcome::Tabs(self.close_tab(&tab)),
            Intent::EditContent { text } => Outcome::ContentSynced(self.edit_content(&text)?),
        };
        debug_assert_eq!(self.check_invariants(), Ok(()));
        Ok(outcome)
    }

    /// Verifies tab uniqueness, tab ownership, active-tab membership and that
    /// the editor shows the active file's content.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (project_id, strip) in self.tabs.strips() {
            let Some(project) = self.store.project(project_id) else {
                return Err(InvariantViolation::UnknownProject(project_id.clone()));
            };
            let mut seen = HashSet::new();
            for tab in strip.tabs() {
                if !seen.insert(&tab.id) {
                    return Err(InvariantViolation::DuplicateTab {
                        project: project_id.clone(),
                        tab: tab.id.clone(),
                    });
                }
                if !project.contains_file(&tab.id) {
                    return Err(InvariantViolation::ForeignTab {
                        project: project_id.clone(),
                        tab: tab.id.clone(),
                    });
                }
            }
            if let Some(active) = strip.active() {
                if !strip.contains(active) {
                    return Err(InvariantViolation::ActiveWithoutTab {
                        project: project_id.clone(),
                        file: active.clone(),
                    });
                }
            }
        }
        if let Some(file) = self.current_file() {
            if self.editor.text() != file.content {
                return Err(InvariantViolation::EditorOutOfSync(file.id.clone()));
            }
        }
        Ok(())
    }

    pub fn view(&self) -> WorkspaceView {
        let current = self.store.current_project();
        let active_file = self.current_file().map(|file| &file.id);
        let is_active = |id: &FileId| active_file == Some(id);

        WorkspaceView {
            projects: self
                .store
                .projects()
                .iter()
                .map(|project| ProjectRow {
                    id: project.id.clone(),
                    name: project.name.clone(),
                    active: current.is_some_and(|c| c.id == project.id),
                })
                .collect(),
            files: current
                .map(|project| {
                    project
                        .files
                        .iter()
                        .map(|file| FileRow {
                            id: file.id.clone(),
                            name: file.name.clone(),
                            active: is_active(&file.id),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            tabs: self
                .open_tabs()
                .iter()
                .map(|tab| TabRow {
                    id: tab.id.clone(),
                    name: tab.name.clone(),
                    active: is_active(&tab.id),
                })
                .collect(),
            editor: self.editor.text().to_string(),
        }
    }

    fn apply(&mut self, change: TabChange) -> TabChange {
        if change != TabChange::Unchanged {
            self.refresh_editor();
        }
        change
    }

    fn refresh_editor(&mut self) {
        let file = self.store.current_project().and_then(|project| {
            self.tabs
                .active_file(&project.id)
                .and_then(|id| project.file(id))
        });
        match file {
            Some(file) => self.editor.load(&file.content),
            None => self.editor.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn workspace() -> Workspace<MemoryStorage> {
        Workspace::open(MemoryStorage::new())
    }

    #[test]
    fn creating_file_without_project_is_reported() {
        let mut ws = workspace();
        assert!(matches!(
            ws.create_file("a.txt"),
            Err(WorkspaceError::NoProjectSelected)
        ));
        assert!(matches!(
            ws.dispatch(Intent::CreateFile { name: "  ".into() }),
            Err(WorkspaceError::NoProjectSelected)
        ));
    }

    #[test]
    fn new_project_is_selected_and_new_file_opened() {
        let mut ws = workspace();
        let project = ws.create_project("P1").unwrap().unwrap();
        assert_eq!(ws.current_project().map(|p| &p.id), Some(&project));

        let file = ws.create_file("a.txt").unwrap().unwrap();
        assert_eq!(ws.current_file().map(|f| &f.id), Some(&file));
        assert_eq!(ws.open_tabs().len(), 1);
        assert_eq!(ws.check_invariants(), Ok(()));
    }

    #[test]
    fn activation_loads_file_content_into_editor() {
        let mut ws = workspace();
        ws.create_project("P").unwrap();
        let a = ws.create_file("a").unwrap().unwrap();
        ws.edit_content("alpha").unwrap();
        let b = ws.create_file("b").unwrap().unwrap();
        assert!(ws.editor().is_blank());
        ws.edit_content("beta").unwrap();

        assert_eq!(ws.activate_tab(&a), TabChange::Activated(a.clone()));
        assert_eq!(ws.editor().text(), "alpha");
        ws.activate_tab(&b);
        assert_eq!(ws.editor().text(), "beta");
    }

    #[test]
    fn closing_only_tab_blanks_editor() {
        let mut ws = workspace();
        ws.create_project("P").unwrap();
        let a = ws.create_file("a").unwrap().unwrap();
        ws.edit_content("text").unwrap();

        assert_eq!(ws.close_tab(&a), TabChange::Cleared);
        assert!(ws.current_file().is_none());
        assert!(ws.editor().is_blank());
        assert!(ws.open_tabs().is_empty());
    }

    #[test]
    fn switching_projects_swaps_tabs_and_restores_them() {
        let mut ws = workspace();
        let first = ws.create_project("one").unwrap().unwrap();
        let a = ws.create_file("a").unwrap().unwrap();
        ws.edit_content("from one").unwrap();

        let second = ws.create_project("two").unwrap().unwrap();
        assert!(ws.open_tabs().is_empty());
        assert!(ws.current_file().is_none());
        assert!(ws.editor().is_blank());

        // an id from the other project is not reachable from here
        assert_eq!(ws.open_file(&a), TabChange::Unchanged);

        assert_eq!(ws.switch_project(&first), Some(first.clone()));
        assert_eq!(ws.current_file().map(|f| &f.id), Some(&a));
        assert_eq!(ws.editor().text(), "from one");

        ws.switch_project(&second);
        assert_eq!(ws.check_invariants(), Ok(()));
    }

    #[test]
    fn unknown_project_selection_leaves_nothing_open() {
        let mut ws = workspace();
        ws.create_project("P").unwrap();
        ws.create_file("a").unwrap();

        assert_eq!(ws.switch_project(&ProjectId::from("ghost")), None);
        assert!(ws.current_project().is_none());
        assert!(ws.open_tabs().is_empty());
        assert_eq!(ws.open_file(&FileId::from("anything")), TabChange::Unchanged);
        assert!(!ws.edit_content("typed").unwrap());
    }

    #[test]
    fn view_marks_active_rows() {
        let mut ws = workspace();
        ws.create_project("P").unwrap();
        let a = ws.create_file("a").unwrap().unwrap();
        ws.create_file("b").unwrap();
        ws.activate_tab(&a);

        let view = ws.view();
        assert_eq!(view.active_project().map(|row| row.name.as_str()), Some("P"));
        assert_eq!(view.active_tab().map(|row| &row.id), Some(&a));
        let active_files: Vec<_> = view.files.iter().filter(|row| row.active).collect();
        assert_eq!(active_files.len(), 1);
        assert_eq!(active_files[0].id, a);
    }

    #[test]
    fn dispatch_reports_declined_creations() {
        let mut ws = workspace();
        let outcome = ws
            .dispatch(Intent::CreateProject { name: " ".into() })
            .unwrap();
        assert_eq!(outcome, Outcome::Declined);
        assert!(ws.projects().is_empty());
    }
}
