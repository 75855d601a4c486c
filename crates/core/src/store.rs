use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ids::{FileId, IdGenerator, ProjectId};
use crate::model::{normalize_name, File, Project};
use crate::storage::{StorageAdapter, StorageError, PROJECTS_KEY};

/// Errors raised by workspace mutations.
/// 工作區變更時可能出現的錯誤。
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("create a project before adding files")]
    NoProjectSelected,
    #[error("failed to serialize workspace: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owns the project graph and the current project selection.
/// 擁有專案圖與目前選取的專案。
///
/// Every structural mutation and content write is followed by a full
/// serialization of the project list into the storage adapter. Selection is
/// never persisted; a freshly opened store selects its first project.
#[derive(Debug)]
pub struct WorkspaceStore<S> {
    storage: S,
    key: String,
    projects: Vec<Project>,
    current: Option<ProjectId>,
    ids: IdGenerator,
}

impl<S: StorageAdapter> WorkspaceStore<S> {
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, PROJECTS_KEY)
    }

    /// Loads the project graph stored under `key` and selects the first project.
    /// 從指定鍵載入專案圖並選取第一個專案。
    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let projects = load(&storage, &key);
        let current = projects.first().map(|project| project.id.clone());
        let mut store = Self {
            storage,
            key,
            projects,
            current,
            ids: IdGenerator::new(),
        };
        store.seed_ids();
        debug!(
            key = %store.key,
            projects = store.projects.len(),
            "workspace store opened"
        );
        store
    }

    /// Replaces the id generator, re-observing every loaded id.
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self.seed_ids();
        self
    }

    fn seed_ids(&mut self) {
        for project in &self.projects {
            self.ids.observe(project.id.as_str());
            for file in &project.files {
                self.ids.observe(file.id.as_str());
            }
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == *id)
    }

    pub fn current_project_id(&self) -> Option<&ProjectId> {
        self.current.as_ref()
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current.as_ref().and_then(|id| self.project(id))
    }

    /// Appends a new empty project and persists. Blank names are declined with `Ok(None)`.
    /// 新增空白專案並儲存；空白名稱會回傳 `Ok(None)`。
    pub fn create_project(&mut self, name: &str) -> Result<Option<&Project>, WorkspaceError> {
        let Some(name) = normalize_name(name) else {
            debug!("declined project with blank name");
            return Ok(None);
        };
        let id = ProjectId::from_string(self.ids.next_id());
        info!(project = %id, name = %name, "project created");
        self.projects.push(Project::new(id, name));
        self.persist()?;
        Ok(self.projects.last())
    }

    /// Selects the project with `id`; an unknown id leaves no project selected.
    /// 選取指定專案；找不到時清除目前選取。
    pub fn select_project(&mut self, id: &ProjectId) -> Option<&Project> {
        self.current = self
            .projects
            .iter()
            .find(|project| project.id == *id)
            .map(|project| project.id.clone());
        if self.current.is_none() {
            debug!(project = %id, "selected unknown project");
        }
        self.current_project()
    }

    /// Appends an empty file to `project` and persists. Unknown projects and blank
    /// names are silently declined.
    pub fn create_file(
        &mut self,
        project: &ProjectId,
        name: &str,
    ) -> Result<Option<&File>, WorkspaceError> {
        let Some(name) = normalize_name(name) else {
            debug!(project = %project, "declined file with blank name");
            return Ok(None);
        };
        let Some(index) = self.projects.iter().position(|p| p.id == *project) else {
            debug!(project = %project, "file creation for unknown project");
            return Ok(None);
        };
        let id = FileId::from_string(self.ids.next_id());
        info!(project = %project, file = %id, name = %name, "file created");
        self.projects[index].files.push(File::new(id, name));
        self.persist()?;
        Ok(self.projects[index].files.last())
    }

    /// Overwrites a file's content without persisting. Returns `false` when the
    /// file does not exist.
    pub(crate) fn write_content(
        &mut self,
        project: &ProjectId,
        file: &FileId,
        text: &str,
    ) -> bool {
        let Some(target) = self
            .projects
            .iter_mut()
            .find(|p| p.id == *project)
            .and_then(|p| p.file_mut(file))
        else {
            return false;
        };
        text.clone_into(&mut target.content);
        true
    }

    /// Compact JSON form of the project list, as written to storage.
    pub fn serialize_projects(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.projects)
    }

    /// Writes the full project graph under the store key.
    /// 將完整專案圖寫入儲存鍵。
    pub fn persist(&mut self) -> Result<(), WorkspaceError> {
        let payload = self.serialize_projects()?;
        self.storage.set(&self.key, &payload)?;
        debug!(key = %self.key, bytes = payload.len(), "workspace persisted");
        Ok(())
    }
}

/// Reads the project list stored under `key`.
///
/// Absent, unreadable, or malformed values all load as an empty workspace.
pub fn load<S: StorageAdapter + ?Sized>(storage: &S, key: &str) -> Vec<Project> {
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<Project>>(&raw) {
            Ok(projects) => projects,
            Err(err) => {
                warn!(key, error = %err, "stored workspace is malformed; starting empty");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(key, error = %err, "failed to read stored workspace; starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn frozen_clock() -> u64 {
        1_000
    }

    fn empty_store() -> WorkspaceStore<MemoryStorage> {
        WorkspaceStore::open(MemoryStorage::new())
            .with_id_generator(IdGenerator::with_clock(frozen_clock))
    }

    #[test]
    fn create_project_appends_in_creation_order_and_persists() {
        let mut store = empty_store();
        let first = store.create_project("  Alpha ").unwrap().unwrap().id.clone();
        let second = store.create_project("Beta").unwrap().unwrap().id.clone();

        assert_ne!(first, second);
        let names: Vec<_> = store.projects().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Beta"]);
        assert_eq!(store.storage().write_count(), 2);
        assert_eq!(load(store.storage(), PROJECTS_KEY), store.projects());
    }

    #[test]
    fn blank_names_create_nothing() {
        let mut store = empty_store();
        assert!(store.create_project("   ").unwrap().is_none());
        assert!(store.projects().is_empty());
        assert_eq!(store.storage().write_count(), 0);

        let project = store.create_project("P").unwrap().unwrap().id.clone();
        assert!(store.create_file(&project, "\t").unwrap().is_none());
        assert!(store.project(&project).unwrap().files.is_empty());
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let mut store = empty_store();
        store.create_project("Same").unwrap();
        store.create_project("Same").unwrap();
        assert_eq!(store.projects().len(), 2);
    }

    #[test]
    fn create_file_for_unknown_project_is_a_no_op() {
        let mut store = empty_store();
        let created = store
            .create_file(&ProjectId::from("missing"), "a.txt")
            .unwrap();
        assert!(created.is_none());
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn select_unknown_project_clears_selection() {
        let mut store = empty_store();
        let id = store.create_project("P").unwrap().unwrap().id.clone();
        assert_eq!(store.select_project(&id).map(|p| p.name.as_str()), Some("P"));
        assert!(store.select_project(&ProjectId::from("nope")).is_none());
        assert!(store.current_project_id().is_none());
    }

    #[test]
    fn open_selects_first_project_and_seeds_ids() {
        let raw = r#"[{"id":"5000","name":"one","files":[{"id":"7000","name":"a","content":"x"}]},{"id":"6000","name":"two","files":[]}]"#;
        let storage = MemoryStorage::new().with_entry(PROJECTS_KEY, raw);
        let mut store =
            WorkspaceStore::open(storage).with_id_generator(IdGenerator::with_clock(frozen_clock));

        assert_eq!(store.current_project().map(|p| p.name.as_str()), Some("one"));
        let project = store.create_project("three").unwrap().unwrap();
        assert_eq!(project.id.as_str(), "7001");
    }

    #[test]
    fn malformed_storage_loads_as_empty() {
        for raw in ["not json", "{\"id\":1}", "[{\"name\":\"no id\"}]"] {
            let storage = MemoryStorage::new().with_entry(PROJECTS_KEY, raw);
            let store = WorkspaceStore::open(storage);
            assert!(store.projects().is_empty());
            assert!(store.current_project().is_none());
        }
    }

    #[test]
    fn serialization_is_stable_across_reload() {
        let mut store = empty_store();
        let project = store.create_project("P1").unwrap().unwrap().id.clone();
        let file = store.create_file(&project, "a.txt").unwrap().unwrap().id.clone();
        assert!(store.write_content(&project, &file, "line \"quoted\"\nnext ✓"));

        let first = store.serialize_projects().unwrap();
        let reloaded: Vec<Project> = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string(&reloaded).unwrap();
        assert_eq!(first, second);
    }
}
