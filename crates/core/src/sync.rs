use tracing::trace;

use crate::ids::{FileId, ProjectId};
use crate::storage::StorageAdapter;
use crate::store::{WorkspaceError, WorkspaceStore};

/// Text currently shown by the editing surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorSurface {
    text: String,
}

impl EditorSurface {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    pub(crate) fn load(&mut self, text: &str) {
        text.clone_into(&mut self.text);
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }
}

/// Applies an editor change event.
///
/// The surface always takes the new text. When a file is active its content is
/// replaced and the whole graph persisted immediately; there is no batching.
/// Returns whether a file was updated.
pub(crate) fn apply_edit<S: StorageAdapter>(
    store: &mut WorkspaceStore<S>,
    editor: &mut EditorSurface,
    active: Option<(&ProjectId, &FileId)>,
    text: &str,
) -> Result<bool, WorkspaceError> {
    editor.load(text);
    let Some((project, file)) = active else {
        trace!("edit with no active file");
        return Ok(false);
    };
    if !store.write_content(project, file, text) {
        return Ok(false);
    }
    store.persist()?;
    trace!(file = %file, bytes = text.len(), "content synced");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn edit_without_active_file_only_touches_surface() {
        let mut store = WorkspaceStore::open(MemoryStorage::new());
        let mut editor = EditorSurface::default();
        let synced = apply_edit(&mut store, &mut editor, None, "draft").unwrap();
        assert!(!synced);
        assert_eq!(editor.text(), "draft");
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn edit_with_active_file_writes_and_persists() {
        let mut store = WorkspaceStore::open(MemoryStorage::new());
        let project = store.create_project("P").unwrap().unwrap().id.clone();
        let file = store.create_file(&project, "a").unwrap().unwrap().id.clone();
        let writes = store.storage().write_count();

        let mut editor = EditorSurface::default();
        let synced = apply_edit(&mut store, &mut editor, Some((&project, &file)), "hi").unwrap();

        assert!(synced);
        assert_eq!(store.storage().write_count(), writes + 1);
        assert_eq!(store.project(&project).unwrap().files[0].content, "hi");
    }
}
