//! Resolves command-line arguments that may be either ids or names.

use codehub_core::{FileId, ProjectId, StorageAdapter, Workspace};

/// Matches a project by id first, then by name. Unmatched keys pass through as ids.
pub fn project_id<S: StorageAdapter>(ws: &Workspace<S>, key: &str) -> ProjectId {
    let projects = ws.projects();
    projects
        .iter()
        .find(|project| project.id.as_str() == key)
        .or_else(|| projects.iter().find(|project| project.name == key))
        .map(|project| project.id.clone())
        .unwrap_or_else(|| ProjectId::from(key))
}

/// Matches a file of the current project by id first, then by name.
pub fn file_id<S: StorageAdapter>(ws: &Workspace<S>, key: &str) -> FileId {
    let Some(project) = ws.current_project() else {
        return FileId::from(key);
    };
    project
        .files
        .iter()
        .find(|file| file.id.as_str() == key)
        .or_else(|| project.files.iter().find(|file| file.name == key))
        .map(|file| file.id.clone())
        .unwrap_or_else(|| FileId::from(key))
}

/// Matches an open tab by id first, then by name.
pub fn tab_id<S: StorageAdapter>(ws: &Workspace<S>, key: &str) -> FileId {
    let tabs = ws.open_tabs();
    tabs.iter()
        .find(|tab| tab.id.as_str() == key)
        .or_else(|| tabs.iter().find(|tab| tab.name == key))
        .map(|tab| tab.id.clone())
        .unwrap_or_else(|| FileId::from(key))
}
