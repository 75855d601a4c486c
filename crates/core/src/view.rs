use serde::Serialize;

use crate::ids::{FileId, ProjectId};

/// Row in the project list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub name: String,
    pub active: bool,
}

/// Row in the current project's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
    pub id: FileId,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabRow {
    pub id: FileId,
    pub name: String,
    pub active: bool,
}

/// Read-only projection of the workspace for rendering layers.
/// 提供畫面層使用的唯讀工作區投影。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceView {
    pub projects: Vec<ProjectRow>,
    pub files: Vec<FileRow>,
    pub tabs: Vec<TabRow>,
    pub editor: String,
}

impl WorkspaceView {
    pub fn active_project(&self) -> Option<&ProjectRow> {
        self.projects.iter().find(|row| row.active)
    }

    pub fn active_tab(&self) -> Option<&TabRow> {
        self.tabs.iter().find(|row| row.active)
    }
}
