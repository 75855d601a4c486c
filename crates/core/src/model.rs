use serde::{Deserialize, Serialize};

use crate::ids::{FileId, ProjectId};

/// Named text document owned by exactly one project.  
/// 由單一專案擁有的具名文字檔。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub name: String,
    #[serde(default)]
    pub content: String,
}

impl File {
    pub fn new(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            content: String::new(),
        }
    }
}

/// Top-level container holding files in creation order.  
/// 依建立順序保存檔案的最上層容器。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub files: Vec<File>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            files: Vec::new(),
        }
    }

    pub fn file(&self, id: &FileId) -> Option<&File> {
        self.files.iter().find(|file| file.id == *id)
    }

    pub fn file_mut(&mut self, id: &FileId) -> Option<&mut File> {
        self.files.iter_mut().find(|file| file.id == *id)
    }

    pub fn contains_file(&self, id: &FileId) -> bool {
        self.file(id).is_some()
    }
}

/// Open reference to a file. The name is a snapshot taken when the tab opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub id: FileId,
    pub name: String,
}

impl Tab {
    pub fn for_file(file: &File) -> Self {
        Self {
            id: file.id.clone(),
            name: file.name.clone(),
        }
    }
}

/// Trims a user-supplied name, rejecting names that are empty after trimming.
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
