use serde::{Deserialize, Serialize};

use crate::ids::{FileId, ProjectId};
use crate::tabs::TabChange;

/// Closed set of user intents understood by [`crate::Workspace::dispatch`].
///
/// Serialized with an `"intent"` tag, e.g.
/// `{"intent":"open_file","file":"1700000000000"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    CreateProject { name: String },
    SelectProject { project: ProjectId },
    CreateFile { name: String },
    OpenFile { file: FileId },
    ActivateTab { tab: FileId },
    CloseTab { tab: FileId },
    EditContent { text: String },
}

/// What a dispatched intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ProjectCreated(ProjectId),
    ProjectSelected(Option<ProjectId>),
    FileCreated(FileId),
    Tabs(TabChange),
    ContentSynced(bool),
    /// A create intent was declined because the name was blank.
    Declined,
}
