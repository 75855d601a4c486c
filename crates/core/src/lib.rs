//! Workspace state model for CodeHub: projects own files, files open into
//! per-project tabs, and every change to the project graph is persisted
//! through a key-value storage adapter.
//! CodeHub 工作區狀態模型：專案擁有檔案、檔案開啟為分頁，專案圖的每次變更皆經由鍵值儲存持久化。

mod util;

pub mod ids;
pub mod intent;
pub mod model;
pub mod storage;
pub mod store;
pub mod sync;
pub mod tabs;
pub mod view;
pub mod workspace;

pub use ids::{FileId, IdGenerator, ProjectId};
pub use intent::{Intent, Outcome};
pub use model::{normalize_name, File, Project, Tab};
pub use storage::{FileStorage, MemoryStorage, StorageAdapter, StorageError, PROJECTS_KEY};
pub use store::{load, WorkspaceError, WorkspaceStore};
pub use sync::EditorSurface;
pub use tabs::{TabChange, TabController, TabStrip};
pub use view::{FileRow, ProjectRow, TabRow, WorkspaceView};
pub use workspace::{InvariantViolation, Workspace};
