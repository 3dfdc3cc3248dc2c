/// FolderSleuth terminal frontend.
///
/// Lists the immediate subfolders of a folder and sizes each one through the
/// core `ScanWorker`. Business logic lives in `foldersleuth-core`; this crate
/// only holds presentation state and rendering.
pub mod render;
pub mod state;

pub use state::{App, FolderRow, FolderTable, RowStatus};
