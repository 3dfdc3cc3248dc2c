/// Platform-specific functionality — deciding which directories are safe
/// to descend into.
///
/// Symbolic links and Windows reparse points (junctions, mount points) are
/// never followed: they can loop back into the tree or pull in data that
/// lives outside the scan root.
pub mod links;

pub use links::{is_reparse_point, is_safe_dir};
