//! tree diffing, rename detection and patch rendering

mod pathspec;
mod print;
mod similarity;
mod tree;

pub use pathspec::Pathspec;
pub use print::{print, DiffFormat};
pub use similarity::{find_similar, FindOptions};
pub use tree::{diff_commits, diff_trees, DiffOptions};
