mod commit;
mod delta;
mod object;
mod tree;

pub use commit::{Commit, Signature};
pub use delta::{DeltaStatus, DiffDelta, DiffFile, DiffHunk, DiffLine, LineOrigin};
pub use object::{Blob, ObjectKind, Tag};
pub use tree::{EntryClass, EntryMode, Tree, TreeEntry};
