//! revgraph - content-addressed revision graph engine
//!
//! commit-graph traversal, merge-base resolution, tree diffing with
//! rename/copy detection, and working-tree status over a content-addressed
//! object store. storage, transport and filesystem scanning live behind
//! narrow collaborator traits; this crate owns only the graph and diff
//! algorithms.
//!
//! # Core concepts
//!
//! - **Blob**: raw file content, addressed by hash
//! - **Tree**: a name-sorted directory listing mapping names to blobs and
//!   subtrees
//! - **Commit**: a snapshot of a tree with parent links forming a DAG
//! - **Tag**: a named annotation pointing at another object
//!
//! objects are addressed by the SHA-256 of their canonical CBOR encoding;
//! the id of an object travels beside the record rather than inside it.
//!
//! # Example
//!
//! ```
//! use revgraph::{diff, Commit, CommitGraphView, MemoryStore, RevWalker, Signature, Sort};
//! use revgraph::{EntryMode, TreeEntry};
//!
//! let mut store = MemoryStore::new();
//! let author = Signature::new("dev", "dev@example.com");
//!
//! let blob = store.insert_blob(b"fn main() {}\n".to_vec());
//! let tree = store
//!     .insert_tree(vec![TreeEntry::new("main.rs", EntryMode::Regular, blob)])
//!     .unwrap();
//! let first = store
//!     .insert_commit(Commit::new(tree, vec![], author.clone(), 1, "initial"))
//!     .unwrap();
//!
//! let blob2 = store.insert_blob(b"fn main() { run() }\n".to_vec());
//! let tree2 = store
//!     .insert_tree(vec![TreeEntry::new("main.rs", EntryMode::Regular, blob2)])
//!     .unwrap();
//! let second = store
//!     .insert_commit(Commit::new(tree2, vec![first], author, 2, "call run"))
//!     .unwrap();
//!
//! // walk history, newest first
//! let view = CommitGraphView::new(&store);
//! let mut walker = RevWalker::new(view);
//! walker.set_order(Sort::TIME);
//! walker.push(second).unwrap();
//! let messages: Vec<String> = walker
//!     .map(|item| item.unwrap().1.message)
//!     .collect();
//! assert_eq!(messages, vec!["call run", "initial"]);
//!
//! // diff the two commits
//! let deltas =
//!     diff::diff_commits(&view, Some(first), Some(second), &diff::DiffOptions::default())
//!         .unwrap();
//! assert_eq!(deltas.len(), 1);
//! assert_eq!(deltas[0].path(), "main.rs");
//! ```

mod error;
mod graph;
mod id;
mod merge_base;
mod status;
mod store;
mod walk;

pub mod diff;
pub mod types;
pub mod workdir;

pub use error::{Error, Result};
pub use graph::CommitGraphView;
pub use id::Id;
pub use merge_base::{merge_base, merge_base_many};
pub use status::{status, StatusEntry, StatusList, StatusOptions};
pub use store::{
    blob_address, HeadSource, Index, IndexEntry, MemoryStore, Object, ObjectStore, WorkdirEntry,
};
pub use types::{
    Blob, Commit, DeltaStatus, DiffDelta, DiffFile, DiffHunk, DiffLine, EntryClass, EntryMode,
    LineOrigin, ObjectKind, Signature, Tag, Tree, TreeEntry,
};
pub use walk::{RevWalker, Sort};
