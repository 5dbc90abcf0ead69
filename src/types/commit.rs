use serde::{Deserialize, Serialize};

use crate::id::Id;

/// author or committer identity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// a commit object pointing to a tree with metadata
///
/// the commit's own id is not embedded: it is the content address of this
/// record and travels beside it (see `RevWalker::next_commit`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// root tree id
    pub tree: Id,
    /// parent commit ids (empty for initial, 1 for linear, 2+ for merge)
    pub parents: Vec<Id>,
    /// author identity
    pub author: Signature,
    /// committer identity
    pub committer: Signature,
    /// commit time, unix seconds
    pub time: i64,
    /// commit message
    pub message: String,
}

impl Commit {
    /// create a new commit; committer defaults to the author
    pub fn new(
        tree: Id,
        parents: Vec<Id>,
        author: Signature,
        time: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parents,
            committer: author.clone(),
            author,
            time,
            message: message.into(),
        }
    }

    /// set a distinct committer
    pub fn with_committer(mut self, committer: Signature) -> Self {
        self.committer = committer;
        self
    }

    /// is this an initial commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// is this a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// first parent, if any
    pub fn first_parent(&self) -> Option<Id> {
        self.parents.first().copied()
    }
}
