use crate::error::{Error, Result};
use crate::id::Id;
use crate::store::{Object, ObjectStore};
use crate::types::{Blob, Commit, ObjectKind, Tag, Tree, TreeEntry};

/// read-only adapter over an object store
///
/// the only component that touches [`ObjectStore`]. lookups clone the record
/// out of the store so callers own the result; there is no caching here -
/// wrap the store with memoization if repeated lookups matter.
pub struct CommitGraphView<'a, S> {
    store: &'a S,
}

impl<'a, S> Clone for CommitGraphView<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S> Copy for CommitGraphView<'a, S> {}

impl<'a, S: ObjectStore> CommitGraphView<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// look up a commit by id
    pub fn commit(&self, id: Id) -> Result<Commit> {
        match self.store.resolve(id, ObjectKind::Commit)? {
            Object::Commit(c) => Ok(c.clone()),
            _ => unreachable!("resolve checked the kind"),
        }
    }

    /// look up a tree by id
    pub fn tree(&self, id: Id) -> Result<Tree> {
        match self.store.resolve(id, ObjectKind::Tree)? {
            Object::Tree(t) => Ok(t.clone()),
            _ => unreachable!("resolve checked the kind"),
        }
    }

    /// look up a blob by id
    pub fn blob(&self, id: Id) -> Result<Blob> {
        Ok(self.blob_ref(id)?.clone())
    }

    /// look up a tag by id
    pub fn tag(&self, id: Id) -> Result<Tag> {
        match self.store.resolve(id, ObjectKind::Tag)? {
            Object::Tag(t) => Ok(t.clone()),
            _ => unreachable!("resolve checked the kind"),
        }
    }

    /// borrow a blob without cloning its content
    pub(crate) fn blob_ref(&self, id: Id) -> Result<&'a Blob> {
        match self.store.resolve(id, ObjectKind::Blob)? {
            Object::Blob(b) => Ok(b),
            _ => unreachable!("resolve checked the kind"),
        }
    }

    /// resolve an id to a commit, peeling through annotated tags
    ///
    /// returns the peeled id together with the commit.
    pub fn peel_to_commit(&self, id: Id) -> Result<(Id, Commit)> {
        let mut current = id;
        loop {
            match self.store.lookup(current)? {
                Object::Commit(c) => return Ok((current, c.clone())),
                Object::Tag(t) => current = t.target,
                other => {
                    return Err(Error::WrongKind {
                        id: current,
                        expected: ObjectKind::Commit,
                        actual: other.kind(),
                    })
                }
            }
        }
    }

    /// parent ids of a commit
    pub fn parents(&self, id: Id) -> Result<Vec<Id>> {
        Ok(self.commit(id)?.parents)
    }

    /// root tree of a commit
    pub fn tree_of(&self, commit_id: Id) -> Result<Tree> {
        let commit = self.commit(commit_id)?;
        self.tree(commit.tree)
    }

    /// look up a tree entry by '/'-separated path
    ///
    /// a missing component fails with `PathNotFound`; an interior component
    /// that names a non-subtree entry fails with `AmbiguousPath` (the name is
    /// ambiguous between file and directory use).
    pub fn entry_at_path(&self, tree: &Tree, path: &str) -> Result<TreeEntry> {
        let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
        let mut current = tree.clone();

        while let Some(name) = components.next() {
            let entry = current
                .get(name)
                .ok_or_else(|| Error::PathNotFound(path.to_string()))?
                .clone();

            if components.peek().is_none() {
                return Ok(entry);
            }
            if !entry.mode.is_subtree() {
                return Err(Error::AmbiguousPath(path.to_string()));
            }
            current = self.tree(entry.target)?;
        }

        Err(Error::PathNotFound(path.to_string()))
    }
}
