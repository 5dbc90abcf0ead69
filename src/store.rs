//! external collaborator interfaces and an in-memory reference store
//!
//! the engine consumes objects through the narrow [`ObjectStore`] and
//! [`HeadSource`] traits; persistence, wire formats and caching live behind
//! them. [`MemoryStore`] is an arena of interned objects indexed by [`Id`],
//! addressing each object by the SHA-256 of its canonical CBOR encoding.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::graph::CommitGraphView;
use crate::id::Id;
use crate::types::{Blob, Commit, EntryMode, ObjectKind, Tag, Tree, TreeEntry};

/// a resolved object
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }
}

/// content-addressable object lookup
///
/// implementations must be safe for concurrent reads; the engine never
/// writes through this interface.
pub trait ObjectStore {
    /// look up an object by id
    fn lookup(&self, id: Id) -> Result<&Object>;

    /// look up an object and require a specific kind
    fn resolve(&self, id: Id, expected: ObjectKind) -> Result<&Object> {
        let obj = self.lookup(id)?;
        if obj.kind() != expected {
            return Err(Error::WrongKind {
                id,
                expected,
                actual: obj.kind(),
            });
        }
        Ok(obj)
    }

    /// does the store contain this id
    fn contains(&self, id: Id) -> bool {
        self.lookup(id).is_ok()
    }
}

/// resolution of the current branch tip
pub trait HeadSource {
    /// id of the commit the current head points at
    fn current_head(&self) -> Result<Id>;
}

/// domain separator prepended to the hashed payload per object kind
fn kind_byte(kind: ObjectKind) -> u8 {
    match kind {
        ObjectKind::Commit => 1,
        ObjectKind::Tree => 2,
        ObjectKind::Blob => 3,
        ObjectKind::Tag => 4,
    }
}

/// hash = SHA256(kind_byte | payload)
fn address(kind: ObjectKind, payload: &[u8]) -> Id {
    let mut hasher = Sha256::new();
    hasher.update([kind_byte(kind)]);
    hasher.update(payload);
    Id::from_bytes(hasher.finalize().into())
}

fn cbor_payload<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)?;
    Ok(bytes)
}

/// content address of raw blob bytes
///
/// exposed so working-directory scanners can mint ids comparable with
/// tree entries without inserting anything.
pub fn blob_address(content: &[u8]) -> Id {
    address(ObjectKind::Blob, content)
}

/// in-memory content-addressed object store
///
/// inserts are idempotent: the same content always yields the same id.
#[derive(Default)]
pub struct MemoryStore {
    objects: HashMap<Id, Object>,
    head: Option<Id>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of interned objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// intern a blob, returning its content address
    pub fn insert_blob(&mut self, content: impl Into<Vec<u8>>) -> Id {
        let blob = Blob::new(content);
        let id = blob_address(&blob.content);
        self.objects.entry(id).or_insert(Object::Blob(blob));
        id
    }

    /// intern a tree built from the given entries (validated and sorted)
    pub fn insert_tree(&mut self, entries: Vec<TreeEntry>) -> Result<Id> {
        let tree = Tree::new(entries)?;
        let id = address(ObjectKind::Tree, &cbor_payload(&tree)?);
        self.objects.entry(id).or_insert(Object::Tree(tree));
        Ok(id)
    }

    /// intern a commit
    pub fn insert_commit(&mut self, commit: Commit) -> Result<Id> {
        let id = address(ObjectKind::Commit, &cbor_payload(&commit)?);
        self.objects.entry(id).or_insert(Object::Commit(commit));
        Ok(id)
    }

    /// intern an annotated tag
    pub fn insert_tag(&mut self, tag: Tag) -> Result<Id> {
        let id = address(ObjectKind::Tag, &cbor_payload(&tag)?);
        self.objects.entry(id).or_insert(Object::Tag(tag));
        Ok(id)
    }

    /// point the head at a commit
    pub fn set_head(&mut self, id: Id) {
        self.head = Some(id);
    }

    /// clear the head (unborn branch)
    pub fn clear_head(&mut self) {
        self.head = None;
    }
}

impl ObjectStore for MemoryStore {
    fn lookup(&self, id: Id) -> Result<&Object> {
        self.objects.get(&id).ok_or(Error::NotFound(id))
    }
}

impl HeadSource for MemoryStore {
    fn current_head(&self) -> Result<Id> {
        let id = self.head.ok_or(Error::UnbornBranch)?;
        match self.objects.get(&id) {
            Some(Object::Commit(_)) => Ok(id),
            _ => Err(Error::DetachedOrMissing),
        }
    }
}

/// one staged path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// full relative path, '/'-separated
    pub path: String,
    pub mode: EntryMode,
    pub target: Id,
}

impl IndexEntry {
    pub fn new(path: impl Into<String>, mode: EntryMode, target: Id) -> Self {
        Self {
            path: path.into(),
            mode,
            target,
        }
    }
}

/// staging-area state: a path-sorted flat sequence, equivalent in shape to
/// a flattened tree
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// build an index, sorting entries by path and rejecting duplicates
    pub fn new(mut entries: Vec<IndexEntry>) -> Result<Self> {
        entries.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));
        for window in entries.windows(2) {
            if window[0].path == window[1].path {
                return Err(Error::DuplicateIndexPath(window[0].path.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// flatten a tree into index shape, recursing through subtrees
    pub fn from_tree<S: ObjectStore>(view: &CommitGraphView<'_, S>, tree: &Tree) -> Result<Self> {
        let mut entries = Vec::new();
        flatten_tree(view, tree, "", &mut entries)?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// look up an entry by full path
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries
            .binary_search_by(|e| e.path.as_bytes().cmp(path.as_bytes()))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// does any entry live under the given directory path
    pub fn contains_dir(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir);
        let at = self
            .entries
            .partition_point(|e| e.path.as_bytes() < prefix.as_bytes());
        self.entries
            .get(at)
            .is_some_and(|e| e.path.starts_with(&prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten_tree<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    tree: &Tree,
    prefix: &str,
    out: &mut Vec<IndexEntry>,
) -> Result<()> {
    for entry in tree.entries() {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };

        if entry.mode.is_subtree() {
            let subtree = view.tree(entry.target)?;
            flatten_tree(view, &subtree, &path, out)?;
        } else {
            out.push(IndexEntry::new(path, entry.mode, entry.target));
        }
    }
    Ok(())
}

/// one working-directory path as reported by a scanner
///
/// `target` is the content address of the on-disk bytes; `ignored` is set
/// by scanners that evaluate ignore rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkdirEntry {
    pub path: String,
    pub mode: EntryMode,
    pub target: Id,
    pub ignored: bool,
}

impl WorkdirEntry {
    pub fn new(path: impl Into<String>, mode: EntryMode, target: Id) -> Self {
        Self {
            path: path.into(),
            mode,
            target,
            ignored: false,
        }
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }
}
