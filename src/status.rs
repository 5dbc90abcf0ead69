use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::diff::Pathspec;
use crate::error::{Error, Result};
use crate::graph::CommitGraphView;
use crate::id::Id;
use crate::store::{Index, IndexEntry, ObjectStore, WorkdirEntry};
use crate::types::{DiffDelta, DiffFile, EntryMode, Tree};

/// status computation options, mirroring the tree differ's
#[derive(Clone, Debug)]
pub struct StatusOptions {
    /// path filter evaluated on full relative paths
    pub pathspec: Pathspec,
    /// report paths absent from the index
    pub include_untracked: bool,
    /// report every file inside an untracked directory instead of one
    /// entry for the directory itself
    pub recurse_untracked_dirs: bool,
    /// report paths the scanner flagged as ignored
    pub include_ignored: bool,
    /// drop submodule entries from all three sides
    pub exclude_submodules: bool,
    /// keep unmodified pairs in the per-path deltas
    pub include_unmodified: bool,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            pathspec: Pathspec::any(),
            include_untracked: true,
            recurse_untracked_dirs: false,
            include_ignored: false,
            exclude_submodules: false,
            include_unmodified: false,
        }
    }
}

/// per-path status: the staged delta and the unstaged delta, either of
/// which may be absent
#[derive(Clone, Debug)]
pub struct StatusEntry {
    pub path: String,
    pub head_to_index: Option<DiffDelta>,
    pub index_to_workdir: Option<DiffDelta>,
}

/// path-ordered status entries plus the paths the scanner could not read
///
/// scan failures are per-item and never abort the computation.
#[derive(Debug, Default)]
pub struct StatusList {
    pub entries: Vec<StatusEntry>,
    pub unreadable: Vec<Error>,
}

impl StatusList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatusEntry> {
        self.entries.iter()
    }
}

/// unified per-path status across head, index and working directory
///
/// computed as two flat diffs - head tree against index, index against the
/// working directory scan - merged by path. a workdir path absent from the
/// index entirely is untracked; scanner-flagged ignored paths appear only
/// under `include_ignored`.
pub fn status<S, I>(
    view: &CommitGraphView<'_, S>,
    head_tree: Option<&Tree>,
    index: &Index,
    workdir: I,
    opts: &StatusOptions,
) -> Result<StatusList>
where
    S: ObjectStore,
    I: IntoIterator<Item = Result<WorkdirEntry>>,
{
    let keep = |entry: &IndexEntry| -> bool {
        opts.pathspec.matches(&entry.path)
            && !(opts.exclude_submodules && entry.mode == EntryMode::Submodule)
    };

    let head_flat: Vec<IndexEntry> = match head_tree {
        Some(tree) => Index::from_tree(view, tree)?
            .entries()
            .iter()
            .filter(|e| keep(e))
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    let index_flat: Vec<IndexEntry> = index.entries().iter().filter(|e| keep(e)).cloned().collect();

    // consume the scan, splitting tracked paths from untracked/ignored ones
    let mut unreadable = Vec::new();
    let mut tracked: Vec<IndexEntry> = Vec::new();
    let mut extra_deltas: Vec<DiffDelta> = Vec::new();
    let mut untracked_dirs: BTreeSet<String> = BTreeSet::new();

    for item in workdir {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                unreadable.push(err);
                continue;
            }
        };
        if !opts.pathspec.matches(&entry.path) {
            continue;
        }
        if opts.exclude_submodules && entry.mode == EntryMode::Submodule {
            continue;
        }

        if index.get(&entry.path).is_some() {
            tracked.push(IndexEntry::new(entry.path, entry.mode, entry.target));
        } else if entry.ignored {
            if opts.include_ignored {
                extra_deltas.push(DiffDelta::ignored(DiffFile::new(
                    entry.path,
                    entry.target,
                    entry.mode,
                )));
            }
        } else if opts.include_untracked {
            match untracked_container(&entry.path, index, opts.recurse_untracked_dirs) {
                Some(dir) => {
                    // whole directory is untracked: one entry for the prefix
                    if untracked_dirs.insert(dir.clone()) {
                        extra_deltas.push(DiffDelta::untracked(DiffFile::new(
                            format!("{}/", dir),
                            Id::ZERO,
                            EntryMode::Subtree,
                        )));
                    }
                }
                None => {
                    extra_deltas.push(DiffDelta::untracked(DiffFile::new(
                        entry.path,
                        entry.target,
                        entry.mode,
                    )));
                }
            }
        }
    }
    tracked.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));

    let head_to_index = diff_flat(&head_flat, &index_flat, opts.include_unmodified);
    let mut index_to_workdir = diff_flat(&index_flat, &tracked, opts.include_unmodified);
    index_to_workdir.extend(extra_deltas);

    // merge the two delta streams by path
    let mut merged: BTreeMap<String, StatusEntry> = BTreeMap::new();
    for delta in head_to_index {
        let path = delta.path().to_string();
        merged
            .entry(path.clone())
            .or_insert_with(|| StatusEntry {
                path,
                head_to_index: None,
                index_to_workdir: None,
            })
            .head_to_index = Some(delta);
    }
    for delta in index_to_workdir {
        let path = delta.path().to_string();
        merged
            .entry(path.clone())
            .or_insert_with(|| StatusEntry {
                path,
                head_to_index: None,
                index_to_workdir: None,
            })
            .index_to_workdir = Some(delta);
    }

    Ok(StatusList {
        entries: merged.into_values().collect(),
        unreadable,
    })
}

/// shortest ancestor directory of `path` with no index entries beneath it,
/// unless per-file recursion was requested
fn untracked_container(path: &str, index: &Index, recurse: bool) -> Option<String> {
    if recurse {
        return None;
    }
    let components: Vec<&str> = path.split('/').collect();
    let mut prefix = String::new();
    for component in &components[..components.len().saturating_sub(1)] {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(component);
        if !index.contains_dir(&prefix) {
            return Some(prefix);
        }
    }
    None
}

/// merge-walk two path-sorted flat entry lists, classifying each path the
/// way the tree differ classifies leaves; only-new paths in the second
/// pass are untracked and handled by the caller
fn diff_flat(
    old: &[IndexEntry],
    new: &[IndexEntry],
    include_unmodified: bool,
) -> Vec<DiffDelta> {
    let mut deltas = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < old.len() || j < new.len() {
        let ord = match (old.get(i), new.get(j)) {
            (Some(o), Some(n)) => o.path.as_bytes().cmp(n.path.as_bytes()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match ord {
            Ordering::Less => {
                let o = &old[i];
                deltas.push(DiffDelta::deleted(DiffFile::new(
                    o.path.clone(),
                    o.target,
                    o.mode,
                )));
                i += 1;
            }
            Ordering::Greater => {
                let n = &new[j];
                deltas.push(DiffDelta::added(DiffFile::new(
                    n.path.clone(),
                    n.target,
                    n.mode,
                )));
                j += 1;
            }
            Ordering::Equal => {
                let o = &old[i];
                let n = &new[j];
                let old_file = DiffFile::new(o.path.clone(), o.target, o.mode);
                let new_file = DiffFile::new(n.path.clone(), n.target, n.mode);
                if o.target == n.target && o.mode == n.mode {
                    if include_unmodified {
                        deltas.push(DiffDelta::unmodified(old_file, new_file));
                    }
                } else if o.mode.class() == n.mode.class() {
                    deltas.push(DiffDelta::modified(old_file, new_file));
                } else {
                    deltas.push(DiffDelta::typechange(old_file, new_file));
                }
                i += 1;
                j += 1;
            }
        }
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{DeltaStatus, TreeEntry};

    fn file_tree(store: &mut MemoryStore, files: &[(&str, &str)]) -> Id {
        let entries = files
            .iter()
            .map(|(name, content)| {
                let blob = store.insert_blob(content.as_bytes().to_vec());
                TreeEntry::new(*name, EntryMode::Regular, blob)
            })
            .collect();
        store.insert_tree(entries).unwrap()
    }

    fn wd(store: &mut MemoryStore, path: &str, content: &str) -> Result<WorkdirEntry> {
        let id = store.insert_blob(content.as_bytes().to_vec());
        Ok(WorkdirEntry::new(path, EntryMode::Regular, id))
    }

    #[test]
    fn test_clean_worktree_is_empty() {
        let mut store = MemoryStore::new();
        let tree_id = file_tree(&mut store, &[("file.txt", "content")]);
        let workdir = vec![wd(&mut store, "file.txt", "content")];

        let view = CommitGraphView::new(&store);
        let tree = view.tree(tree_id).unwrap();
        let index = Index::from_tree(&view, &tree).unwrap();

        let list = status(
            &view,
            Some(&tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();
        assert!(list.is_empty());
        assert!(list.unreadable.is_empty());
    }

    #[test]
    fn test_staged_addition() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("old.txt", "old")]);
        let staged_blob = store.insert_blob(b"staged".to_vec());

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let mut entries = Index::from_tree(&view, &head_tree)
            .unwrap()
            .entries()
            .to_vec();
        entries.push(IndexEntry::new("new.txt", EntryMode::Regular, staged_blob));
        let index = Index::new(entries).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![
            wd(&mut store2, "new.txt", "staged"),
            wd(&mut store2, "old.txt", "old"),
        ];

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        let entry = &list.entries[0];
        assert_eq!(entry.path, "new.txt");
        assert_eq!(
            entry.head_to_index.as_ref().map(|d| d.status),
            Some(DeltaStatus::Added)
        );
        assert!(entry.index_to_workdir.is_none());
    }

    #[test]
    fn test_staged_deletion() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("gone.txt", "bye"), ("kept.txt", "hi")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let entries: Vec<IndexEntry> = Index::from_tree(&view, &head_tree)
            .unwrap()
            .entries()
            .iter()
            .filter(|e| e.path != "gone.txt")
            .cloned()
            .collect();
        let index = Index::new(entries).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![wd(&mut store2, "kept.txt", "hi")];

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(
            list.entries[0].head_to_index.as_ref().map(|d| d.status),
            Some(DeltaStatus::Deleted)
        );
    }

    #[test]
    fn test_unstaged_modification() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("file.txt", "v1")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![wd(&mut store2, "file.txt", "v2")];

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        let entry = &list.entries[0];
        assert!(entry.head_to_index.is_none());
        assert_eq!(
            entry.index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Modified)
        );
    }

    #[test]
    fn test_workdir_deletion() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("file.txt", "v1")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            Vec::new(),
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(
            list.entries[0].index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Deleted)
        );
    }

    #[test]
    fn test_untracked_file() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("tracked.txt", "hi")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![
            wd(&mut store2, "stray.txt", "new"),
            wd(&mut store2, "tracked.txt", "hi"),
        ];

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        let entry = &list.entries[0];
        assert_eq!(entry.path, "stray.txt");
        assert_eq!(
            entry.index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Untracked)
        );
    }

    #[test]
    fn test_untracked_excluded_on_request() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("tracked.txt", "hi")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![
            wd(&mut store2, "stray.txt", "new"),
            wd(&mut store2, "tracked.txt", "hi"),
        ];

        let opts = StatusOptions {
            include_untracked: false,
            ..Default::default()
        };
        let list = status(&view, Some(&head_tree), &index, workdir, &opts).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_untracked_directory_collapses() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("tracked.txt", "hi")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![
            wd(&mut store2, "newdir/a.txt", "a"),
            wd(&mut store2, "newdir/b.txt", "b"),
            wd(&mut store2, "tracked.txt", "hi"),
        ];

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list.entries[0].path, "newdir/");
        assert_eq!(
            list.entries[0].index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Untracked)
        );
    }

    #[test]
    fn test_untracked_directory_recursion() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("tracked.txt", "hi")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![
            wd(&mut store2, "newdir/a.txt", "a"),
            wd(&mut store2, "newdir/b.txt", "b"),
            wd(&mut store2, "tracked.txt", "hi"),
        ];

        let opts = StatusOptions {
            recurse_untracked_dirs: true,
            ..Default::default()
        };
        let list = status(&view, Some(&head_tree), &index, workdir, &opts).unwrap();

        let paths: Vec<_> = list.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["newdir/a.txt", "newdir/b.txt"]);
    }

    #[test]
    fn test_ignored_paths() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::empty();

        let mut store2 = MemoryStore::new();
        let blob = store2.insert_blob(b"obj".to_vec());
        let make_workdir = || {
            vec![Ok(
                WorkdirEntry::new("build.o", EntryMode::Regular, blob).ignored()
            )]
        };

        let silent = status(
            &view,
            Some(&head_tree),
            &index,
            make_workdir(),
            &StatusOptions::default(),
        )
        .unwrap();
        assert!(silent.is_empty());

        let opts = StatusOptions {
            include_ignored: true,
            ..Default::default()
        };
        let loud = status(&view, Some(&head_tree), &index, make_workdir(), &opts).unwrap();
        assert_eq!(loud.len(), 1);
        assert_eq!(
            loud.entries[0].index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Ignored)
        );
    }

    #[test]
    fn test_submodule_exclusion() {
        let mut store = MemoryStore::new();
        let sub_commit = store.insert_blob(b"fake".to_vec());
        let index = Index::new(vec![IndexEntry::new(
            "vendor",
            EntryMode::Submodule,
            sub_commit,
        )])
        .unwrap();

        let view = CommitGraphView::new(&store);
        let opts = StatusOptions {
            exclude_submodules: true,
            ..Default::default()
        };
        // submodule missing from the workdir would otherwise show deleted
        let list = status(&view, None, &index, Vec::new(), &opts).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_typechange_in_workdir() {
        let mut store = MemoryStore::new();
        let blob = store.insert_blob(b"target".to_vec());
        let index = Index::new(vec![IndexEntry::new("thing", EntryMode::Regular, blob)]).unwrap();

        let view = CommitGraphView::new(&store);
        let workdir = vec![Ok(WorkdirEntry::new("thing", EntryMode::Symlink, blob))];
        let list = status(&view, None, &index, workdir, &StatusOptions::default()).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(
            list.entries[0].index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Typechange)
        );
    }

    #[test]
    fn test_unreadable_paths_do_not_abort() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("file.txt", "v1")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![
            Err(Error::Io {
                path: "locked.txt".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            }),
            wd(&mut store2, "file.txt", "v2"),
        ];

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.unreadable.len(), 1);
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.entries[0].index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Modified)
        );
    }

    #[test]
    fn test_pathspec_filters_all_sides() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("a.rs", "v1"), ("b.md", "v1")]);

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::from_tree(&view, &head_tree).unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![
            wd(&mut store2, "a.rs", "v2"),
            wd(&mut store2, "b.md", "v2"),
            wd(&mut store2, "stray.md", "new"),
        ];

        let opts = StatusOptions {
            pathspec: Pathspec::new(["*.rs"]).unwrap(),
            ..Default::default()
        };
        let list = status(&view, Some(&head_tree), &index, workdir, &opts).unwrap();

        let paths: Vec<_> = list.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs"]);
    }

    #[test]
    fn test_staged_and_unstaged_on_same_path() {
        let mut store = MemoryStore::new();
        let head = file_tree(&mut store, &[("file.txt", "v1")]);
        let staged = store.insert_blob(b"v2".to_vec());

        let view = CommitGraphView::new(&store);
        let head_tree = view.tree(head).unwrap();
        let index = Index::new(vec![IndexEntry::new("file.txt", EntryMode::Regular, staged)])
            .unwrap();

        let mut store2 = MemoryStore::new();
        let workdir = vec![wd(&mut store2, "file.txt", "v3")];

        let list = status(
            &view,
            Some(&head_tree),
            &index,
            workdir,
            &StatusOptions::default(),
        )
        .unwrap();

        assert_eq!(list.len(), 1);
        let entry = &list.entries[0];
        assert_eq!(
            entry.head_to_index.as_ref().map(|d| d.status),
            Some(DeltaStatus::Modified)
        );
        assert_eq!(
            entry.index_to_workdir.as_ref().map(|d| d.status),
            Some(DeltaStatus::Modified)
        );
    }
}
