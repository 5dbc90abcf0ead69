use std::cmp::Ordering;

use crate::diff::Pathspec;
use crate::error::Result;
use crate::graph::CommitGraphView;
use crate::id::Id;
use crate::store::ObjectStore;
use crate::types::{DiffDelta, DiffFile, Tree, TreeEntry};

/// options shared by tree diffing and patch rendering
///
/// the whitespace and line-ending flags affect patch rendering only, never
/// the structural classification of deltas.
#[derive(Clone, Debug)]
pub struct DiffOptions {
    /// emit `Unmodified` deltas too (required for copy detection)
    pub include_unmodified: bool,
    /// swap old and new before diffing
    pub reverse: bool,
    /// path filter evaluated on full relative paths before emitting
    pub pathspec: Pathspec,
    /// treat lines differing only in whitespace as equal when rendering
    pub ignore_whitespace: bool,
    /// strip trailing carriage returns when rendering
    pub ignore_line_endings: bool,
    /// context lines around each hunk when rendering
    pub context_lines: u32,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            include_unmodified: false,
            reverse: false,
            pathspec: Pathspec::any(),
            ignore_whitespace: false,
            ignore_line_endings: false,
            context_lines: 3,
        }
    }
}

/// entry-level deltas between two trees, ordered by path
///
/// either side may be `None`, the virtual absent tree, producing all-added
/// or all-deleted output. deltas are emitted for non-subtree entries only;
/// subtrees recurse. a subtree replaced by a blob (or vice versa) is a
/// delete plus an add, never a partial match.
pub fn diff_trees<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    old: Option<&Tree>,
    new: Option<&Tree>,
    opts: &DiffOptions,
) -> Result<Vec<DiffDelta>> {
    let (old, new) = if opts.reverse { (new, old) } else { (old, new) };

    let mut deltas = Vec::new();
    walk(view, old, new, "", opts, &mut deltas)?;
    deltas.sort_by(|a, b| a.path().as_bytes().cmp(b.path().as_bytes()));
    Ok(deltas)
}

/// diff the root trees of two commits
///
/// `None` stands for the absent tree, so the first commit of a history
/// diffs as all-added. annotated tags are peeled.
pub fn diff_commits<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    old: Option<Id>,
    new: Option<Id>,
    opts: &DiffOptions,
) -> Result<Vec<DiffDelta>> {
    let old_tree = match old {
        Some(id) => {
            let (_, commit) = view.peel_to_commit(id)?;
            Some(view.tree(commit.tree)?)
        }
        None => None,
    };
    let new_tree = match new {
        Some(id) => {
            let (_, commit) = view.peel_to_commit(id)?;
            Some(view.tree(commit.tree)?)
        }
        None => None,
    };
    diff_trees(view, old_tree.as_ref(), new_tree.as_ref(), opts)
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// lock-step merge-walk over two name-sorted entry lists
fn walk<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    old: Option<&Tree>,
    new: Option<&Tree>,
    prefix: &str,
    opts: &DiffOptions,
    out: &mut Vec<DiffDelta>,
) -> Result<()> {
    let old_entries = old.map(Tree::entries).unwrap_or(&[]);
    let new_entries = new.map(Tree::entries).unwrap_or(&[]);

    let mut i = 0;
    let mut j = 0;
    while i < old_entries.len() || j < new_entries.len() {
        let ord = match (old_entries.get(i), new_entries.get(j)) {
            (Some(o), Some(n)) => o.name.as_bytes().cmp(n.name.as_bytes()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match ord {
            Ordering::Less => {
                emit_side(view, &old_entries[i], prefix, opts, Side::Deleted, out)?;
                i += 1;
            }
            Ordering::Greater => {
                emit_side(view, &new_entries[j], prefix, opts, Side::Added, out)?;
                j += 1;
            }
            Ordering::Equal => {
                emit_pair(view, &old_entries[i], &new_entries[j], prefix, opts, out)?;
                i += 1;
                j += 1;
            }
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Side {
    Added,
    Deleted,
}

/// emit an entry present on one side only, recursing through subtrees
fn emit_side<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    entry: &TreeEntry,
    prefix: &str,
    opts: &DiffOptions,
    side: Side,
    out: &mut Vec<DiffDelta>,
) -> Result<()> {
    let path = join(prefix, &entry.name);

    if entry.mode.is_subtree() {
        let subtree = view.tree(entry.target)?;
        return match side {
            Side::Added => walk(view, None, Some(&subtree), &path, opts, out),
            Side::Deleted => walk(view, Some(&subtree), None, &path, opts, out),
        };
    }

    if !opts.pathspec.matches(&path) {
        return Ok(());
    }
    let file = DiffFile::new(path, entry.target, entry.mode);
    out.push(match side {
        Side::Added => DiffDelta::added(file),
        Side::Deleted => DiffDelta::deleted(file),
    });
    Ok(())
}

/// classify a name present on both sides
fn emit_pair<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    old: &TreeEntry,
    new: &TreeEntry,
    prefix: &str,
    opts: &DiffOptions,
    out: &mut Vec<DiffDelta>,
) -> Result<()> {
    let path = join(prefix, &old.name);

    match (old.mode.is_subtree(), new.mode.is_subtree()) {
        (true, true) => {
            // equal subtrees only need descending when unmodified leaves
            // are wanted
            if old.target != new.target || opts.include_unmodified {
                let old_sub = view.tree(old.target)?;
                let new_sub = view.tree(new.target)?;
                walk(view, Some(&old_sub), Some(&new_sub), &path, opts, out)?;
            }
            Ok(())
        }
        (true, false) | (false, true) => {
            // subtree replaced by blob or vice versa: delete plus add
            emit_side(view, old, prefix, opts, Side::Deleted, out)?;
            emit_side(view, new, prefix, opts, Side::Added, out)
        }
        (false, false) => {
            if !opts.pathspec.matches(&path) {
                return Ok(());
            }
            let old_file = DiffFile::new(path.clone(), old.target, old.mode);
            let new_file = DiffFile::new(path, new.target, new.mode);

            if old.target == new.target && old.mode == new.mode {
                if opts.include_unmodified {
                    out.push(DiffDelta::unmodified(old_file, new_file));
                }
            } else if old.mode.class() == new.mode.class() {
                out.push(DiffDelta::modified(old_file, new_file));
            } else {
                out.push(DiffDelta::typechange(old_file, new_file));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{DeltaStatus, EntryMode};

    fn tree_of(store: &mut MemoryStore, entries: Vec<(&str, EntryMode, Id)>) -> Id {
        let entries = entries
            .into_iter()
            .map(|(name, mode, target)| TreeEntry::new(name, mode, target))
            .collect();
        store.insert_tree(entries).unwrap()
    }

    fn file_tree(store: &mut MemoryStore, files: &[(&str, &str)]) -> Id {
        let entries = files
            .iter()
            .map(|(name, content)| {
                let blob = store.insert_blob(content.as_bytes().to_vec());
                (*name, EntryMode::Regular, blob)
            })
            .collect::<Vec<_>>();
        tree_of(store, entries)
    }

    fn statuses(deltas: &[DiffDelta]) -> Vec<(DeltaStatus, String)> {
        deltas
            .iter()
            .map(|d| (d.status, d.path().to_string()))
            .collect()
    }

    #[test]
    fn test_diff_identical_trees() {
        let mut store = MemoryStore::new();
        let id = file_tree(&mut store, &[("a.txt", "alpha"), ("b.txt", "beta")]);

        let view = CommitGraphView::new(&store);
        let tree = view.tree(id).unwrap();
        let deltas = diff_trees(&view, Some(&tree), Some(&tree), &DiffOptions::default()).unwrap();
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_diff_identical_trees_include_unmodified() {
        let mut store = MemoryStore::new();
        let id = file_tree(&mut store, &[("a.txt", "alpha")]);

        let view = CommitGraphView::new(&store);
        let tree = view.tree(id).unwrap();
        let opts = DiffOptions {
            include_unmodified: true,
            ..Default::default()
        };
        let deltas = diff_trees(&view, Some(&tree), Some(&tree), &opts).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].status, DeltaStatus::Unmodified);
    }

    #[test]
    fn test_diff_against_absent_tree() {
        let mut store = MemoryStore::new();
        let blob = store.insert_blob(b"content".to_vec());
        let sub = tree_of(
            &mut store,
            vec![
                ("x.txt", EntryMode::Regular, blob),
                ("y.txt", EntryMode::Regular, blob),
            ],
        );
        let root = tree_of(
            &mut store,
            vec![
                ("dir", EntryMode::Subtree, sub),
                ("top.txt", EntryMode::Regular, blob),
            ],
        );

        let view = CommitGraphView::new(&store);
        let tree = view.tree(root).unwrap();

        // recursive leaf count: dir/x.txt, dir/y.txt, top.txt
        let added = diff_trees(&view, None, Some(&tree), &DiffOptions::default()).unwrap();
        assert_eq!(
            statuses(&added),
            vec![
                (DeltaStatus::Added, "dir/x.txt".to_string()),
                (DeltaStatus::Added, "dir/y.txt".to_string()),
                (DeltaStatus::Added, "top.txt".to_string()),
            ]
        );

        let deleted = diff_trees(&view, Some(&tree), None, &DiffOptions::default()).unwrap();
        assert!(deleted.iter().all(|d| d.status == DeltaStatus::Deleted));
        assert_eq!(deleted.len(), 3);
    }

    #[test]
    fn test_diff_added_and_deleted() {
        let mut store = MemoryStore::new();
        let old = file_tree(&mut store, &[("keep.txt", "same"), ("gone.txt", "bye")]);
        let new = file_tree(&mut store, &[("keep.txt", "same"), ("new.txt", "hi")]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();
        let deltas = diff_trees(&view, Some(&old), Some(&new), &DiffOptions::default()).unwrap();

        assert_eq!(
            statuses(&deltas),
            vec![
                (DeltaStatus::Deleted, "gone.txt".to_string()),
                (DeltaStatus::Added, "new.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_modified_content() {
        let mut store = MemoryStore::new();
        let old = file_tree(&mut store, &[("file.txt", "version1")]);
        let new = file_tree(&mut store, &[("file.txt", "version2")]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();
        let deltas = diff_trees(&view, Some(&old), Some(&new), &DiffOptions::default()).unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].status, DeltaStatus::Modified);
        assert_eq!(deltas[0].path(), "file.txt");
    }

    #[test]
    fn test_diff_mode_only_change_is_modified() {
        let mut store = MemoryStore::new();
        let blob = store.insert_blob(b"#!/bin/sh\n".to_vec());
        let old = tree_of(&mut store, vec![("run", EntryMode::Regular, blob)]);
        let new = tree_of(&mut store, vec![("run", EntryMode::Executable, blob)]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();
        let deltas = diff_trees(&view, Some(&old), Some(&new), &DiffOptions::default()).unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].status, DeltaStatus::Modified);
    }

    #[test]
    fn test_diff_typechange() {
        let mut store = MemoryStore::new();
        let blob = store.insert_blob(b"target".to_vec());
        let old = tree_of(&mut store, vec![("thing", EntryMode::Regular, blob)]);
        let new = tree_of(&mut store, vec![("thing", EntryMode::Symlink, blob)]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();
        let deltas = diff_trees(&view, Some(&old), Some(&new), &DiffOptions::default()).unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].status, DeltaStatus::Typechange);
    }

    #[test]
    fn test_diff_subtree_vs_blob_is_delete_plus_add() {
        let mut store = MemoryStore::new();
        let blob = store.insert_blob(b"inner".to_vec());
        let sub = tree_of(&mut store, vec![("inner.txt", EntryMode::Regular, blob)]);
        let old = tree_of(&mut store, vec![("thing", EntryMode::Subtree, sub)]);
        let new = tree_of(&mut store, vec![("thing", EntryMode::Regular, blob)]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();
        let deltas = diff_trees(&view, Some(&old), Some(&new), &DiffOptions::default()).unwrap();

        assert_eq!(
            statuses(&deltas),
            vec![
                (DeltaStatus::Added, "thing".to_string()),
                (DeltaStatus::Deleted, "thing/inner.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_nested_changes_sorted() {
        let mut store = MemoryStore::new();
        let old_inner = file_tree(&mut store, &[("file.txt", "content")]);
        let new_inner = file_tree(&mut store, &[("file.txt", "modified"), ("new.txt", "new")]);
        let old = tree_of(&mut store, vec![("dir", EntryMode::Subtree, old_inner)]);
        let new = tree_of(&mut store, vec![("dir", EntryMode::Subtree, new_inner)]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();
        let deltas = diff_trees(&view, Some(&old), Some(&new), &DiffOptions::default()).unwrap();

        assert_eq!(
            statuses(&deltas),
            vec![
                (DeltaStatus::Modified, "dir/file.txt".to_string()),
                (DeltaStatus::Added, "dir/new.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_reverse_swaps_sides() {
        let mut store = MemoryStore::new();
        let old = file_tree(&mut store, &[("gone.txt", "bye")]);
        let new = file_tree(&mut store, &[]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();

        let opts = DiffOptions {
            reverse: true,
            ..Default::default()
        };
        let deltas = diff_trees(&view, Some(&old), Some(&new), &opts).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].status, DeltaStatus::Added);
        assert_eq!(deltas[0].path(), "gone.txt");
    }

    #[test]
    fn test_diff_pathspec_filter() {
        let mut store = MemoryStore::new();
        let old = file_tree(&mut store, &[("a.rs", "one"), ("b.md", "one")]);
        let new = file_tree(&mut store, &[("a.rs", "two"), ("b.md", "two")]);

        let view = CommitGraphView::new(&store);
        let old = view.tree(old).unwrap();
        let new = view.tree(new).unwrap();

        let opts = DiffOptions {
            pathspec: Pathspec::new(["*.rs"]).unwrap(),
            ..Default::default()
        };
        let deltas = diff_trees(&view, Some(&old), Some(&new), &opts).unwrap();
        assert_eq!(statuses(&deltas), vec![(DeltaStatus::Modified, "a.rs".to_string())]);
    }

    #[test]
    fn test_diff_commits() {
        use crate::types::{Commit, Signature};

        let mut store = MemoryStore::new();
        let t1 = file_tree(&mut store, &[("file.txt", "v1")]);
        let t2 = file_tree(&mut store, &[("file.txt", "v2")]);
        let sig = Signature::new("author", "author@example.com");
        let c1 = store
            .insert_commit(Commit::new(t1, vec![], sig.clone(), 10, "one"))
            .unwrap();
        let c2 = store
            .insert_commit(Commit::new(t2, vec![c1], sig, 20, "two"))
            .unwrap();

        let view = CommitGraphView::new(&store);
        let deltas = diff_commits(&view, Some(c1), Some(c2), &DiffOptions::default()).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].status, DeltaStatus::Modified);

        let initial = diff_commits(&view, None, Some(c1), &DiffOptions::default()).unwrap();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].status, DeltaStatus::Added);
    }
}
