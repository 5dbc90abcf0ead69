use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::graph::CommitGraphView;
use crate::id::Id;
use crate::store::ObjectStore;
use crate::types::{DeltaStatus, DiffDelta, EntryClass};

/// thresholds for rename/copy detection, 0-100
#[derive(Clone, Copy, Debug)]
pub struct FindOptions {
    pub rename_threshold: u8,
    pub copy_threshold: u8,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            rename_threshold: 50,
            copy_threshold: 50,
        }
    }
}

/// merge delete+add pairs into rename/copy deltas above a similarity
/// threshold
///
/// this is a greedy bipartite best-match, not a maximum-weight matching:
/// deletes are processed in path order and each takes its best remaining
/// add; equal scores resolve to the byte-wise smallest candidate path. the
/// locally-greedy result is part of the contract - tooling depends on it.
///
/// copy detection sources from `Unmodified` deltas, so it only fires when
/// the input was produced with `include_unmodified` set.
pub fn find_similar<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    deltas: Vec<DiffDelta>,
    opts: &FindOptions,
) -> Result<Vec<DiffDelta>> {
    let mut slots: Vec<Option<DiffDelta>> = deltas.into_iter().map(Some).collect();

    let deleted = candidate_indices(&slots, DeltaStatus::Deleted);
    let added = candidate_indices(&slots, DeltaStatus::Added);
    let unmodified = candidate_indices(&slots, DeltaStatus::Unmodified);

    // rename pass: greedy best-match of each delete against remaining adds
    let mut used_adds: HashSet<usize> = HashSet::new();
    for &di in &deleted {
        let old_file = slots[di]
            .as_ref()
            .and_then(|d| d.old.clone())
            .expect("deleted delta has an old side");

        let mut best: Option<(u8, usize)> = None;
        for &ai in &added {
            if used_adds.contains(&ai) {
                continue;
            }
            let add = slots[ai].as_ref().expect("unused add slot");
            let new_file = add.new.as_ref().expect("added delta has a new side");
            if new_file.mode.class() != old_file.mode.class() {
                continue;
            }
            let score = score_pair(view, old_file.id, new_file.id, opts.rename_threshold)?;
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, ai));
            }
            if score == 100 {
                break;
            }
        }

        if let Some((score, ai)) = best {
            if score >= opts.rename_threshold {
                used_adds.insert(ai);
                let add = slots[ai].take().expect("unused add slot");
                let del = slots[di].take().expect("unprocessed delete slot");
                slots[di] = Some(DiffDelta::renamed(
                    del.old.expect("old side"),
                    add.new.expect("new side"),
                    score,
                ));
            }
        }
    }

    // copy pass: remaining adds that match an unmodified blob elsewhere
    for &ai in &added {
        if used_adds.contains(&ai) {
            continue;
        }
        let new_file = slots[ai]
            .as_ref()
            .and_then(|d| d.new.clone())
            .expect("added delta has a new side");

        let mut best: Option<(u8, usize)> = None;
        for &ui in &unmodified {
            let unmod = slots[ui].as_ref().expect("unmodified slot");
            let source = unmod.old.as_ref().expect("unmodified delta has sides");
            if source.mode.class() != new_file.mode.class() {
                continue;
            }
            let score = score_pair(view, source.id, new_file.id, opts.copy_threshold)?;
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, ui));
            }
            if score == 100 {
                break;
            }
        }

        if let Some((score, ui)) = best {
            if score >= opts.copy_threshold {
                let source = slots[ui]
                    .as_ref()
                    .and_then(|d| d.old.clone())
                    .expect("unmodified source");
                slots[ai] = Some(DiffDelta::copied(source, new_file, score));
            }
        }
    }

    let mut refined: Vec<DiffDelta> = slots.into_iter().flatten().collect();
    refined.sort_by(|a, b| a.path().as_bytes().cmp(b.path().as_bytes()));
    Ok(refined)
}

/// indices of rename-compatible deltas with the given status, path-sorted
/// so the greedy assignment is deterministic
fn candidate_indices(slots: &[Option<DiffDelta>], status: DeltaStatus) -> Vec<usize> {
    let mut indices: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| {
            slot.as_ref().is_some_and(|d| {
                d.status == status
                    && matches!(
                        d.old.as_ref().or(d.new.as_ref()).map(|f| f.mode.class()),
                        Some(EntryClass::File) | Some(EntryClass::Symlink)
                    )
            })
        })
        .map(|(i, _)| i)
        .collect();
    indices.sort_by(|a, b| {
        let pa = slots[*a].as_ref().map(|d| d.path()).unwrap_or("");
        let pb = slots[*b].as_ref().map(|d| d.path()).unwrap_or("");
        pa.as_bytes().cmp(pb.as_bytes())
    });
    indices
}

/// content similarity of two blobs, 0-100
///
/// line-based token multiset overlap. identical ids short-circuit to 100;
/// a byte-size bound prunes pairs that cannot plausibly reach the
/// threshold before any content is tokenized (a heuristic over a
/// line-based metric, accepted as such).
fn score_pair<S: ObjectStore>(
    view: &CommitGraphView<'_, S>,
    old_id: Id,
    new_id: Id,
    threshold: u8,
) -> Result<u8> {
    if old_id == new_id {
        return Ok(100);
    }

    let old = view.blob_ref(old_id)?;
    let new = view.blob_ref(new_id)?;

    let min = old.len().min(new.len());
    let max = old.len().max(new.len());
    if max == 0 {
        return Ok(100);
    }
    if threshold > 0 && (200 * min) / (min + max) < threshold as usize {
        return Ok(0);
    }

    let (old_lines, old_total) = line_multiset(&old.content);
    let (new_lines, new_total) = line_multiset(&new.content);
    if old_total + new_total == 0 {
        return Ok(100);
    }

    let common: usize = old_lines
        .iter()
        .map(|(line, count)| count.min(new_lines.get(line).unwrap_or(&0)))
        .sum();

    Ok(((200 * common) / (old_total + new_total)) as u8)
}

fn line_multiset(content: &[u8]) -> (HashMap<&[u8], usize>, usize) {
    let mut parts: Vec<&[u8]> = content.split(|b| *b == b'\n').collect();
    if parts.last().is_some_and(|l| l.is_empty()) {
        parts.pop();
    }
    let mut map = HashMap::new();
    let total = parts.len();
    for line in parts {
        *map.entry(line).or_insert(0usize) += 1;
    }
    (map, total)
}
