use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{Error, Result};
use crate::graph::CommitGraphView;
use crate::id::Id;
use crate::store::ObjectStore;

/// reachability masks for the two sides of the walk
const SIDE_A: u8 = 1;
const SIDE_B: u8 = 2;
const BOTH: u8 = SIDE_A | SIDE_B;

/// shared frontier node: highest commit time first, ties broken by
/// ascending id byte order
struct FrontierNode {
    time: i64,
    id: Id,
}

impl PartialEq for FrontierNode {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for FrontierNode {}

impl PartialOrd for FrontierNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// best common ancestor of two commits
///
/// walks the ancestors of both sides through one time-ordered frontier,
/// marking each visited id with the side(s) that reached it; the first id
/// popped carrying both marks wins. annotated tags are peeled. fails with
/// `NoCommonAncestor` when the histories are disjoint.
pub fn merge_base<S: ObjectStore>(view: &CommitGraphView<'_, S>, a: Id, b: Id) -> Result<Id> {
    let (a, commit_a) = view.peel_to_commit(a)?;
    let (b, commit_b) = view.peel_to_commit(b)?;

    if a == b {
        return Ok(a);
    }

    let mut marks: HashMap<Id, u8> = HashMap::new();
    let mut frontier: BinaryHeap<FrontierNode> = BinaryHeap::new();

    marks.insert(a, SIDE_A);
    frontier.push(FrontierNode {
        time: commit_a.time,
        id: a,
    });
    marks.insert(b, SIDE_B);
    frontier.push(FrontierNode {
        time: commit_b.time,
        id: b,
    });

    while let Some(node) = frontier.pop() {
        let mask = marks[&node.id];
        if mask == BOTH {
            return Ok(node.id);
        }

        let commit = view.commit(node.id)?;
        for parent in commit.parents {
            let entry = marks.entry(parent).or_insert(0);
            if *entry & mask == mask {
                continue;
            }
            *entry |= mask;
            let time = view.commit(parent)?.time;
            frontier.push(FrontierNode { time, id: parent });
        }
    }

    Err(Error::NoCommonAncestor { a, b })
}

/// best common ancestor of two or more commits, folded pairwise
///
/// a single id resolves to itself; an empty slice fails with
/// `NoCommonAncestor`.
pub fn merge_base_many<S: ObjectStore>(view: &CommitGraphView<'_, S>, ids: &[Id]) -> Result<Id> {
    let [first, rest @ ..] = ids else {
        return Err(Error::NoCommonAncestor {
            a: Id::ZERO,
            b: Id::ZERO,
        });
    };
    let mut base = view.peel_to_commit(*first)?.0;
    for id in rest {
        base = merge_base(view, base, *id)?;
    }
    Ok(base)
}
