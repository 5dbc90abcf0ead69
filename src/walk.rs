use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::graph::CommitGraphView;
use crate::id::Id;
use crate::store::{HeadSource, ObjectStore};
use crate::types::Commit;

/// traversal order flags, combined with named combinators
///
/// `TOPOLOGICAL` and `TIME` pick the base order; `REVERSE` inverts the
/// emission sequence of whichever base order is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sort(u32);

impl Sort {
    /// unspecified deterministic order (depth-first by push order)
    pub const NONE: Sort = Sort(0);
    /// children before parents
    pub const TOPOLOGICAL: Sort = Sort(1 << 0);
    /// highest commit time first
    pub const TIME: Sort = Sort(1 << 1);
    /// invert the emission sequence
    pub const REVERSE: Sort = Sort(1 << 2);

    #[must_use]
    pub const fn union(self, other: Sort) -> Sort {
        Sort(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Sort) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: Sort) {
        self.0 |= other.0;
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// frontier node for time-ordered traversal
struct TimeNode {
    time: i64,
    /// insertion sequence; earlier insertions win ties
    seq: u64,
    id: Id,
    commit: Commit,
}

impl PartialEq for TimeNode {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for TimeNode {}

impl PartialOrd for TimeNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap: highest time first, then earliest insertion
        self.time
            .cmp(&other.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// eligible node during topological emission
struct TopoNode {
    time_first: bool,
    time: i64,
    disc: usize,
    id: Id,
    commit: Commit,
}

impl PartialEq for TopoNode {
    fn eq(&self, other: &Self) -> bool {
        self.disc == other.disc
    }
}

impl Eq for TopoNode {}

impl PartialOrd for TopoNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TopoNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap: with TIME set, highest time first; ties (and the plain
        // topological case) fall back to discovery order
        if self.time_first {
            self.time
                .cmp(&other.time)
                .then_with(|| other.disc.cmp(&self.disc))
        } else {
            other.disc.cmp(&self.disc)
        }
    }
}

enum Frontier {
    Idle,
    Stack(Vec<Id>),
    Heap(BinaryHeap<TimeNode>),
    Buffered(VecDeque<(Id, Commit)>),
}

/// iterator over the commit graph reachable from pushed roots minus
/// commits reachable from hidden roots
///
/// per-walk state (frontier, visited set, hidden set) is owned exclusively
/// by this instance; independent walkers over the same view may run
/// concurrently. the walk is lazy and forward-only: roots are expanded on
/// the first `next_commit` call, and an exhausted walker stays exhausted.
pub struct RevWalker<'a, S> {
    view: CommitGraphView<'a, S>,
    sorting: Sort,
    first_parent_only: bool,
    pushed: Vec<Id>,
    hidden_roots: Vec<Id>,
    hidden: HashSet<Id>,
    visited: HashSet<Id>,
    frontier: Frontier,
    seq: u64,
    prepared: bool,
    exhausted: bool,
}

impl<'a, S: ObjectStore> RevWalker<'a, S> {
    pub fn new(view: CommitGraphView<'a, S>) -> Self {
        Self {
            view,
            sorting: Sort::NONE,
            first_parent_only: false,
            pushed: Vec::new(),
            hidden_roots: Vec::new(),
            hidden: HashSet::new(),
            visited: HashSet::new(),
            frontier: Frontier::Idle,
            seq: 0,
            prepared: false,
            exhausted: false,
        }
    }

    /// mark a commit and its ancestry as wanted
    ///
    /// annotated tags are peeled to their commit; pushing the same id twice
    /// is a no-op. fails with `NonCommitObject` if the id does not resolve
    /// to a commit.
    pub fn push(&mut self, id: Id) -> Result<()> {
        let peeled = self.peel(id)?;
        if !self.pushed.contains(&peeled) {
            self.pushed.push(peeled);
        }
        self.reset_emission();
        Ok(())
    }

    /// mark a commit and its ancestry as excluded
    ///
    /// hide dominates push regardless of call order; hiding a commit not
    /// reachable from any pushed root is a no-op.
    pub fn hide(&mut self, id: Id) -> Result<()> {
        let peeled = self.peel(id)?;
        if !self.hidden_roots.contains(&peeled) {
            self.hidden_roots.push(peeled);
        }
        self.reset_emission();
        Ok(())
    }

    /// push the current head commit
    pub fn push_head(&mut self, head: &impl HeadSource) -> Result<()> {
        let id = head.current_head()?;
        self.push(id)
    }

    /// select the traversal order
    ///
    /// calling this mid-iteration re-seeds the frontier from the push set:
    /// emission restarts from scratch in the new order.
    pub fn set_order(&mut self, sorting: Sort) {
        self.sorting = sorting;
        self.reset_emission();
    }

    /// traverse only the first parent of each merge, yielding a linear view
    pub fn simplify_first_parent(&mut self) {
        self.first_parent_only = true;
        self.reset_emission();
    }

    /// produce the next commit in traversal order, or `None` at exhaustion
    pub fn next_commit(&mut self) -> Result<Option<(Id, Commit)>> {
        if self.exhausted {
            return Ok(None);
        }
        if !self.prepared {
            self.prepare()?;
        }
        let item = match &self.frontier {
            Frontier::Idle => None,
            Frontier::Stack(_) => self.next_from_stack()?,
            Frontier::Heap(_) => self.next_from_heap()?,
            Frontier::Buffered(_) => self.next_from_buffer(),
        };
        if item.is_none() {
            self.exhausted = true;
        }
        Ok(item)
    }

    fn peel(&self, id: Id) -> Result<Id> {
        match self.view.peel_to_commit(id) {
            Ok((peeled, _)) => Ok(peeled),
            Err(Error::WrongKind { .. }) => Err(Error::NonCommitObject(id)),
            Err(other) => Err(other),
        }
    }

    fn reset_emission(&mut self) {
        if !self.exhausted {
            self.prepared = false;
            self.frontier = Frontier::Idle;
        }
    }

    fn effective_parents(&self, commit: &Commit) -> Vec<Id> {
        if self.first_parent_only {
            commit.first_parent().into_iter().collect()
        } else {
            commit.parents.clone()
        }
    }

    /// everything reachable from the hide roots; hide always follows all
    /// parents, even under first-parent simplification
    fn hidden_closure(&self) -> Result<HashSet<Id>> {
        let mut hidden = HashSet::new();
        let mut stack = self.hidden_roots.clone();
        while let Some(id) = stack.pop() {
            if !hidden.insert(id) {
                continue;
            }
            let commit = self.view.commit(id)?;
            stack.extend(commit.parents.iter().copied());
        }
        Ok(hidden)
    }

    fn prepare(&mut self) -> Result<()> {
        self.hidden = self.hidden_closure()?;
        self.visited.clear();
        self.seq = 0;

        if self.sorting.contains(Sort::TOPOLOGICAL) {
            let order = self.topological_order()?;
            self.frontier = Frontier::Buffered(order.into());
        } else if self.sorting.contains(Sort::TIME) {
            let mut heap = BinaryHeap::new();
            for id in self.pushed.clone() {
                if self.hidden.contains(&id) || !self.visited.insert(id) {
                    continue;
                }
                let commit = self.view.commit(id)?;
                heap.push(TimeNode {
                    time: commit.time,
                    seq: self.seq,
                    id,
                    commit,
                });
                self.seq += 1;
            }
            self.frontier = Frontier::Heap(heap);
        } else {
            // depth-first by push order: last root pushed onto the stack
            // pops last
            let stack: Vec<Id> = self.pushed.iter().rev().copied().collect();
            self.frontier = Frontier::Stack(stack);
        }
        self.prepared = true;

        // reversal is not a streaming transform over these orders: buffer
        // the whole walk before emitting the first result
        if self.sorting.contains(Sort::REVERSE) {
            if let Frontier::Buffered(buf) = &mut self.frontier {
                let mut items: Vec<_> = std::mem::take(buf).into();
                items.reverse();
                *buf = items.into();
            } else {
                let mut items = Vec::new();
                loop {
                    let next = match &self.frontier {
                        Frontier::Stack(_) => self.next_from_stack()?,
                        Frontier::Heap(_) => self.next_from_heap()?,
                        _ => None,
                    };
                    match next {
                        Some(item) => items.push(item),
                        None => break,
                    }
                }
                items.reverse();
                self.frontier = Frontier::Buffered(items.into());
            }
        }
        Ok(())
    }

    fn next_from_stack(&mut self) -> Result<Option<(Id, Commit)>> {
        loop {
            let id = match &mut self.frontier {
                Frontier::Stack(stack) => match stack.pop() {
                    Some(id) => id,
                    None => return Ok(None),
                },
                _ => return Ok(None),
            };
            if self.hidden.contains(&id) || !self.visited.insert(id) {
                continue;
            }
            let commit = self.view.commit(id)?;
            let parents = self.effective_parents(&commit);
            if let Frontier::Stack(stack) = &mut self.frontier {
                // reversed so the first parent pops first
                for parent in parents.iter().rev() {
                    if !self.visited.contains(parent) && !self.hidden.contains(parent) {
                        stack.push(*parent);
                    }
                }
            }
            return Ok(Some((id, commit)));
        }
    }

    fn next_from_heap(&mut self) -> Result<Option<(Id, Commit)>> {
        let node = match &mut self.frontier {
            Frontier::Heap(heap) => heap.pop(),
            _ => None,
        };
        let Some(node) = node else {
            return Ok(None);
        };
        let parents = self.effective_parents(&node.commit);
        for parent in parents {
            if self.hidden.contains(&parent) || !self.visited.insert(parent) {
                continue;
            }
            let commit = self.view.commit(parent)?;
            let entry = TimeNode {
                time: commit.time,
                seq: self.seq,
                id: parent,
                commit,
            };
            self.seq += 1;
            if let Frontier::Heap(heap) = &mut self.frontier {
                heap.push(entry);
            }
        }
        Ok(Some((node.id, node.commit)))
    }

    fn next_from_buffer(&mut self) -> Option<(Id, Commit)> {
        match &mut self.frontier {
            Frontier::Buffered(buf) => buf.pop_front(),
            _ => None,
        }
    }

    /// Kahn-style order over the subgraph induced by pushed ancestors:
    /// a commit becomes eligible only once every in-subgraph child has been
    /// emitted; among eligible commits, discovery order (or commit time when
    /// TIME is also set)
    fn topological_order(&mut self) -> Result<Vec<(Id, Commit)>> {
        struct NodeInfo {
            commit: Option<Commit>,
            parents: Vec<Id>,
            disc: usize,
            pending: usize,
        }

        let time_first = self.sorting.contains(Sort::TIME);
        let mut info: HashMap<Id, NodeInfo> = HashMap::new();
        let mut discovery: Vec<Id> = Vec::new();

        // discover the induced subgraph breadth-first from the push roots
        let mut queue: VecDeque<Id> = VecDeque::new();
        for id in &self.pushed {
            if !self.hidden.contains(id) && !info.contains_key(id) {
                queue.push_back(*id);
                info.insert(
                    *id,
                    NodeInfo {
                        commit: None,
                        parents: Vec::new(),
                        disc: 0,
                        pending: 0,
                    },
                );
            }
        }
        while let Some(id) = queue.pop_front() {
            let commit = self.view.commit(id)?;
            let parents: Vec<Id> = self
                .effective_parents(&commit)
                .into_iter()
                .filter(|p| !self.hidden.contains(p))
                .collect();
            for parent in &parents {
                if !info.contains_key(parent) {
                    info.insert(
                        *parent,
                        NodeInfo {
                            commit: None,
                            parents: Vec::new(),
                            disc: 0,
                            pending: 0,
                        },
                    );
                    queue.push_back(*parent);
                }
            }
            let disc = discovery.len();
            discovery.push(id);
            let node = info.get_mut(&id).expect("discovered node");
            node.commit = Some(commit);
            node.parents = parents;
            node.disc = disc;
        }

        // count in-subgraph children per commit
        for id in &discovery {
            let parents = info[id].parents.clone();
            for parent in parents {
                if let Some(node) = info.get_mut(&parent) {
                    node.pending += 1;
                }
            }
        }

        // emit commits whose children have all been emitted
        let mut eligible: BinaryHeap<TopoNode> = BinaryHeap::new();
        for id in &discovery {
            if info[id].pending != 0 {
                continue;
            }
            let entry = info.get_mut(id).expect("discovered node");
            let disc = entry.disc;
            let commit = entry.commit.take().expect("commit present");
            eligible.push(TopoNode {
                time_first,
                time: commit.time,
                disc,
                id: *id,
                commit,
            });
        }

        let mut order = Vec::with_capacity(discovery.len());
        while let Some(node) = eligible.pop() {
            let parents = info[&node.id].parents.clone();
            order.push((node.id, node.commit));
            for parent in parents {
                let entry = info.get_mut(&parent).expect("in-subgraph parent");
                entry.pending -= 1;
                if entry.pending == 0 {
                    let commit = entry.commit.take().expect("commit present");
                    eligible.push(TopoNode {
                        time_first,
                        time: commit.time,
                        disc: entry.disc,
                        id: parent,
                        commit,
                    });
                }
            }
        }
        Ok(order)
    }
}

impl<'a, S: ObjectStore> Iterator for RevWalker<'a, S> {
    type Item = Result<(Id, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_commit().transpose()
    }
}
