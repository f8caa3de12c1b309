//! Ancestry walks over the commit DAG

use crate::commit::{Commit, CommitGraph};
use crate::error::VcError;
use crate::types::{Address, Timestamp};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Lazy breadth-first walk over `parent_ids`.
///
/// Each commit is yielded once, with its distance from the start. The order depends only on
/// the graph, so walking again yields the same sequence.
pub struct Ancestors<'a> {
    graph: &'a CommitGraph,
    start: Option<Address>,
    include_start: bool,
    queue: VecDeque<(Address, u32)>,
    visited: HashSet<Address>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(graph: &'a CommitGraph, start: Address, include_start: bool) -> Self {
        Self {
            graph,
            start: Some(start),
            include_start,
            queue: VecDeque::new(),
            visited: HashSet::new(),
        }
    }

    /// Next commit and its depth, `None` once the walk is exhausted
    pub async fn next_commit(&mut self) -> Result<Option<(Commit, u32)>, VcError> {
        if let Some(start) = self.start.take() {
            let commit = self.graph.get_commit_with_retry(&start).await?;
            self.visited.insert(start);
            self.enqueue_parents(&commit, 0);
            if self.include_start {
                return Ok(Some((commit, 0)));
            }
        }

        let Some((id, depth)) = self.queue.pop_front() else {
            return Ok(None);
        };
        let commit = self.graph.get_commit_with_retry(&id).await?;
        self.enqueue_parents(&commit, depth);
        Ok(Some((commit, depth)))
    }

    /// Drain the remaining walk
    pub async fn collect_all(mut self) -> Result<Vec<Commit>, VcError> {
        let mut commits = Vec::new();
        while let Some((commit, _)) = self.next_commit().await? {
            commits.push(commit);
        }
        Ok(commits)
    }

    fn enqueue_parents(&mut self, commit: &Commit, depth: u32) {
        for parent in &commit.parent_ids {
            if self.visited.insert(parent.clone()) {
                self.queue.push_back((parent.clone(), depth + 1));
            }
        }
    }
}

struct Reached {
    depth: u32,
    timestamp: Timestamp,
    parents: Vec<Address>,
}

async fn reach(graph: &CommitGraph, start: &Address) -> Result<HashMap<Address, Reached>, VcError> {
    let mut walk = Ancestors::new(graph, start.clone(), true);
    let mut reached = HashMap::new();
    while let Some((commit, depth)) = walk.next_commit().await? {
        reached.insert(
            commit.id,
            Reached {
                depth,
                timestamp: commit.timestamp,
                parents: commit.parent_ids,
            },
        );
    }
    Ok(reached)
}

/// Best common ancestor of `a` and `b`.
///
/// Common ancestors that are themselves ancestors of another common ancestor are discarded.
/// Remaining candidates are ordered by the larger of their two BFS depths, then the sum of
/// both depths, then commit timestamp, then id.
pub(crate) async fn lowest_common_ancestor(
    graph: &CommitGraph,
    a: &Address,
    b: &Address,
) -> Result<Option<Address>, VcError> {
    if a == b {
        graph.get_commit_with_retry(a).await?;
        return Ok(Some(a.clone()));
    }

    let from_a = reach(graph, a).await?;
    let from_b = reach(graph, b).await?;

    let common: HashSet<&Address> = from_a.keys().filter(|id| from_b.contains_key(*id)).collect();
    if common.is_empty() {
        debug!(a = %a, b = %b, "No common ancestor");
        return Ok(None);
    }

    // Everything reachable from the parents of a common ancestor is dominated by it.
    let mut dominated: HashSet<&Address> = HashSet::new();
    let mut frontier: Vec<&Address> = common
        .iter()
        .flat_map(|id| from_a[*id].parents.iter())
        .collect();
    while let Some(id) = frontier.pop() {
        if !dominated.insert(id) {
            continue;
        }
        if let Some(reached) = from_a.get(id) {
            frontier.extend(reached.parents.iter());
        }
    }

    let best = common
        .into_iter()
        .filter(|id| !dominated.contains(*id))
        .min_by(|x, y| {
            let key = |id: &Address| {
                let da = from_a[id].depth;
                let db = from_b[id].depth;
                (da.max(db), da + db, from_a[id].timestamp)
            };
            key(x).cmp(&key(y)).then_with(|| x.cmp(y))
        })
        .cloned();

    debug!(a = %a, b = %b, ancestor = ?best, "Common ancestor resolved");
    Ok(best)
}
