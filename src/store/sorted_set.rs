//! Sorted set: members ordered by `(score, member)`
//!
//! Two structures kept in lockstep:
//! - a `HashMap` member -> score for O(1) score lookups and membership;
//! - a skip list (nodes stored in an arena `Vec`, linked by index) whose
//!   forward links carry spans, giving O(log n) insert, delete, rank and
//!   rank-to-node lookups.

use bytes::Bytes;
use rand::Rng;
use std::collections::HashMap;

const MAX_LEVEL: usize = 32;
const LEVEL_P: f64 = 0.25;

/// Arena index of the header node
const HEAD: usize = 0;

#[derive(Debug, Clone, Copy)]
struct Level {
    forward: Option<usize>,
    /// Number of level-0 steps this link jumps over
    span: usize,
}

#[derive(Debug, Clone)]
struct Node {
    member: Bytes,
    score: f64,
    backward: Option<usize>,
    levels: Vec<Level>,
}

impl Node {
    fn new(member: Bytes, score: f64, height: usize) -> Self {
        Node {
            member,
            score,
            backward: None,
            levels: vec![
                Level {
                    forward: None,
                    span: 0
                };
                height
            ],
        }
    }

    /// True if this node sorts strictly before `(score, member)`
    fn precedes(&self, score: f64, member: &[u8]) -> bool {
        self.score < score || (self.score == score && self.member.as_ref() < member)
    }
}

/// Sorted set value
#[derive(Debug, Clone)]
pub struct SortedSet {
    scores: HashMap<Bytes, f64>,
    nodes: Vec<Node>,
    free: Vec<usize>,
    level: usize,
    length: usize,
    tail: Option<usize>,
}

impl Default for SortedSet {
    fn default() -> Self {
        SortedSet {
            scores: HashMap::new(),
            nodes: vec![Node::new(Bytes::new(), 0.0, MAX_LEVEL)],
            free: Vec::new(),
            level: 1,
            length: 0,
            tail: None,
        }
    }
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Add a member or update its score
    ///
    /// Returns true if the member is new. Re-adding with the same score
    /// changes nothing. The caller rejects NaN scores.
    pub fn add(&mut self, member: Bytes, score: f64) -> bool {
        match self.scores.get(&member).copied() {
            Some(old) if old == score => false,
            Some(old) => {
                self.delete_node(old, &member);
                self.insert_node(member.clone(), score);
                self.scores.insert(member, score);
                false
            }
            None => {
                self.insert_node(member.clone(), score);
                self.scores.insert(member, score);
                true
            }
        }
    }

    /// Remove a member, returning true if it was present
    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove(member) {
            Some(score) => self.delete_node(score, member),
            None => false,
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.scores.contains_key(member)
    }

    /// 0-based position in ascending order
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.score(member)?;
        let mut rank = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                let node = &self.nodes[next];
                if node.score < score || (node.score == score && node.member.as_ref() <= member) {
                    rank += self.nodes[x].levels[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            if x != HEAD && self.nodes[x].member.as_ref() == member {
                return Some(rank - 1);
            }
        }
        None
    }

    /// 0-based position in descending order
    pub fn rev_rank(&self, member: &[u8]) -> Option<usize> {
        if self.last().map_or(false, |(top, _)| top.as_ref() == member) {
            return Some(0);
        }
        self.rank(member).map(|rank| self.length - 1 - rank)
    }

    /// Members with scores between two normalized inclusive ranks
    pub fn range_by_rank(&self, start: usize, stop: usize) -> Vec<(Bytes, f64)> {
        if start > stop || start >= self.length {
            return Vec::new();
        }
        let stop = stop.min(self.length - 1);
        let mut out = Vec::with_capacity(stop - start + 1);
        let mut cursor = self.node_at(start + 1);
        while let Some(idx) = cursor {
            if out.len() > stop - start {
                break;
            }
            let node = &self.nodes[idx];
            out.push((node.member.clone(), node.score));
            cursor = node.levels[0].forward;
        }
        out
    }

    /// Remove members between two normalized inclusive ranks
    pub fn remove_range_by_rank(&mut self, start: usize, stop: usize) -> usize {
        let doomed = self.range_by_rank(start, stop);
        for (member, score) in &doomed {
            self.scores.remove(member);
            self.delete_node(*score, member);
        }
        doomed.len()
    }

    /// Iterate in ascending order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            cursor: self.nodes[HEAD].levels[0].forward,
        }
    }

    /// Approximate heap footprint
    pub fn memory_usage(&self) -> usize {
        let members: usize = self.scores.keys().map(|m| m.len()).sum();
        let per_member = std::mem::size_of::<Node>()
            + std::mem::size_of::<Level>() * 2
            + std::mem::size_of::<(Bytes, f64)>();
        members + self.length * per_member
    }

    fn random_level() -> usize {
        let mut rng = rand::thread_rng();
        let mut level = 1;
        while level < MAX_LEVEL && rng.gen_bool(LEVEL_P) {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Insert a member known to be absent from the list
    fn insert_node(&mut self, member: Bytes, score: f64) {
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].levels[i].forward {
                if self.nodes[next].precedes(score, &member) {
                    rank[i] += self.nodes[x].levels[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let height = Self::random_level();
        if height > self.level {
            for i in self.level..height {
                rank[i] = 0;
                update[i] = HEAD;
                self.nodes[HEAD].levels[i].span = self.length;
            }
            self.level = height;
        }

        let new = self.alloc(Node::new(member, score, height));
        for i in 0..height {
            let prev = update[i];
            let prev_level = self.nodes[prev].levels[i];
            self.nodes[new].levels[i] = Level {
                forward: prev_level.forward,
                span: prev_level.span - (rank[0] - rank[i]),
            };
            self.nodes[prev].levels[i] = Level {
                forward: Some(new),
                span: rank[0] - rank[i] + 1,
            };
        }
        for i in height..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        self.nodes[new].backward = if update[0] == HEAD {
            None
        } else {
            Some(update[0])
        };
        match self.nodes[new].levels[0].forward {
            Some(next) => self.nodes[next].backward = Some(new),
            None => self.tail = Some(new),
        }
        self.length += 1;
    }

    /// Delete the node holding `(score, member)`, returning true if found
    fn delete_node(&mut self, score: f64, member: &[u8]) -> bool {
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if self.nodes[next].precedes(score, member) {
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        match self.nodes[x].levels[0].forward {
            Some(target)
                if self.nodes[target].score == score
                    && self.nodes[target].member.as_ref() == member =>
            {
                self.unlink(target, &update);
                true
            }
            _ => false,
        }
    }

    fn unlink(&mut self, target: usize, update: &[usize; MAX_LEVEL]) {
        for (i, &prev) in update.iter().enumerate().take(self.level) {
            if self.nodes[prev].levels[i].forward == Some(target) {
                let removed = self.nodes[target].levels[i];
                let prev_level = &mut self.nodes[prev].levels[i];
                prev_level.span = prev_level.span + removed.span - 1;
                prev_level.forward = removed.forward;
            } else {
                self.nodes[prev].levels[i].span -= 1;
            }
        }

        let backward = self.nodes[target].backward;
        match self.nodes[target].levels[0].forward {
            Some(next) => self.nodes[next].backward = backward,
            None => self.tail = backward,
        }

        while self.level > 1 && self.nodes[HEAD].levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        self.length -= 1;

        let node = &mut self.nodes[target];
        node.member = Bytes::new();
        node.levels.clear();
        node.backward = None;
        self.free.push(target);
    }

    /// Node at a 1-based rank
    fn node_at(&self, rank: usize) -> Option<usize> {
        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                let span = self.nodes[x].levels[i].span;
                if traversed + span <= rank {
                    traversed += span;
                    x = next;
                } else {
                    break;
                }
            }
            if traversed == rank {
                return Some(x);
            }
        }
        None
    }

    /// Highest-ranked member, if any
    pub fn last(&self) -> Option<(&Bytes, f64)> {
        self.tail.map(|idx| {
            let node = &self.nodes[idx];
            (&node.member, node.score)
        })
    }
}

/// Ascending iterator over `(member, score)`
pub struct Iter<'a> {
    set: &'a SortedSet,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Bytes, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.set.nodes[idx];
        self.cursor = node.levels[0].forward;
        Some((&node.member, node.score))
    }
}
