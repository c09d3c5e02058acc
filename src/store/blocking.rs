//! Waiters for blocking list pops
//!
//! A blocked caller owns an [`Arc<Waiter>`] registered in the wait queue
//! of every key it watches. Queues live inside the shard that owns the
//! key, so registration and hand-off happen under the same shard lock as
//! the list itself: a push can never slip between "list is empty" and
//! "waiter is queued".
//!
//! Each waiter is served at most once. A push hands its element directly
//! to the first still-waiting waiter (FIFO per key). A waiter that times
//! out flips to `Abandoned` under its own lock, so a concurrent push either
//! sees it abandoned and skips it, or served it first and the element is
//! returned to the caller. Nothing is lost either way.

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

/// Which end of a list a pop takes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Left,
    Right,
}

impl ListEnd {
    pub(crate) fn pop(self, list: &mut VecDeque<Bytes>) -> Option<Bytes> {
        match self {
            ListEnd::Left => list.pop_front(),
            ListEnd::Right => list.pop_back(),
        }
    }

    pub(crate) fn push(self, list: &mut VecDeque<Bytes>, value: Bytes) {
        match self {
            ListEnd::Left => list.push_front(value),
            ListEnd::Right => list.push_back(value),
        }
    }
}

#[derive(Debug)]
enum WaitState {
    Waiting,
    Served(Bytes, Bytes),
    Abandoned,
}

/// A caller blocked on one or more list keys
#[derive(Debug)]
pub struct Waiter {
    end: ListEnd,
    state: Mutex<WaitState>,
    ready: Condvar,
}

impl Waiter {
    pub fn new(end: ListEnd) -> Arc<Self> {
        Arc::new(Waiter {
            end,
            state: Mutex::new(WaitState::Waiting),
            ready: Condvar::new(),
        })
    }

    pub fn is_waiting(&self) -> bool {
        matches!(*self.state.lock(), WaitState::Waiting)
    }

    /// Pop from `list` into this waiter if it is still waiting
    ///
    /// Returns false (and leaves the list alone) if the waiter was already
    /// served or abandoned.
    pub fn offer(&self, key: &Bytes, list: &mut VecDeque<Bytes>) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, WaitState::Waiting) {
            return false;
        }
        match self.end.pop(list) {
            Some(value) => {
                *state = WaitState::Served(key.clone(), value);
                self.ready.notify_one();
                true
            }
            None => false,
        }
    }

    /// Block until served or until `deadline` (forever when `None`)
    ///
    /// After this returns the waiter is spent: later offers are refused.
    pub fn wait(&self, deadline: Option<Instant>) -> Option<(Bytes, Bytes)> {
        let mut state = self.state.lock();
        loop {
            if !matches!(*state, WaitState::Waiting) {
                break;
            }
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.ready.wait(&mut state),
            }
        }

        match std::mem::replace(&mut *state, WaitState::Abandoned) {
            WaitState::Served(key, value) => Some((key, value)),
            _ => None,
        }
    }
}

/// Per-key FIFO queues of waiters, owned by a shard
#[derive(Debug, Default)]
pub struct WaitQueues {
    queues: HashMap<Bytes, VecDeque<Arc<Waiter>>>,
}

impl WaitQueues {
    pub fn register(&mut self, key: Bytes, waiter: Arc<Waiter>) {
        self.queues.entry(key).or_default().push_back(waiter);
    }

    /// Drop a waiter from a key's queue
    pub fn remove(&mut self, key: &Bytes, waiter: &Arc<Waiter>) {
        if let Some(queue) = self.queues.get_mut(key) {
            queue.retain(|w| !Arc::ptr_eq(w, waiter));
            if queue.is_empty() {
                self.queues.remove(key);
            }
        }
    }

    /// Hand elements of `list` to waiters on `key`, oldest waiter first
    ///
    /// Spent waiters found along the way are discarded. Returns how many
    /// waiters were served.
    pub fn serve(&mut self, key: &Bytes, list: &mut VecDeque<Bytes>) -> usize {
        let Some(queue) = self.queues.get_mut(key) else {
            return 0;
        };

        let mut served = 0;
        while !list.is_empty() {
            let Some(waiter) = queue.pop_front() else {
                break;
            };
            if waiter.offer(key, list) {
                served += 1;
            }
        }

        if queue.is_empty() {
            self.queues.remove(key);
        }
        served
    }

    /// Number of queued waiter registrations
    pub fn len(&self) -> usize {
        self.queues.values().map(|q| q.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
