//! Cross-thread work queue drained by the UI thread.
//!
//! Any thread may post boxed tasks; the owner thread runs them in FIFO order
//! from [`DispatchQueue::process`], once per loop iteration. Every post
//! signals the [`Waker`] so a sleeping loop notices promptly.
//!
//! Tasks are dropped outside the queue lock, whether they ran, were
//! cancelled or were discarded by [`DispatchQueue::close`], so a task's
//! captured data may safely post again from its destructor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Instant;

use handplay_types::{HandplayError, Result};

use crate::wakeup::Waker;

/// A unit of work run on the owner thread against `T`.
pub type Task<T> = Box<dyn FnOnce(&mut T) + Send>;

/// Identifies one posted task for [`DispatchQueue::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostHandle(u64);

/// How much of the queue one `process` call may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Everything pending when the call started.
    Drain,
    MaxItems(usize),
    /// Stop starting new tasks once this instant has passed.
    Until(Instant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Post,
    /// The task owns data handed over by the poster.
    PostSteal,
    /// A `run_sync` caller is blocked on this item.
    Sync,
}

struct Item<T> {
    id: u64,
    kind: ItemKind,
    task: Task<T>,
}

struct Queue<T> {
    items: VecDeque<Item<T>>,
    closed: bool,
}

struct Shared<T> {
    queue: Mutex<Queue<T>>,
    next_id: AtomicU64,
    waker: Option<Waker>,
    owner: OnceLock<ThreadId>,
}

pub struct DispatchQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for DispatchQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: 'static> DispatchQueue<T> {
    pub fn new(waker: Option<Waker>) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    items: VecDeque::new(),
                    closed: false,
                }),
                next_id: AtomicU64::new(1),
                waker,
                owner: OnceLock::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue<T>> {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the calling thread as the one that runs `process`. The first
    /// call wins.
    pub fn bind_owner_thread(&self) {
        let _ = self.shared.owner.set(thread::current().id());
    }

    pub fn is_owner_thread(&self) -> bool {
        self.shared.owner.get() == Some(&thread::current().id())
    }

    fn enqueue(&self, kind: ItemKind, task: Task<T>) -> Option<PostHandle> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let rejected = {
            let mut queue = self.lock();
            if queue.closed {
                Some(task)
            } else {
                queue.items.push_back(Item { id, kind, task });
                None
            }
        };
        if let Some(task) = rejected {
            log::debug!("Dropping {kind:?} task {id}: dispatch queue closed");
            drop(task);
            return None;
        }
        log::trace!("Queued {kind:?} task {id}");
        if let Some(waker) = &self.shared.waker {
            waker.wake();
        }
        Some(PostHandle(id))
    }

    /// Fire-and-forget. The returned handle may be passed to `cancel`.
    pub fn post<F>(&self, f: F) -> PostHandle
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        let id = self.enqueue(ItemKind::Post, Box::new(f));
        id.unwrap_or(PostHandle(0))
    }

    /// Fire-and-forget that takes ownership of `data`. `data` is dropped
    /// exactly once: after `f` consumes it, or when the task is cancelled or
    /// discarded unrun.
    pub fn post_steal<D, F>(&self, data: D, f: F) -> PostHandle
    where
        D: Send + 'static,
        F: FnOnce(&mut T, D) + Send + 'static,
    {
        let id = self.enqueue(ItemKind::PostSteal, Box::new(move |target| f(target, data)));
        id.unwrap_or(PostHandle(0))
    }

    /// Run `f` on the owner thread and block until it has finished,
    /// returning its result.
    ///
    /// # Panics
    ///
    /// When called from the owner thread, which would wait on itself.
    pub fn run_sync<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
    {
        assert!(
            !self.is_owner_thread(),
            "run_sync called from the thread that drains the dispatch queue"
        );
        let (tx, rx) = crossbeam_channel::bounded(1);
        let task = Box::new(move |target: &mut T| {
            let _ = tx.send(f(target));
        });
        if self.enqueue(ItemKind::Sync, task).is_none() {
            return Err(HandplayError::Dispatch("queue is closed".into()));
        }
        rx.recv()
            .map_err(|_| HandplayError::Dispatch("queue closed before the call ran".into()))
    }

    /// Remove a task that has not started yet. Returns false when it already
    /// ran, is running, or never existed.
    pub fn cancel(&self, handle: PostHandle) -> bool {
        let removed = {
            let mut queue = self.lock();
            queue
                .items
                .iter()
                .position(|item| item.id == handle.0)
                .and_then(|pos| queue.items.remove(pos))
        };
        match removed {
            Some(item) => {
                log::trace!("Cancelled {:?} task {}", item.kind, item.id);
                drop(item);
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.lock().items.len()
    }

    /// Run pending tasks against `target`. Tasks posted while processing wait
    /// for the next call.
    pub fn process(&self, target: &mut T, budget: Budget) -> usize {
        self.process_with(target, budget, |_| {})
    }

    /// Like [`process`](Self::process), calling `after_each` once after every
    /// task.
    pub fn process_with(
        &self,
        target: &mut T,
        budget: Budget,
        mut after_each: impl FnMut(&mut T),
    ) -> usize {
        let snapshot = self.pending();
        let limit = match budget {
            Budget::MaxItems(n) => snapshot.min(n),
            Budget::Drain | Budget::Until(_) => snapshot,
        };
        let mut ran = 0;
        while ran < limit {
            if let Budget::Until(deadline) = budget {
                if Instant::now() >= deadline {
                    break;
                }
            }
            let next = self.lock().items.pop_front();
            let Some(item) = next else { break };
            log::trace!("Running {:?} task {}", item.kind, item.id);
            (item.task)(target);
            after_each(target);
            ran += 1;
        }
        ran
    }

    /// Stop accepting tasks and discard everything pending. Blocked
    /// `run_sync` callers get an error.
    pub fn close(&self) -> usize {
        let discarded: Vec<Item<T>> = {
            let mut queue = self.lock();
            queue.closed = true;
            queue.items.drain(..).collect()
        };
        if !discarded.is_empty() {
            log::debug!("Discarding {} pending tasks", discarded.len());
        }
        discarded.len()
    }
}
