//! Keyed timers
//!
//! Every delayed effect (tone fade completion, popup hide, fact hide,
//! celebration delay) is a fire-once task under a [`TaskKey`].
//!
//! - Scheduling under a key aborts whatever was pending under that key
//! - A task that was replaced never runs, even if its sleep already elapsed
//! - Without a tokio runtime, scheduling is a logged no-op

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Timer slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Fade-in completion or stop of the ambient tone
    AmbientTone,
    /// Hide of the visible unlock popup
    UnlockPopup,
    /// Hide of the visible fact
    Fact,
    /// One delayed celebration; every burst has its own slot
    Celebration(u64),
}

#[derive(Default)]
struct Slots {
    tasks: HashMap<TaskKey, (u64, JoinHandle<()>)>,
    next_generation: u64,
}

/// Cancellable, keyed, fire-once timers
#[derive(Clone, Default)]
pub struct Scheduler {
    slots: Arc<Mutex<Slots>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, replacing anything pending under `key`
    pub fn schedule<F>(&self, key: TaskKey, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!(?key, "no async runtime, timer dropped");
            return;
        };

        // Held across spawn so the task cannot settle before it is registered
        let mut slots = self.slots.lock();
        let generation = slots.next_generation;
        slots.next_generation += 1;

        let scheduler = self.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if scheduler.settle(key, generation) {
                trace!(?key, "timer fired");
                task();
            }
        });

        if let Some((_, previous)) = slots.tasks.insert(key, (generation, handle)) {
            previous.abort();
        }
    }

    /// Abort the task pending under `key`. Returns true if one was pending.
    pub fn cancel(&self, key: TaskKey) -> bool {
        match self.slots.lock().tasks.remove(&key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort everything
    pub fn cancel_all(&self) {
        for (_, (_, handle)) in self.slots.lock().tasks.drain() {
            handle.abort();
        }
    }

    pub fn is_pending(&self, key: TaskKey) -> bool {
        self.slots.lock().tasks.contains_key(&key)
    }

    /// Number of pending tasks
    pub fn pending(&self) -> usize {
        self.slots.lock().tasks.len()
    }

    /// Deregister a finished sleep; false if it was replaced or cancelled meanwhile
    fn settle(&self, key: TaskKey, generation: u64) -> bool {
        let mut slots = self.slots.lock();
        match slots.tasks.get(&key) {
            Some((current, _)) if *current == generation => {
                slots.tasks.remove(&key);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
