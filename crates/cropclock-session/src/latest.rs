//! Observable value slot where only the most recent trigger may commit.
//!
//! Each trigger takes a [`Ticket`] with [`Latest::begin`]. Taking a ticket
//! invalidates every earlier one, so an older request that completes late
//! finds its ticket stale and its result is dropped.

use parking_lot::Mutex;
use tokio::sync::watch;

/// Generation token handed to one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct Latest<T> {
    generation: Mutex<u64>,
    tx: watch::Sender<T>,
}

impl<T> Latest<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            generation: Mutex::new(0),
            tx,
        }
    }

    /// Start a new trigger and apply `on_start` to the value
    pub fn begin(&self, on_start: impl FnOnce(&mut T)) -> Ticket {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.tx.send_modify(on_start);
        Ticket(*generation)
    }

    /// Apply `apply` only if `ticket` is still the newest. Returns whether it was applied.
    pub fn commit(&self, ticket: Ticket, apply: impl FnOnce(&mut T)) -> bool {
        let generation = self.generation.lock();
        if *generation != ticket.0 {
            return false;
        }
        self.tx.send_modify(apply);
        true
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        *self.generation.lock() == ticket.0
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Latest<T> {
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}
