//! A one-shot completion barrier.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;

/// Stays complete once completed. Waiters return immediately afterwards.
pub(crate) struct Completion<M: RawMutex> {
    done: BlockingMutex<M, Cell<bool>>,
    signal: Signal<M, ()>,
}

impl<M: RawMutex> Completion<M> {
    pub(crate) const fn new(done: bool) -> Self {
        Self {
            done: BlockingMutex::new(Cell::new(done)),
            signal: Signal::new(),
        }
    }

    pub(crate) fn complete(&self) {
        self.done.lock(|done| done.set(true));
        self.signal.signal(());
    }

    /// Reopens the barrier for a new asynchronous load.
    pub(crate) fn reset(&self) {
        self.done.lock(|done| done.set(false));
        self.signal.reset();
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.done.lock(Cell::get)
    }

    pub(crate) async fn wait(&self) {
        while !self.is_complete() {
            self.signal.wait().await;
        }
    }
}
