//! A blocking FIFO queue and a single-consumer channel built on top of it.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{RecvError, TryRecvError};

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
    senders: usize,
}

/// An unbounded, thread-safe FIFO queue with a blocking `receive`.
///
/// `send` never blocks. `receive` suspends the calling thread while the queue is empty; the lock is
/// released for as long as the thread is suspended. Any number of threads may send and receive through a
/// shared reference, and every value is delivered to exactly one receiver.
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        BlockingQueue {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
                senders: 0,
            }),
            not_empty: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // the critical sections cannot panic halfway through an update
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` to the tail of the queue and wakes one waiting receiver.
    ///
    /// A closed queue still accepts values and delivers them before reporting disconnection.
    pub fn send(&self, item: T) {
        let mut state = self.lock();
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
    }

    /// Removes and returns the head of the queue, waiting until a value is available.
    ///
    /// Returns `RecvError::Disconnected` only once the queue is both empty and closed.
    pub fn receive(&self) -> Result<T, RecvError> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(RecvError::Disconnected);
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes and returns the head of the queue without waiting.
    pub fn try_receive(&self) -> Result<T, TryRecvError> {
        let mut state = self.lock();
        match state.items.pop_front() {
            Some(item) => Ok(item),
            None if state.closed => Err(TryRecvError::Disconnected),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Closes the queue and wakes every waiting receiver.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);
        self.not_empty.notify_all();
    }

    /// Returns `true` if the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns the number of queued values.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` if no value is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn attach_sender(&self) {
        self.lock().senders += 1;
    }

    fn detach_sender(&self) {
        let mut state = self.lock();
        state.senders -= 1;
        if state.senders == 0 {
            state.closed = true;
            drop(state);
            self.not_empty.notify_all();
        }
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a channel backed by a `BlockingQueue`.
///
/// The `Sender` can be cloned to add producers. The `Receiver` cannot be cloned, so a channel has exactly
/// one consumer. The channel disconnects when every `Sender` is dropped or one of them calls `close`.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let queue = Arc::new(BlockingQueue::new());
    queue.attach_sender();
    (
        Sender {
            queue: queue.clone(),
        },
        Receiver { queue },
    )
}

/// The sending half of a channel.
pub struct Sender<T> {
    queue: Arc<BlockingQueue<T>>,
}

impl<T> Sender<T> {
    /// Sends a value. Never blocks.
    pub fn send(&self, item: T) {
        self.queue.send(item)
    }

    /// Disconnects the channel for every sender. Values already queued are still delivered.
    pub fn close(&self) {
        self.queue.close()
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        self.queue.attach_sender();
        Sender {
            queue: self.queue.clone(),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        self.queue.detach_sender();
    }
}

/// The receiving half of a channel.
pub struct Receiver<T> {
    queue: Arc<BlockingQueue<T>>,
}

impl<T> Receiver<T> {
    /// Waits for the next value. See `BlockingQueue::receive`.
    pub fn receive(&self) -> Result<T, RecvError> {
        self.queue.receive()
    }

    /// Takes the next value if one is queued.
    pub fn try_receive(&self) -> Result<T, TryRecvError> {
        self.queue.try_receive()
    }

    /// Returns the number of values waiting to be received.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if no value is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
