//! Single-threaded FIFO event queue.

use std::collections::VecDeque;

/// Queue of pending events, dispatched one at a time.
///
/// Each handler call runs to completion before the next event is popped.
/// Events posted while handling go to the back of the queue.
#[derive(Debug)]
pub struct EventLoop<E> {
    queue: VecDeque<E>,
}

impl<E> Default for EventLoop<E> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<E> EventLoop<E> {
    /// Creates an empty loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event` behind everything already pending.
    pub fn post(&mut self, event: E) {
        self.queue.push_back(event);
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Dispatches events until the queue is empty and returns how many
    /// were handled.
    ///
    /// The handler receives the loop itself so it can post follow-up
    /// events.
    ///
    /// # Errors
    ///
    /// Stops at the first handler error and returns it. Events after the
    /// failing one stay queued.
    pub fn run_until_idle<F, Error>(&mut self, mut handler: F) -> Result<usize, Error>
    where
        F: FnMut(E, &mut Self) -> Result<(), Error>,
    {
        let mut handled = 0;
        while let Some(event) = self.queue.pop_front() {
            handler(event, self)?;
            handled += 1;
        }
        Ok(handled)
    }
}
