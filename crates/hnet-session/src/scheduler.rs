use std::collections::VecDeque;
use std::task::Poll;

use hnet_codec::{Codec, PartialRead};
use tracing::trace;

use crate::error::Result;

/// A queued result read that can make progress without blocking.
pub trait PendingRead<S: ?Sized> {
    /// Advance with whatever `src` has available. Returns true once the
    /// value is complete and its continuation has run.
    fn advance(&mut self, src: &mut S) -> Result<bool>;
}

/// An outstanding call: the partially decoded result plus what to do with
/// it.
pub struct PendingCall<R: Codec, F> {
    state: R::DecodeState,
    continuation: Option<F>,
}

impl<R: Codec, F: FnOnce(R)> PendingCall<R, F> {
    pub fn new(continuation: F) -> Self {
        Self {
            state: R::prepare(),
            continuation: Some(continuation),
        }
    }
}

impl<S, R, F> PendingRead<S> for PendingCall<R, F>
where
    S: PartialRead + ?Sized,
    R: Codec,
    F: FnOnce(R),
{
    fn advance(&mut self, src: &mut S) -> Result<bool> {
        match R::resume(src, &mut self.state)? {
            Poll::Ready(value) => {
                if let Some(continuation) = self.continuation.take() {
                    continuation(value);
                }
                Ok(true)
            }
            Poll::Pending => Ok(false),
        }
    }
}

/// FIFO of outstanding result reads on one connection.
///
/// Results arrive in call order, so only the front entry may read. Driving
/// never blocks: it stops at the first entry that cannot finish with the
/// bytes currently available.
pub struct Scheduler<S: ?Sized> {
    queue: VecDeque<Box<dyn PendingRead<S>>>,
}

impl<S: PartialRead + ?Sized> Scheduler<S> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Queue a read of an `R` result, completed by `continuation`.
    pub fn push<R, F>(&mut self, continuation: F)
    where
        R: Codec + 'static,
        F: FnOnce(R) + 'static,
    {
        self.queue
            .push_back(Box::new(PendingCall::<R, F>::new(continuation)));
    }

    /// Complete as many queued reads as the available bytes allow.
    ///
    /// Returns how many completed during this call.
    pub fn drive(&mut self, src: &mut S) -> Result<usize> {
        let mut completed = 0;
        while let Some(front) = self.queue.front_mut() {
            if !front.advance(src)? {
                break;
            }
            self.queue.pop_front();
            completed += 1;
        }
        trace!(completed, pending = self.queue.len(), "scheduler step");
        Ok(completed)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every queued read without running continuations.
    ///
    /// Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

impl<S: PartialRead + ?Sized> Default for Scheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}
