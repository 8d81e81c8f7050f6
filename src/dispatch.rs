//! Posted-action queue.
//!
//! UI state lives on one thread. Other threads hand it work by posting
//! closures through a [`DispatchHandle`]; the UI thread runs them with
//! [`Dispatcher::drain`] between frames.

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// A unit of work run on the UI thread against its state `S`.
pub type Action<S> = Box<dyn FnOnce(&mut S) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatcher has been dropped")]
    Closed,
}

/// Cloneable, `Send` handle for posting actions.
pub struct DispatchHandle<S> {
    tx: UnboundedSender<Action<S>>,
}

impl<S> Clone for DispatchHandle<S> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<S> DispatchHandle<S> {
    /// Queue `action`. Fails only once the dispatcher is gone.
    pub fn post(&self, action: impl FnOnce(&mut S) + Send + 'static) -> Result<(), DispatchError> {
        self.tx.send(Box::new(action)).map_err(|_| DispatchError::Closed)
    }
}

/// Receiving end, owned by the UI thread.
pub struct Dispatcher<S> {
    tx: UnboundedSender<Action<S>>,
    rx: UnboundedReceiver<Action<S>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn handle(&self) -> DispatchHandle<S> {
        DispatchHandle { tx: self.tx.clone() }
    }

    /// Run queued actions in posting order, at most `limit` of them when
    /// given. Actions posted while draining run in the same call if the
    /// limit allows. Returns how many ran.
    pub fn drain(&mut self, state: &mut S, limit: Option<usize>) -> usize {
        let mut ran = 0;
        while limit.map_or(true, |l| ran < l) {
            match self.rx.try_recv() {
                Ok(action) => {
                    action(state);
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if ran > 0 {
            trace!(ran, "posted actions drained");
        }
        ran
    }
}

// ===========================================================================
// Tests
// ===========================================================================
