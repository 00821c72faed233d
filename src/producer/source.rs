//! Pull interface between a producer and its delivery engine

use crate::subscriber::Termination;

/// Outcome of pulling from a [`Source`]
#[derive(Debug)]
pub enum Pull<V, E> {
    /// Next item, delivered against one unit of demand
    Item(V),
    /// Nothing available yet; the producer calls `drain` when that changes
    Pending,
    /// The source is exhausted or failed
    Done(Termination<E>),
}

/// Per-subscription supply of signals
///
/// A source is only ever touched by the thread currently delivering for its
/// subscription, so implementations need no internal ordering of their own.
/// It is dropped as soon as the subscription terminates or is cancelled.
pub trait Source<V, E>: Send {
    /// Produce the next signal; only called while demand is outstanding
    fn pull(&mut self) -> Pull<V, E>;

    /// Report a terminal signal that is due regardless of demand
    ///
    /// Called when no demand is outstanding. Completion and failure do not
    /// consume demand, so a source that is already exhausted should say so here.
    fn poll_terminal(&mut self) -> Option<Termination<E>> {
        None
    }
}
