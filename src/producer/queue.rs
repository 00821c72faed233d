//! Sequence-ordered multi-consumer buffer behind the broadcast producer
//!
//! Every published item gets a monotonic sequence number. Each consumer keeps
//! its own read position, so subscribers progress at the pace of their own
//! demand while sharing one `Arc` per item. Entries read by every consumer are
//! garbage collected before the next publish.

use crate::core::sync::handle_mutex_poison;
use crate::producer::error::{PublishError, PublishResult};
use crate::producer::source::{Pull, Source};
use crate::subscriber::Termination;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct QueueEntry<V> {
    sequence: u64,
    item: Arc<V>,
}

#[derive(Debug)]
struct QueueState<V, E> {
    /// Next sequence to assign; starts at 1
    next_sequence: u64,
    entries: VecDeque<QueueEntry<V>>,
    /// Next sequence each consumer expects to read
    positions: HashMap<u64, u64>,
    terminal: Option<Termination<E>>,
}

/// Bounded broadcast buffer with per-consumer positions
#[derive(Debug)]
pub(crate) struct SignalQueue<V, E> {
    state: Mutex<QueueState<V, E>>,
    max_size: usize,
}

impl<V, E> SignalQueue<V, E> {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                next_sequence: 1,
                entries: VecDeque::new(),
                positions: HashMap::new(),
                terminal: None,
            }),
            max_size,
        }
    }

    fn lock(&self) -> PublishResult<MutexGuard<'_, QueueState<V, E>>> {
        handle_mutex_poison(self.state.lock(), |message| PublishError::OperationFailed {
            message,
        })
    }

    pub(crate) fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of buffered items not yet read by every consumer
    pub(crate) fn size(&self) -> usize {
        self.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    /// Sequence the next published item will receive
    pub(crate) fn head_sequence(&self) -> u64 {
        self.lock().map(|state| state.next_sequence).unwrap_or(0)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock()
            .map(|state| state.terminal.is_some())
            .unwrap_or(true)
    }

    /// Register a consumer at the head; it sees only items published from now on
    pub(crate) fn register_consumer(&self, consumer_id: u64) -> PublishResult<()> {
        let mut state = self.lock()?;
        let head = state.next_sequence;
        state.positions.insert(consumer_id, head);
        Ok(())
    }

    pub(crate) fn unregister_consumer(&self, consumer_id: u64) {
        if let Ok(mut state) = self.lock() {
            state.positions.remove(&consumer_id);
            Self::collect_garbage(&mut state);
        }
    }

    pub(crate) fn consumer_ids(&self) -> Vec<u64> {
        self.lock()
            .map(|state| state.positions.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Append an item, returning its sequence number
    pub(crate) fn publish(&self, item: V) -> PublishResult<u64> {
        let mut state = self.lock()?;
        if state.terminal.is_some() {
            return Err(PublishError::Closed);
        }

        Self::collect_garbage(&mut state);
        if state.entries.len() >= self.max_size {
            return Err(PublishError::QueueFull {
                max_size: self.max_size,
            });
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.push_back(QueueEntry {
            sequence,
            item: Arc::new(item),
        });
        Ok(sequence)
    }

    /// Next unread item for a consumer, advancing its position
    pub(crate) fn read_next(&self, consumer_id: u64) -> Option<Arc<V>> {
        let mut state = self.lock().ok()?;
        let position = *state.positions.get(&consumer_id)?;
        let (sequence, item) = state
            .entries
            .iter()
            .find(|entry| entry.sequence >= position)
            .map(|entry| (entry.sequence, Arc::clone(&entry.item)))?;
        state.positions.insert(consumer_id, sequence + 1);
        Some(item)
    }

    /// Items published but not yet read by a consumer
    pub(crate) fn lag(&self, consumer_id: u64) -> usize {
        self.lock()
            .ok()
            .and_then(|state| {
                let position = *state.positions.get(&consumer_id)?;
                Some(
                    state
                        .entries
                        .iter()
                        .filter(|entry| entry.sequence >= position)
                        .count(),
                )
            })
            .unwrap_or(0)
    }

    /// Record the terminal signal every consumer receives once caught up
    pub(crate) fn close(&self, termination: Termination<E>) -> PublishResult<()> {
        let mut state = self.lock()?;
        if state.terminal.is_some() {
            return Err(PublishError::Closed);
        }
        state.terminal = Some(termination);
        Ok(())
    }

    /// Remove entries every consumer has read; without consumers, everything
    fn collect_garbage(state: &mut QueueState<V, E>) -> usize {
        let before = state.entries.len();
        match state.positions.values().min().copied() {
            Some(min_sequence) => state.entries.retain(|entry| entry.sequence >= min_sequence),
            None => state.entries.clear(),
        }
        before - state.entries.len()
    }
}

impl<V, E: Clone> SignalQueue<V, E> {
    /// Terminal signal for a consumer that has read everything
    pub(crate) fn terminal_for(&self, consumer_id: u64) -> Option<Termination<E>> {
        let state = self.lock().ok()?;
        let terminal = state.terminal.as_ref()?;
        let position = state
            .positions
            .get(&consumer_id)
            .copied()
            .unwrap_or(state.next_sequence);
        let caught_up = state
            .entries
            .back()
            .map_or(true, |last| last.sequence < position);
        caught_up.then(|| terminal.clone())
    }
}

/// One consumer's view of a [`SignalQueue`]; unregisters when dropped
pub(crate) struct QueueSource<V, E> {
    queue: Arc<SignalQueue<V, E>>,
    consumer_id: u64,
}

impl<V, E> QueueSource<V, E> {
    pub(crate) fn new(queue: Arc<SignalQueue<V, E>>, consumer_id: u64) -> Self {
        Self { queue, consumer_id }
    }
}

impl<V, E> Source<V, E> for QueueSource<V, E>
where
    V: Clone + Send + Sync,
    E: Clone + Send,
{
    fn pull(&mut self) -> Pull<V, E> {
        if let Some(item) = self.queue.read_next(self.consumer_id) {
            return Pull::Item(V::clone(&item));
        }
        match self.queue.terminal_for(self.consumer_id) {
            Some(termination) => Pull::Done(termination),
            None => Pull::Pending,
        }
    }

    fn poll_terminal(&mut self) -> Option<Termination<E>> {
        self.queue.terminal_for(self.consumer_id)
    }
}

impl<V, E> Drop for QueueSource<V, E> {
    fn drop(&mut self) {
        self.queue.unregister_consumer(self.consumer_id);
    }
}
