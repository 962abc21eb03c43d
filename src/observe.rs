use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Fan-out of state snapshots to any number of subscribers.
///
/// Owners call [`Publisher::publish`] while holding their own lock, so every
/// subscriber sees snapshots in the same order they were produced.
#[derive(Debug)]
pub struct Publisher<T> {
    subscribers: Vec<Sender<T>>,
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> Publisher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, current: T) -> Subscription<T> {
        let (tx, rx) = mpsc::channel();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(current);
        self.subscribers.push(tx);
        Subscription { rx }
    }

    pub fn publish(&mut self, value: &T) {
        // Dropped subscriptions fall out here.
        self.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Receiving end of a [`Publisher`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: Receiver<T>,
}

impl<T> Subscription<T> {
    pub fn try_recv(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains everything pending and keeps only the newest snapshot.
    pub fn latest(&self) -> Option<T> {
        self.rx.try_iter().last()
    }

    pub fn pending(&self) -> impl Iterator<Item = T> + '_ {
        self.rx.try_iter()
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_gets_current_value_first() {
        let mut publisher = Publisher::new();
        publisher.publish(&1);
        let sub = publisher.subscribe(2);
        publisher.publish(&3);
        assert_eq!(sub.pending().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let mut publisher = Publisher::new();
        let keep = publisher.subscribe(0);
        let gone = publisher.subscribe(0);
        gone.unsubscribe();
        publisher.publish(&5);
        assert_eq!(publisher.subscriber_count(), 1);
        assert_eq!(keep.latest(), Some(5));
    }
}
