//! Single-slot tap hand-off from the input thread to the render thread

use crossbeam::channel::{self, Receiver, Sender, TryRecvError, TrySendError};
use glam::Vec2;
use web_time::Instant;

/// A single tap on the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapEvent {
    /// Screen position in pixels
    pub position: Vec2,
    /// When the finger lifted
    pub timestamp: Instant,
}

impl TapEvent {
    /// A tap at `position`, stamped now
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            timestamp: Instant::now(),
        }
    }
}

/// Capacity-one tap buffer.
///
/// `offer` never blocks and never overwrites: while a tap is waiting any
/// newer tap is dropped. `poll` never blocks and empties the slot.
#[derive(Debug, Clone)]
pub struct TapQueue {
    sender: Sender<TapEvent>,
    receiver: Receiver<TapEvent>,
}

impl Default for TapQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TapQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = channel::bounded(1);
        Self { sender, receiver }
    }

    /// Producer handle for the input thread
    pub fn sender(&self) -> TapSender {
        TapSender {
            sender: self.sender.clone(),
        }
    }

    /// Queue a tap if the slot is free. Returns `false` when it was dropped.
    pub fn offer(&self, tap: TapEvent) -> bool {
        offer_on(&self.sender, tap)
    }

    /// Take the waiting tap, if any
    pub fn poll(&self) -> Option<TapEvent> {
        match self.receiver.try_recv() {
            Ok(tap) => Some(tap),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Whether no tap is waiting
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Cloneable producer end of a [`TapQueue`]
#[derive(Debug, Clone)]
pub struct TapSender {
    sender: Sender<TapEvent>,
}

impl TapSender {
    /// Queue a tap if the slot is free. Returns `false` when it was dropped.
    pub fn offer(&self, tap: TapEvent) -> bool {
        offer_on(&self.sender, tap)
    }
}

fn offer_on(sender: &Sender<TapEvent>, tap: TapEvent) -> bool {
    match sender.try_send(tap) {
        Ok(()) => true,
        Err(TrySendError::Full(dropped)) => {
            log::debug!("Tap at {:?} dropped, previous tap still pending", dropped.position);
            false
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    #[test]
    fn test_first_tap_survives() {
        let queue = TapQueue::new();
        assert!(queue.offer(TapEvent::new(Vec2::new(1.0, 1.0))));
        assert!(!queue.offer(TapEvent::new(Vec2::new(2.0, 2.0))));

        let tap = queue.poll().expect("tap queued");
        assert_eq!(tap.position, Vec2::new(1.0, 1.0));
        assert!(queue.poll().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sender_from_other_thread() {
        let queue = TapQueue::new();
        let sender = queue.sender();
        let accepted = thread::spawn(move || {
            (0..10)
                .filter(|i| sender.offer(TapEvent::new(Vec2::splat(*i as f32))))
                .count()
        })
        .join()
        .expect("input thread");

        // nothing polls during the burst, so only the first tap fits
        assert_eq!(accepted, 1);
        assert_eq!(queue.poll().map(|tap| tap.position), Some(Vec2::ZERO));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Offer(f32),
        Poll,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0.0f32..1000.0).prop_map(Op::Offer), Just(Op::Poll)]
    }

    proptest! {
        #[test]
        fn prop_matches_single_slot_model(ops in proptest::collection::vec(op(), 0..64)) {
            let queue = TapQueue::new();
            let mut model: Option<f32> = None;

            for op in ops {
                match op {
                    Op::Offer(x) => {
                        let accepted = queue.offer(TapEvent::new(Vec2::new(x, 0.0)));
                        prop_assert_eq!(accepted, model.is_none());
                        if model.is_none() {
                            model = Some(x);
                        }
                    }
                    Op::Poll => {
                        let polled = queue.poll().map(|tap| tap.position.x);
                        prop_assert_eq!(polled, model.take());
                    }
                }
            }
        }
    }
}
