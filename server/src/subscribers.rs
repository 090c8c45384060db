//! Registry of connected viewers and best-effort state fan-out
//!
//! Each subscriber owns a bounded queue. Broadcasting never waits on a
//! queue: a full queue loses that update for that subscriber only, and a
//! queue whose receiver is gone is removed from the registry. The caller
//! (the tick loop) never sees a delivery failure.

use log::{info, warn};
use snake_shared::{GameInformation, PlayerLocations};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Snapshot pushed to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Scoreboard, message log and food, sent when a visible message is posted
    Info(GameInformation),
    /// Every player's cells, sent once per tick
    Players(PlayerLocations),
}

pub type UpdateReceiver = mpsc::Receiver<Update>;

pub struct SubscriberRegistry {
    subscribers: HashMap<u32, mpsc::Sender<Update>>,
    /// Next subscription id; 0 is never handed out
    next_subscription_id: u32,
    /// Queue depth per subscriber
    buffer: usize,
}

impl SubscriberRegistry {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: HashMap::new(),
            next_subscription_id: 1,
            buffer: buffer.max(1),
        }
    }

    /// Registers a new subscriber and returns its id with the receiving end
    /// of its update queue.
    pub fn subscribe(&mut self) -> (u32, UpdateReceiver) {
        let subscription_id = self.next_subscription_id;
        self.next_subscription_id += 1;

        let (tx, rx) = mpsc::channel(self.buffer);
        self.subscribers.insert(subscription_id, tx);
        info!("Subscriber {} registered", subscription_id);

        (subscription_id, rx)
    }

    /// Returns false if the id was unknown or already removed.
    pub fn unsubscribe(&mut self, subscription_id: u32) -> bool {
        if self.subscribers.remove(&subscription_id).is_some() {
            info!("Subscriber {} unregistered", subscription_id);
            true
        } else {
            false
        }
    }

    /// Queues an update for a single subscriber
    pub fn send_to(&mut self, subscription_id: u32, update: Update) -> bool {
        let Some(sender) = self.subscribers.get(&subscription_id) else {
            return false;
        };

        match sender.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Subscriber {} is lagging, update dropped", subscription_id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.subscribers.remove(&subscription_id);
                info!("Subscriber {} went away", subscription_id);
                false
            }
        }
    }

    /// Queues an update for every subscriber and returns how many accepted it
    pub fn broadcast(&mut self, update: &Update) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (subscription_id, sender) in &self.subscribers {
            match sender.try_send(update.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Subscriber {} is lagging, update dropped", subscription_id);
                }
                Err(TrySendError::Closed(_)) => closed.push(*subscription_id),
            }
        }

        for subscription_id in closed {
            self.subscribers.remove(&subscription_id);
            info!("Subscriber {} went away", subscription_id);
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
