/*
[INPUT]:  Balance values published by any part of the application
[OUTPUT]: Process-wide broadcast of balance updates
[POS]:    Event layer - `balanceUpdated` publish/subscribe channel
[UPDATE]: When adding payload fields or changing channel capacity
*/

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::debug;

const BALANCE_CHANNEL_CAPACITY: usize = 64;

/// Payload of the `balanceUpdated` event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdated(pub Decimal);

/// Broadcast channel for out-of-band balance updates.
///
/// Cloning yields another handle onto the same channel.
#[derive(Debug, Clone)]
pub struct BalanceBus {
    tx: broadcast::Sender<BalanceUpdated>,
}

impl BalanceBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(BALANCE_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a new balance. Returns the number of subscribers that will see it.
    pub fn publish(&self, balance: Decimal) -> usize {
        match self.tx.send(BalanceUpdated(balance)) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(%balance, "balance update published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BalanceUpdated> {
        self.tx.subscribe()
    }
}

impl Default for BalanceBus {
    fn default() -> Self {
        Self::new()
    }
}
