//! Shared desk state, published through watch channels.
//!
//! Each resource occupies its own channel with exactly one writer task,
//! so no value is ever mutated concurrently; consumers observe wholesale
//! replacements. Failed fetches leave the last-good value in place and
//! raise a per-resource error flag instead.

use certbook::{Balances, MarketTrade, OpenOrder, OrderBookSnapshot, ReferencePrices};
use tokio::sync::watch;

/// One synchronized resource, for error flagging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    OrderBook,
    Trades,
    OpenOrders,
    Balances,
    Prices,
}

/// Per-resource transient error flags.
///
/// A raised flag means the most recent fetch of that resource failed and
/// its value is stale; the value itself is still the last good one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncErrors {
    pub order_book: bool,
    pub trades: bool,
    pub open_orders: bool,
    pub balances: bool,
    pub prices: bool,
}

impl SyncErrors {
    /// True if any resource is currently failing.
    pub fn any(&self) -> bool {
        self.order_book || self.trades || self.open_orders || self.balances || self.prices
    }
}

/// Watch-channel store for every synchronized resource.
pub struct MarketStore {
    order_book: watch::Sender<OrderBookSnapshot>,
    trades: watch::Sender<Vec<MarketTrade>>,
    open_orders: watch::Sender<Vec<OpenOrder>>,
    balances: watch::Sender<Balances>,
    prices: watch::Sender<ReferencePrices>,
    errors: watch::Sender<SyncErrors>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self {
            order_book: watch::channel(OrderBookSnapshot::default()).0,
            trades: watch::channel(Vec::new()).0,
            open_orders: watch::channel(Vec::new()).0,
            balances: watch::channel(Balances::default()).0,
            prices: watch::channel(ReferencePrices::default()).0,
            errors: watch::channel(SyncErrors::default()).0,
        }
    }

    // === subscriptions ===

    pub fn subscribe_order_book(&self) -> watch::Receiver<OrderBookSnapshot> {
        self.order_book.subscribe()
    }

    pub fn subscribe_trades(&self) -> watch::Receiver<Vec<MarketTrade>> {
        self.trades.subscribe()
    }

    pub fn subscribe_open_orders(&self) -> watch::Receiver<Vec<OpenOrder>> {
        self.open_orders.subscribe()
    }

    pub fn subscribe_balances(&self) -> watch::Receiver<Balances> {
        self.balances.subscribe()
    }

    pub fn subscribe_prices(&self) -> watch::Receiver<ReferencePrices> {
        self.prices.subscribe()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<SyncErrors> {
        self.errors.subscribe()
    }

    // === current values ===

    pub fn order_book(&self) -> OrderBookSnapshot {
        self.order_book.borrow().clone()
    }

    pub fn trades(&self) -> Vec<MarketTrade> {
        self.trades.borrow().clone()
    }

    pub fn open_orders(&self) -> Vec<OpenOrder> {
        self.open_orders.borrow().clone()
    }

    pub fn balances(&self) -> Balances {
        *self.balances.borrow()
    }

    pub fn prices(&self) -> ReferencePrices {
        *self.prices.borrow()
    }

    pub fn errors(&self) -> SyncErrors {
        *self.errors.borrow()
    }

    // === publication ===

    /// Replace the order book, unless the new snapshot is structurally
    /// identical to the current one. Returns whether a replacement was
    /// published; a suppressed duplicate never wakes subscribers.
    pub fn publish_order_book(&self, snapshot: OrderBookSnapshot) -> bool {
        self.order_book.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }

    pub fn publish_trades(&self, trades: Vec<MarketTrade>) {
        let _ = self.trades.send_replace(trades);
    }

    pub fn publish_open_orders(&self, orders: Vec<OpenOrder>) {
        let _ = self.open_orders.send_replace(orders);
    }

    pub fn publish_balances(&self, balances: Balances) {
        let _ = self.balances.send_replace(balances);
    }

    pub fn publish_prices(&self, prices: ReferencePrices) {
        let _ = self.prices.send_replace(prices);
    }

    /// Raise or clear one resource's error flag. Subscribers are only
    /// woken when the flag actually changes.
    pub fn set_error(&self, resource: Resource, failing: bool) {
        self.errors.send_if_modified(|errors| {
            let flag = match resource {
                Resource::OrderBook => &mut errors.order_book,
                Resource::Trades => &mut errors.trades,
                Resource::OpenOrders => &mut errors.open_orders,
                Resource::Balances => &mut errors.balances,
                Resource::Prices => &mut errors.prices,
            };
            if *flag == failing {
                false
            } else {
                *flag = failing;
                true
            }
        });
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certbook::{Price, PriceLevel};

    fn book(ask_quantity: u64) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: vec![PriceLevel::new(Price(100_00), 10, 1)],
            asks: vec![PriceLevel::new(Price(101_00), ask_quantity, 1)],
            last_price: None,
            captured_at: 1,
        }
    }

    #[test]
    fn identical_snapshot_is_suppressed() {
        let store = MarketStore::new();
        let mut rx = store.subscribe_order_book();

        assert!(store.publish_order_book(book(5)));
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        // Same structure again: no publication, no wakeup
        assert!(!store.publish_order_book(book(5)));
        assert!(!rx.has_changed().unwrap());

        // A real change publishes
        assert!(store.publish_order_book(book(6)));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn error_flags_are_per_resource() {
        let store = MarketStore::new();

        store.set_error(Resource::Trades, true);
        let errors = store.errors();
        assert!(errors.trades);
        assert!(!errors.order_book);
        assert!(errors.any());

        store.set_error(Resource::Trades, false);
        assert!(!store.errors().any());
    }

    #[test]
    fn repeated_flag_does_not_wake_subscribers() {
        let store = MarketStore::new();
        let mut rx = store.subscribe_errors();

        store.set_error(Resource::Balances, true);
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        store.set_error(Resource::Balances, true);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn balances_replacement() {
        let store = MarketStore::new();
        store.publish_balances(Balances {
            eur: Price(1_000_00),
            eua: 5,
            cer: 0,
        });
        assert_eq!(store.balances().eur, Price(1_000_00));
    }
}
