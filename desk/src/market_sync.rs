//! Fixed-cadence market-data synchronization.
//!
//! One task polls {order book, recent trades, open orders, balances} on
//! a fixed interval. The four fetches run concurrently with no
//! inter-resource ordering; each applies its own result as it resolves.
//! Failures keep the last-good value and raise the resource's error
//! flag. Every write is guarded by the owning scope, so requests that
//! resolve after teardown are dropped silently.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use certbook::CertificateType;
use certbook_gateway::Gateway;

use crate::scope::ScopeHandle;
use crate::store::{MarketStore, Resource};

/// Edge-trigger for an immediate synchronization pass.
///
/// Used by the execution coordinator to refresh balances and orders
/// right after a fill instead of waiting out the poll interval.
/// Triggers coalesce: refreshing an already-pending sync is a no-op.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    pub fn refresh_now(&self) {
        let _ = self.tx.try_send(());
    }
}

/// The market-data polling task.
pub struct MarketDataSync<G> {
    gateway: Arc<G>,
    store: Arc<MarketStore>,
    certificate: CertificateType,
    poll_interval: Duration,
    trade_limit: usize,
    refresh_rx: mpsc::Receiver<()>,
}

impl<G: Gateway> MarketDataSync<G> {
    pub fn new(
        gateway: Arc<G>,
        store: Arc<MarketStore>,
        certificate: CertificateType,
        poll_interval: Duration,
        trade_limit: usize,
    ) -> (Self, RefreshHandle) {
        let (tx, refresh_rx) = mpsc::channel(1);
        (
            Self {
                gateway,
                store,
                certificate,
                poll_interval,
                trade_limit,
                refresh_rx,
            },
            RefreshHandle { tx },
        )
    }

    /// Receive one pending refresh trigger, for tests that observe the
    /// coordinator's edge-trigger without running the loop.
    #[cfg(test)]
    pub(crate) async fn recv_refresh(&mut self) {
        let _ = self.refresh_rx.recv().await;
    }

    /// Poll until the scope is cancelled. The first pass runs
    /// immediately on activation.
    pub async fn run(mut self, mut scope: ScopeHandle) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(
            "market data sync started ({} every {:?})",
            self.certificate, self.poll_interval
        );

        loop {
            tokio::select! {
                _ = scope.cancelled() => break,
                _ = interval.tick() => {}
                Some(()) = self.refresh_rx.recv() => {}
            }
            if !scope.is_live() {
                break;
            }
            self.tick(&scope).await;
        }

        debug!("market data sync stopped");
    }

    /// One synchronization pass: all four resources concurrently, each
    /// applied independently on completion.
    pub async fn tick(&self, scope: &ScopeHandle) {
        let order_book = async {
            let result = self.gateway.order_book(self.certificate).await;
            if !scope.is_live() {
                return;
            }
            match result {
                Ok(snapshot) => {
                    self.store.set_error(Resource::OrderBook, false);
                    if self.store.publish_order_book(snapshot) {
                        debug!("order book replaced");
                    }
                }
                Err(e) => {
                    warn!("order book fetch failed: {e}");
                    self.store.set_error(Resource::OrderBook, true);
                }
            }
        };

        let trades = async {
            let result = self
                .gateway
                .recent_trades(self.certificate, self.trade_limit)
                .await;
            if !scope.is_live() {
                return;
            }
            match result {
                Ok(trades) => {
                    self.store.set_error(Resource::Trades, false);
                    self.store.publish_trades(trades);
                }
                Err(e) => {
                    warn!("trade tape fetch failed: {e}");
                    self.store.set_error(Resource::Trades, true);
                }
            }
        };

        let open_orders = async {
            let result = self.gateway.open_orders().await;
            if !scope.is_live() {
                return;
            }
            match result {
                Ok(orders) => {
                    self.store.set_error(Resource::OpenOrders, false);
                    self.store.publish_open_orders(orders);
                }
                Err(e) => {
                    warn!("open orders fetch failed: {e}");
                    self.store.set_error(Resource::OpenOrders, true);
                }
            }
        };

        let balances = async {
            let result = self.gateway.balances().await;
            if !scope.is_live() {
                return;
            }
            match result {
                Ok(balances) => {
                    self.store.set_error(Resource::Balances, false);
                    self.store.publish_balances(balances);
                }
                Err(e) => {
                    warn!("balances fetch failed: {e}");
                    self.store.set_error(Resource::Balances, true);
                }
            }
        };

        tokio::join!(order_book, trades, open_orders, balances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use certbook::{Balances, OrderBookSnapshot, Price, PriceLevel};
    use certbook_gateway::mock::MockGateway;

    fn book() -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: vec![PriceLevel::new(Price(100_00), 10, 1)],
            asks: vec![PriceLevel::new(Price(101_00), 5, 1)],
            last_price: None,
            captured_at: 1,
        }
    }

    fn sync(gateway: Arc<MockGateway>, store: Arc<MarketStore>) -> MarketDataSync<MockGateway> {
        MarketDataSync::new(
            gateway,
            store,
            CertificateType::Eua,
            Duration::from_secs(5),
            50,
        )
        .0
    }

    #[tokio::test]
    async fn tick_fetches_all_four_resources() {
        let gateway = Arc::new(
            MockGateway::builder()
                .with_order_book(book())
                .with_balances(Balances {
                    eur: Price(5_000_00),
                    eua: 10,
                    cer: 0,
                })
                .build(),
        );
        let store = Arc::new(MarketStore::new());
        let scope = Scope::new();

        sync(gateway.clone(), store.clone())
            .tick(&scope.handle())
            .await;

        assert_eq!(gateway.call_count("order_book"), 1);
        assert_eq!(gateway.call_count("recent_trades"), 1);
        assert_eq!(gateway.call_count("open_orders"), 1);
        assert_eq!(gateway.call_count("balances"), 1);
        assert_eq!(store.order_book().best_bid(), Some(Price(100_00)));
        assert_eq!(store.balances().eur, Price(5_000_00));
        assert!(!store.errors().any());
    }

    #[tokio::test]
    async fn one_failing_resource_does_not_block_the_others() {
        let gateway = Arc::new(MockGateway::builder().with_order_book(book()).build());
        gateway.fail_balances("backend down");
        let store = Arc::new(MarketStore::new());
        let scope = Scope::new();

        sync(gateway, store.clone()).tick(&scope.handle()).await;

        // Balances failed but the book still applied
        assert!(store.errors().balances);
        assert!(!store.errors().order_book);
        assert_eq!(store.order_book().best_bid(), Some(Price(100_00)));
    }

    #[tokio::test]
    async fn failure_retains_last_good_value() {
        let gateway = Arc::new(MockGateway::builder().with_order_book(book()).build());
        let store = Arc::new(MarketStore::new());
        let scope = Scope::new();
        let task = sync(gateway.clone(), store.clone());

        task.tick(&scope.handle()).await;
        assert_eq!(store.order_book().best_bid(), Some(Price(100_00)));

        gateway.fail_order_book("timeout");
        task.tick(&scope.handle()).await;

        assert!(store.errors().order_book);
        assert_eq!(store.order_book().best_bid(), Some(Price(100_00)));

        // Recovery clears the flag
        gateway.set_order_book(book());
        task.tick(&scope.handle()).await;
        assert!(!store.errors().order_book);
    }

    #[tokio::test]
    async fn cancelled_scope_drops_results_silently() {
        let gateway = Arc::new(MockGateway::builder().with_order_book(book()).build());
        let store = Arc::new(MarketStore::new());
        let scope = Scope::new();
        let handle = scope.handle();
        scope.cancel();

        sync(gateway, store.clone()).tick(&handle).await;

        // Fetches resolved after teardown: nothing written
        assert!(store.order_book().is_empty());
        assert!(!store.errors().any());
    }
}
