// Allow our euro.cents digit grouping convention (e.g., 100_00 = €100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Lifecycle tests for the price-feed synchronizer: the polling loop is
//! the durable transport, and at most one socket attempt ever happens.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use certbook::{Price, ReferencePrices};
use certbook_desk::feed::{advance as machine_advance, Command, Event, PriceFeedSync, State};
use certbook_desk::scope::Scope;
use certbook_desk::store::MarketStore;
use certbook_gateway::FeedEvent;
use certbook_gateway::mock::{MockGateway, ScriptedPriceFeed};

const POLL: Duration = Duration::from_secs(30);
const SETTLE_DELAY: Duration = Duration::from_secs(2);

fn prices(eua: i64) -> ReferencePrices {
    ReferencePrices {
        eua: Price(eua),
        cer: Price(1_15),
        updated_at: 1_700_000_000_000,
    }
}

fn spawn_feed(
    gateway: Arc<MockGateway>,
    socket: Arc<ScriptedPriceFeed>,
    store: Arc<MarketStore>,
    scope: &Scope,
) {
    let feed = PriceFeedSync::new(gateway, socket, store, POLL, SETTLE_DELAY);
    tokio::spawn(feed.run(scope.handle()));
}

/// Let spawned tasks run without advancing the clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    settle().await;
}

// ============================================================================
// Driver lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn initial_fetch_publishes_then_socket_attaches_after_settle() {
    let gateway = Arc::new(MockGateway::builder().with_prices(prices(82_40)).build());
    let socket = Arc::new(ScriptedPriceFeed::new(vec![FeedEvent::Prices(prices(82_55))]));
    let store = Arc::new(MarketStore::new());
    let scope = Scope::new();
    spawn_feed(gateway, socket.clone(), store.clone(), &scope);

    settle().await;
    assert_eq!(store.prices().eua, Price(82_40));
    assert_eq!(socket.connect_count(), 0, "attempt waits out the settle delay");

    advance(SETTLE_DELAY).await;
    assert_eq!(socket.connect_count(), 1);
    // The socket message reached the store
    assert_eq!(store.prices().eua, Price(82_55));
}

#[tokio::test(start_paused = true)]
async fn exactly_one_attempt_despite_errors_and_closes() {
    let gateway = Arc::new(MockGateway::builder().with_prices(prices(82_40)).build());
    let socket = Arc::new(ScriptedPriceFeed::new(vec![
        FeedEvent::Prices(prices(82_55)),
        FeedEvent::Error("reset by peer".into()),
    ]));
    let store = Arc::new(MarketStore::new());
    let scope = Scope::new();
    spawn_feed(gateway.clone(), socket.clone(), store.clone(), &scope);

    settle().await;
    advance(SETTLE_DELAY).await;
    assert_eq!(socket.connect_count(), 1);

    // Hours of polling later: still exactly one attempt, polling alive
    for _ in 0..6 {
        advance(POLL).await;
    }
    assert_eq!(socket.connect_count(), 1);
    assert!(gateway.call_count("current_prices") >= 7);
}

#[tokio::test(start_paused = true)]
async fn failed_connect_leaves_polling_only() {
    let gateway = Arc::new(MockGateway::builder().with_prices(prices(82_40)).build());
    let socket = Arc::new(ScriptedPriceFeed::failing("connection refused"));
    let store = Arc::new(MarketStore::new());
    let scope = Scope::new();
    spawn_feed(gateway.clone(), socket.clone(), store.clone(), &scope);

    settle().await;
    advance(SETTLE_DELAY).await;
    assert_eq!(socket.connect_count(), 1);

    advance(POLL).await;
    advance(POLL).await;
    assert_eq!(socket.connect_count(), 1);
    assert_eq!(store.prices().eua, Price(82_40));
}

#[tokio::test(start_paused = true)]
async fn initial_failure_means_no_socket_ever() {
    let gateway = Arc::new(MockGateway::builder().build());
    gateway.fail_prices("503");
    let socket = Arc::new(ScriptedPriceFeed::new(vec![]));
    let store = Arc::new(MarketStore::new());
    let scope = Scope::new();
    spawn_feed(gateway.clone(), socket.clone(), store.clone(), &scope);

    settle().await;
    assert!(store.errors().prices);

    // Polling keeps running and recovers; the socket is never attempted
    gateway.set_prices(prices(82_40));
    advance(SETTLE_DELAY).await;
    advance(POLL).await;
    assert_eq!(socket.connect_count(), 0);
    assert!(!store.errors().prices);
    assert_eq!(store.prices().eua, Price(82_40));
}

#[tokio::test(start_paused = true)]
async fn polling_failures_keep_last_good_price() {
    let gateway = Arc::new(MockGateway::builder().with_prices(prices(82_40)).build());
    let socket = Arc::new(ScriptedPriceFeed::new(vec![]));
    let store = Arc::new(MarketStore::new());
    let scope = Scope::new();
    spawn_feed(gateway.clone(), socket, store.clone(), &scope);

    settle().await;
    advance(SETTLE_DELAY).await;

    gateway.fail_prices("timeout");
    advance(POLL).await;
    assert!(store.errors().prices);
    assert_eq!(store.prices().eua, Price(82_40));
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_polling_and_pending_attempt() {
    let gateway = Arc::new(MockGateway::builder().with_prices(prices(82_40)).build());
    let socket = Arc::new(ScriptedPriceFeed::new(vec![]));
    let store = Arc::new(MarketStore::new());
    let scope = Scope::new();
    spawn_feed(gateway.clone(), socket.clone(), store, &scope);

    settle().await;
    // Cancel while the settle delay is still pending
    scope.cancel();
    settle().await;

    let polls = gateway.call_count("current_prices");
    advance(SETTLE_DELAY).await;
    advance(POLL).await;
    advance(POLL).await;

    assert_eq!(socket.connect_count(), 0, "scheduled attempt cancelled");
    assert_eq!(gateway.call_count("current_prices"), polls);
}

// ============================================================================
// Machine property: at most one connect, whatever happens
// ============================================================================

fn event_strategy() -> impl Strategy<Value = Event> {
    prop::sample::select(vec![
        Event::Activated,
        Event::InitialFetchSucceeded,
        Event::InitialFetchFailed,
        Event::SettleElapsed,
        Event::SocketOpened,
        Event::SocketError,
        Event::SocketClosed,
        Event::Teardown,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// No event stream, however adversarial, produces two connects.
    #[test]
    fn at_most_one_connect_per_lifetime(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut state = State::Idle;
        let mut connects = 0;
        for event in events {
            let (next, commands) = machine_advance(state, event);
            state = next;
            connects += commands.iter().filter(|&&c| c == Command::ConnectSocket).count();
        }
        prop_assert!(connects <= 1);
    }

    /// Teardown is terminal: nothing after it emits a command.
    #[test]
    fn stopped_absorbs_everything(events in prop::collection::vec(event_strategy(), 0..40)) {
        let mut state = State::Stopped;
        for event in events {
            let (next, commands) = machine_advance(state, event);
            prop_assert_eq!(next, State::Stopped);
            prop_assert!(commands.is_empty());
            state = next;
        }
    }
}
