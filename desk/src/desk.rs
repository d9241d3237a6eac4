//! Desk orchestration: wires gateway, store, synchronizers, and the
//! execution coordinator together, and hosts the CLI command bodies.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use rustc_hash::FxHashMap;
use tokio::sync::watch;

use certbook::{
    Balances, CertificateType, ExecutionResult, MarketOrderRequest, MarketTrade,
    OrderBookSnapshot, Price, Side, depth, estimate_market_buy,
};
use certbook_gateway::{Gateway, PriceFeedSocket, RestGateway, WsPriceFeed};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::execute::ExecutionCoordinator;
use crate::feed::PriceFeedSync;
use crate::market_sync::MarketDataSync;
use crate::preview::PreviewReconciler;
use crate::scope::Scope;
use crate::store::MarketStore;

/// A running trading desk for one certificate class.
///
/// Spawns the market-data and price-feed tasks on construction; both
/// stop when the desk is shut down or dropped, because the scope owns
/// their liveness.
pub struct TradingDesk<G> {
    gateway: Arc<G>,
    store: Arc<MarketStore>,
    scope: Scope,
    coordinator: ExecutionCoordinator<G>,
    certificate: CertificateType,
    book_rx: watch::Receiver<OrderBookSnapshot>,
    balances_rx: watch::Receiver<Balances>,
}

impl<G: Gateway + 'static> TradingDesk<G> {
    /// Spawn the synchronization tasks and return the facade.
    pub fn spawn<S: PriceFeedSocket + 'static>(
        config: &Config,
        certificate: CertificateType,
        gateway: Arc<G>,
        socket: Arc<S>,
    ) -> Self {
        let store = Arc::new(MarketStore::new());
        let scope = Scope::new();

        // Subscribe before the first tick so readiness is never missed.
        let book_rx = store.subscribe_order_book();
        let balances_rx = store.subscribe_balances();

        let (sync, refresh) = MarketDataSync::new(
            gateway.clone(),
            store.clone(),
            certificate,
            config.data_poll_interval(),
            config.sync.trade_tape_limit,
        );
        tokio::spawn(sync.run(scope.handle()));

        let feed = PriceFeedSync::new(
            gateway.clone(),
            socket,
            store.clone(),
            config.price_poll_interval(),
            config.socket_settle_delay(),
        );
        tokio::spawn(feed.run(scope.handle()));

        let coordinator = ExecutionCoordinator::new(gateway.clone(), refresh, config.success_flash());

        Self {
            gateway,
            store,
            scope,
            coordinator,
            certificate,
            book_rx,
            balances_rx,
        }
    }

    pub fn store(&self) -> &Arc<MarketStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &ExecutionCoordinator<G> {
        &self.coordinator
    }

    /// Wait until the first order book and balances have arrived.
    pub async fn wait_ready(&mut self, timeout: Duration) -> bool {
        let wait = async {
            let _ = self.book_rx.changed().await;
            let _ = self.balances_rx.changed().await;
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Execute a gated market buy: local estimate, backend preview,
    /// submission. The preview is the sole gate; any failure along the
    /// way blocks execution.
    pub async fn buy(&self, amount_eur: Price) -> Result<ExecutionResult> {
        let request = MarketOrderRequest::new(self.certificate, Side::Buy, amount_eur)?;

        let book = self.store.order_book();
        let mut ticket = PreviewReconciler::new(self.certificate);
        if let Some(fetch) = ticket.update_budget(amount_eur, &book.asks) {
            let response = self.gateway.preview_order(&fetch.request).await;
            ticket.apply_response(fetch.generation, response);
        }

        let balances = self.store.balances();
        if !ticket.can_submit(balances.eur, self.coordinator.in_flight()) {
            return Err(Error::NotExecutable(ticket.block_reason(balances.eur)));
        }

        let result = self.coordinator.submit(&request).await?;
        // The preview is spent; balances refresh via the triggered sync.
        ticket.clear_preview();
        Ok(result)
    }

    /// Cancel the scope, stopping both synchronization tasks.
    pub fn shutdown(&self) {
        self.scope.cancel();
    }
}

fn rest_gateway(config: &Config) -> Result<Arc<RestGateway>> {
    Ok(Arc::new(RestGateway::new(
        &config.connection.base_url,
        config.request_timeout(),
    )?))
}

// === CLI command bodies ===

/// Check backend connectivity.
pub async fn check_status(config: &Config) -> Result<()> {
    print!("Connecting to {}... ", config.connection.base_url);
    let gateway = rest_gateway(config)?;

    let prices = gateway.current_prices().await?;
    println!("OK");

    let balances = gateway.balances().await?;
    println!("Reference prices: EUA {} / CER {}", prices.eua, prices.cer);
    println!("Available balance: {}", balances.eur);
    Ok(())
}

/// Show current account balances.
pub async fn show_balances(config: &Config) -> Result<()> {
    let gateway = rest_gateway(config)?;
    let balances = gateway.balances().await?;
    display_balances(&balances);
    Ok(())
}

/// Fetch the book once and show depth plus the local fill estimate.
pub async fn show_estimate(
    config: &Config,
    certificate: CertificateType,
    amount_eur: Price,
) -> Result<()> {
    let gateway = rest_gateway(config)?;
    let book = gateway.order_book(certificate).await?;

    display_depth(&book);

    match estimate_market_buy(&book.asks, amount_eur) {
        Some(estimate) => {
            println!("\nMarket buy of {amount_eur} ({certificate}):");
            println!("  filled     {:>10} units", estimate.filled_quantity);
            println!("  cost       {:>10}", estimate.total_cost);
            println!("  avg price  {:>10}", Price(estimate.average_price() as i64));
            println!("  levels     {:>10}", estimate.levels_touched);
        }
        None => {
            println!("\n{amount_eur} does not buy a single unit at the current ask depth.");
        }
    }
    Ok(())
}

/// Preview, confirm, and execute a market buy.
pub async fn run_buy(
    config: &Config,
    certificate: CertificateType,
    amount_eur: Price,
    force: bool,
) -> Result<()> {
    let gateway = rest_gateway(config)?;
    let socket = Arc::new(WsPriceFeed::new(&config.connection.ws_url));
    let mut desk = TradingDesk::spawn(config, certificate, gateway.clone(), socket);

    if !desk.wait_ready(config.request_timeout()).await {
        desk.shutdown();
        return Err(Error::Aborted("market data did not arrive in time".into()));
    }

    // Show the ticket: local estimate first, backend economics after.
    let book = desk.store().order_book();
    match estimate_market_buy(&book.asks, amount_eur) {
        Some(estimate) => println!(
            "Local estimate: {} units for {} (avg {}, {} level(s))",
            estimate.filled_quantity,
            estimate.total_cost,
            Price(estimate.average_price() as i64),
            estimate.levels_touched,
        ),
        None => {
            desk.shutdown();
            return Err(Error::NotExecutable(
                "budget does not cover one unit at the best ask".into(),
            ));
        }
    }

    let mut ticket = PreviewReconciler::new(certificate);
    if let Some(fetch) = ticket.update_budget(amount_eur, &book.asks) {
        let response = gateway.preview_order(&fetch.request).await;
        ticket.apply_response(fetch.generation, response);
    }
    let balances = desk.store().balances();
    match ticket.preview() {
        Some(preview) if preview.can_execute => {
            println!(
                "Backend preview: total {} (fee {} at {:.2}%), balance after {}",
                preview.total_cost_net,
                preview.platform_fee,
                preview.platform_fee_rate * 100.0,
                preview.remaining_balance,
            );
        }
        _ => {
            let reason = ticket.block_reason(balances.eur);
            desk.shutdown();
            return Err(Error::NotExecutable(reason));
        }
    }

    if !force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Buy {certificate} for {amount_eur}?"))
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;
        if !confirmed {
            desk.shutdown();
            println!("Aborted.");
            return Ok(());
        }
    }

    let result = desk.buy(amount_eur).await?;
    println!(
        "FILLED {} units at {} avg, total {} (fee {}), order {}",
        result.filled_quantity,
        Price(result.weighted_avg_price as i64),
        result.total_cost_net,
        result.platform_fee,
        result.order_id,
    );

    // The post-trade refresh is already in flight; show settled balances.
    let mut balances_rx = desk.store().subscribe_balances();
    if tokio::time::timeout(config.request_timeout(), balances_rx.changed())
        .await
        .is_ok()
    {
        display_balances(&desk.store().balances());
    }

    desk.shutdown();
    Ok(())
}

/// Live view: print every store update until interrupted.
pub async fn watch(config: &Config, certificate: CertificateType) -> Result<()> {
    let gateway = rest_gateway(config)?;
    let socket = Arc::new(WsPriceFeed::new(&config.connection.ws_url));
    let desk = TradingDesk::spawn(config, certificate, gateway, socket);

    info!("watching {certificate}; ctrl-c to stop");

    let store = desk.store();
    let mut book_rx = store.subscribe_order_book();
    let mut trades_rx = store.subscribe_trades();
    let mut orders_rx = store.subscribe_open_orders();
    let mut balances_rx = store.subscribe_balances();
    let mut prices_rx = store.subscribe_prices();
    let mut errors_rx = store.subscribe_errors();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Ok(()) = book_rx.changed() => {
                let book = book_rx.borrow_and_update().clone();
                display_book_summary(&book);
            }
            Ok(()) = trades_rx.changed() => {
                let trades = trades_rx.borrow_and_update().clone();
                display_trades(&trades, &store.order_book());
            }
            Ok(()) = orders_rx.changed() => {
                let orders = orders_rx.borrow_and_update().clone();
                display_open_orders(&orders);
            }
            Ok(()) = balances_rx.changed() => {
                let balances = *balances_rx.borrow_and_update();
                display_balances(&balances);
            }
            Ok(()) = prices_rx.changed() => {
                let prices = *prices_rx.borrow_and_update();
                println!(
                    "[{}] prices  EUA {}  CER {}",
                    format_time(prices.updated_at),
                    prices.eua,
                    prices.cer,
                );
            }
            Ok(()) = errors_rx.changed() => {
                let errors = *errors_rx.borrow_and_update();
                if errors.any() {
                    println!("sync degraded: {errors:?}");
                }
            }
        }
    }

    desk.shutdown();
    println!("\nStopped.");
    Ok(())
}

// === Display helpers ===

fn format_time(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".into())
}

fn depth_bar(cumulative: u64, total: u64) -> String {
    const WIDTH: usize = 20;
    let filled = if total == 0 {
        0
    } else {
        (cumulative as usize * WIDTH).div_ceil(total as usize)
    };
    "#".repeat(filled.min(WIDTH))
}

fn display_depth(book: &OrderBookSnapshot) {
    let asks = book.cumulative_asks();
    let bids = book.cumulative_bids();
    let ask_total = depth::total_depth(&asks);
    let bid_total = depth::total_depth(&bids);

    println!("ASKS (captured {}):", format_time(book.captured_at));
    for level in asks.iter().rev() {
        println!(
            "  {:>10} {:>8} {:>8}  {}",
            format!("{}", level.price),
            level.quantity,
            level.cumulative_quantity,
            depth_bar(level.cumulative_quantity, ask_total),
        );
    }
    match book.spread() {
        Some(spread) => println!("  --- spread {} ---", Price(spread)),
        None => println!("  --- one-sided book ---"),
    }
    println!("BIDS:");
    for level in &bids {
        println!(
            "  {:>10} {:>8} {:>8}  {}",
            format!("{}", level.price),
            level.quantity,
            level.cumulative_quantity,
            depth_bar(level.cumulative_quantity, bid_total),
        );
    }
}

fn display_book_summary(book: &OrderBookSnapshot) {
    let bid = book
        .best_bid()
        .map_or_else(|| "-".into(), |p| format!("{p}"));
    let ask = book
        .best_ask()
        .map_or_else(|| "-".into(), |p| format!("{p}"));
    let spread = book
        .spread()
        .map_or_else(|| "-".into(), |s| format!("{}", Price(s)));
    println!(
        "[{}] book  bid {} / ask {} (spread {}), depth {}x{}",
        format_time(book.captured_at),
        bid,
        ask,
        spread,
        book.total_bid_quantity(),
        book.total_ask_quantity(),
    );
}

fn display_trades(trades: &[MarketTrade], book: &OrderBookSnapshot) {
    for trade in trades.iter().take(5) {
        let side = trade
            .infer_aggressor_side(book)
            .map_or("?", |side| match side {
                Side::Buy => "B",
                Side::Sell => "S",
            });
        println!(
            "[{}] trade {side} {}",
            format_time(trade.executed_at),
            trade,
        );
    }
}

fn display_open_orders(orders: &[certbook::OpenOrder]) {
    let working: Vec<_> = orders.iter().filter(|o| o.status.is_active()).collect();
    if working.is_empty() {
        println!("open orders: none");
        return;
    }
    // Remaining quantity per certificate class
    let mut remaining: FxHashMap<CertificateType, u64> = FxHashMap::default();
    for order in &working {
        *remaining.entry(order.certificate).or_default() += order.remaining;
    }
    let summary: Vec<String> = remaining
        .iter()
        .map(|(certificate, quantity)| format!("{certificate} {quantity}"))
        .collect();
    println!("open orders: {} working ({})", working.len(), summary.join(", "));
}

fn display_balances(balances: &Balances) {
    println!(
        "balances  EUR {}  EUA {}  CER {}",
        balances.eur, balances.eua, balances.cer,
    );
}
