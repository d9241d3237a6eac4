//! Single-flight market-order submission.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use log::{info, warn};
use tokio::time::Instant;

use certbook::{ExecutionResult, MarketOrderRequest};
use certbook_gateway::Gateway;

use crate::error::{Error, Result};
use crate::market_sync::RefreshHandle;

/// Submits market orders, one at a time.
///
/// A second `submit` while one is pending is rejected outright — no
/// queuing. A successful fill triggers an immediate market-data refresh
/// so balances and orders reflect it, and raises a success flag that
/// stays visible for a fixed duration. A failed submission propagates
/// to the caller with no state mutated, so the confirmation surface can
/// display the error inline and retry with the same details.
pub struct ExecutionCoordinator<G> {
    gateway: Arc<G>,
    refresh: RefreshHandle,
    in_flight: AtomicBool,
    success_at: Mutex<Option<Instant>>,
    success_flash: Duration,
}

impl<G: Gateway> ExecutionCoordinator<G> {
    pub fn new(gateway: Arc<G>, refresh: RefreshHandle, success_flash: Duration) -> Self {
        Self {
            gateway,
            refresh,
            in_flight: AtomicBool::new(false),
            success_at: Mutex::new(None),
            success_flash,
        }
    }

    /// True while a submission is pending. The preview gate consults
    /// this to disable the trigger.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// True within the flash window after a successful fill.
    pub fn success_visible(&self) -> bool {
        self.success_at
            .lock()
            .unwrap()
            .is_some_and(|at| at.elapsed() < self.success_flash)
    }

    /// Submit a market order.
    pub async fn submit(&self, request: &MarketOrderRequest) -> Result<ExecutionResult> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::SubmissionInFlight);
        }

        let result = self.gateway.execute_market_order(request).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(result) => {
                info!(
                    "market order filled: {} {} {} for {} ({} units)",
                    request.side,
                    request.certificate,
                    request.amount_eur,
                    result.total_cost_net,
                    result.filled_quantity,
                );
                *self.success_at.lock().unwrap() = Some(Instant::now());
                self.refresh.refresh_now();
                Ok(result)
            }
            Err(e) => {
                warn!("market order failed: {e}");
                Err(e.into())
            }
        }
    }
}
