//! Reconciles the local fill estimate with the backend order preview.
//!
//! The local estimate is synchronous and renders immediately; the
//! backend preview resolves later and is the sole gate for enabling
//! submission. Preview fetches are tagged with a generation so a
//! response from a superseded request is dropped instead of
//! overwriting a newer one.

use certbook::{
    CertificateType, FillEstimate, OrderKind, OrderPreview, PreviewRequest, Price, PriceLevel,
    Side, estimate_market_buy,
};
use certbook_gateway::GatewayError;

/// A preview fetch the caller must perform, tagged with the generation
/// that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewFetch {
    pub generation: u64,
    pub request: PreviewRequest,
}

/// Merged view of a market-buy ticket before submission.
pub struct PreviewReconciler {
    certificate: CertificateType,
    budget: Price,
    generation: u64,
    estimate: Option<FillEstimate>,
    preview: Option<OrderPreview>,
    error: Option<String>,
}

impl PreviewReconciler {
    pub fn new(certificate: CertificateType) -> Self {
        Self {
            certificate,
            budget: Price::ZERO,
            generation: 0,
            estimate: None,
            preview: None,
            error: None,
        }
    }

    /// The instantaneous local estimate, shown before any round trip.
    pub fn local_estimate(&self) -> Option<&FillEstimate> {
        self.estimate.as_ref()
    }

    /// The backend preview, once resolved and still current.
    pub fn preview(&self) -> Option<&OrderPreview> {
        self.preview.as_ref()
    }

    /// The inline preview error, if the latest fetch failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switch certificate class. Clears everything derived and returns
    /// the fetch for the new selection, if one is warranted.
    pub fn set_certificate(
        &mut self,
        certificate: CertificateType,
        asks: &[PriceLevel],
    ) -> Option<PreviewFetch> {
        self.certificate = certificate;
        self.update_budget(self.budget, asks)
    }

    /// Re-trigger the preview for the unchanged budget after the
    /// available balance moved (the backend recomputes eligibility and
    /// remaining balance against it).
    pub fn balance_changed(&mut self, asks: &[PriceLevel]) -> Option<PreviewFetch> {
        self.update_budget(self.budget, asks)
    }

    /// Apply a budget change (or a fresh book for the same budget).
    ///
    /// Recomputes the local estimate synchronously. Any in-flight fetch
    /// is superseded and any resolved preview or error is discarded.
    /// Returns the fetch to perform, or `None` when the budget is
    /// non-positive, in which case no fetch is warranted at all.
    pub fn update_budget(&mut self, budget: Price, asks: &[PriceLevel]) -> Option<PreviewFetch> {
        self.budget = budget;
        self.estimate = estimate_market_buy(asks, budget);
        self.generation += 1;
        // A preview resolved for the previous inputs must not gate the
        // new ones; the gate stays closed until this fetch resolves.
        self.preview = None;
        self.error = None;

        if budget.0 <= 0 {
            return None;
        }

        Some(PreviewFetch {
            generation: self.generation,
            request: PreviewRequest {
                certificate: self.certificate,
                side: Side::Buy,
                amount_eur: budget,
                kind: OrderKind::Market,
            },
        })
    }

    /// Apply a resolved fetch. Responses whose generation does not match
    /// the latest fetch are dropped. Failure clears the preview and
    /// surfaces an inline error: the gate stays closed.
    pub fn apply_response(&mut self, generation: u64, result: Result<OrderPreview, GatewayError>) {
        if generation != self.generation {
            return;
        }
        match result {
            Ok(preview) => {
                self.preview = Some(preview);
                self.error = None;
            }
            Err(e) => {
                self.preview = None;
                self.error = Some(e.to_string());
            }
        }
    }

    /// Discard the resolved preview (after an execution, before balances
    /// refresh).
    pub fn clear_preview(&mut self) {
        self.generation += 1;
        self.preview = None;
        self.error = None;
    }

    /// Whether submission is permitted: the backend has said
    /// `can_execute`, there is balance to spend, and nothing is already
    /// in flight. Every failure path answers false.
    pub fn can_submit(&self, available_balance: Price, submission_in_flight: bool) -> bool {
        self.preview.as_ref().is_some_and(|p| p.can_execute)
            && available_balance.0 > 0
            && !submission_in_flight
    }

    /// Why submission is blocked, for inline display.
    pub fn block_reason(&self, available_balance: Price) -> String {
        if let Some(error) = &self.error {
            return format!("preview failed: {error}");
        }
        match &self.preview {
            None => "waiting for backend preview".into(),
            Some(preview) if !preview.can_execute => preview
                .execution_message
                .clone()
                .unwrap_or_else(|| "backend declined the order".into()),
            Some(_) if available_balance.0 <= 0 => "no available balance".into(),
            Some(_) => "a submission is already in flight".into(),
        }
    }
}
