//! Reference prices for the traded certificate classes.

use crate::{CertificateType, Price, TimestampMs};

/// A whole-snapshot reference price message.
///
/// Both the price-feed socket and its polling fallback deliver this
/// shape; consumers cannot tell which transport produced an update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferencePrices {
    /// EU Allowance reference price in cents
    pub eua: Price,
    /// Certified Emission Reduction reference price in cents
    pub cer: Price,
    /// When the backend produced the snapshot
    pub updated_at: TimestampMs,
}

impl ReferencePrices {
    /// Reference price for one certificate class.
    #[inline]
    pub fn price(&self, certificate: CertificateType) -> Price {
        match certificate {
            CertificateType::Eua => self.eua,
            CertificateType::Cer => self.cer,
        }
    }
}
