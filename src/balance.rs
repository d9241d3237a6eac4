//! Account balances.

use crate::{CertificateType, Price, Quantity};

/// EUR cash plus certificate holdings.
///
/// Eventually consistent: refreshed from the backend after every
/// execution rather than mutated optimistically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Balances {
    /// Available EUR cash in cents
    pub eur: Price,
    /// EU Allowance units held
    pub eua: Quantity,
    /// Certified Emission Reduction units held
    pub cer: Quantity,
}

impl Balances {
    /// Holdings for one certificate class.
    #[inline]
    pub fn certificate(&self, certificate: CertificateType) -> Quantity {
        match certificate {
            CertificateType::Eua => self.eua,
            CertificateType::Cer => self.cer,
        }
    }
}
