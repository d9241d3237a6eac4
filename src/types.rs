//! Core types: Price, Quantity, TimestampMs, OrderId, CertificateType

use std::fmt;
use std::str::FromStr;

/// Price or monetary amount in euro cents.
///
/// `Price(10050)` represents €100.50. Using fixed-point avoids
/// floating-point errors in money math; decimal major-unit values from
/// the backend are converted at the gateway boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Value in euros as a float, for display math only.
    #[inline]
    pub fn as_eur(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let euros = self.0 / 100;
        let cents = (self.0 % 100).abs();
        if self.0 < 0 {
            write!(f, "-€{}.{:02}", euros.abs(), cents)
        } else {
            write!(f, "€{}.{:02}", euros, cents)
        }
    }
}

/// Quantity of certificate units. Always whole units.
pub type Quantity = u64;

/// Milliseconds since the Unix epoch, as reported by the backend.
pub type TimestampMs = i64;

/// Unique order identifier assigned by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

/// Certificate class traded on the venue.
///
/// EUA = EU Allowance, CER = Certified Emission Reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CertificateType {
    Eua,
    Cer,
}

impl CertificateType {
    /// Lowercase wire identifier used in API paths.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            CertificateType::Eua => "eua",
            CertificateType::Cer => "cer",
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateType::Eua => write!(f, "EUA"),
            CertificateType::Cer => write!(f, "CER"),
        }
    }
}

/// Error returned when parsing an unknown certificate identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownCertificate(pub String);

impl fmt::Display for UnknownCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown certificate type: {}", self.0)
    }
}

impl std::error::Error for UnknownCertificate {}

impl FromStr for CertificateType {
    type Err = UnknownCertificate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eua" => Ok(CertificateType::Eua),
            "cer" => Ok(CertificateType::Cer),
            other => Err(UnknownCertificate(other.to_string())),
        }
    }
}
