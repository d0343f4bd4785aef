use std::fmt;

use chrono::{DateTime, Utc};
use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Which price source produced a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Lowest active buy-it-now listing.
    Auction,
    /// Sell-to-bazaar order book quote.
    Bazaar,
    /// Fixed vendor payout from the catalog.
    Npc,
}

impl PriceSource {
    /// Every source, in chain priority order.
    pub const ALL: [PriceSource; 3] = [PriceSource::Auction, PriceSource::Bazaar, PriceSource::Npc];

    /// Stable identifier used for logging, circuit breaking and rate limiting.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Auction => "AUCTION",
            Self::Bazaar => "BAZAAR",
            Self::Npc => "NPC",
        }
    }

    /// Chain position; lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Auction => 0,
            Self::Bazaar => 1,
            Self::Npc => 2,
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auction => write!(f, "auction"),
            Self::Bazaar => write!(f, "bazaar"),
            Self::Npc => write!(f, "npc"),
        }
    }
}

/// Round a price to the nearest tenth, halves away from zero.
pub fn round_to_tenth(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an upstream float into a rounded, strictly positive price.
///
/// Returns `None` for NaN, infinities, and anything that rounds to zero or
/// below (so `0.04` is not a price).
pub fn price_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
        .map(round_to_tenth)
        .filter(|amount| *amount > Decimal::ZERO)
}

/// A price produced by one source before it is stamped into a record.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceCandidate {
    /// The amount a holder could realize, already rounded.
    pub amount: Decimal,
    /// Buy-from-bazaar quote, bazaar only.
    pub bazaar_buy_amount: Option<Decimal>,
}

impl PriceCandidate {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount: round_to_tenth(amount),
            bazaar_buy_amount: None,
        }
    }

    pub fn with_bazaar_buy(amount: Decimal, buy_amount: Option<Decimal>) -> Self {
        Self {
            amount: round_to_tenth(amount),
            bazaar_buy_amount: buy_amount.map(round_to_tenth),
        }
    }
}

/// Normalized price of one item, identical in shape whatever the source.
///
/// `amount` is the single figure used for valuation; for bazaar it is the
/// sell-to-bazaar price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub amount: Decimal,
    pub source: PriceSource,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bazaar_buy_amount: Option<Decimal>,
}

impl PriceRecord {
    /// Stamp a source candidate into a record.
    pub fn from_candidate(
        display_name: impl Into<String>,
        source: PriceSource,
        candidate: PriceCandidate,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let bazaar_buy_amount = match source {
            PriceSource::Bazaar => candidate.bazaar_buy_amount.map(round_to_tenth),
            PriceSource::Auction | PriceSource::Npc => None,
        };

        Self {
            amount: round_to_tenth(candidate.amount),
            source,
            captured_at,
            display_name: display_name.into(),
            bazaar_buy_amount,
        }
    }
}
