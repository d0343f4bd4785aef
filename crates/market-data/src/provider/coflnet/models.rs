//! Coflnet API response models.
//!
//! Only the fields the price sources read are modelled; everything else in
//! the payloads is ignored.

use serde::Deserialize;

use crate::provider::auction::AuctionListing;
use crate::provider::bazaar::BazaarQuote;

/// Entry of `/api/auctions/tag/{tag}/active/bin`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoflnetAuction {
    pub item_name: Option<String>,
    pub starting_bid: Option<f64>,
    // The endpoint only lists BIN auctions; the flag is usually present anyway
    pub bin: Option<bool>,
}

impl From<CoflnetAuction> for AuctionListing {
    fn from(raw: CoflnetAuction) -> Self {
        AuctionListing {
            item_name: raw.item_name.unwrap_or_default(),
            is_bin: raw.bin.unwrap_or(true),
            starting_bid: raw.starting_bid.unwrap_or(0.0),
        }
    }
}

/// Body of `/api/bazaar/{tag}/snapshot`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoflnetBazaarSnapshot {
    pub product_id: Option<String>,
    pub sell_price: Option<f64>,
    pub buy_price: Option<f64>,
}

impl CoflnetBazaarSnapshot {
    /// `None` when the payload names no product.
    pub fn into_quote(self) -> Option<BazaarQuote> {
        let product_id = self.product_id.filter(|id| !id.is_empty())?;
        Some(BazaarQuote {
            product_id,
            sell_price: self.sell_price.unwrap_or(0.0),
            buy_price: self.buy_price.unwrap_or(0.0),
        })
    }
}
