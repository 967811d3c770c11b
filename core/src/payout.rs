// deckvault/src/payout.rs

//! Splitting a sale price between the guild and a deck's contributors.
//!
//! Amounts are whole currency units. The guild takes `guild_cut_percent` of the price (rounded
//! down); the rest is divided into equal shares, one per contributed card. Whatever does not
//! divide evenly stays with the guild, so the split always adds up to the sale price.

use crate::error::{DeckError, DeckResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_GUILD_CUT_PERCENT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutPolicy {
  guild_cut_percent: u8,
}

impl Default for PayoutPolicy {
  fn default() -> Self {
    Self {
      guild_cut_percent: DEFAULT_GUILD_CUT_PERCENT,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSplit {
  pub sale_price: i64,
  pub guild_cut: i64,
  pub shares: usize,
  pub payouts: BTreeMap<String, i64>,
}

impl PayoutPolicy {
  pub fn new(guild_cut_percent: u8) -> DeckResult<Self> {
    if guild_cut_percent > 100 {
      return Err(DeckError::InvalidPolicy(format!(
        "guild cut must be between 0 and 100 percent (got {guild_cut_percent})"
      )));
    }
    Ok(Self { guild_cut_percent })
  }

  pub fn guild_cut_percent(&self) -> u8 {
    self.guild_cut_percent
  }

  /// `contributors` may repeat a name once per card that user contributed.
  pub fn split<S: AsRef<str>>(&self, sale_price: i64, contributors: &[S]) -> DeckResult<PayoutSplit> {
    if sale_price <= 0 {
      return Err(DeckError::InvalidSalePrice(sale_price));
    }

    // i128 keeps price * percent from overflowing for any i64 price.
    let base_cut = (sale_price as i128 * self.guild_cut_percent as i128 / 100) as i64;
    let distributable = sale_price - base_cut;
    let shares = contributors.len();

    if shares == 0 {
      return Ok(PayoutSplit {
        sale_price,
        guild_cut: sale_price,
        shares,
        payouts: BTreeMap::new(),
      });
    }

    let share = distributable / shares as i64;
    let mut payouts: BTreeMap<String, i64> = BTreeMap::new();
    for contributor in contributors {
      *payouts.entry(contributor.as_ref().to_string()).or_insert(0) += share;
    }
    let guild_cut = sale_price - share * shares as i64;

    debug!(sale_price, guild_cut, shares, share, "Payout split computed.");
    Ok(PayoutSplit {
      sale_price,
      guild_cut,
      shares,
      payouts,
    })
  }
}
