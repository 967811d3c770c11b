// deckvault/src/disposition.rs

use crate::error::{DeckError, DeckResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happened to a finalized deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
  Sold,
  Fulfilled,
  Unallocated,
}

impl Disposition {
  pub fn as_str(&self) -> &'static str {
    match self {
      Disposition::Sold => "sold",
      Disposition::Fulfilled => "fulfilled",
      Disposition::Unallocated => "unallocated",
    }
  }
}

impl fmt::Display for Disposition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Disposition {
  type Err = DeckError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "sold" => Ok(Disposition::Sold),
      "fulfilled" => Ok(Disposition::Fulfilled),
      "unallocated" | "" => Ok(Disposition::Unallocated),
      other => Err(DeckError::InvalidDisposition(other.to_string())),
    }
  }
}

/// The mutable part of a finalized deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispositionUpdate {
  pub disposition: Disposition,
  #[serde(default)]
  pub sale_price: Option<i64>,
  #[serde(default)]
  pub recipient: Option<String>,
}

impl DispositionUpdate {
  pub fn unallocated() -> Self {
    Self {
      disposition: Disposition::Unallocated,
      sale_price: None,
      recipient: None,
    }
  }

  pub fn validate(&self) -> DeckResult<()> {
    match self.disposition {
      Disposition::Sold => match self.sale_price {
        None => Err(DeckError::MissingSalePrice),
        Some(price) if price <= 0 => Err(DeckError::InvalidSalePrice(price)),
        Some(_) => Ok(()),
      },
      Disposition::Fulfilled => match self.recipient.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => Ok(()),
        _ => Err(DeckError::MissingRecipient),
      },
      Disposition::Unallocated => Ok(()),
    }
  }

  /// Validates, then drops the fields that do not apply to the disposition.
  pub fn normalized(self) -> DeckResult<Self> {
    self.validate()?;
    Ok(match self.disposition {
      Disposition::Sold => Self {
        recipient: self.recipient.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        ..self
      },
      Disposition::Fulfilled => Self {
        sale_price: None,
        recipient: self.recipient.map(|r| r.trim().to_string()),
        ..self
      },
      Disposition::Unallocated => Self::unallocated(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sold_requires_positive_price() {
    let mut update = DispositionUpdate {
      disposition: Disposition::Sold,
      sale_price: None,
      recipient: None,
    };
    assert!(matches!(update.validate(), Err(DeckError::MissingSalePrice)));
    update.sale_price = Some(0);
    assert!(matches!(update.validate(), Err(DeckError::InvalidSalePrice(0))));
    update.sale_price = Some(1200);
    assert!(update.validate().is_ok());
  }

  #[test]
  fn fulfilled_drops_sale_price() {
    let update = DispositionUpdate {
      disposition: Disposition::Fulfilled,
      sale_price: Some(50),
      recipient: Some("  mira ".to_string()),
    }
    .normalized()
    .unwrap();
    assert_eq!(update.sale_price, None);
    assert_eq!(update.recipient.as_deref(), Some("mira"));
  }

  #[test]
  fn parses_case_insensitively() {
    assert_eq!("SOLD".parse::<Disposition>().unwrap(), Disposition::Sold);
    assert!("traded".parse::<Disposition>().is_err());
  }
}
