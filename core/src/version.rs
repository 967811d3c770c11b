// deckvault/src/version.rs

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A release version of the form `v?MAJOR[.MINOR[.PATCH]][-suffix]`. The suffix is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
}

impl FromStr for Version {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    let trimmed = trimmed
      .strip_prefix('v')
      .or_else(|| trimmed.strip_prefix('V'))
      .unwrap_or(trimmed);
    let core = trimmed.split(|c: char| c == '-' || c == '+').next().unwrap_or_default();
    if core.is_empty() {
      return Err(format!("empty version string '{s}'"));
    }

    let mut parts = [0u64; 3];
    for (i, piece) in core.split('.').enumerate() {
      if i >= parts.len() {
        return Err(format!("too many components in version '{s}'"));
      }
      parts[i] = piece
        .parse()
        .map_err(|_| format!("invalid component '{piece}' in version '{s}'"))?;
    }
    Ok(Version {
      major: parts[0],
      minor: parts[1],
      patch: parts[2],
    })
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
  }
}

/// True when `candidate` parses and is strictly greater than `current`.
pub fn is_newer(current: &str, candidate: &str) -> bool {
  match (current.parse::<Version>(), candidate.parse::<Version>()) {
    (Ok(cur), Ok(cand)) => cand > cur,
    (Err(_), Ok(_)) => true,
    _ => false,
  }
}
