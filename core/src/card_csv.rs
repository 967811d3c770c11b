// deckvault/src/card_csv.rs

//! CSV form of the card table, used by export and import.
//!
//! The header is `name,owner,deck`. On import the columns may come in any order and the header
//! is matched case-insensitively. Quoting follows RFC 4180.

use crate::error::{DeckError, DeckResult};
use serde::{Deserialize, Serialize};

const COLUMNS: [&str; 3] = ["name", "owner", "deck"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
  pub name: String,
  pub owner: String,
  pub deck: String,
}

pub fn write_cards(records: &[CardRecord]) -> String {
  let mut out = String::with_capacity(16 + records.len() * 48);
  out.push_str(&COLUMNS.join(","));
  out.push_str("\r\n");
  for r in records {
    push_field(&mut out, &r.name);
    out.push(',');
    push_field(&mut out, &r.owner);
    out.push(',');
    push_field(&mut out, &r.deck);
    out.push_str("\r\n");
  }
  out
}

fn push_field(out: &mut String, field: &str) {
  if field.contains(&[',', '"', '\r', '\n'][..]) {
    out.push('"');
    out.push_str(&field.replace('"', "\"\""));
    out.push('"');
  } else {
    out.push_str(field);
  }
}

pub fn parse_cards(input: &str) -> DeckResult<Vec<CardRecord>> {
  let rows = split_rows(input)?;
  let mut rows = rows.into_iter().filter(|(_, fields)| !(fields.len() == 1 && fields[0].trim().is_empty()));

  let (header_line, header) = rows.next().ok_or(DeckError::Csv {
    line: 1,
    message: "missing header row".to_string(),
  })?;
  let position = |column: &str| {
    header
      .iter()
      .position(|h| h.trim().eq_ignore_ascii_case(column))
      .ok_or_else(|| DeckError::Csv {
        line: header_line,
        message: format!("header is missing the '{column}' column"),
      })
  };
  let (name_at, owner_at, deck_at) = (position("name")?, position("owner")?, position("deck")?);

  let mut records = Vec::new();
  for (line, fields) in rows {
    if fields.len() != header.len() {
      return Err(DeckError::Csv {
        line,
        message: format!("expected {} fields, found {}", header.len(), fields.len()),
      });
    }
    records.push(CardRecord {
      name: fields[name_at].trim().to_string(),
      owner: fields[owner_at].trim().to_string(),
      deck: fields[deck_at].trim().to_string(),
    });
  }
  Ok(records)
}

/// Splits the input into rows of fields, each tagged with the line it starts on.
fn split_rows(input: &str) -> DeckResult<Vec<(usize, Vec<String>)>> {
  let mut rows = Vec::new();
  let mut fields = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut line = 1;
  let mut row_start = 1;
  let mut chars = input.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push(c);
        }
        _ => field.push(c),
      }
      continue;
    }
    match c {
      '"' if field.is_empty() => in_quotes = true,
      ',' => fields.push(std::mem::take(&mut field)),
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' | '\r' => {
        fields.push(std::mem::take(&mut field));
        rows.push((row_start, std::mem::take(&mut fields)));
        line += 1;
        row_start = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(DeckError::Csv {
      line: row_start,
      message: "unterminated quoted field".to_string(),
    });
  }
  if !field.is_empty() || !fields.is_empty() {
    fields.push(field);
    rows.push((row_start, fields));
  }
  Ok(rows)
}
