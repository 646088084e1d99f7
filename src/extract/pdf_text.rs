// src/extract/pdf_text.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::numeric::clean_number;
use super::{ExtractError, SourceId, Tolerance};
use crate::tariff::{TariffRow, TariffTable};

const SOURCE: SourceId = SourceId::MarinaEste;

/// The tariff block starts under the header line naming the length column
/// and the low-season band (the PDF is Spanish: "ESLORA ... T. BAJA ...").
static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)eslora.*baja").expect("pdf header pattern"));

/// Whitespace-split token positions within a tariff line.
const FIELDS: [&str; 4] = ["length", "low", "mid", "high"];

/// Marina del Este's tariffs arrive as plain text already pulled out of the
/// PDF. Rows run from the line after the header until the first non-blank
/// line that does not start with a digit (the tax footnotes); nothing after
/// that boundary is consumed, even if it looks numeric again.
pub fn extract(text: &str, tolerance: Tolerance) -> Result<TariffTable, ExtractError> {
    let mut lines = text.lines();
    if !lines.by_ref().any(|l| HEADER.is_match(l)) {
        return Err(ExtractError::HeaderNotFound { source: SOURCE });
    }

    let mut rows = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let row = rows.len();
        let mut values = [None; 4];
        for (i, &field) in FIELDS.iter().enumerate() {
            let raw = tokens.get(i).copied().unwrap_or("");
            values[i] = match clean_number(raw) {
                Some(v) => Some(v),
                None => match tolerance {
                    Tolerance::Tolerant => {
                        warn!(source = %SOURCE, field, row, raw, "unreadable token, keeping row");
                        None
                    }
                    Tolerance::Strict => {
                        return Err(ExtractError::UnreadableCell {
                            source: SOURCE,
                            field,
                            raw: raw.to_owned(),
                            row,
                        })
                    }
                },
            };
        }

        rows.push(TariffRow::new(values[0], None, [values[1], values[2], values[3]]));
    }

    debug!(source = %SOURCE, rows = rows.len(), "extracted pdf-text tariffs");
    Ok(TariffTable::new(rows))
}
