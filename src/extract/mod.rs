// src/extract/mod.rs

pub mod dual_table;
pub mod fixed_table;
pub mod numeric;
pub mod pdf_text;

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::tariff::TariffTable;

pub(crate) static ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("Invalid CSS selector for table rows"));
pub(crate) static CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Invalid CSS selector for table cells"));

/// Concatenated, whitespace-trimmed text of one table cell.
pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extraction failures. The anchor-not-found variants (`TableNotFound`,
/// `TablesNotFound`, `HeaderNotFound`) mean the source changed shape and
/// always abort the call; `UnreadableCell` is raised only under
/// [`Tolerance::Strict`]; the tolerant policy degrades the cell to a
/// missing value instead.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no parser registered for source `{0}`")]
    UnknownSource(String),

    #[error("{source}: table `{anchor}` not found")]
    TableNotFound {
        source: SourceId,
        anchor: &'static str,
    },

    #[error("{source}: {missing} table label not found")]
    TablesNotFound {
        source: SourceId,
        missing: &'static str,
    },

    #[error("{source}: tariff header line not found")]
    HeaderNotFound { source: SourceId },

    #[error("{source}: unreadable {field} `{raw}` in row {row}")]
    UnreadableCell {
        source: SourceId,
        field: &'static str,
        raw: String,
        row: usize,
    },
}

/// Policy for a single unreadable cell: abort the whole extraction, or keep
/// the row and mark that one value missing. Always passed explicitly so
/// callers (and tests) control it per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tolerance {
    /// Any unreadable mandatory cell fails the extraction.
    Strict,
    /// An unreadable cell becomes a missing value; the row survives.
    #[default]
    Tolerant,
}

/// The registered tariff sources. This is a closed set: a new source means a
/// new variant, a new parser and a new match arm below; there is no
/// fallback parser for unknown identifiers.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Benalmadena,
    Marbella,
    MarinaEste,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::Benalmadena, SourceId::Marbella, SourceId::MarinaEste];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Benalmadena => "benalmadena",
            SourceId::Marbella => "marbella",
            SourceId::MarinaEste => "marina_este",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// thiserror infers any field named `source` as the error source, which
// requires the field type to implement `std::error::Error`.
impl std::error::Error for SourceId {}

impl FromStr for SourceId {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ExtractError::UnknownSource(s.to_owned()))
    }
}

/// Look up the parser for a runtime source identifier.
pub fn resolve(source_id: &str) -> Result<SourceId, ExtractError> {
    source_id.parse()
}

/// Extract with the default tolerant policy.
pub fn extract_tariffs(source: SourceId, text: &str) -> Result<TariffTable, ExtractError> {
    extract_tariffs_with(source, text, Tolerance::default())
}

/// Run the registered parser for `source` over `text`. Pure function of its
/// arguments; safe to call concurrently.
#[instrument(level = "debug", skip(text), fields(text_len = text.len()))]
pub fn extract_tariffs_with(
    source: SourceId,
    text: &str,
    tolerance: Tolerance,
) -> Result<TariffTable, ExtractError> {
    match source {
        SourceId::Benalmadena => fixed_table::extract(text, tolerance),
        SourceId::Marbella => dual_table::extract(text, tolerance),
        SourceId::MarinaEste => pdf_text::extract(text, tolerance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_unknown_source() {
        let err = resolve("unknown_id").unwrap_err();
        assert!(matches!(err, ExtractError::UnknownSource(ref id) if id == "unknown_id"));
    }

    #[test]
    fn resolve_maps_registered_ids() {
        assert_eq!(resolve("benalmadena").unwrap(), SourceId::Benalmadena);
        assert_eq!(resolve("marbella").unwrap(), SourceId::Marbella);
        assert_eq!(resolve("marina_este").unwrap(), SourceId::MarinaEste);
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "TARIFAS\nESLORA T. BAJA T. MEDIA T. ALTA\n8 10,00 12,00 14,00\n10 15,50 18,00 21,00\n* IVA incluido\n";
        let a = extract_tariffs(SourceId::MarinaEste, text).unwrap();
        let b = extract_tariffs(SourceId::MarinaEste, text).unwrap();
        assert_eq!(a, b);
    }
}
