// src/extract/fixed_table.rs

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::numeric::clean_number;
use super::{cell_text, ExtractError, SourceId, Tolerance, CELL, ROW};
use crate::tariff::{TariffRow, TariffTable, SEASONS};

/// Declarative layout for a source whose tariffs sit in one table and whose
/// column order encodes the season. The columns carry no machine-readable
/// labels, so the mapping below IS the contract with that table. Validated
/// once when built, so a layout mistake fails at one named checkpoint
/// instead of as stray indexing inside row handling.
#[derive(Debug)]
pub struct TableLayout {
    source: SourceId,
    anchor: &'static str,
    table: Selector,
    skip_header_rows: usize,
    length_col: usize,
    beam_col: Option<usize>,
    /// Cell index feeding each canonical season slot; `None` = the source
    /// does not publish that band (stays missing, never zero).
    season_cols: [Option<usize>; 3],
}

impl TableLayout {
    fn new(
        source: SourceId,
        anchor: &'static str,
        skip_header_rows: usize,
        length_col: usize,
        beam_col: Option<usize>,
        season_cols: [Option<usize>; 3],
    ) -> Result<Self, String> {
        let table =
            Selector::parse(anchor).map_err(|_| format!("{source}: bad selector `{anchor}`"))?;

        let mut used: Vec<usize> = season_cols.iter().flatten().copied().collect();
        if used.is_empty() {
            return Err(format!("{source}: layout maps no season column"));
        }
        used.push(length_col);
        used.extend(beam_col);
        let total = used.len();
        used.sort_unstable();
        used.dedup();
        if used.len() != total {
            return Err(format!("{source}: layout maps the same column twice"));
        }

        Ok(Self {
            source,
            anchor,
            table,
            skip_header_rows,
            length_col,
            beam_col,
            season_cols,
        })
    }
}

// Benalmádena (tablepress-17): two header rows, then
// eslora | manga | temporada alta | temporada baja. No "media" column.
static BENALMADENA: Lazy<TableLayout> = Lazy::new(|| {
    TableLayout::new(
        SourceId::Benalmadena,
        "table#tablepress-17",
        2,
        0,
        Some(1),
        [Some(3), None, Some(2)],
    )
    .expect("benalmadena table layout")
});

pub fn extract(html: &str, tolerance: Tolerance) -> Result<TariffTable, ExtractError> {
    extract_with_layout(&BENALMADENA, html, tolerance)
}

fn extract_with_layout(
    layout: &TableLayout,
    html: &str,
    tolerance: Tolerance,
) -> Result<TariffTable, ExtractError> {
    let doc = Html::parse_document(html);
    let table = doc
        .select(&layout.table)
        .next()
        .ok_or(ExtractError::TableNotFound {
            source: layout.source,
            anchor: layout.anchor,
        })?;

    let mut rows = Vec::new();
    for tr in table.select(&ROW).skip(layout.skip_header_rows) {
        let cells: Vec<String> = tr.select(&CELL).map(cell_text).collect();
        let row = rows.len();

        let length = read_cell(layout.source, &cells, layout.length_col, "length", row, tolerance)?;
        let beam = match layout.beam_col {
            Some(col) => read_cell(layout.source, &cells, col, "beam", row, tolerance)?,
            None => None,
        };

        let mut prices = [None; 3];
        for season in SEASONS {
            if let Some(col) = layout.season_cols[season.slot()] {
                prices[season.slot()] =
                    read_cell(layout.source, &cells, col, season.label(), row, tolerance)?;
            }
        }

        rows.push(TariffRow::new(length, beam, prices));
    }

    debug!(source = %layout.source, rows = rows.len(), "extracted fixed-table tariffs");
    Ok(TariffTable::new(rows))
}

fn read_cell(
    source: SourceId,
    cells: &[String],
    col: usize,
    field: &'static str,
    row: usize,
    tolerance: Tolerance,
) -> Result<Option<f64>, ExtractError> {
    let raw = cells.get(col).map(String::as_str).unwrap_or("");
    match clean_number(raw) {
        Some(v) => Ok(Some(v)),
        None => match tolerance {
            Tolerance::Tolerant => {
                warn!(%source, field, row, raw, "unreadable cell, keeping row with missing value");
                Ok(None)
            }
            Tolerance::Strict => Err(ExtractError::UnreadableCell {
                source,
                field,
                raw: raw.to_owned(),
                row,
            }),
        },
    }
}
