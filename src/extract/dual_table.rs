// src/extract/dual_table.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::numeric::{clean_number, leading_number};
use super::{cell_text, ExtractError, SourceId, Tolerance, CELL, ROW};
use crate::tariff::{TariffRow, TariffTable};

const SOURCE: SourceId = SourceId::Marbella;

/// 1-based cell index of the "PRECIO S/IVA" (before tax) column in both
/// season tables.
const PRICE_COL: usize = 2;

static LOW_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TEMPORADA\s+BAJA").expect("low-season label pattern"));
static HIGH_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TEMPORADA\s+ALTA").expect("high-season label pattern"));
static STRONG: Lazy<Selector> =
    Lazy::new(|| Selector::parse("strong").expect("Invalid CSS selector for table labels"));

/// Marbella publishes two separate tables, one per season, each announced by
/// a bold label. Rows are joined on the boat length: a left join keyed on
/// the low-season table, so lengths that only appear in the high-season
/// table are dropped.
pub fn extract(html: &str, tolerance: Tolerance) -> Result<TariffTable, ExtractError> {
    let doc = Html::parse_document(html);

    let low_table = labeled_table(&doc, &LOW_LABEL).ok_or(ExtractError::TablesNotFound {
        source: SOURCE,
        missing: "low-season",
    })?;
    let high_table = labeled_table(&doc, &HIGH_LABEL).ok_or(ExtractError::TablesNotFound {
        source: SOURCE,
        missing: "high-season",
    })?;

    let low = pick(low_table, tolerance)?;
    let high = pick(high_table, tolerance)?;

    let mut rows = Vec::with_capacity(low.len());
    for (length, low_price) in low {
        // exact equality on the normalized length; first match in table
        // order wins when the high table repeats a length
        let high_price = high
            .iter()
            .find(|(l, _)| *l == length)
            .and_then(|(_, p)| *p);
        rows.push(TariffRow::new(
            Some(length),
            None,
            [low_price, None, high_price],
        ));
    }

    debug!(source = %SOURCE, rows = rows.len(), "extracted dual-table tariffs");
    Ok(TariffTable::new(rows))
}

/// Finds the `<table>` enclosing a bold label that matches `label`.
fn labeled_table<'a>(doc: &'a Html, label: &Regex) -> Option<ElementRef<'a>> {
    doc.select(&STRONG)
        .find(|el| label.is_match(&el.text().collect::<String>()))
        .and_then(|el| {
            el.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "table")
        })
}

/// Extracts (length, price) pairs from one season table. The length is the
/// leading numeric token of the first cell ("12 x 4 m." → 12); rows with
/// fewer cells than the price column are layout filler and are skipped.
fn pick(
    table: ElementRef<'_>,
    tolerance: Tolerance,
) -> Result<Vec<(f64, Option<f64>)>, ExtractError> {
    let mut out = Vec::new();
    for tr in table.select(&ROW) {
        let cells: Vec<String> = tr.select(&CELL).map(cell_text).collect();
        if cells.len() < PRICE_COL {
            continue;
        }
        let row = out.len();

        let Some(length) = leading_number(&cells[0]) else {
            match tolerance {
                Tolerance::Tolerant => {
                    // the length is the join key; without it the row is unusable
                    warn!(source = %SOURCE, row, raw = %cells[0], "unreadable length, skipping row");
                    continue;
                }
                Tolerance::Strict => {
                    return Err(ExtractError::UnreadableCell {
                        source: SOURCE,
                        field: "length",
                        raw: cells[0].clone(),
                        row,
                    })
                }
            }
        };

        let raw_price = &cells[PRICE_COL - 1];
        let price = match clean_number(raw_price) {
            Some(v) => Some(v),
            None => match tolerance {
                Tolerance::Tolerant => {
                    warn!(source = %SOURCE, row, raw = %raw_price, "unreadable price, keeping row");
                    None
                }
                Tolerance::Strict => {
                    return Err(ExtractError::UnreadableCell {
                        source: SOURCE,
                        field: "price",
                        raw: raw_price.clone(),
                        row,
                    })
                }
            },
        };

        out.push((length, price));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(low_rows: &str, high_rows: &str) -> String {
        format!(
            r#"<html><body>
            <table><tbody>
            <tr><th colspan="2"><strong>Temporada Baja</strong></th></tr>
            <tr><th>Eslora</th><th>Precio S/IVA</th></tr>
            {low_rows}
            </tbody></table>
            <table><tbody>
            <tr><th colspan="2"><strong>TEMPORADA ALTA</strong></th></tr>
            <tr><th>Eslora</th><th>Precio S/IVA</th></tr>
            {high_rows}
            </tbody></table>
            </body></html>"#
        )
    }

    #[test]
    fn joins_on_length_first_match_wins() {
        let html = page(
            "<tr><td>12 x 4 m.</td><td>100,00 €</td></tr>",
            concat!(
                "<tr><td>12 x 4 m.</td><td>150,00 €</td></tr>",
                "<tr><td>12 x 4 m.</td><td>999,00 €</td></tr>",
            ),
        );
        let table = extract(&html, Tolerance::Tolerant).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].length, Some(12.0));
        assert_eq!(table.rows[0].prices, vec![Some(100.0), None, Some(150.0)]);
    }

    #[test]
    fn high_season_only_lengths_are_dropped() {
        let html = page(
            "<tr><td>12 x 4 m.</td><td>100,00 €</td></tr>",
            concat!(
                "<tr><td>12 x 4 m.</td><td>150,00 €</td></tr>",
                "<tr><td>20 x 6 m.</td><td>300,00 €</td></tr>",
            ),
        );
        let table = extract(&html, Tolerance::Tolerant).unwrap();
        assert_eq!(table.rows.len(), 1, "left join keyed on low-season rows");
        assert!(table.rows.iter().all(|r| r.length != Some(20.0)));
    }

    #[test]
    fn unmatched_low_length_keeps_high_missing() {
        let html = page(
            concat!(
                "<tr><td>8 x 3 m.</td><td>60,00 €</td></tr>",
                "<tr><td>10 x 3,5 m.</td><td>80,00 €</td></tr>",
            ),
            "<tr><td>8 x 3 m.</td><td>90,00 €</td></tr>",
        );
        let table = extract(&html, Tolerance::Tolerant).unwrap();
        assert_eq!(table.rows[0].prices, vec![Some(60.0), None, Some(90.0)]);
        assert_eq!(table.rows[1].prices, vec![Some(80.0), None, None]);
    }

    #[test]
    fn mid_season_is_always_missing() {
        let html = page(
            "<tr><td>12 x 4 m.</td><td>100,00 €</td></tr>",
            "<tr><td>12 x 4 m.</td><td>150,00 €</td></tr>",
        );
        let table = extract(&html, Tolerance::Tolerant).unwrap();
        assert!(table.rows.iter().all(|r| r.prices[1].is_none()));
    }

    #[test]
    fn missing_label_is_a_hard_failure() {
        let html = r#"<html><body>
            <table><tbody>
            <tr><th><strong>Temporada Baja</strong></th></tr>
            <tr><td>12 x 4 m.</td><td>100,00 €</td></tr>
            </tbody></table>
            </body></html>"#;
        let err = extract(html, Tolerance::Tolerant).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::TablesNotFound { source: SourceId::Marbella, missing: "high-season" }
        ));
    }

    #[test]
    fn strict_mode_aborts_on_unreadable_price() {
        let html = page(
            "<tr><td>12 x 4 m.</td><td>consultar</td></tr>",
            "<tr><td>12 x 4 m.</td><td>150,00 €</td></tr>",
        );
        let err = extract(&html, Tolerance::Strict).unwrap_err();
        assert!(matches!(err, ExtractError::UnreadableCell { field: "price", .. }));
    }
}
