// src/tariff.rs

use serde::{Deserialize, Serialize};

/// A pricing band. Sources publish these under local labels
/// (baja/media/alta); canonically they are low/mid/high and their order is
/// positional: `prices` slots line up with [`SEASONS`] and are never
/// reordered.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Low,
    Mid,
    High,
}

/// Canonical season order for every extracted table.
pub const SEASONS: [Season; 3] = [Season::Low, Season::Mid, Season::High];

impl Season {
    /// Position of this season's price slot within a row.
    pub fn slot(self) -> usize {
        match self {
            Season::Low => 0,
            Season::Mid => 1,
            Season::High => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Low => "low",
            Season::Mid => "mid",
            Season::High => "high",
        }
    }
}

/// One boat-length bucket and its per-season prices.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TariffRow {
    /// Length bucket in metres. `None` when the source cell was unreadable.
    pub length: Option<f64>,
    /// Beam in metres, for sources that publish one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam: Option<f64>,
    /// Prices aligned positionally with [`TariffTable::seasons`]. `None` is
    /// a band the source does not publish, or a cell that could not be read
    /// under the tolerant policy.
    pub prices: Vec<Option<f64>>,
}

impl TariffRow {
    /// Builds a row with one price slot per canonical season.
    pub fn new(length: Option<f64>, beam: Option<f64>, prices: [Option<f64>; 3]) -> Self {
        Self {
            length,
            beam,
            prices: prices.to_vec(),
        }
    }
}

/// The normalized output of every extraction. Constructed fresh per call,
/// never mutated afterwards; the persistence collaborator serializes it
/// whole (current snapshot + append-only history).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TariffTable {
    pub seasons: Vec<Season>,
    pub rows: Vec<TariffRow>,
}

impl TariffTable {
    pub fn new(rows: Vec<TariffRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.prices.len() == SEASONS.len()));
        Self {
            seasons: SEASONS.to_vec(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn seasons_serialize_as_lowercase_labels() -> Result<()> {
        let table = TariffTable::new(vec![TariffRow::new(
            Some(10.0),
            None,
            [Some(15.0), None, Some(25.0)],
        )]);
        let json = serde_json::to_value(&table)?;
        assert_eq!(
            json["seasons"],
            serde_json::json!(["low", "mid", "high"]),
            "season order is positional and must survive serialization"
        );
        // absent beam is omitted, not serialized as null
        assert!(json["rows"][0].get("beam").is_none());
        assert_eq!(json["rows"][0]["prices"], serde_json::json!([15.0, null, 25.0]));
        Ok(())
    }

    #[test]
    fn beam_round_trips_when_present() -> Result<()> {
        let row = TariffRow::new(Some(12.0), Some(4.0), [Some(100.0), None, Some(150.0)]);
        let json = serde_json::to_string(&row)?;
        let back: TariffRow = serde_json::from_str(&json)?;
        assert_eq!(back, row);
        Ok(())
    }
}
