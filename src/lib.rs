//! Extraction engine for marina tariff sources: turns already-fetched page
//! text (rendered HTML, or plain text pulled out of a tariff PDF) into a
//! normalized [`tariff::TariffTable`]. Fetching, storage and scheduling live
//! in the surrounding system; everything here is pure computation over the
//! input text.

pub mod extract;
pub mod tariff;

pub use extract::{
    extract_tariffs, extract_tariffs_with, resolve, ExtractError, SourceId, Tolerance,
};
pub use tariff::{Season, TariffRow, TariffTable, SEASONS};
