//! Price data structures and sources.

mod prices;
mod source;

pub(crate) use prices::fill_forward_backward;
pub use prices::{DateRange, PriceSeries};
pub use source::{CsvPriceSource, MemoryPriceSource, PriceSource, REFERENCE_SYMBOL};
