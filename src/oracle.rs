use crate::error::Result;
use crate::types::PriceReading;

/// Price source. The engine samples it once per mutating operation.
pub trait Oracle {
    fn latest_price(&self) -> Result<PriceReading>;
}
