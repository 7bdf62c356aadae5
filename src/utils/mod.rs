pub mod dates;

pub use dates::{parse_day_first, parse_iso, DateParsingConfig};
