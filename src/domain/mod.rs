pub mod dates;
pub mod record;
pub mod target;

pub use dates::estimate_date;
pub use record::{DedupKey, Record, DEDUP_TEXT_PREFIX};
pub use target::{Target, QUERY_PLACEHOLDER};
