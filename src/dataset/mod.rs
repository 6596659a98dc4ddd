mod load;
mod parse;
pub(crate) mod record;

pub use load::load_records;
pub use parse::parse_records;
pub use record::{GroupField, Record};
