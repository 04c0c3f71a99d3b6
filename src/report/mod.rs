pub mod accumulate;
pub mod assemble;
pub mod exec;
pub mod record;

pub use accumulate::{Accumulator, Totals};
pub use exec::execute;
pub use record::{build_record, RecordOptions};
