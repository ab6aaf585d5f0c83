pub mod scenario;
pub mod util;

pub use util::{parse_seeds, percent, report_stamp, split_csv};
