pub mod category;
pub mod report;
pub mod revision;

pub use category::Category;
pub use report::{AggregateOutcome, CheckResult, FileReport, RunReport};
pub use revision::Revision;
