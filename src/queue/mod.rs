mod job;
mod report;

pub use job::{Job, VideoStatus};
pub use report::{ArchiveOutcome, TickReport, TickResponse};
