pub mod job_enumerator;
pub mod job_logger;

pub use job_enumerator::JobEnumerator;
pub use job_logger::{JobLogger, SerializedLogger, TracingJobLogger};
