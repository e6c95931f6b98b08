pub mod render_flow;

pub use render_flow::{CompletionMode, JobCompletion, JobOutcome, RenderFlow};
