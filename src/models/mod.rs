pub mod mode;
pub mod output_layout;
pub mod parameter_space;
pub mod render_job;

pub use mode::mode_name;
pub use output_layout::OutputLayout;
pub use parameter_space::{ParameterSpace, RenderParams};
pub use render_job::{RenderJob, SortKey};
