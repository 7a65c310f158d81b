pub mod durations;
pub mod pipeline_pass;

pub use pipeline_pass::{PipelinePass, StageWindow};
