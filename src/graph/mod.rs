pub mod stage_dag;

pub use stage_dag::{Handoff, StageDag};
