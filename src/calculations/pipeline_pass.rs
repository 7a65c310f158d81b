use crate::calculations::durations::last_batch_pages;
use crate::error::WorkflowError;
use crate::graph::{Handoff, StageDag};
use crate::project::ProjectConfig;
use crate::step::StepType;
use std::collections::HashMap;

/// Start and finish of a stage as offsets (in available days) from the schedule anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageWindow {
    pub step_type: StepType,
    pub start: i64,
    pub finish: i64,
}

/// Lays every stage out relative to offset 0.
///
/// A monolithic edge starts the downstream stage `approval_days` after the upstream
/// finishes. A batched edge whose batch is smaller than the upstream page count lets the
/// downstream stage start once the first batch is done and approved; the downstream
/// stage still cannot finish before the last batch has been approved and worked.
pub struct PipelinePass<'a> {
    dag: &'a StageDag,
    config: &'a ProjectConfig,
}

impl<'a> PipelinePass<'a> {
    pub fn new(dag: &'a StageDag, config: &'a ProjectConfig) -> Self {
        Self { dag, config }
    }

    pub fn execute(&self) -> Result<HashMap<StepType, StageWindow>, WorkflowError> {
        let approval = self.config.approval_days;
        let mut windows: HashMap<StepType, StageWindow> = HashMap::new();

        for step_type in self.dag.execution_order()? {
            let work = self.config.stage_work(step_type);
            let duration = work.duration_days();

            let mut start = 0;
            let mut finish_floor = 0;
            for (upstream, handoff) in self.dag.incoming(step_type) {
                let up = windows.get(&upstream).copied().ok_or_else(|| {
                    WorkflowError::StageGraph(format!(
                        "{upstream} was not scheduled before {step_type}"
                    ))
                })?;
                let up_work = self.config.stage_work(upstream);

                let pipelined = match (handoff, up_work.pages()) {
                    (Handoff::Batched { batch_pages }, Some(pages)) if batch_pages < pages => {
                        Some((batch_pages, pages))
                    }
                    _ => None,
                };

                match pipelined {
                    Some((batch_pages, pages)) => {
                        let first_ready = up.start + up_work.days_for(batch_pages) + approval;
                        let last_batch = last_batch_pages(pages, batch_pages);
                        let last_done = up.finish + approval + work.days_for(last_batch);
                        start = start.max(first_ready);
                        finish_floor = finish_floor.max(last_done);
                    }
                    None => {
                        start = start.max(up.finish + approval);
                    }
                }
            }

            let finish = (start + duration).max(finish_floor);
            windows.insert(
                step_type,
                StageWindow {
                    step_type,
                    start,
                    finish,
                },
            );
        }

        Ok(windows)
    }
}
