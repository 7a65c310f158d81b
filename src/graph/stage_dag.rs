use crate::error::WorkflowError;
use crate::project::ProjectConfig;
use crate::step::StepType;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// How finished work moves along an edge of the stage graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Downstream waits for the whole upstream stage.
    Whole,
    /// Upstream releases pages in batches of this size.
    Batched { batch_pages: i64 },
}

pub struct StageDag {
    pub graph: DiGraph<StepType, Handoff>,
    pub id_to_index: HashMap<StepType, NodeIndex>,
}

impl StageDag {
    pub fn build(config: &ProjectConfig) -> Self {
        let mut graph: DiGraph<StepType, Handoff> = DiGraph::new();
        let mut id_to_index: HashMap<StepType, NodeIndex> = HashMap::new();

        for step_type in StepType::ALL {
            let node_ix = graph.add_node(step_type);
            id_to_index.insert(step_type, node_ix);
        }

        // Edges: upstream -> stage
        for step_type in StepType::ALL {
            for upstream in step_type.upstream() {
                let handoff = match config.handoff_batch(*upstream) {
                    Some(batch_pages) => Handoff::Batched { batch_pages },
                    None => Handoff::Whole,
                };
                if let (Some(&u), Some(&v)) =
                    (id_to_index.get(upstream), id_to_index.get(&step_type))
                {
                    graph.add_edge(u, v, handoff);
                }
            }
        }

        Self { graph, id_to_index }
    }

    pub fn execution_order(&self) -> Result<Vec<StepType>, WorkflowError> {
        let order = toposort(&self.graph, None)
            .map_err(|_| WorkflowError::StageGraph("cycle detected in stage graph".into()))?;
        Ok(order.into_iter().map(|ix| self.graph[ix]).collect())
    }

    /// Upstream stages of `step_type` with the handoff used on each edge.
    pub fn incoming(&self, step_type: StepType) -> Vec<(StepType, Handoff)> {
        let Some(&node_ix) = self.id_to_index.get(&step_type) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node_ix, Direction::Incoming)
            .map(|edge| (self.graph[edge.source()], *edge.weight()))
            .collect()
    }
}
