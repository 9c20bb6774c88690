//! Argument normalizer
//!
//! Turns the loosely typed JSON a model produces into [`ToolInput`] values
//! the bridge can marshal without further checks. Normalization is pure:
//! it never touches the runtime.

mod canonical;
mod combinatorial;
mod graph;
mod ilp;
mod reader;

use crate::domain::input::ToolInput;
use crate::domain::tools::ToolKind;
use serde_json::Value;
use thiserror::Error;

pub use graph::parse_weight_map;

/// Largest accepted vertex id.
pub const MAX_VERTEX_ID: u32 = 1_000_000;

/// A rejected argument. `field` is always a top-level argument name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid '{field}': {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn normalize(kind: ToolKind, raw: &Value) -> Result<ToolInput, ValidationError> {
    let args = reader::Args::new(raw)?;
    let input = match kind {
        ToolKind::PtasKnapsack => ToolInput::PtasKnapsack {
            problem: combinatorial::knapsack(&args)?,
            epsilon: combinatorial::epsilon(&args)?,
        },
        ToolKind::ExactKnapsack => ToolInput::ExactKnapsack(combinatorial::knapsack(&args)?),
        ToolKind::BinPacking => ToolInput::BinPacking(combinatorial::bin_packing(&args)?),
        ToolKind::WeightedIntervalScheduling => {
            ToolInput::WeightedIntervalScheduling(combinatorial::interval_scheduling(&args)?)
        }
        ToolKind::SetCover => ToolInput::SetCover(combinatorial::set_cover(&args)?),
        ToolKind::MaxCoverage => ToolInput::MaxCoverage(combinatorial::max_coverage(&args)?),
        ToolKind::WeightedBipartiteMatching => {
            ToolInput::WeightedBipartiteMatching(combinatorial::bipartite_matching(&args)?)
        }
        ToolKind::MakespanScheduling => {
            ToolInput::MakespanScheduling(combinatorial::makespan(&args)?)
        }
        ToolKind::MixedIlp => ToolInput::MixedIlp(ilp::mixed_ilp(&args)?),
        ToolKind::InfluenceMaximization => {
            ToolInput::InfluenceMaximization(graph::influence(&args)?)
        }
        ToolKind::DensestSubgraph => ToolInput::DensestSubgraph(graph::densest_subgraph(&args)?),
        ToolKind::KCoreDecomposition => ToolInput::KCoreDecomposition(graph::k_core(&args)?),
        ToolKind::BetweennessCentrality => {
            ToolInput::BetweennessCentrality(graph::betweenness(&args)?)
        }
        ToolKind::Pagerank => ToolInput::Pagerank(graph::pagerank(&args)?),
    };
    Ok(input)
}
