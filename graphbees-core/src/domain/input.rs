//! Solver-ready inputs produced by the argument normalizer.
//!
//! Every value here has already been validated: indices are 0-based,
//! graphs are simple, and parallel arrays have matching lengths. The runtime
//! bridge consumes them without re-checking.

use super::tools::ToolKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type NodeId = u32;
pub type Edge = (NodeId, NodeId);
pub type WeightMap = BTreeMap<Edge, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnapsackItem {
    pub weight: u64,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackInput {
    pub capacity: u64,
    pub items: Vec<KnapsackItem>,
    pub labels: Option<Vec<String>>,
}

impl KnapsackInput {
    pub fn weights(&self) -> Vec<u64> {
        self.items.iter().map(|item| item.weight).collect()
    }

    pub fn values(&self) -> Vec<u64> {
        self.items.iter().map(|item| item.value).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinPackingInput {
    pub items: Vec<u64>,
    pub bin_capacity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSchedulingInput {
    pub jobs: Vec<Interval>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetCoverInput {
    /// Sorted, deduplicated element ids per subset.
    pub subsets: Vec<Vec<u32>>,
    pub costs: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxCoverageInput {
    pub subsets: Vec<Vec<u32>>,
    pub k: u32,
}

/// Two independent label spaces; `edges[i]` is `(left label, right label)`
/// and carries `weights[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BipartiteMatchingInput {
    pub left_nodes: Vec<NodeId>,
    pub right_nodes: Vec<NodeId>,
    pub edges: Vec<Edge>,
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MakespanInput {
    pub jobs: Vec<f64>,
    pub machines: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    #[default]
    Continuous,
    Integer,
    Binary,
}

impl VarType {
    pub fn as_str(self) -> &'static str {
        match self {
            VarType::Continuous => "continuous",
            VarType::Integer => "integer",
            VarType::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlpVariable {
    pub name: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub var_type: VarType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTerm {
    pub variable: String,
    pub coefficient: f64,
}

/// `Σ coefficient·variable + constant`, one term per variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<LinearTerm>,
    pub constant: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "<=")]
    LessEq,
    #[serde(rename = ">=")]
    GreaterEq,
    #[serde(rename = "==")]
    Equal,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::LessEq => "<=",
            Relation::GreaterEq => ">=",
            Relation::Equal => "==",
        }
    }
}

/// Canonical `Σ aᵢxᵢ OP rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub terms: Vec<LinearTerm>,
    pub relation: Relation,
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sense {
    #[default]
    Max,
    Min,
}

impl Sense {
    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Max => "Max",
            Sense::Min => "Min",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixedIlpInput {
    pub variables: Vec<IlpVariable>,
    pub constraints: Vec<LinearConstraint>,
    /// `None` means feasibility mode.
    pub objective: Option<LinearExpr>,
    pub sense: Sense,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceInput {
    pub edges: Vec<Edge>,
    /// Activation probability of every directed edge.
    pub probabilities: WeightMap,
    pub k: u32,
    pub n_simulations: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensestSubgraphInput {
    pub edges: Vec<Edge>,
    pub directed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphInput {
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetweennessInput {
    pub edges: Vec<Edge>,
    pub normalized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagerankInput {
    pub edges: Vec<Edge>,
    pub alpha: f64,
}

/// Normalized arguments, one variant per tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    PtasKnapsack { problem: KnapsackInput, epsilon: f64 },
    ExactKnapsack(KnapsackInput),
    BinPacking(BinPackingInput),
    WeightedIntervalScheduling(IntervalSchedulingInput),
    SetCover(SetCoverInput),
    MaxCoverage(MaxCoverageInput),
    WeightedBipartiteMatching(BipartiteMatchingInput),
    MakespanScheduling(MakespanInput),
    MixedIlp(MixedIlpInput),
    InfluenceMaximization(InfluenceInput),
    DensestSubgraph(DensestSubgraphInput),
    KCoreDecomposition(GraphInput),
    BetweennessCentrality(BetweennessInput),
    Pagerank(PagerankInput),
}

impl ToolInput {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInput::PtasKnapsack { .. } => ToolKind::PtasKnapsack,
            ToolInput::ExactKnapsack(_) => ToolKind::ExactKnapsack,
            ToolInput::BinPacking(_) => ToolKind::BinPacking,
            ToolInput::WeightedIntervalScheduling(_) => ToolKind::WeightedIntervalScheduling,
            ToolInput::SetCover(_) => ToolKind::SetCover,
            ToolInput::MaxCoverage(_) => ToolKind::MaxCoverage,
            ToolInput::WeightedBipartiteMatching(_) => ToolKind::WeightedBipartiteMatching,
            ToolInput::MakespanScheduling(_) => ToolKind::MakespanScheduling,
            ToolInput::MixedIlp(_) => ToolKind::MixedIlp,
            ToolInput::InfluenceMaximization(_) => ToolKind::InfluenceMaximization,
            ToolInput::DensestSubgraph(_) => ToolKind::DensestSubgraph,
            ToolInput::KCoreDecomposition(_) => ToolKind::KCoreDecomposition,
            ToolInput::BetweennessCentrality(_) => ToolKind::BetweennessCentrality,
            ToolInput::Pagerank(_) => ToolKind::Pagerank,
        }
    }
}
