use serde::{Deserialize, Serialize};
use std::fmt;

/// Every algorithm the agent can call.
///
/// Registry entries, argument rules and bridge marshalling all match on this
/// enum, so adding a variant fails to compile until each of them handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    PtasKnapsack,
    ExactKnapsack,
    BinPacking,
    WeightedIntervalScheduling,
    SetCover,
    MaxCoverage,
    WeightedBipartiteMatching,
    MakespanScheduling,
    MixedIlp,
    InfluenceMaximization,
    DensestSubgraph,
    KCoreDecomposition,
    BetweennessCentrality,
    Pagerank,
}

impl ToolKind {
    /// Catalog order, as advertised to the model.
    pub const ALL: [ToolKind; 14] = [
        ToolKind::PtasKnapsack,
        ToolKind::ExactKnapsack,
        ToolKind::BinPacking,
        ToolKind::WeightedIntervalScheduling,
        ToolKind::SetCover,
        ToolKind::MaxCoverage,
        ToolKind::WeightedBipartiteMatching,
        ToolKind::MakespanScheduling,
        ToolKind::MixedIlp,
        ToolKind::InfluenceMaximization,
        ToolKind::DensestSubgraph,
        ToolKind::KCoreDecomposition,
        ToolKind::BetweennessCentrality,
        ToolKind::Pagerank,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::PtasKnapsack => "ptas_knapsack",
            ToolKind::ExactKnapsack => "exact_knapsack",
            ToolKind::BinPacking => "bin_packing",
            ToolKind::WeightedIntervalScheduling => "weighted_interval_scheduling",
            ToolKind::SetCover => "set_cover",
            ToolKind::MaxCoverage => "max_coverage",
            ToolKind::WeightedBipartiteMatching => "weighted_bipartite_matching",
            ToolKind::MakespanScheduling => "makespan_scheduling",
            ToolKind::MixedIlp => "mixed_ilp",
            ToolKind::InfluenceMaximization => "influence_maximization",
            ToolKind::DensestSubgraph => "densest_subgraph",
            ToolKind::KCoreDecomposition => "k_core_decomposition",
            ToolKind::BetweennessCentrality => "betweenness_centrality",
            ToolKind::Pagerank => "pagerank",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
