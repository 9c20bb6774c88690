//! Wire types exchanged with the solver worker.
//!
//! Messages are line-delimited JSON-RPC 2.0. After `initialize`, each tool
//! call is one `solve` request `{algorithm, input}`. Node and item indices on
//! this side of the wire are 1-based, matching the worker's conventions;
//! translation happens in the bridge.

use crate::domain::input::{IlpVariable, LinearConstraint, LinearExpr};
use crate::domain::solver::RuntimeInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const PROTOCOL_VERSION: &str = "graphbees-worker/1";
pub const REQUIRED_PACKAGES: [&str; 4] = ["JuliAlg", "Graphs", "JuMP", "HiGHS"];

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_SOLVE: &str = "solve";
pub const METHOD_SHUTDOWN: &str = "shutdown";

pub const METHOD_NOT_FOUND: i64 = -32601;

/// Fixed sample budget passed to the greedy influence maximizer.
pub const INFLUENCE_GREEDY_SAMPLES: u32 = 1000;

#[derive(Debug, Serialize)]
pub struct InitializeParams<'a> {
    pub protocol_version: &'a str,
    pub threads: Value,
    pub packages: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(flatten)]
    pub info: RuntimeInfo,
}

/// Worker log notification payload.
#[derive(Debug, Deserialize)]
pub struct LogParams {
    #[serde(default)]
    pub level: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "algorithm", content = "input", rename_all = "snake_case")]
pub enum SolveRequest {
    PtasKnapsack(PtasKnapsackParams),
    ExactKnapsack(KnapsackParams),
    BinPacking(BinPackingParams),
    WeightedIntervalScheduling(IntervalParams),
    SetCover(SetCoverParams),
    MaxCoverage(MaxCoverageParams),
    WeightedBipartiteMatching(BipartiteParams),
    MakespanScheduling(MakespanParams),
    MixedIlp(MixedIlpParams),
    InfluenceMaximization(InfluenceParams),
    DensestSubgraph(DensestParams),
    KCoreDecomposition(GraphParams),
    BetweennessCentrality(BetweennessParams),
    Pagerank(PagerankParams),
}

pub type WireEdge = [u64; 2];
/// `[u, v, weight]` with 1-based endpoints.
pub type WireWeightedEdge = (u64, u64, f64);

#[derive(Debug, Serialize)]
pub struct KnapsackParams {
    pub capacity: u64,
    pub weights: Vec<u64>,
    pub values: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct PtasKnapsackParams {
    pub capacity: u64,
    pub epsilon: f64,
    pub weights: Vec<u64>,
    pub values: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct BinPackingParams {
    pub items: Vec<u64>,
    pub bin_capacity: u64,
}

#[derive(Debug, Serialize)]
pub struct IntervalParams {
    pub start_times: Vec<i64>,
    pub end_times: Vec<i64>,
    pub weights: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct SetCoverParams {
    pub subsets: Vec<Vec<u32>>,
    pub costs: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct MaxCoverageParams {
    pub subsets: Vec<Vec<u32>>,
    pub k: u32,
}

#[derive(Debug, Serialize)]
pub struct BipartiteParams {
    pub node_count: u64,
    pub left: Vec<u64>,
    pub right: Vec<u64>,
    pub edges: Vec<WireEdge>,
    pub weights: Vec<WireWeightedEdge>,
}

#[derive(Debug, Serialize)]
pub struct MakespanParams {
    pub jobs: Vec<f64>,
    pub m: u32,
}

#[derive(Debug, Serialize)]
pub struct MixedIlpParams {
    pub variables: Vec<IlpVariable>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: Option<LinearExpr>,
    pub sense: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InfluenceParams {
    pub node_count: u64,
    pub edges: Vec<WireEdge>,
    pub weights: Vec<WireWeightedEdge>,
    pub k: u32,
    pub greedy_samples: u32,
    pub n_simulations: u32,
}

#[derive(Debug, Serialize)]
pub struct DensestParams {
    pub node_count: u64,
    pub edges: Vec<WireEdge>,
    pub directed: bool,
}

#[derive(Debug, Serialize)]
pub struct GraphParams {
    pub node_count: u64,
    pub edges: Vec<WireEdge>,
}

#[derive(Debug, Serialize)]
pub struct BetweennessParams {
    pub node_count: u64,
    pub edges: Vec<WireEdge>,
    pub normalized: bool,
}

#[derive(Debug, Serialize)]
pub struct PagerankParams {
    pub node_count: u64,
    pub edges: Vec<WireEdge>,
    pub alpha: f64,
}

// Replies, as returned by the worker.

#[derive(Debug, Deserialize)]
pub struct SelectionReply<T> {
    pub objective: T,
    pub selected: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BinPackingReply {
    pub num_bins: u64,
    pub bins: Vec<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
pub struct MatchingReply {
    pub total_weight: f64,
    pub matched: Vec<WireEdge>,
}

#[derive(Debug, Deserialize)]
pub struct MakespanReply {
    pub makespan: f64,
    pub assignments: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct MixedIlpReply {
    pub status: String,
    #[serde(default)]
    pub objective_value: Option<f64>,
    #[serde(default)]
    pub variable_values: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
pub struct InfluenceReply {
    pub seeds: Vec<u64>,
    pub spread: f64,
}

#[derive(Debug, Deserialize)]
pub struct DensestReply {
    pub nodes: Vec<u64>,
    pub density: f64,
}

#[derive(Debug, Deserialize)]
pub struct CoreReply {
    /// `[node, core number]` pairs.
    pub core_numbers: Vec<[u64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct ScoresReply {
    pub scores: Vec<f64>,
}
