//! Static tool catalog.
//!
//! One [`ToolEntry`] per [`ToolKind`]: the function definition advertised to
//! the model and the metadata shown next to each result.

use crate::domain::tools::ToolKind;
use crate::types::ToolDefinition;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Value, json};

/// Human-facing description of the algorithm behind a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolMeta {
    pub display_name: &'static str,
    pub algorithm: &'static str,
    pub guarantee: &'static str,
    pub complexity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub kind: ToolKind,
    pub definition: ToolDefinition,
    pub meta: ToolMeta,
}

static ENTRIES: Lazy<Vec<ToolEntry>> = Lazy::new(|| {
    ToolKind::ALL
        .into_iter()
        .map(|kind| ToolEntry {
            kind,
            definition: ToolDefinition {
                name: kind.name().to_string(),
                description: description(kind).to_string(),
                parameters: parameters(kind),
            },
            meta: meta(kind),
        })
        .collect()
});

/// All entries in catalog order.
pub fn entries() -> &'static [ToolEntry] {
    &ENTRIES
}

pub fn entry(kind: ToolKind) -> &'static ToolEntry {
    // ENTRIES is built from ToolKind::ALL in declaration order.
    &ENTRIES[kind as usize]
}

pub fn lookup(name: &str) -> Option<&'static ToolEntry> {
    ToolKind::from_name(name).map(entry)
}

/// Function definitions for every tool, ready for a [`ModelRequest`].
///
/// [`ModelRequest`]: crate::infrastructure::model::ModelRequest
pub fn definitions() -> Vec<ToolDefinition> {
    ENTRIES.iter().map(|entry| entry.definition.clone()).collect()
}

fn meta(kind: ToolKind) -> ToolMeta {
    let (display_name, algorithm, guarantee, complexity, notes) = match kind {
        ToolKind::PtasKnapsack => (
            "FPTAS Knapsack",
            "Value-Scaled Dynamic Programming (FPTAS)",
            "(1+ε)-approximation",
            "O(n^2 / ε)",
            Some("Returned value is at least OPT / (1 + ε)."),
        ),
        ToolKind::ExactKnapsack => (
            "Exact Knapsack",
            "Dynamic Programming over capacity",
            "Exact",
            "O(n * W)",
            Some("Pseudo-polynomial; prefer ptas_knapsack for large capacities."),
        ),
        ToolKind::BinPacking => (
            "Bin Packing",
            "First Fit Decreasing",
            "(11/9) OPT + O(1) bins",
            "O(n log n)",
            None,
        ),
        ToolKind::WeightedIntervalScheduling => (
            "Weighted Interval Scheduling",
            "Dynamic Programming + Binary Search",
            "Exact",
            "O(n log n)",
            None,
        ),
        ToolKind::SetCover => (
            "Set Cover",
            "Greedy (cost-effectiveness ratio)",
            "O(ln n)-approximation",
            "O(n * m)",
            None,
        ),
        ToolKind::MaxCoverage => (
            "Max Coverage",
            "Greedy (marginal gain)",
            "(1 - 1/e)-approximation",
            "O(k * n * m)",
            None,
        ),
        ToolKind::WeightedBipartiteMatching => (
            "Weighted Bipartite Matching",
            "LP Relaxation (exact for bipartite graph matching)",
            "Exact optimal",
            "O(n^3) via LP",
            Some("Left and right node ids are independent label spaces."),
        ),
        ToolKind::MakespanScheduling => (
            "Makespan Scheduling",
            "Longest Processing Time (LPT)",
            "(4/3 - 1/(3m))-approximation",
            "O(n log n)",
            None,
        ),
        ToolKind::MixedIlp => (
            "Mixed ILP",
            "MILP via JuMP + HiGHS",
            "Exact (for solved model)",
            "Problem-dependent",
            Some("Without an objective the model is solved for feasibility only."),
        ),
        ToolKind::InfluenceMaximization => (
            "Influence Maximization",
            "Greedy hill climbing with Monte Carlo Independent Cascade",
            "(1 - 1/e - δ)-approximation",
            "O(k * n * R * m)",
            Some("Spread is a Monte Carlo estimate; R is the simulation count."),
        ),
        ToolKind::DensestSubgraph => (
            "Densest Subgraph",
            "Goldberg max-flow (undirected) / Charikar LP (directed)",
            "Exact",
            "O(n * m * log n)",
            None,
        ),
        ToolKind::KCoreDecomposition => (
            "K-Core Decomposition",
            "Batagelj-Zaversnik peeling",
            "Exact",
            "O(n + m)",
            None,
        ),
        ToolKind::BetweennessCentrality => (
            "Betweenness Centrality",
            "Brandes' algorithm",
            "Exact",
            "O(n * m)",
            None,
        ),
        ToolKind::Pagerank => (
            "PageRank",
            "Power iteration",
            "Converged to tolerance",
            "O(iterations * m)",
            None,
        ),
    };
    ToolMeta {
        display_name,
        algorithm,
        guarantee,
        complexity,
        notes,
    }
}

fn description(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::PtasKnapsack => {
            "Solve 0/1 knapsack with a (1+epsilon)-approximation. Faster than exact for large inputs."
        }
        ToolKind::ExactKnapsack => {
            "Solve 0/1 knapsack exactly by dynamic programming. Use only for small capacities."
        }
        ToolKind::BinPacking => {
            "Pack items into fixed-capacity bins using the First-Fit Decreasing heuristic. Returns bin assignments."
        }
        ToolKind::WeightedIntervalScheduling => {
            "Find the maximum-weight set of non-overlapping intervals via DP. Returns selected jobs and total weight."
        }
        ToolKind::SetCover => {
            "Find an approximate minimum-cost set cover using the greedy algorithm. O(ln n) approximation."
        }
        ToolKind::MaxCoverage => {
            "Select up to k subsets to maximize the number of covered elements. (1-1/e)-approximation."
        }
        ToolKind::WeightedBipartiteMatching => {
            "Find a maximum-weight matching in a bipartite graph. Exact solution via LP relaxation (integral for bipartite graphs). Use for assignment problems: workers to jobs, tasks to machines, etc."
        }
        ToolKind::MakespanScheduling => {
            "Schedule n jobs on m identical parallel machines to minimize makespan (the maximum machine load) using the LPT heuristic. (4/3 - 1/(3m))-approximation guarantee."
        }
        ToolKind::MixedIlp => {
            "Solve a mixed integer linear program formulated from natural language using JuMP + HiGHS."
        }
        ToolKind::InfluenceMaximization => {
            "Pick k seed nodes of a directed graph that maximize expected influence spread under the Independent Cascade model."
        }
        ToolKind::DensestSubgraph => {
            "Find the subgraph with maximum edge density (edges / nodes)."
        }
        ToolKind::KCoreDecomposition => {
            "Compute the core number of every node of an undirected graph."
        }
        ToolKind::BetweennessCentrality => {
            "Compute betweenness centrality for every node. Index i of the result is node i."
        }
        ToolKind::Pagerank => {
            "Compute PageRank scores for every node. Index i of the result is node i."
        }
    }
}

fn int_array(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "integer"}, "description": description})
}

fn number_array(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "number"}, "description": description})
}

fn edge_list(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "array", "items": {"type": "integer"}, "minItems": 2, "maxItems": 2},
        "description": description,
    })
}

fn subsets() -> Value {
    json!({
        "type": "array",
        "items": {"type": "array", "items": {"type": "integer"}},
        "description": "Collection of subsets (each is a list of element ids)",
    })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({"type": "object", "properties": properties, "required": required})
}

fn parameters(kind: ToolKind) -> Value {
    let knapsack = || {
        json!({
            "capacity": {"type": "integer", "description": "Knapsack capacity"},
            "weights": int_array("Weight of each item"),
            "values": int_array("Value of each item"),
            "labels": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Optional label for each item (e.g. item name)",
            },
        })
    };

    match kind {
        ToolKind::PtasKnapsack => {
            let mut properties = knapsack();
            properties["epsilon"] = json!({
                "type": "number",
                "description": "Approximation parameter in (0, 1), e.g. 0.1 for a 1.1-approximation. Defaults to 0.1.",
            });
            object(properties, &["capacity", "weights", "values"])
        }
        ToolKind::ExactKnapsack => object(knapsack(), &["capacity", "weights", "values"]),
        ToolKind::BinPacking => object(
            json!({
                "items": int_array("Size of each item"),
                "bin_capacity": {"type": "integer", "description": "Maximum capacity per bin"},
            }),
            &["items", "bin_capacity"],
        ),
        ToolKind::WeightedIntervalScheduling => object(
            json!({
                "start_times": int_array("Start time of each job"),
                "end_times": int_array("End time of each job"),
                "weights": int_array("Weight/value of each job"),
            }),
            &["start_times", "end_times", "weights"],
        ),
        ToolKind::SetCover => object(
            json!({
                "subsets": subsets(),
                "costs": number_array("Cost of each subset"),
            }),
            &["subsets", "costs"],
        ),
        ToolKind::MaxCoverage => object(
            json!({
                "subsets": subsets(),
                "k": {"type": "integer", "description": "Maximum number of subsets to select"},
            }),
            &["subsets", "k"],
        ),
        ToolKind::WeightedBipartiteMatching => object(
            json!({
                "left_nodes": int_array("Node IDs in the left partition (0-indexed). May overlap with right_nodes IDs; they are independent label spaces."),
                "right_nodes": int_array("Node IDs in the right partition (0-indexed). May overlap with left_nodes IDs; they are independent label spaces."),
                "edges": edge_list("List of [u, v] edges where u is a left node ID and v is a right node ID."),
                "weights": number_array("Optional weight per edge, parallel to the edges list. Defaults to 1.0 per edge."),
            }),
            &["left_nodes", "right_nodes", "edges"],
        ),
        ToolKind::MakespanScheduling => object(
            json!({
                "jobs": number_array("Processing time of each job"),
                "m": {"type": "integer", "description": "Number of machines, at most the number of jobs"},
            }),
            &["jobs", "m"],
        ),
        ToolKind::MixedIlp => object(
            json!({
                "variables": {
                    "type": "array",
                    "description": "Decision variables",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string", "description": "Variable name, e.g. x"},
                            "lower_bound": {"type": "number", "description": "Optional lower bound"},
                            "upper_bound": {"type": "number", "description": "Optional upper bound"},
                            "var_type": {
                                "type": "string",
                                "enum": ["continuous", "integer", "binary"],
                                "default": "continuous",
                            },
                        },
                        "required": ["name"],
                    },
                },
                "constraints": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Linear constraints using ASCII operators only (<=, >=, ==), e.g. ['2x + y <= 10', 'x + 3y <= 12']",
                },
                "objective": {
                    "type": "string",
                    "description": "Optional linear objective expression, e.g. '3x + 5y'. Omit for feasibility-only models.",
                },
                "sense": {
                    "type": "string",
                    "enum": ["Max", "Min"],
                    "default": "Max",
                },
            }),
            &["variables", "constraints"],
        ),
        ToolKind::InfluenceMaximization => object(
            json!({
                "edges": edge_list("Directed [u, v] edges (0-indexed node ids)."),
                "weights": {
                    "type": "object",
                    "additionalProperties": {"type": "number"},
                    "description": "Activation probability in [0, 1] for every edge, keyed \"u,v\".",
                },
                "k": {"type": "integer", "description": "Number of seed nodes"},
                "n_simulations": {
                    "type": "integer",
                    "description": "Monte Carlo simulations per estimate. Defaults to 10000.",
                },
            }),
            &["edges", "weights", "k"],
        ),
        ToolKind::DensestSubgraph => object(
            json!({
                "edges": edge_list("[u, v] edges (0-indexed node ids)."),
                "directed": {"type": "boolean", "default": false},
            }),
            &["edges"],
        ),
        ToolKind::KCoreDecomposition => object(
            json!({"edges": edge_list("Undirected [u, v] edges (0-indexed node ids).")}),
            &["edges"],
        ),
        ToolKind::BetweennessCentrality => object(
            json!({
                "edges": edge_list("Undirected [u, v] edges (0-indexed node ids)."),
                "normalized": {"type": "boolean", "default": true},
            }),
            &["edges"],
        ),
        ToolKind::Pagerank => object(
            json!({
                "edges": edge_list("[u, v] edges (0-indexed node ids)."),
                "alpha": {
                    "type": "number",
                    "description": "Damping factor in (0, 1). Defaults to 0.85.",
                },
            }),
            &["edges"],
        ),
    }
}
