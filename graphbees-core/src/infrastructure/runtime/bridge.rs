//! Translation between normalized tool inputs and the worker protocol.
//!
//! Outbound, 0-based ids become the worker's 1-based ids and bipartite
//! labels are remapped into one disjoint id space. Inbound, replies are
//! decoded into typed solutions, shifted back and checked against the input
//! they answer.

use super::handle::SolverRuntime;
use super::protocol::*;
use crate::domain::input::{
    BipartiteMatchingInput, Edge, KnapsackInput, MakespanInput, NodeId, ToolInput,
};
use crate::domain::solver::{RuntimeInfo, SolverBridge, SolverError, SolverErrorKind};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

#[async_trait]
impl SolverBridge for SolverRuntime {
    async fn solve(&self, input: &ToolInput) -> Result<Value, SolverError> {
        let tool = input.kind().name();
        let request = encode_request(input);
        let params = serde_json::to_value(&request).map_err(|err| {
            SolverError::new(tool, SolverErrorKind::Protocol, err.to_string())
        })?;

        let reply = self
            .solve_raw(params)
            .await
            .map_err(|err| SolverError::new(tool, err.solver_kind(), err.to_string()))?;

        decode_reply(input, reply)
    }

    fn runtime_info(&self) -> Option<RuntimeInfo> {
        self.info().cloned()
    }
}

pub(crate) fn encode_request(input: &ToolInput) -> SolveRequest {
    match input {
        ToolInput::PtasKnapsack { problem, epsilon } => {
            SolveRequest::PtasKnapsack(PtasKnapsackParams {
                capacity: problem.capacity,
                epsilon: *epsilon,
                weights: problem.weights(),
                values: problem.values(),
            })
        }
        ToolInput::ExactKnapsack(problem) => SolveRequest::ExactKnapsack(KnapsackParams {
            capacity: problem.capacity,
            weights: problem.weights(),
            values: problem.values(),
        }),
        ToolInput::BinPacking(input) => SolveRequest::BinPacking(BinPackingParams {
            items: input.items.clone(),
            bin_capacity: input.bin_capacity,
        }),
        ToolInput::WeightedIntervalScheduling(input) => {
            SolveRequest::WeightedIntervalScheduling(IntervalParams {
                start_times: input.jobs.iter().map(|job| job.start).collect(),
                end_times: input.jobs.iter().map(|job| job.end).collect(),
                weights: input.jobs.iter().map(|job| job.weight).collect(),
            })
        }
        ToolInput::SetCover(input) => SolveRequest::SetCover(SetCoverParams {
            subsets: input.subsets.clone(),
            costs: input.costs.clone(),
        }),
        ToolInput::MaxCoverage(input) => SolveRequest::MaxCoverage(MaxCoverageParams {
            subsets: input.subsets.clone(),
            k: input.k,
        }),
        ToolInput::WeightedBipartiteMatching(input) => {
            SolveRequest::WeightedBipartiteMatching(BipartiteLabels::new(input).params(input))
        }
        ToolInput::MakespanScheduling(input) => SolveRequest::MakespanScheduling(MakespanParams {
            jobs: input.jobs.clone(),
            m: input.machines,
        }),
        ToolInput::MixedIlp(input) => SolveRequest::MixedIlp(MixedIlpParams {
            variables: input.variables.clone(),
            constraints: input.constraints.clone(),
            objective: input.objective.clone(),
            sense: input.sense.as_str(),
        }),
        ToolInput::InfluenceMaximization(input) => {
            SolveRequest::InfluenceMaximization(InfluenceParams {
                node_count: node_count(&input.edges),
                edges: one_based(&input.edges),
                weights: input
                    .probabilities
                    .iter()
                    .map(|(&(u, v), &p)| (u as u64 + 1, v as u64 + 1, p))
                    .collect(),
                k: input.k,
                greedy_samples: INFLUENCE_GREEDY_SAMPLES,
                n_simulations: input.n_simulations,
            })
        }
        ToolInput::DensestSubgraph(input) => SolveRequest::DensestSubgraph(DensestParams {
            node_count: node_count(&input.edges),
            edges: one_based(&input.edges),
            directed: input.directed,
        }),
        ToolInput::KCoreDecomposition(input) => SolveRequest::KCoreDecomposition(GraphParams {
            node_count: node_count(&input.edges),
            edges: one_based(&input.edges),
        }),
        ToolInput::BetweennessCentrality(input) => {
            SolveRequest::BetweennessCentrality(BetweennessParams {
                node_count: node_count(&input.edges),
                edges: one_based(&input.edges),
                normalized: input.normalized,
            })
        }
        ToolInput::Pagerank(input) => SolveRequest::Pagerank(PagerankParams {
            node_count: node_count(&input.edges),
            edges: one_based(&input.edges),
            alpha: input.alpha,
        }),
    }
}

pub(crate) fn decode_reply(input: &ToolInput, reply: Value) -> Result<Value, SolverError> {
    let decoder = Decoder {
        tool: input.kind().name(),
    };
    match input {
        ToolInput::PtasKnapsack { problem, .. } | ToolInput::ExactKnapsack(problem) => {
            decoder.knapsack(problem, decoder.parse(reply)?)
        }
        ToolInput::BinPacking(input) => {
            let reply: BinPackingReply = decoder.parse(reply)?;
            let bins = reply
                .bins
                .into_iter()
                .map(|bin| decoder.indices(bin, input.items.len()))
                .collect::<Result<Vec<_>, _>>()?;
            decoder.emit(BinPackingSolution {
                num_bins: reply.num_bins,
                bins,
            })
        }
        ToolInput::WeightedIntervalScheduling(input) => {
            let reply: SelectionReply<u64> = decoder.parse(reply)?;
            decoder.emit(IntervalSolution {
                max_weight: reply.objective,
                selected_jobs: decoder.indices(reply.selected, input.jobs.len())?,
            })
        }
        ToolInput::SetCover(input) => {
            let reply: SelectionReply<f64> = decoder.parse(reply)?;
            decoder.emit(SetCoverSolution {
                total_cost: reply.objective,
                selected_subsets: decoder.indices(reply.selected, input.subsets.len())?,
            })
        }
        ToolInput::MaxCoverage(input) => {
            let reply: SelectionReply<u64> = decoder.parse(reply)?;
            decoder.emit(MaxCoverageSolution {
                num_covered: reply.objective,
                selected_subsets: decoder.indices(reply.selected, input.subsets.len())?,
            })
        }
        ToolInput::WeightedBipartiteMatching(input) => {
            let reply: MatchingReply = decoder.parse(reply)?;
            let labels = BipartiteLabels::new(input);
            let matched_edges = reply
                .matched
                .into_iter()
                .map(|[a, b]| {
                    labels
                        .original(a, b)
                        .ok_or_else(|| decoder.error(format!("unknown matched edge [{a}, {b}]")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            decoder.emit(MatchingSolution {
                total_weight: reply.total_weight,
                matched_edges,
            })
        }
        ToolInput::MakespanScheduling(input) => decoder.makespan(input, decoder.parse(reply)?),
        ToolInput::MixedIlp(input) => {
            let reply: MixedIlpReply = decoder.parse(reply)?;
            let mode = if input.objective.is_some() {
                "optimization"
            } else {
                "feasibility"
            };
            decoder.emit(MixedIlpSolution {
                status: reply.status,
                mode,
                objective_value: reply.objective_value,
                variable_values: reply.variable_values,
            })
        }
        ToolInput::InfluenceMaximization(input) => {
            let reply: InfluenceReply = decoder.parse(reply)?;
            decoder.emit(InfluenceSolution {
                seed_nodes: decoder.nodes(reply.seeds, &input.edges)?,
                expected_spread: reply.spread,
            })
        }
        ToolInput::DensestSubgraph(input) => {
            let reply: DensestReply = decoder.parse(reply)?;
            decoder.emit(DensestSolution {
                nodes: decoder.nodes(reply.nodes, &input.edges)?,
                density: reply.density,
            })
        }
        ToolInput::KCoreDecomposition(input) => {
            let reply: CoreReply = decoder.parse(reply)?;
            let mut cores = reply
                .core_numbers
                .into_iter()
                .map(|[node, core]| -> Result<[u64; 2], SolverError> {
                    Ok([decoder.node(node, &input.edges)? as u64, core])
                })
                .collect::<Result<Vec<_>, _>>()?;
            cores.sort_unstable();
            decoder.emit(cores)
        }
        ToolInput::BetweennessCentrality(input) => {
            decoder.scores(decoder.parse(reply)?, &input.edges)
        }
        ToolInput::Pagerank(input) => decoder.scores(decoder.parse(reply)?, &input.edges),
    }
}

fn one_based(edges: &[Edge]) -> Vec<WireEdge> {
    edges
        .iter()
        .map(|&(u, v)| [u as u64 + 1, v as u64 + 1])
        .collect()
}

/// Highest 0-based id plus one; the worker builds a graph on `1..=count`.
fn node_count(edges: &[Edge]) -> u64 {
    edges
        .iter()
        .map(|&(u, v)| u.max(v) as u64 + 1)
        .max()
        .unwrap_or(0)
}

/// Left label `i`-th in declaration order maps to `i + 1`; right labels
/// continue after the last left id.
struct BipartiteLabels {
    left: HashMap<NodeId, u64>,
    right: HashMap<NodeId, u64>,
    inverse_left: HashMap<u64, NodeId>,
    inverse_right: HashMap<u64, NodeId>,
}

impl BipartiteLabels {
    fn new(input: &BipartiteMatchingInput) -> Self {
        let offset = input.left_nodes.len() as u64;
        let left: HashMap<NodeId, u64> = input
            .left_nodes
            .iter()
            .enumerate()
            .map(|(i, &label)| (label, i as u64 + 1))
            .collect();
        let right: HashMap<NodeId, u64> = input
            .right_nodes
            .iter()
            .enumerate()
            .map(|(i, &label)| (label, offset + i as u64 + 1))
            .collect();
        let inverse_left = left.iter().map(|(&label, &id)| (id, label)).collect();
        let inverse_right = right.iter().map(|(&label, &id)| (id, label)).collect();
        Self {
            left,
            right,
            inverse_left,
            inverse_right,
        }
    }

    fn params(&self, input: &BipartiteMatchingInput) -> BipartiteParams {
        let mut edges = Vec::with_capacity(input.edges.len());
        let mut weights = Vec::with_capacity(input.edges.len());
        for (&(u, v), &weight) in input.edges.iter().zip(&input.weights) {
            // The normalizer guarantees every endpoint is declared.
            let (Some(&a), Some(&b)) = (self.left.get(&u), self.right.get(&v)) else {
                continue;
            };
            edges.push([a, b]);
            weights.push((a, b, weight));
        }
        let mut left: Vec<u64> = self.left.values().copied().collect();
        let mut right: Vec<u64> = self.right.values().copied().collect();
        left.sort_unstable();
        right.sort_unstable();
        BipartiteParams {
            node_count: (input.left_nodes.len() + input.right_nodes.len()) as u64,
            left,
            right,
            edges,
            weights,
        }
    }

    /// Undirected edges may come back in either orientation.
    fn original(&self, a: u64, b: u64) -> Option<[NodeId; 2]> {
        if let (Some(&l), Some(&r)) = (self.inverse_left.get(&a), self.inverse_right.get(&b)) {
            return Some([l, r]);
        }
        match (self.inverse_left.get(&b), self.inverse_right.get(&a)) {
            (Some(&l), Some(&r)) => Some([l, r]),
            _ => None,
        }
    }
}

struct Decoder {
    tool: &'static str,
}

impl Decoder {
    fn error(&self, message: impl Into<String>) -> SolverError {
        SolverError::new(self.tool, SolverErrorKind::Protocol, message)
    }

    fn parse<T: DeserializeOwned>(&self, reply: Value) -> Result<T, SolverError> {
        serde_json::from_value(reply)
            .map_err(|err| self.error(format!("unexpected worker reply: {err}")))
    }

    fn emit<T: Serialize>(&self, solution: T) -> Result<Value, SolverError> {
        serde_json::to_value(solution).map_err(|err| self.error(err.to_string()))
    }

    /// 1-based positions into a collection of `len` elements, shifted to 0-based.
    fn indices(&self, raw: Vec<u64>, len: usize) -> Result<Vec<usize>, SolverError> {
        raw.into_iter()
            .map(|index| match usize::try_from(index) {
                Ok(index) if (1..=len).contains(&index) => Ok(index - 1),
                _ => Err(self.error(format!("index {index} is outside 1..={len}"))),
            })
            .collect()
    }

    fn node(&self, raw: u64, edges: &[Edge]) -> Result<NodeId, SolverError> {
        let count = node_count(edges);
        if raw == 0 || raw > count {
            return Err(self.error(format!("node {raw} is outside 1..={count}")));
        }
        NodeId::try_from(raw - 1).map_err(|err| self.error(err.to_string()))
    }

    fn nodes(&self, raw: Vec<u64>, edges: &[Edge]) -> Result<Vec<NodeId>, SolverError> {
        raw.into_iter().map(|node| self.node(node, edges)).collect()
    }

    fn knapsack(
        &self,
        problem: &KnapsackInput,
        reply: SelectionReply<u64>,
    ) -> Result<Value, SolverError> {
        let items = self.indices(reply.selected, problem.items.len())?;
        let mut seen = HashSet::with_capacity(items.len());
        if let Some(&repeated) = items.iter().find(|&&i| !seen.insert(i)) {
            return Err(self.error(format!("item {} selected more than once", repeated + 1)));
        }
        let total_weight = items
            .iter()
            .try_fold(0u64, |total, &i| total.checked_add(problem.items[i].weight))
            .ok_or_else(|| self.error("selected weight overflows u64"))?;
        if total_weight > problem.capacity {
            return Err(self.error(format!(
                "selected weight {total_weight} exceeds capacity {}",
                problem.capacity
            )));
        }
        let selected_labels = problem
            .labels
            .as_ref()
            .map(|labels| items.iter().map(|&i| labels[i].clone()).collect());
        self.emit(KnapsackSolution {
            value: reply.objective,
            items,
            total_weight,
            capacity: problem.capacity,
            selected_labels,
        })
    }

    fn makespan(&self, input: &MakespanInput, reply: MakespanReply) -> Result<Value, SolverError> {
        if reply.assignments.len() != input.jobs.len() {
            return Err(self.error(format!(
                "{} assignments for {} jobs",
                reply.assignments.len(),
                input.jobs.len()
            )));
        }
        let machine_count = input.machines as usize;
        if machine_count > input.jobs.len() {
            return Err(self.error(format!(
                "{machine_count} machines for {} jobs",
                input.jobs.len()
            )));
        }
        let assignments = self.indices(reply.assignments, machine_count)?;
        let mut machines = vec![Vec::new(); machine_count];
        for (job, &machine) in assignments.iter().enumerate() {
            machines[machine].push(job);
        }
        self.emit(MakespanSolution {
            makespan: reply.makespan,
            assignments,
            machines,
        })
    }

    fn scores(&self, reply: ScoresReply, edges: &[Edge]) -> Result<Value, SolverError> {
        let expected = node_count(edges) as usize;
        if reply.scores.len() != expected {
            return Err(self.error(format!(
                "{} scores for {expected} nodes",
                reply.scores.len()
            )));
        }
        self.emit(reply.scores)
    }
}

#[derive(Serialize)]
struct KnapsackSolution {
    value: u64,
    items: Vec<usize>,
    total_weight: u64,
    capacity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_labels: Option<Vec<String>>,
}

#[derive(Serialize)]
struct BinPackingSolution {
    num_bins: u64,
    bins: Vec<Vec<usize>>,
}

#[derive(Serialize)]
struct IntervalSolution {
    max_weight: u64,
    selected_jobs: Vec<usize>,
}

#[derive(Serialize)]
struct SetCoverSolution {
    total_cost: f64,
    selected_subsets: Vec<usize>,
}

#[derive(Serialize)]
struct MaxCoverageSolution {
    num_covered: u64,
    selected_subsets: Vec<usize>,
}

#[derive(Serialize)]
struct MatchingSolution {
    total_weight: f64,
    matched_edges: Vec<[NodeId; 2]>,
}

#[derive(Serialize)]
struct MakespanSolution {
    makespan: f64,
    assignments: Vec<usize>,
    machines: Vec<Vec<usize>>,
}

#[derive(Serialize)]
struct MixedIlpSolution {
    status: String,
    mode: &'static str,
    objective_value: Option<f64>,
    variable_values: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct InfluenceSolution {
    seed_nodes: Vec<NodeId>,
    expected_spread: f64,
}

#[derive(Serialize)]
struct DensestSolution {
    nodes: Vec<NodeId>,
    density: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::input::{GraphInput, KnapsackItem, PagerankInput};
    use serde_json::json;

    fn knapsack() -> KnapsackInput {
        KnapsackInput {
            capacity: 5,
            items: vec![
                KnapsackItem { weight: 2, value: 3 },
                KnapsackItem { weight: 3, value: 4 },
                KnapsackItem { weight: 4, value: 5 },
            ],
            labels: Some(vec!["tent".into(), "stove".into(), "rope".into()]),
        }
    }

    #[test]
    fn graph_requests_are_one_based() {
        let input = ToolInput::Pagerank(PagerankInput {
            edges: vec![(0, 1), (1, 2)],
            alpha: 0.85,
        });
        let encoded = serde_json::to_value(encode_request(&input)).expect("serializes");
        assert_eq!(
            encoded,
            json!({
                "algorithm": "pagerank",
                "input": {"node_count": 3, "edges": [[1, 2], [2, 3]], "alpha": 0.85}
            })
        );
    }

    #[test]
    fn knapsack_reply_is_shifted_and_labelled() {
        let input = ToolInput::ExactKnapsack(knapsack());
        let value = decode_reply(&input, json!({"objective": 7, "selected": [1, 2]})).expect("ok");
        assert_eq!(value["items"], json!([0, 1]));
        assert_eq!(value["total_weight"], 5);
        assert_eq!(value["selected_labels"], json!(["tent", "stove"]));
    }

    #[test]
    fn out_of_range_indices_are_protocol_errors() {
        let input = ToolInput::ExactKnapsack(knapsack());
        let err = decode_reply(&input, json!({"objective": 7, "selected": [0]})).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::Protocol);
    }

    #[test]
    fn knapsack_selection_must_be_distinct_and_fit() {
        let input = ToolInput::ExactKnapsack(knapsack());
        let err = decode_reply(&input, json!({"objective": 6, "selected": [1, 1]})).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::Protocol);

        let err = decode_reply(&input, json!({"objective": 9, "selected": [2, 3]})).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::Protocol);
        assert!(err.message.contains("exceeds capacity"), "{}", err.message);

        let heavy = ToolInput::ExactKnapsack(KnapsackInput {
            capacity: u64::MAX,
            items: vec![
                KnapsackItem { weight: u64::MAX, value: 1 },
                KnapsackItem { weight: 1, value: 1 },
            ],
            labels: None,
        });
        let err = decode_reply(&heavy, json!({"objective": 2, "selected": [1, 2]})).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::Protocol);
    }

    #[test]
    fn bipartite_labels_are_disjoint_and_restored() {
        let matching = BipartiteMatchingInput {
            left_nodes: vec![0, 1],
            right_nodes: vec![0, 1],
            edges: vec![(0, 1), (1, 0)],
            weights: vec![2.0, 3.0],
        };
        let labels = BipartiteLabels::new(&matching);
        let params = labels.params(&matching);
        assert_eq!(params.node_count, 4);
        assert_eq!(params.edges, vec![[1, 4], [2, 3]]);

        let input = ToolInput::WeightedBipartiteMatching(matching);
        let value = decode_reply(
            &input,
            json!({"total_weight": 5.0, "matched": [[1, 4], [3, 2]]}),
        )
        .expect("ok");
        assert_eq!(value["matched_edges"], json!([[0, 1], [1, 0]]));
    }

    #[test]
    fn makespan_groups_jobs_by_machine() {
        let input = ToolInput::MakespanScheduling(MakespanInput {
            jobs: vec![3.0, 2.0, 2.0],
            machines: 2,
        });
        let value = decode_reply(
            &input,
            json!({"makespan": 4.0, "assignments": [1, 2, 2]}),
        )
        .expect("ok");
        assert_eq!(value["assignments"], json!([0, 1, 1]));
        assert_eq!(value["machines"], json!([[0], [1, 2]]));
    }

    #[test]
    fn makespan_with_more_machines_than_jobs_is_refused() {
        let input = ToolInput::MakespanScheduling(MakespanInput {
            jobs: vec![1.0, 2.0],
            machines: 4_000_000_000,
        });
        let err = decode_reply(&input, json!({"makespan": 2.0, "assignments": [1, 2]}))
            .unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::Protocol);
    }

    #[test]
    fn core_numbers_become_sorted_pairs() {
        let input = ToolInput::KCoreDecomposition(GraphInput {
            edges: vec![(0, 1), (1, 2), (0, 2), (2, 3)],
        });
        let value = decode_reply(
            &input,
            json!({"core_numbers": [[4, 1], [1, 2], [3, 2], [2, 2]]}),
        )
        .expect("ok");
        assert_eq!(value, json!([[0, 2], [1, 2], [2, 2], [3, 1]]));
    }
}
