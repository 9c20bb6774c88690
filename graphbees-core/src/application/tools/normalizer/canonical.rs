use super::ilp::{render_constraint, render_terms, variable_to_json};
use crate::domain::input::{Edge, ToolInput};
use serde_json::{Map, Value, json};

fn edges_json(edges: &[Edge]) -> Value {
    Value::Array(edges.iter().map(|&(u, v)| json!([u, v])).collect())
}

impl ToolInput {
    /// Canonical argument object for this input.
    ///
    /// Feeding the result back through the normalizer yields an equal
    /// `ToolInput`. Defaults are spelled out explicitly.
    pub fn to_arguments(&self) -> Value {
        match self {
            ToolInput::PtasKnapsack { problem, epsilon } => {
                let mut args = knapsack_json(problem);
                args.insert("epsilon".into(), json!(epsilon));
                Value::Object(args)
            }
            ToolInput::ExactKnapsack(problem) => Value::Object(knapsack_json(problem)),
            ToolInput::BinPacking(input) => json!({
                "items": input.items,
                "bin_capacity": input.bin_capacity,
            }),
            ToolInput::WeightedIntervalScheduling(input) => json!({
                "start_times": input.jobs.iter().map(|job| job.start).collect::<Vec<_>>(),
                "end_times": input.jobs.iter().map(|job| job.end).collect::<Vec<_>>(),
                "weights": input.jobs.iter().map(|job| job.weight).collect::<Vec<_>>(),
            }),
            ToolInput::SetCover(input) => json!({
                "subsets": input.subsets,
                "costs": input.costs,
            }),
            ToolInput::MaxCoverage(input) => json!({
                "subsets": input.subsets,
                "k": input.k,
            }),
            ToolInput::WeightedBipartiteMatching(input) => json!({
                "left_nodes": input.left_nodes,
                "right_nodes": input.right_nodes,
                "edges": edges_json(&input.edges),
                "weights": input.weights,
            }),
            ToolInput::MakespanScheduling(input) => json!({
                "jobs": input.jobs,
                "m": input.machines,
            }),
            ToolInput::MixedIlp(input) => {
                let mut args = Map::new();
                args.insert(
                    "variables".into(),
                    Value::Array(input.variables.iter().map(variable_to_json).collect()),
                );
                args.insert(
                    "constraints".into(),
                    Value::Array(
                        input
                            .constraints
                            .iter()
                            .map(|constraint| Value::String(render_constraint(constraint)))
                            .collect(),
                    ),
                );
                if let Some(objective) = &input.objective {
                    args.insert(
                        "objective".into(),
                        Value::String(render_terms(&objective.terms, objective.constant)),
                    );
                }
                args.insert("sense".into(), input.sense.as_str().into());
                Value::Object(args)
            }
            ToolInput::InfluenceMaximization(input) => {
                let weights: Map<String, Value> = input
                    .probabilities
                    .iter()
                    .map(|(&(u, v), &p)| (format!("{u},{v}"), json!(p)))
                    .collect();
                json!({
                    "edges": edges_json(&input.edges),
                    "weights": weights,
                    "k": input.k,
                    "n_simulations": input.n_simulations,
                })
            }
            ToolInput::DensestSubgraph(input) => json!({
                "edges": edges_json(&input.edges),
                "directed": input.directed,
            }),
            ToolInput::KCoreDecomposition(input) => json!({
                "edges": edges_json(&input.edges),
            }),
            ToolInput::BetweennessCentrality(input) => json!({
                "edges": edges_json(&input.edges),
                "normalized": input.normalized,
            }),
            ToolInput::Pagerank(input) => json!({
                "edges": edges_json(&input.edges),
                "alpha": input.alpha,
            }),
        }
    }
}

fn knapsack_json(problem: &crate::domain::input::KnapsackInput) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("capacity".into(), json!(problem.capacity));
    args.insert("weights".into(), json!(problem.weights()));
    args.insert("values".into(), json!(problem.values()));
    if let Some(labels) = &problem.labels {
        args.insert("labels".into(), json!(labels));
    }
    args
}
