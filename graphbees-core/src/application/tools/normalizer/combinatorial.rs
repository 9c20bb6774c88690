use super::graph::{parse_weight_map, vertex};
use super::reader::{Args, as_array, as_f64, as_u64};
use super::ValidationError;
use crate::domain::input::{
    BinPackingInput, BipartiteMatchingInput, Edge, Interval, IntervalSchedulingInput,
    KnapsackInput, KnapsackItem, MakespanInput, MaxCoverageInput, NodeId, SetCoverInput,
};
use serde_json::Value;
use std::collections::HashSet;

pub(super) const DEFAULT_EPSILON: f64 = 0.1;

fn non_empty<T>(field: &'static str, items: Vec<T>) -> Result<Vec<T>, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(items)
}

fn same_length(
    field: &'static str,
    found: usize,
    reference: &'static str,
    expected: usize,
) -> Result<(), ValidationError> {
    if found != expected {
        return Err(ValidationError::new(
            field,
            format!("has {found} entries but {reference} has {expected}"),
        ));
    }
    Ok(())
}

fn positive(field: &'static str, value: u64) -> Result<u64, ValidationError> {
    if value == 0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(value)
}

pub(super) fn knapsack(args: &Args<'_>) -> Result<KnapsackInput, ValidationError> {
    let capacity = positive("capacity", args.u64("capacity")?)?;
    let weights = non_empty("weights", args.u64_array("weights")?)?;
    let values = args.u64_array("values")?;
    same_length("values", values.len(), "weights", weights.len())?;

    let labels = match args.optional("labels") {
        None => None,
        Some(raw) => {
            let labels = as_array("labels", raw)?
                .iter()
                .map(|label| match label {
                    Value::String(text) => Ok(text.clone()),
                    Value::Number(number) => Ok(number.to_string()),
                    _ => Err(ValidationError::new("labels", "labels must be strings")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            same_length("labels", labels.len(), "weights", weights.len())?;
            Some(labels)
        }
    };

    let items = weights
        .into_iter()
        .zip(values)
        .map(|(weight, value)| KnapsackItem { weight, value })
        .collect();
    Ok(KnapsackInput {
        capacity,
        items,
        labels,
    })
}

pub(super) fn epsilon(args: &Args<'_>) -> Result<f64, ValidationError> {
    let epsilon = args.opt_f64("epsilon")?.unwrap_or(DEFAULT_EPSILON);
    if !(epsilon > 0.0 && epsilon < 1.0) {
        return Err(ValidationError::new(
            "epsilon",
            format!("must be in (0, 1), got {epsilon}"),
        ));
    }
    Ok(epsilon)
}

pub(super) fn bin_packing(args: &Args<'_>) -> Result<BinPackingInput, ValidationError> {
    let bin_capacity = positive("bin_capacity", args.u64("bin_capacity")?)?;
    let items = non_empty("items", args.u64_array("items")?)?;
    for (index, &size) in items.iter().enumerate() {
        if size == 0 {
            return Err(ValidationError::new(
                "items",
                format!("item {index} has size 0; sizes must be positive"),
            ));
        }
        if size > bin_capacity {
            return Err(ValidationError::new(
                "items",
                format!(
                    "item {index} has size {size}, larger than the bin capacity {bin_capacity}, so it cannot be packed"
                ),
            ));
        }
    }
    Ok(BinPackingInput {
        items,
        bin_capacity,
    })
}

pub(super) fn interval_scheduling(
    args: &Args<'_>,
) -> Result<IntervalSchedulingInput, ValidationError> {
    let starts = non_empty("start_times", args.i64_array("start_times")?)?;
    let ends = args.i64_array("end_times")?;
    let weights = args.u64_array("weights")?;
    same_length("end_times", ends.len(), "start_times", starts.len())?;
    same_length("weights", weights.len(), "start_times", starts.len())?;

    let jobs = starts
        .into_iter()
        .zip(ends)
        .zip(weights)
        .enumerate()
        .map(|(index, ((start, end), weight))| {
            if start >= end {
                return Err(ValidationError::new(
                    "end_times",
                    format!("job {index} ends at {end}, not after its start {start}"),
                ));
            }
            Ok(Interval { start, end, weight })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IntervalSchedulingInput { jobs })
}

fn subsets(args: &Args<'_>) -> Result<Vec<Vec<u32>>, ValidationError> {
    const FIELD: &str = "subsets";
    let raw = args.array(FIELD)?;
    if raw.is_empty() {
        return Err(ValidationError::new(FIELD, "must not be empty"));
    }
    raw.iter()
        .enumerate()
        .map(|(index, subset)| {
            let mut elements = as_array(FIELD, subset)?
                .iter()
                .map(|element| {
                    let id = as_u64(FIELD, element)?;
                    u32::try_from(id).map_err(|_| {
                        ValidationError::new(FIELD, format!("element id {id} is too large"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if elements.is_empty() {
                return Err(ValidationError::new(
                    FIELD,
                    format!("subset {index} is empty"),
                ));
            }
            elements.sort_unstable();
            elements.dedup();
            Ok(elements)
        })
        .collect()
}

pub(super) fn set_cover(args: &Args<'_>) -> Result<SetCoverInput, ValidationError> {
    let subsets = subsets(args)?;
    let costs = args.f64_array("costs")?;
    same_length("costs", costs.len(), "subsets", subsets.len())?;
    if let Some((index, cost)) = costs.iter().enumerate().find(|(_, cost)| **cost < 0.0) {
        return Err(ValidationError::new(
            "costs",
            format!("subset {index} has negative cost {cost}"),
        ));
    }
    Ok(SetCoverInput { subsets, costs })
}

pub(super) fn max_coverage(args: &Args<'_>) -> Result<MaxCoverageInput, ValidationError> {
    let subsets = subsets(args)?;
    let k = args.u32("k")?;
    if k == 0 {
        return Err(ValidationError::new("k", "must be at least 1"));
    }
    Ok(MaxCoverageInput { subsets, k })
}

fn node_side(args: &Args<'_>, field: &'static str) -> Result<Vec<NodeId>, ValidationError> {
    let nodes = non_empty(
        field,
        args.array(field)?
            .iter()
            .map(|value| vertex(field, value))
            .collect::<Result<Vec<_>, _>>()?,
    )?;
    let mut seen = HashSet::with_capacity(nodes.len());
    if let Some(duplicate) = nodes.iter().find(|node| !seen.insert(**node)) {
        return Err(ValidationError::new(
            field,
            format!("node {duplicate} is listed twice"),
        ));
    }
    Ok(nodes)
}

pub(super) fn bipartite_matching(
    args: &Args<'_>,
) -> Result<BipartiteMatchingInput, ValidationError> {
    const FIELD: &str = "edges";
    let left_nodes = node_side(args, "left_nodes")?;
    let right_nodes = node_side(args, "right_nodes")?;
    let left: HashSet<NodeId> = left_nodes.iter().copied().collect();
    let right: HashSet<NodeId> = right_nodes.iter().copied().collect();

    let raw_edges = args.array(FIELD)?;
    if raw_edges.is_empty() {
        return Err(ValidationError::new(FIELD, "must contain at least one edge"));
    }
    let mut seen = HashSet::with_capacity(raw_edges.len());
    let edges = raw_edges
        .iter()
        .map(|raw| {
            let (u, v): Edge = match as_array(FIELD, raw)?.as_slice() {
                [u, v] => (vertex(FIELD, u)?, vertex(FIELD, v)?),
                _ => {
                    return Err(ValidationError::new(
                        FIELD,
                        "each edge must be a [left, right] pair",
                    ));
                }
            };
            if !left.contains(&u) {
                return Err(ValidationError::new(
                    FIELD,
                    format!("edge [{u}, {v}] starts at {u}, which is not a left node"),
                ));
            }
            if !right.contains(&v) {
                return Err(ValidationError::new(
                    FIELD,
                    format!("edge [{u}, {v}] ends at {v}, which is not a right node"),
                ));
            }
            if !seen.insert((u, v)) {
                return Err(ValidationError::new(
                    FIELD,
                    format!("duplicate edge [{u}, {v}]"),
                ));
            }
            Ok((u, v))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let weights = match args.optional("weights") {
        None => vec![1.0; edges.len()],
        Some(Value::Array(values)) => {
            let weights = values
                .iter()
                .map(|value| as_f64("weights", value))
                .collect::<Result<Vec<_>, _>>()?;
            same_length("weights", weights.len(), "edges", edges.len())?;
            weights
        }
        Some(map @ Value::Object(_)) => {
            let by_edge = parse_weight_map(map, &edges)?;
            edges
                .iter()
                .map(|edge| by_edge.get(edge).copied().unwrap_or(1.0))
                .collect()
        }
        Some(_) => {
            return Err(ValidationError::new(
                "weights",
                "must be an array parallel to edges or an object keyed by \"u,v\"",
            ));
        }
    };

    Ok(BipartiteMatchingInput {
        left_nodes,
        right_nodes,
        edges,
        weights,
    })
}

pub(super) fn makespan(args: &Args<'_>) -> Result<MakespanInput, ValidationError> {
    let jobs = non_empty(
        "jobs",
        args.array("jobs")?
            .iter()
            .map(|value| as_f64("jobs", value))
            .collect::<Result<Vec<_>, _>>()?,
    )?;
    if let Some((index, time)) = jobs.iter().enumerate().find(|(_, time)| **time < 0.0) {
        return Err(ValidationError::new(
            "jobs",
            format!("job {index} has negative processing time {time}"),
        ));
    }
    let machines = args.u32("m")?;
    if machines == 0 {
        return Err(ValidationError::new("m", "at least one machine is required"));
    }
    if machines as usize > jobs.len() {
        return Err(ValidationError::new(
            "m",
            format!(
                "{machines} machines exceeds the {} jobs to schedule",
                jobs.len()
            ),
        ));
    }
    Ok(MakespanInput { jobs, machines })
}
