use super::reader::{Args, as_array, as_i64, as_f64, preview};
use super::{MAX_VERTEX_ID, ValidationError};
use crate::domain::input::{
    BetweennessInput, DensestSubgraphInput, Edge, GraphInput, InfluenceInput, NodeId,
    PagerankInput, WeightMap,
};
use serde_json::Value;
use std::collections::HashSet;

pub(super) const DEFAULT_SIMULATIONS: u32 = 10_000;
pub(super) const MAX_SIMULATIONS: u32 = 1_000_000;
pub(super) const DEFAULT_ALPHA: f64 = 0.85;

pub(super) fn vertex(field: &'static str, value: &Value) -> Result<NodeId, ValidationError> {
    let id = as_i64(field, value)?;
    if id < 0 {
        return Err(ValidationError::new(
            field,
            format!("vertex ids must be non-negative, got {id}"),
        ));
    }
    if id > i64::from(MAX_VERTEX_ID) {
        return Err(ValidationError::new(
            field,
            format!("vertex id {id} exceeds the maximum of {MAX_VERTEX_ID}"),
        ));
    }
    Ok(id as NodeId)
}

fn pair(field: &'static str, value: &Value) -> Result<Edge, ValidationError> {
    match as_array(field, value)?.as_slice() {
        [u, v] => Ok((vertex(field, u)?, vertex(field, v)?)),
        _ => Err(ValidationError::new(
            field,
            format!("each edge must be a [u, v] pair, got {}", preview(value)),
        )),
    }
}

/// Parses a non-empty simple edge list.
///
/// Self-loops are rejected, as are repeated pairs; for undirected graphs
/// `[v, u]` repeats `[u, v]`.
pub(super) fn edge_list(
    field: &'static str,
    value: &Value,
    directed: bool,
) -> Result<Vec<Edge>, ValidationError> {
    let raw = as_array(field, value)?;
    if raw.is_empty() {
        return Err(ValidationError::new(field, "must contain at least one edge"));
    }
    let mut seen = HashSet::with_capacity(raw.len());
    raw.iter()
        .map(|item| {
            let (u, v) = pair(field, item)?;
            if u == v {
                return Err(ValidationError::new(
                    field,
                    format!("self-loop on vertex {u} is not allowed"),
                ));
            }
            let key = if directed { (u, v) } else { (u.min(v), u.max(v)) };
            if !seen.insert(key) {
                return Err(ValidationError::new(
                    field,
                    format!("duplicate edge [{u}, {v}]"),
                ));
            }
            Ok((u, v))
        })
        .collect()
}

/// Parses a `{"u,v": weight}` object into a pair-keyed map.
///
/// Every key must name a pair present in `edges`. Errors are always reported
/// against the `weights` field.
pub fn parse_weight_map(raw: &Value, edges: &[Edge]) -> Result<WeightMap, ValidationError> {
    const FIELD: &str = "weights";
    let Value::Object(entries) = raw else {
        return Err(ValidationError::new(
            FIELD,
            "must be an object keyed by \"u,v\"",
        ));
    };
    let declared: HashSet<Edge> = edges.iter().copied().collect();

    let mut weights = WeightMap::new();
    for (key, value) in entries {
        let edge = weight_key(key).ok_or_else(|| {
            ValidationError::new(
                FIELD,
                format!("key '{key}' is not of the form \"u,v\" with integer vertices"),
            )
        })?;
        if !declared.contains(&edge) {
            return Err(ValidationError::new(
                FIELD,
                format!("key '{key}' does not match any declared edge"),
            ));
        }
        weights.insert(edge, as_f64(FIELD, value)?);
    }
    Ok(weights)
}

fn weight_key(key: &str) -> Option<Edge> {
    let (u, v) = key.split_once(',')?;
    let u: i64 = u.trim().parse().ok()?;
    let v: i64 = v.trim().parse().ok()?;
    let bound = i64::from(MAX_VERTEX_ID);
    if !(0..=bound).contains(&u) || !(0..=bound).contains(&v) {
        return None;
    }
    Some((u as NodeId, v as NodeId))
}

fn distinct_vertices(edges: &[Edge]) -> usize {
    edges
        .iter()
        .flat_map(|&(u, v)| [u, v])
        .collect::<HashSet<_>>()
        .len()
}

pub(super) fn influence(args: &Args<'_>) -> Result<InfluenceInput, ValidationError> {
    let edges = edge_list("edges", args.required("edges")?, true)?;
    let probabilities = parse_weight_map(args.required("weights")?, &edges)?;

    if let Some(missing) = edges.iter().find(|edge| !probabilities.contains_key(edge)) {
        return Err(ValidationError::new(
            "weights",
            format!(
                "missing activation probability for edge \"{},{}\"",
                missing.0, missing.1
            ),
        ));
    }
    if let Some(((u, v), p)) = probabilities
        .iter()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(ValidationError::new(
            "weights",
            format!("probability for \"{u},{v}\" must be within [0, 1], got {p}"),
        ));
    }

    let k = args.u32("k")?;
    let nodes = distinct_vertices(&edges);
    if k == 0 || k as usize > nodes {
        return Err(ValidationError::new(
            "k",
            format!("must be between 1 and the node count ({nodes}), got {k}"),
        ));
    }

    let n_simulations = args.opt_u32("n_simulations")?.unwrap_or(DEFAULT_SIMULATIONS);
    if !(1..=MAX_SIMULATIONS).contains(&n_simulations) {
        return Err(ValidationError::new(
            "n_simulations",
            format!("must be between 1 and {MAX_SIMULATIONS}, got {n_simulations}"),
        ));
    }

    Ok(InfluenceInput {
        edges,
        probabilities,
        k,
        n_simulations,
    })
}

pub(super) fn densest_subgraph(args: &Args<'_>) -> Result<DensestSubgraphInput, ValidationError> {
    let directed = args.opt_bool("directed")?.unwrap_or(false);
    Ok(DensestSubgraphInput {
        edges: edge_list("edges", args.required("edges")?, directed)?,
        directed,
    })
}

pub(super) fn k_core(args: &Args<'_>) -> Result<GraphInput, ValidationError> {
    Ok(GraphInput {
        edges: edge_list("edges", args.required("edges")?, false)?,
    })
}

pub(super) fn betweenness(args: &Args<'_>) -> Result<BetweennessInput, ValidationError> {
    Ok(BetweennessInput {
        edges: edge_list("edges", args.required("edges")?, false)?,
        normalized: args.opt_bool("normalized")?.unwrap_or(true),
    })
}

pub(super) fn pagerank(args: &Args<'_>) -> Result<PagerankInput, ValidationError> {
    let edges = edge_list("edges", args.required("edges")?, false)?;
    let alpha = args.opt_f64("alpha")?.unwrap_or(DEFAULT_ALPHA);
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(ValidationError::new(
            "alpha",
            format!("damping factor must be in (0, 1), got {alpha}"),
        ));
    }
    Ok(PagerankInput { edges, alpha })
}
