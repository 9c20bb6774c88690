// Normalizer tests - argument validation and canonical re-serialization.

use graphbees_core::domain::input::ToolInput;
use graphbees_core::domain::tools::ToolKind;
use graphbees_core::tools::normalizer::{MAX_VERTEX_ID, parse_weight_map};
use graphbees_core::tools::normalize;
use serde_json::{Value, json};

fn valid_arguments(kind: ToolKind) -> Value {
    match kind {
        ToolKind::PtasKnapsack => {
            json!({"weights": [2, 3, 4], "values": [3, 4, 5], "capacity": 5, "epsilon": 0.2})
        }
        ToolKind::ExactKnapsack => json!({
            "weights": [2, 3, 4],
            "values": [3, 4, 5],
            "capacity": 5,
            "labels": ["tent", "stove", "rope"],
        }),
        ToolKind::BinPacking => json!({"items": [4, 8, 1, 4, 2, 1], "bin_capacity": 10}),
        ToolKind::WeightedIntervalScheduling => json!({
            "start_times": [1, 2, 4],
            "end_times": [3, 5, 6],
            "weights": [5, 6, 5],
        }),
        ToolKind::SetCover => json!({"subsets": [[1, 0], [1, 2], [2, 3, 3]], "costs": [1.0, 2.5, 1.0]}),
        ToolKind::MaxCoverage => json!({"subsets": [[0, 1], [1, 2], [3]], "k": 2}),
        ToolKind::WeightedBipartiteMatching => json!({
            "left_nodes": [0, 1],
            "right_nodes": [0, 1],
            "edges": [[0, 0], [0, 1], [1, 1]],
            "weights": {"0,1": 3.0, "1,1": 2.0},
        }),
        ToolKind::MakespanScheduling => json!({"jobs": [3.0, 2.0, 2.5, 1.0], "m": 2}),
        ToolKind::MixedIlp => json!({
            "variables": [
                {"name": "x", "lower_bound": 0, "var_type": "integer"},
                {"name": "y", "lower_bound": 0, "upper_bound": 3},
            ],
            "constraints": ["x + 2y <= 6", "x - y >= -1"],
            "objective": "3x + 2y",
            "sense": "max",
        }),
        ToolKind::InfluenceMaximization => json!({
            "edges": [[0, 1], [1, 2], [2, 0]],
            "weights": {"0,1": 0.5, "1,2": 0.4, "2,0": 0.3},
            "k": 1,
        }),
        ToolKind::DensestSubgraph => json!({"edges": [[0, 1], [1, 2], [2, 0], [2, 3]]}),
        ToolKind::KCoreDecomposition => json!({"edges": [[0, 1], [1, 2], [2, 0]]}),
        ToolKind::BetweennessCentrality => json!({"edges": [[0, 1], [1, 2]], "normalized": false}),
        ToolKind::Pagerank => json!({"edges": [[0, 1], [1, 2], [2, 0]], "alpha": 0.9}),
    }
}

#[test]
fn every_tool_accepts_its_example_arguments() {
    for kind in ToolKind::ALL {
        let input = normalize(kind, &valid_arguments(kind))
            .unwrap_or_else(|err| panic!("{kind}: {err}"));
        assert_eq!(input.kind(), kind);
    }
}

#[test]
fn canonical_arguments_normalize_to_the_same_input() {
    for kind in ToolKind::ALL {
        let input = normalize(kind, &valid_arguments(kind)).expect("valid");
        let canonical = input.to_arguments();
        let again = normalize(kind, &canonical).unwrap_or_else(|err| panic!("{kind}: {err}"));
        assert_eq!(again, input, "{kind}");
        assert_eq!(again.to_arguments(), canonical, "{kind}");
    }
}

#[test]
fn knapsack_items_pair_weights_with_values() {
    let input = normalize(
        ToolKind::PtasKnapsack,
        &json!({"weights": [2, 3, 4], "values": [3, 4, 5], "capacity": 5}),
    )
    .expect("valid");
    let ToolInput::PtasKnapsack { problem, epsilon } = input else {
        panic!("wrong variant");
    };
    assert_eq!(problem.capacity, 5);
    assert_eq!(problem.weights(), vec![2, 3, 4]);
    assert_eq!(problem.values(), vec![3, 4, 5]);
    assert!(epsilon > 0.0 && epsilon < 1.0);
}

#[test]
fn knapsack_rejects_mismatched_lengths_and_zero_capacity() {
    let mismatched = normalize(
        ToolKind::ExactKnapsack,
        &json!({"weights": [2, 3], "values": [3], "capacity": 5}),
    )
    .unwrap_err();
    assert_eq!(mismatched.field, "values");

    let zero = normalize(
        ToolKind::ExactKnapsack,
        &json!({"weights": [2], "values": [3], "capacity": 0}),
    )
    .unwrap_err();
    assert_eq!(zero.field, "capacity");
}

#[test]
fn epsilon_must_lie_strictly_between_zero_and_one() {
    for epsilon in [0.0, 1.0, -0.5] {
        let err = normalize(
            ToolKind::PtasKnapsack,
            &json!({"weights": [1], "values": [1], "capacity": 1, "epsilon": epsilon}),
        )
        .unwrap_err();
        assert_eq!(err.field, "epsilon");
    }
}

#[test]
fn oversized_bin_items_are_rejected() {
    let err = normalize(
        ToolKind::BinPacking,
        &json!({"items": [3, 12], "bin_capacity": 10}),
    )
    .unwrap_err();
    assert_eq!(err.field, "items");
    assert!(err.message.contains("cannot be packed"));
}

#[test]
fn intervals_must_end_after_they_start() {
    let err = normalize(
        ToolKind::WeightedIntervalScheduling,
        &json!({"start_times": [4], "end_times": [4], "weights": [1]}),
    )
    .unwrap_err();
    assert_eq!(err.field, "end_times");
}

#[test]
fn set_cover_subsets_are_sorted_and_deduplicated() {
    let input = normalize(ToolKind::SetCover, &valid_arguments(ToolKind::SetCover)).expect("valid");
    let ToolInput::SetCover(cover) = input else {
        panic!("wrong variant");
    };
    assert_eq!(cover.subsets, vec![vec![0, 1], vec![1, 2], vec![2, 3]]);
}

#[test]
fn bipartite_weight_map_fills_unlisted_edges_with_one() {
    let input = normalize(
        ToolKind::WeightedBipartiteMatching,
        &valid_arguments(ToolKind::WeightedBipartiteMatching),
    )
    .expect("valid");
    let ToolInput::WeightedBipartiteMatching(matching) = input else {
        panic!("wrong variant");
    };
    assert_eq!(matching.weights, vec![1.0, 3.0, 2.0]);
}

#[test]
fn bipartite_edges_must_run_left_to_right() {
    let err = normalize(
        ToolKind::WeightedBipartiteMatching,
        &json!({"left_nodes": [0], "right_nodes": [1], "edges": [[1, 0]]}),
    )
    .unwrap_err();
    assert_eq!(err.field, "edges");
}

#[test]
fn weight_map_keys_use_comma_pairs() {
    let edges = vec![(0, 1), (1, 2)];
    let weights = parse_weight_map(&json!({"0,1": 2.5, "1,2": 3.0}), &edges).expect("valid");
    assert_eq!(weights.get(&(0, 1)), Some(&2.5));
    assert_eq!(weights.get(&(1, 2)), Some(&3.0));

    let err = parse_weight_map(&json!({"0-1": 2.5}), &edges).unwrap_err();
    assert_eq!(err.field, "weights");
}

#[test]
fn influence_weight_keys_fail_against_the_weights_field() {
    let err = normalize(
        ToolKind::InfluenceMaximization,
        &json!({"edges": [[0, 1]], "weights": {"0-1": 0.5}, "k": 1}),
    )
    .unwrap_err();
    assert_eq!(err.field, "weights");
}

#[test]
fn vertex_ids_above_the_limit_are_rejected() {
    let err = normalize(
        ToolKind::Pagerank,
        &json!({"edges": [[0, MAX_VERTEX_ID + 1]]}),
    )
    .unwrap_err();
    assert_eq!(err.field, "edges");
}

#[test]
fn ilp_constraints_must_reference_declared_variables() {
    let err = normalize(
        ToolKind::MixedIlp,
        &json!({"variables": ["x"], "constraints": ["x + z <= 3"], "objective": "x"}),
    )
    .unwrap_err();
    assert_eq!(err.field, "constraints");
    assert!(err.message.contains("constraint 0"));
}

#[test]
fn ilp_sense_accepts_only_max_or_min() {
    let err = normalize(
        ToolKind::MixedIlp,
        &json!({"variables": ["x"], "constraints": ["x <= 3"], "objective": "x", "sense": "sideways"}),
    )
    .unwrap_err();
    assert_eq!(err.field, "sense");
}
