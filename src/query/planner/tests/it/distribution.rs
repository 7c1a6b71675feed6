// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use scatter_query_planner::optimizer::property::satisfies_ordering;
use scatter_query_planner::optimizer::property::Distribution;
use scatter_query_planner::optimizer::property::HashedDistribution;
use scatter_query_planner::optimizer::property::Rewindability;
use scatter_query_planner::optimizer::property::SingletonSite;
use scatter_query_planner::optimizer::RelExpr;
use scatter_query_planner::optimizer::SExpr;
use scatter_query_planner::plans::EvalScalar;
use scatter_query_planner::plans::RelOperator;
use scatter_query_planner::plans::ScalarItem;
use scatter_query_planner::plans::SortItem;
use scatter_query_planner::ColumnSet;

use crate::testing::*;

#[test]
fn test_any_is_satisfied_by_everything() {
    let delivered = [
        Distribution::Any,
        Distribution::Hashed(hashed(vec![column_ref(0, "a", int64())])),
        Distribution::Replicated,
        Distribution::Singleton(SingletonSite::Coordinator),
        Distribution::Routed(3),
        Distribution::Universal,
    ];
    for distribution in &delivered {
        assert!(distribution.satisfies(&Distribution::Any), "{}", distribution);
    }
}

#[test]
fn test_non_singleton_rejects_single_streams() {
    let required = Distribution::NonSingleton;
    assert!(!Distribution::Singleton(SingletonSite::Coordinator).satisfies(&required));
    assert!(!Distribution::Singleton(SingletonSite::Worker).satisfies(&required));
    assert!(!Distribution::StrictSingleton(SingletonSite::Coordinator).satisfies(&required));

    assert!(Distribution::Replicated.satisfies(&required));
    assert!(Distribution::Any.satisfies(&required));
    assert!(Distribution::Hashed(hashed(vec![column_ref(0, "a", int64())])).satisfies(&required));
    assert!(Distribution::Universal.satisfies(&required));
}

#[test]
fn test_universal_satisfies_all_but_strict_singleton() {
    let universal = Distribution::Universal;
    assert!(universal.satisfies(&Distribution::Hashed(hashed(vec![column_ref(
        0,
        "a",
        int64()
    )]))));
    assert!(universal.satisfies(&Distribution::Replicated));
    assert!(universal.satisfies(&Distribution::Singleton(SingletonSite::Coordinator)));
    assert!(universal.satisfies(&Distribution::Singleton(SingletonSite::Worker)));
    assert!(universal.satisfies(&Distribution::Routed(7)));
    assert!(universal.satisfies(&Distribution::NonSingleton));

    assert!(!universal.satisfies(&Distribution::StrictSingleton(SingletonSite::Coordinator)));
    assert!(!universal.satisfies(&Distribution::StrictSingleton(SingletonSite::Worker)));
}

#[test]
fn test_singleton_discharges_strict_singleton_on_the_same_site() {
    let coordinator = Distribution::Singleton(SingletonSite::Coordinator);
    assert!(coordinator.satisfies(&Distribution::StrictSingleton(SingletonSite::Coordinator)));
    assert!(!coordinator.satisfies(&Distribution::StrictSingleton(SingletonSite::Worker)));
    assert!(
        !Distribution::Replicated.satisfies(&Distribution::StrictSingleton(
            SingletonSite::Coordinator
        ))
    );
}

#[test]
fn test_hashed_subset_keys_satisfy() {
    let a = column_ref(0, "a", int64());
    let b = column_ref(1, "b", int64());

    let narrow = Distribution::Hashed(hashed(vec![a.clone()]));
    let wide = Distribution::Hashed(hashed(vec![a.clone(), b.clone()]));

    // Grouping by fewer of the required keys still colocates every
    // required-key group; the converse does not hold.
    assert!(narrow.satisfies(&wide));
    assert!(!wide.satisfies(&narrow));

    let empty = Distribution::Hashed(hashed(vec![]));
    assert!(!empty.satisfies(&wide));

    let unrelated = Distribution::Hashed(hashed(vec![column_ref(9, "c", int64())]));
    assert!(!unrelated.satisfies(&wide));
}

#[test]
fn test_hashed_flags_must_agree() {
    let a = column_ref(0, "a", int64());
    let b = column_ref(1, "b", int64());

    let delivered = Distribution::Hashed(HashedDistribution::new(vec![a.clone()], false, true));
    let required = Distribution::Hashed(HashedDistribution::new(
        vec![a.clone(), b.clone()],
        true,
        true,
    ));
    assert!(!delivered.satisfies(&required));

    let relaxed = Distribution::Hashed(HashedDistribution::new(vec![a.clone(), b], false, true));
    assert!(delivered.satisfies(&relaxed));

    let duplicate_insensitive =
        Distribution::Hashed(HashedDistribution::new(vec![a.clone()], true, false));
    let duplicate_sensitive = Distribution::Hashed(HashedDistribution::new(vec![a], true, true));
    assert!(!duplicate_insensitive.satisfies(&duplicate_sensitive));
}

#[test]
fn test_hashed_keys_match_through_coercible_casts() {
    let a = column_ref(0, "a", int32());
    let widened = cast(a.clone(), int64());

    let delivered = Distribution::Hashed(hashed(vec![widened]));
    let required = Distribution::Hashed(hashed(vec![a.clone(), column_ref(1, "b", int64())]));
    assert!(delivered.satisfies(&required));

    // Narrowing changes the hash bucket, so it does not strip.
    let c = column_ref(2, "c", int64());
    let narrowed = cast(c.clone(), int32());
    let delivered = Distribution::Hashed(hashed(vec![narrowed]));
    let required = Distribution::Hashed(hashed(vec![c]));
    assert!(!delivered.satisfies(&required));
}

#[test]
fn test_hashed_equivalent_chain_is_consulted() {
    let o_custkey = column_ref(0, "o_custkey", int64());
    let c_custkey = column_ref(1, "c_custkey", int64());

    let delivered = Distribution::Hashed(
        hashed(vec![o_custkey.clone()]).with_equivalent(hashed(vec![c_custkey.clone()])),
    );
    assert!(delivered.satisfies(&Distribution::Hashed(hashed(vec![o_custkey]))));
    assert!(delivered.satisfies(&Distribution::Hashed(hashed(vec![c_custkey]))));
    assert!(!delivered.satisfies(&Distribution::Hashed(hashed(vec![column_ref(
        9,
        "other",
        int64()
    )]))));
}

#[test]
fn test_exclude_columns_drops_only_affected_keys() {
    let a = column_ref(0, "a", int64());
    let b = column_ref(1, "b", int64());
    let spec = hashed(vec![a.clone(), b.clone()]);

    let untouched = spec.exclude_columns(&ColumnSet::from(vec![9])).unwrap();
    assert_eq!(untouched.keys, vec![a.clone(), b.clone()]);

    let partial = spec.exclude_columns(&ColumnSet::from(vec![1])).unwrap();
    assert_eq!(partial.keys, vec![a]);

    assert!(spec.exclude_columns(&ColumnSet::from(vec![0, 1])).is_none());
}

#[test]
fn test_exclude_columns_filters_the_equivalent_spec() {
    let a = column_ref(0, "a", int64());
    let b = column_ref(1, "b", int64());
    let spec = hashed(vec![a.clone()]).with_equivalent(hashed(vec![b]));

    let remaining = spec.exclude_columns(&ColumnSet::from(vec![1])).unwrap();
    assert_eq!(remaining.keys, vec![a]);
    assert!(remaining.equivalent.is_none());
}

#[test]
fn test_routed_requires_the_same_segment_column() {
    assert!(Distribution::Routed(5).satisfies(&Distribution::Routed(5)));
    assert!(!Distribution::Routed(5).satisfies(&Distribution::Routed(6)));
    assert!(Distribution::Routed(5).satisfies(&Distribution::Any));
    assert!(Distribution::Routed(5).satisfies(&Distribution::NonSingleton));
    assert!(!Distribution::Replicated.satisfies(&Distribution::Routed(5)));
}

#[test]
fn test_replicated_does_not_satisfy_hashed() {
    let required = Distribution::Hashed(hashed(vec![column_ref(0, "a", int64())]));
    assert!(!Distribution::Replicated.satisfies(&required));
    assert!(!Distribution::Singleton(SingletonSite::Coordinator).satisfies(&required));
}

#[test]
fn test_ordering_is_satisfied_by_exact_prefix() {
    let delivered = vec![asc(0), asc(1)];
    assert!(satisfies_ordering(&delivered, &[]));
    assert!(satisfies_ordering(&delivered, &[asc(0)]));
    assert!(satisfies_ordering(&delivered, &[asc(0), asc(1)]));

    assert!(!satisfies_ordering(&delivered, &[asc(1)]));
    assert!(!satisfies_ordering(&delivered, &[asc(0), asc(1), asc(2)]));

    let descending = SortItem {
        index: 0,
        asc: false,
        nulls_first: false,
    };
    assert!(!satisfies_ordering(&delivered, &[descending]));
}

#[test]
fn test_rewindability_strength_order() {
    assert!(Rewindability::Rewindable >= Rewindability::Rescannable);
    assert!(Rewindability::Rescannable >= Rewindability::None);
    assert!(Rewindability::None < Rewindability::Rescannable);
    assert_eq!(Rewindability::default(), Rewindability::None);
}

#[test]
fn test_scan_derives_its_table_layout() {
    let fixture = fixture();

    let orders = scan_expr(&fixture.metadata, 0, fixture.orders);
    let physical = RelExpr::with_s_expr(&orders).derive_physical_prop().unwrap();
    match &physical.distribution {
        Distribution::Hashed(spec) => {
            assert_eq!(spec.keys, vec![column_ref(
                fixture.o_custkey,
                "o_custkey",
                int64()
            )]);
            assert!(spec.nulls_colocated);
            assert!(spec.duplicate_sensitive);
        }
        other => panic!("expected a hashed layout, got {}", other),
    }
    assert_eq!(physical.rewindability, Rewindability::Rescannable);

    let nation = scan_expr(&fixture.metadata, 1, fixture.nation);
    let physical = RelExpr::with_s_expr(&nation).derive_physical_prop().unwrap();
    assert_eq!(physical.distribution, Distribution::Replicated);

    let lineitem = scan_expr(&fixture.metadata, 2, fixture.lineitem);
    let physical = RelExpr::with_s_expr(&lineitem)
        .derive_physical_prop()
        .unwrap();
    assert_eq!(physical.distribution, Distribution::Any);

    let settings = scan_expr(&fixture.metadata, 3, fixture.settings);
    let physical = RelExpr::with_s_expr(&settings)
        .derive_physical_prop()
        .unwrap();
    assert_eq!(
        physical.distribution,
        Distribution::Singleton(SingletonSite::Coordinator)
    );
    let relational = RelExpr::with_s_expr(&settings)
        .derive_relational_prop()
        .unwrap();
    assert!(relational.coordinator_only);
}

#[test]
fn test_projection_keeps_the_layout_while_keys_survive() {
    let fixture = fixture();
    let orders = scan_expr(&fixture.metadata, 0, fixture.orders);

    let keep_key = EvalScalar {
        items: vec![ScalarItem {
            scalar: column_ref(fixture.o_custkey, "o_custkey", int64()),
            index: fixture.o_custkey,
        }],
    };
    let expr = SExpr::create_unary(Arc::new(RelOperator::EvalScalar(keep_key)), orders.clone());
    let physical = RelExpr::with_s_expr(&expr).derive_physical_prop().unwrap();
    match &physical.distribution {
        Distribution::Hashed(spec) => {
            assert_eq!(spec.keys, vec![column_ref(
                fixture.o_custkey,
                "o_custkey",
                int64()
            )]);
        }
        other => panic!("expected a hashed layout, got {}", other),
    }

    let drop_key = EvalScalar {
        items: vec![ScalarItem {
            scalar: column_ref(fixture.o_orderkey, "o_orderkey", int64()),
            index: fixture.o_orderkey,
        }],
    };
    let expr = SExpr::create_unary(Arc::new(RelOperator::EvalScalar(drop_key)), orders);
    let physical = RelExpr::with_s_expr(&expr).derive_physical_prop().unwrap();
    assert_eq!(physical.distribution, Distribution::Any);
}
