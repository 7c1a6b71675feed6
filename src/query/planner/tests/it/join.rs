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

use scatter_query_planner::optimizer::property::Distribution;
use scatter_query_planner::optimizer::property::Enforcement;
use scatter_query_planner::optimizer::property::PhysicalProperty;
use scatter_query_planner::optimizer::property::PropertyKind;
use scatter_query_planner::optimizer::property::RequiredProperty;
use scatter_query_planner::optimizer::property::SingletonSite;
use scatter_query_planner::optimizer::OptimizerConfig;
use scatter_query_planner::optimizer::OptimizerContext;
use scatter_query_planner::optimizer::RelExpr;
use scatter_query_planner::optimizer::SExpr;
use scatter_query_planner::plans::Filter;
use scatter_query_planner::plans::FunctionCall;
use scatter_query_planner::plans::JoinType;
use scatter_query_planner::plans::Operator;
use scatter_query_planner::plans::RelOperator;
use scatter_query_planner::plans::ScalarExpr;
use scatter_query_planner::plans::JOIN_REDISTRIBUTE_REQUESTS_CAP;
use scatter_query_planner::DataType;

use crate::testing::*;

struct JoinCase {
    fixture: TestFixture,
    expr: SExpr,
}

impl JoinCase {
    /// `orders JOIN lineitem ON o_custkey = l_orderkey AND o_orderkey = l_suppkey`
    fn new(join_type: JoinType) -> Self {
        let fixture = fixture();
        let orders = scan_expr(&fixture.metadata, 0, fixture.orders);
        let lineitem = scan_expr(&fixture.metadata, 1, fixture.lineitem);
        let expr = join_on(join_type, orders, lineitem, vec![
            (
                column_ref(fixture.o_custkey, "o_custkey", int64()),
                column_ref(fixture.l_orderkey, "l_orderkey", int64()),
            ),
            (
                column_ref(fixture.o_orderkey, "o_orderkey", int64()),
                column_ref(fixture.l_suppkey, "l_suppkey", int64()),
            ),
        ]);
        JoinCase { fixture, expr }
    }

    fn ctx(&self) -> Arc<OptimizerContext> {
        ctx(&self.fixture.metadata)
    }

    fn request(
        &self,
        ctx: Arc<OptimizerContext>,
        child_index: usize,
        request_index: usize,
        optimized: &[PhysicalProperty],
    ) -> Option<RequiredProperty> {
        let rel_expr = RelExpr::with_s_expr(&self.expr);
        let RelOperator::Join(join) = self.expr.plan() else {
            unreachable!()
        };
        join.compute_required_prop_child(
            ctx,
            &rel_expr,
            child_index,
            request_index,
            optimized,
            &RequiredProperty::default(),
        )
        .unwrap()
    }
}

fn delivered(distribution: Distribution) -> PhysicalProperty {
    PhysicalProperty {
        distribution,
        ..Default::default()
    }
}

fn request_keys(required: &RequiredProperty) -> Vec<ScalarExpr> {
    match &required.distribution {
        Distribution::Hashed(spec) => spec.keys.clone(),
        other => panic!("expected a hashed requirement, got {}", other),
    }
}

#[test]
fn test_request_band_count() {
    let case = JoinCase::new(JoinType::Inner);
    let RelOperator::Join(join) = case.expr.plan() else {
        unreachable!()
    };
    // Two redistribute slots, two broadcast directions, one gather.
    assert_eq!(join.distribution_request_count(), 5);

    let fixture = fixture();
    let cross = join_on(
        JoinType::Cross,
        scan_expr(&fixture.metadata, 0, fixture.orders),
        scan_expr(&fixture.metadata, 1, fixture.lineitem),
        vec![],
    );
    let RelOperator::Join(join) = cross.plan() else {
        unreachable!()
    };
    assert_eq!(join.distribution_request_count(), 3);

    let conditions: Vec<_> = (0..8)
        .map(|_| {
            (
                column_ref(fixture.o_custkey, "o_custkey", int64()),
                column_ref(fixture.l_orderkey, "l_orderkey", int64()),
            )
        })
        .collect();
    let wide = join_on(
        JoinType::Inner,
        scan_expr(&fixture.metadata, 2, fixture.orders),
        scan_expr(&fixture.metadata, 3, fixture.lineitem),
        conditions,
    );
    let RelOperator::Join(join) = wide.plan() else {
        unreachable!()
    };
    assert_eq!(
        join.distribution_request_count(),
        JOIN_REDISTRIBUTE_REQUESTS_CAP + 3
    );
}

#[test]
fn test_combined_keys_first_then_single_keys() {
    let case = JoinCase::new(JoinType::Inner);
    let ctx = case.ctx();

    let combined = case.request(ctx.clone(), 0, 0, &[]).unwrap();
    assert_eq!(request_keys(&combined), vec![
        column_ref(case.fixture.o_custkey, "o_custkey", int64()),
        column_ref(case.fixture.o_orderkey, "o_orderkey", int64()),
    ]);

    // The remaining slots take one key each in condition order. The band
    // count stays at min(keys, cap), so the last key is only ever asked
    // for as part of the combined request.
    let first = case.request(ctx, 0, 1, &[]).unwrap();
    assert_eq!(request_keys(&first), vec![column_ref(
        case.fixture.o_custkey,
        "o_custkey",
        int64()
    )]);
}

#[test]
fn test_redistribute_requests_demand_colocated_nulls() {
    // The conditions here are plain `=`, yet every hashed request still
    // asks for colocated nulls and duplicate sensitivity: a scan's hashed
    // layout carries both flags set, and satisfaction compares flags for
    // equality.
    let case = JoinCase::new(JoinType::Inner);
    for slot in 0..2 {
        let required = case.request(case.ctx(), 0, slot, &[]).unwrap();
        match &required.distribution {
            Distribution::Hashed(spec) => {
                assert!(spec.nulls_colocated);
                assert!(spec.duplicate_sensitive);
            }
            other => panic!("expected a hashed requirement, got {}", other),
        }
    }
}

#[test]
fn test_second_child_follows_the_first_childs_delivery() {
    let case = JoinCase::new(JoinType::Inner);
    let ctx = case.ctx();

    let optimized = [delivered(Distribution::Hashed(hashed(vec![column_ref(
        case.fixture.o_custkey,
        "o_custkey",
        int64(),
    )])))];
    let translated = case.request(ctx.clone(), 1, 0, &optimized).unwrap();
    assert_eq!(request_keys(&translated), vec![column_ref(
        case.fixture.l_orderkey,
        "l_orderkey",
        int64()
    )]);

    // The translation follows the delivered key order, not the slot's.
    let optimized = [delivered(Distribution::Hashed(hashed(vec![
        column_ref(case.fixture.o_orderkey, "o_orderkey", int64()),
        column_ref(case.fixture.o_custkey, "o_custkey", int64()),
    ])))];
    let translated = case.request(ctx, 1, 0, &optimized).unwrap();
    assert_eq!(request_keys(&translated), vec![
        column_ref(case.fixture.l_suppkey, "l_suppkey", int64()),
        column_ref(case.fixture.l_orderkey, "l_orderkey", int64()),
    ]);
}

#[test]
fn test_translation_peels_coercible_casts() {
    let case = JoinCase::new(JoinType::Inner);
    let ctx = case.ctx();

    // An outer join below may have wrapped the key nullable; the wrap
    // does not move a value between hash buckets.
    let key = cast(
        column_ref(case.fixture.o_custkey, "o_custkey", int64()),
        DataType::Nullable(Box::new(int64())),
    );
    let optimized = [delivered(Distribution::Hashed(hashed(vec![key])))];
    let translated = case.request(ctx, 1, 0, &optimized).unwrap();
    assert_eq!(request_keys(&translated), vec![column_ref(
        case.fixture.l_orderkey,
        "l_orderkey",
        int64()
    )]);
}

#[test]
fn test_untranslatable_delivery_kills_the_redistribute_band() {
    let case = JoinCase::new(JoinType::Inner);
    let ctx = case.ctx();

    let optimized = [delivered(Distribution::Hashed(hashed(vec![column_ref(
        99,
        "unrelated",
        int64(),
    )])))];
    assert!(case.request(ctx.clone(), 1, 0, &optimized).is_none());

    // A colocation equivalent that does translate rescues the band.
    let spec = hashed(vec![column_ref(99, "unrelated", int64())]).with_equivalent(hashed(vec![
        column_ref(case.fixture.o_custkey, "o_custkey", int64()),
    ]));
    let optimized = [delivered(Distribution::Hashed(spec))];
    let translated = case.request(ctx, 1, 0, &optimized).unwrap();
    assert_eq!(request_keys(&translated), vec![column_ref(
        case.fixture.l_orderkey,
        "l_orderkey",
        int64()
    )]);
}

#[test]
fn test_first_child_deliveries_that_relax_or_kill_the_band() {
    let case = JoinCase::new(JoinType::Inner);
    let ctx = case.ctx();

    let optimized = [delivered(Distribution::Universal)];
    let required = case.request(ctx.clone(), 1, 0, &optimized).unwrap();
    assert_eq!(required.distribution, Distribution::NonSingleton);

    let optimized = [delivered(Distribution::Replicated)];
    assert!(case.request(ctx.clone(), 1, 0, &optimized).is_none());

    let optimized = [delivered(Distribution::Singleton(
        SingletonSite::Coordinator,
    ))];
    assert!(case.request(ctx, 1, 0, &optimized).is_none());
}

#[test]
fn test_outer_joins_keep_the_preserved_side_distributed() {
    // Bands for two conditions: 0..2 redistribute, 2 broadcast-right,
    // 3 broadcast-left, 4 gather.
    let left = JoinCase::new(JoinType::Left);
    assert!(left.request(left.ctx(), 0, 3, &[]).is_none());
    assert!(left.request(left.ctx(), 0, 2, &[]).is_some());

    let right = JoinCase::new(JoinType::Right);
    assert!(right.request(right.ctx(), 0, 2, &[]).is_none());
    assert!(right.request(right.ctx(), 0, 3, &[]).is_some());

    let full = JoinCase::new(JoinType::Full);
    for request_index in 0..4 {
        assert!(full.request(full.ctx(), 0, request_index, &[]).is_none());
    }
    assert!(full.request(full.ctx(), 0, 4, &[]).is_some());
}

#[test]
fn test_broadcast_band_requests() {
    let case = JoinCase::new(JoinType::Inner);
    let ctx = case.ctx();

    let broadcast_side = case.request(ctx.clone(), 1, 2, &[]).unwrap();
    assert_eq!(broadcast_side.distribution, Distribution::Replicated);

    // The other side is still redistributed by its full key list.
    let kept_side = case.request(ctx.clone(), 0, 2, &[]).unwrap();
    assert_eq!(request_keys(&kept_side), vec![
        column_ref(case.fixture.o_custkey, "o_custkey", int64()),
        column_ref(case.fixture.o_orderkey, "o_orderkey", int64()),
    ]);

    let mirrored = case.request(ctx.clone(), 0, 3, &[]).unwrap();
    assert_eq!(mirrored.distribution, Distribution::Replicated);
    let kept_side = case.request(ctx, 1, 3, &[]).unwrap();
    assert_eq!(request_keys(&kept_side), vec![
        column_ref(case.fixture.l_orderkey, "l_orderkey", int64()),
        column_ref(case.fixture.l_suppkey, "l_suppkey", int64()),
    ]);

    let ctx = ctx_with_config(&case.fixture.metadata, OptimizerConfig {
        enable_redistribute_broadcast: false,
        ..Default::default()
    });
    let kept_side = case.request(ctx, 0, 2, &[]).unwrap();
    assert_eq!(kept_side.distribution, Distribution::NonSingleton);
}

#[test]
fn test_singleton_band_follows_the_first_childs_site() {
    let case = JoinCase::new(JoinType::Inner);
    let ctx = case.ctx();

    let first = case.request(ctx.clone(), 0, 4, &[]).unwrap();
    assert_eq!(
        first.distribution,
        Distribution::Singleton(SingletonSite::Coordinator)
    );

    let optimized = [delivered(Distribution::Singleton(SingletonSite::Worker))];
    let second = case.request(ctx.clone(), 1, 4, &optimized).unwrap();
    assert_eq!(
        second.distribution,
        Distribution::Singleton(SingletonSite::Worker)
    );

    // Constant data satisfies any singleton requirement without moving,
    // so the second child must produce the one real stream.
    let optimized = [delivered(Distribution::Universal)];
    let second = case.request(ctx, 1, 4, &optimized).unwrap();
    assert_eq!(
        second.distribution,
        Distribution::StrictSingleton(SingletonSite::Coordinator)
    );
}

#[test]
fn test_disabled_motions_remove_their_bands() {
    let case = JoinCase::new(JoinType::Inner);

    let no_hash = ctx_with_config(&case.fixture.metadata, OptimizerConfig {
        enable_hash_redistribute: false,
        ..Default::default()
    });
    assert!(case.request(no_hash.clone(), 0, 0, &[]).is_none());
    assert!(case.request(no_hash, 1, 2, &[]).is_some());

    let no_broadcast = ctx_with_config(&case.fixture.metadata, OptimizerConfig {
        enable_broadcast: false,
        ..Default::default()
    });
    assert!(case.request(no_broadcast.clone(), 1, 2, &[]).is_none());
    assert!(case.request(no_broadcast.clone(), 0, 3, &[]).is_none());
    assert!(case.request(no_broadcast, 0, 4, &[]).is_some());
}

#[test]
fn test_an_invalid_request_index_is_an_error() {
    let case = JoinCase::new(JoinType::Inner);
    let rel_expr = RelExpr::with_s_expr(&case.expr);
    let RelOperator::Join(join) = case.expr.plan() else {
        unreachable!()
    };
    let result = join.compute_required_prop_child(
        case.ctx(),
        &rel_expr,
        0,
        5,
        &[],
        &RequiredProperty::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_a_coordinator_bound_side_vetoes_distributed_bands() {
    let fixture = fixture();
    let orders = scan_expr(&fixture.metadata, 0, fixture.orders);
    let settings = scan_expr(&fixture.metadata, 1, fixture.settings);
    let expr = join_on(JoinType::Inner, orders, settings, vec![(
        column_ref(fixture.o_custkey, "o_custkey", int64()),
        column_ref(fixture.s_key, "s_key", int64()),
    )]);
    let case = JoinCase { fixture, expr };

    // Bands for one condition: 0 redistribute, 1/2 broadcast, 3 gather.
    for request_index in 0..3 {
        assert!(case.request(case.ctx(), 0, request_index, &[]).is_none());
    }
    let gather = case.request(case.ctx(), 0, 3, &[]).unwrap();
    assert_eq!(
        gather.distribution,
        Distribution::Singleton(SingletonSite::Coordinator)
    );
}

#[test]
fn test_colocated_derivation_carries_both_key_sets() {
    let fixture = fixture();
    let orders = scan_expr(&fixture.metadata, 0, fixture.orders);
    let customer = scan_expr(&fixture.metadata, 1, fixture.customer);
    let expr = join_on(JoinType::Inner, orders, customer, vec![(
        column_ref(fixture.o_custkey, "o_custkey", int64()),
        column_ref(fixture.c_custkey, "c_custkey", int64()),
    )]);

    let physical = RelExpr::with_s_expr(&expr).derive_physical_prop().unwrap();
    let by_left = Distribution::Hashed(hashed(vec![column_ref(
        fixture.o_custkey,
        "o_custkey",
        int64(),
    )]));
    let by_right = Distribution::Hashed(hashed(vec![column_ref(
        fixture.c_custkey,
        "c_custkey",
        int64(),
    )]));
    assert!(physical.distribution.satisfies(&by_left));
    assert!(physical.distribution.satisfies(&by_right));
}

#[test]
fn test_a_correlated_join_prohibits_buffering() {
    let fixture = fixture();

    // The filter refers to o_custkey, which no child of this join
    // produces, so the whole join is correlated.
    let correlated_filter = Filter {
        predicates: vec![ScalarExpr::FunctionCall(FunctionCall {
            func_name: "eq".to_string(),
            params: vec![],
            arguments: vec![
                column_ref(fixture.c_custkey, "c_custkey", int64()),
                column_ref(fixture.o_custkey, "o_custkey", int64()),
            ],
        })],
    };
    let customer = SExpr::create_unary(
        Arc::new(RelOperator::Filter(correlated_filter)),
        scan_expr(&fixture.metadata, 0, fixture.customer),
    );
    let nation = scan_expr(&fixture.metadata, 1, fixture.nation);
    let expr = join_on(JoinType::Inner, customer, nation, vec![(
        column_ref(fixture.c_custkey, "c_custkey", int64()),
        column_ref(fixture.n_nationkey, "n_nationkey", int64()),
    )]);

    let rel_expr = RelExpr::with_s_expr(&expr);
    let RelOperator::Join(join) = expr.plan() else {
        unreachable!()
    };
    let verdict = join
        .enforcement(
            &rel_expr,
            PropertyKind::Rewindability,
            &RequiredProperty::default(),
            &PhysicalProperty::default(),
        )
        .unwrap();
    assert_eq!(verdict, Enforcement::Prohibited);

    let verdict = join
        .enforcement(
            &rel_expr,
            PropertyKind::PartitionPropagation,
            &RequiredProperty::default(),
            &PhysicalProperty::default(),
        )
        .unwrap();
    assert_eq!(verdict, Enforcement::Prohibited);

    // An uncorrelated join accepts a materialize on top.
    let case = JoinCase::new(JoinType::Inner);
    let rel_expr = RelExpr::with_s_expr(&case.expr);
    let RelOperator::Join(join) = case.expr.plan() else {
        unreachable!()
    };
    let verdict = join
        .enforcement(
            &rel_expr,
            PropertyKind::Rewindability,
            &RequiredProperty::default(),
            &PhysicalProperty::default(),
        )
        .unwrap();
    assert_eq!(verdict, Enforcement::Required);
}
