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

use log::debug;
use scatter_common_exception::ErrorCode;
use scatter_common_exception::Result;

use crate::optimizer::property::enforce_property;
use crate::optimizer::property::Distribution;
use crate::optimizer::property::PropagatorCount;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::property::Rewindability;
use crate::optimizer::property::SingletonSite;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::optimizer::SExpr;
use crate::plans::Exchange;
use crate::plans::Operator;
use crate::plans::RelOperator;

/// Require and enforce physical property from a physical `SExpr`.
///
/// Walks the tree top-down handing each child the requirement its parent
/// computed for it, trying the parent's request alternatives in order and
/// keeping the first one where every child and the node itself can be
/// made to satisfy. Returns `Ok(None)` when no alternative works out;
/// an infeasible plan is an answer here, not an error.
#[recursive::recursive]
pub fn require_property(
    ctx: Arc<OptimizerContext>,
    required: &RequiredProperty,
    s_expr: &SExpr,
) -> Result<Option<SExpr>> {
    let rel_expr = RelExpr::with_s_expr(s_expr);
    if s_expr.arity() == 0 {
        return finalize(ctx, s_expr, required);
    }

    let request_count = rel_expr.distribution_request_count();
    'requests: for request_index in 0..request_count {
        let mut optimized_children = Vec::with_capacity(s_expr.arity());
        let mut children = Vec::with_capacity(s_expr.arity());
        for child_index in 0..s_expr.arity() {
            let Some(child_required) = rel_expr.compute_required_prop_child(
                ctx.clone(),
                child_index,
                request_index,
                &optimized_children,
                required,
            )?
            else {
                debug!(
                    "Abandoning request {} of {}: infeasible for child {}",
                    request_index,
                    s_expr.plan().rel_op(),
                    child_index
                );
                continue 'requests;
            };
            let child = s_expr.child(child_index)?;
            let child_required = pin_required(
                child_required,
                &*RelExpr::with_s_expr(child).derive_relational_prop()?,
            );
            let Some(optimized_child) = require_property(ctx.clone(), &child_required, child)?
            else {
                debug!(
                    "Abandoning request {} of {}: child {} cannot deliver {}",
                    request_index,
                    s_expr.plan().rel_op(),
                    child_index,
                    child_required
                );
                continue 'requests;
            };
            let child_physical = RelExpr::with_s_expr(&optimized_child).derive_physical_prop()?;
            optimized_children.push(child_physical);
            children.push(optimized_child);
        }
        let optimized = s_expr.replace_children(children);
        if let Some(result) = finalize(ctx.clone(), &optimized, required)? {
            return Ok(Some(result));
        }
    }
    Ok(None)
}

/// Subtree-level overrides that trump whatever the parent asked for: a
/// correlated subtree is re-run per outer row on every worker, and a
/// coordinator-only subtree cannot leave the coordinator.
fn pin_required(
    mut required: RequiredProperty,
    child_prop: &RelationalProperty,
) -> RequiredProperty {
    if !child_prop.outer_columns.is_empty() {
        required.distribution = Distribution::Replicated;
        required.rewindability = Rewindability::Rewindable;
    }
    if child_prop.coordinator_only {
        required.distribution = Distribution::Singleton(SingletonSite::Coordinator);
    }
    required
}

fn finalize(
    ctx: Arc<OptimizerContext>,
    s_expr: &SExpr,
    required: &RequiredProperty,
) -> Result<Option<SExpr>> {
    let physical = RelExpr::with_s_expr(s_expr).derive_physical_prop()?;
    if required.satisfied_by(&physical) {
        return Ok(Some(s_expr.clone()));
    }
    enforce_property(ctx, s_expr, required, &physical)
}

/// Turn a physical plan into one whose result lands on the coordinator
/// with every property requirement met along the way.
pub fn optimize_distributed_plan(ctx: Arc<OptimizerContext>, s_expr: &SExpr) -> Result<SExpr> {
    let required = RequiredProperty::default();
    let result = require_property(ctx, &required, s_expr)?
        .ok_or_else(|| ErrorCode::Internal("Cannot build a feasible distributed plan"))?;

    let physical = RelExpr::with_s_expr(&result).derive_physical_prop()?;
    let result = if physical
        .distribution
        .satisfies(&Distribution::Singleton(SingletonSite::Coordinator))
    {
        result
    } else if physical.ordering.is_empty() {
        SExpr::create_unary(Arc::new(RelOperator::Exchange(Exchange::Merge)), result)
    } else {
        SExpr::create_unary(
            Arc::new(RelOperator::Exchange(Exchange::MergeSort(
                physical.ordering.clone(),
            ))),
            result,
        )
    };

    let physical = RelExpr::with_s_expr(&result).derive_physical_prop()?;
    for info in physical.partition_index_map.entries() {
        if info.is_unresolved_consumer() {
            if let PropagatorCount::Bounded(_) = info.expected_propagators() {
                return Err(ErrorCode::UnresolvedPartitionPropagation(format!(
                    "Partition propagation for scan {} was never resolved",
                    info.scan_id()
                )));
            }
        }
    }
    Ok(result)
}
