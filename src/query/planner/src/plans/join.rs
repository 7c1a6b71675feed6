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

use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use scatter_common_exception::ErrorCode;
use scatter_common_exception::Result;

use crate::optimizer::property::Distribution;
use crate::optimizer::property::Enforcement;
use crate::optimizer::property::HashedDistribution;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::PropertyKind;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::property::Rewindability;
use crate::optimizer::property::SingletonSite;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::plans::ScalarExpr;
use crate::ColumnSet;

/// Cap on the number of alternative redistribute requests a join issues,
/// so a wide equi-join does not explode the search.
pub const JOIN_REDISTRIBUTE_REQUESTS_CAP: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl Display for JoinType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT OUTER"),
            JoinType::Right => write!(f, "RIGHT OUTER"),
            JoinType::Full => write!(f, "FULL OUTER"),
            JoinType::Cross => write!(f, "CROSS"),
        }
    }
}

/// `left = right` with `left` over the first child's columns and `right`
/// over the second child's.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JoinEquiCondition {
    pub left: ScalarExpr,
    pub right: ScalarExpr,
    pub is_null_safe: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Join {
    pub join_type: JoinType,
    pub equi_conditions: Vec<JoinEquiCondition>,
    pub non_equi_conditions: Vec<ScalarExpr>,
}

impl Join {
    fn redistribute_request_count(&self) -> usize {
        self.equi_conditions
            .len()
            .min(JOIN_REDISTRIBUTE_REQUESTS_CAP)
    }

    /// Keys requested of the first child under redistribute slot `slot`:
    /// the combined key list first, then each key on its own.
    fn left_request_keys(&self, slot: usize) -> Vec<ScalarExpr> {
        if slot == 0 {
            self.equi_conditions
                .iter()
                .map(|condition| condition.left.clone())
                .collect()
        } else {
            vec![self.equi_conditions[slot - 1].left.clone()]
        }
    }

    fn right_keys(&self) -> Vec<ScalarExpr> {
        self.equi_conditions
            .iter()
            .map(|condition| condition.right.clone())
            .collect()
    }

    fn translate_keys(&self, delivered: &HashedDistribution) -> Option<HashedDistribution> {
        let mut keys = Vec::with_capacity(delivered.keys.len());
        for key in &delivered.keys {
            let right = self.equi_conditions.iter().find_map(|condition| {
                condition
                    .left
                    .matches_ignoring_casts(key)
                    .then(|| condition.right.clone())
            })?;
            keys.push(right);
        }
        Some(HashedDistribution::new(
            keys,
            delivered.nulls_colocated,
            delivered.duplicate_sensitive,
        ))
    }

    /// Map the first child's delivered hashed spec onto the second
    /// child's columns through the equi conditions, walking the
    /// equivalence chain when the primary spec does not translate.
    fn colocated_right_requirement(
        &self,
        delivered: &HashedDistribution,
    ) -> Option<HashedDistribution> {
        if let Some(translated) = self.translate_keys(delivered) {
            return Some(translated);
        }
        delivered
            .equivalent
            .as_deref()
            .and_then(|equivalent| self.colocated_right_requirement(equivalent))
    }
}

impl Operator for Join {
    fn rel_op(&self) -> RelOp {
        RelOp::Join
    }

    fn arity(&self) -> usize {
        2
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        let left_prop = rel_expr.derive_relational_prop_child(0)?;
        let right_prop = rel_expr.derive_relational_prop_child(1)?;
        let mut output_columns = left_prop.output_columns.clone();
        output_columns.union_with(&right_prop.output_columns);

        let mut condition_columns = ColumnSet::new();
        for condition in &self.equi_conditions {
            condition_columns.union_with(&condition.left.used_columns());
            condition_columns.union_with(&condition.right.used_columns());
        }
        for predicate in &self.non_equi_conditions {
            condition_columns.union_with(&predicate.used_columns());
        }
        let mut used_columns = left_prop.used_columns.clone();
        used_columns.union_with(&right_prop.used_columns);
        used_columns.union_with(&condition_columns);

        let mut outer_columns = left_prop.outer_columns.clone();
        outer_columns.union_with(&right_prop.outer_columns);
        outer_columns.union_with(&condition_columns);
        let outer_columns = outer_columns.exclude(&output_columns);

        Ok(Arc::new(RelationalProperty {
            output_columns,
            outer_columns,
            used_columns,
            coordinator_only: left_prop.coordinator_only || right_prop.coordinator_only,
        }))
    }

    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        let left_prop = rel_expr.derive_physical_prop_child(0)?;
        let right_prop = rel_expr.derive_physical_prop_child(1)?;
        let partition_index_map = left_prop
            .partition_index_map
            .combine(&right_prop.partition_index_map)?;

        let distribution = match (left_prop.distribution, right_prop.distribution) {
            // A colocated join makes either side's keys describe the
            // output layout.
            (Distribution::Hashed(left), Distribution::Hashed(right)) => {
                Distribution::Hashed(left.with_equivalent(right))
            }
            (Distribution::Universal, other) | (other, Distribution::Universal) => other,
            (Distribution::Replicated, other) | (other, Distribution::Replicated) => other,
            (left, right) if left == right => left,
            _ => Distribution::Any,
        };
        Ok(PhysicalProperty {
            distribution,
            ordering: vec![],
            rewindability: Rewindability::None,
            partition_index_map,
        })
    }

    fn distribution_request_count(&self) -> usize {
        // Redistribute alternatives, two broadcast directions, and the
        // singleton fallback.
        self.redistribute_request_count() + 3
    }

    fn compute_required_prop_child(
        &self,
        ctx: Arc<OptimizerContext>,
        rel_expr: &RelExpr,
        child_index: usize,
        request_index: usize,
        optimized_children: &[PhysicalProperty],
        required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>> {
        let redistribute_count = self.redistribute_request_count();
        let broadcast_right = redistribute_count;
        let broadcast_left = redistribute_count + 1;
        let singleton = redistribute_count + 2;

        if self.join_type == JoinType::Full && request_index != singleton {
            return Ok(None);
        }
        // A coordinator-bound side cannot take part in a redistributed or
        // broadcast join; gather the other side to it instead.
        if request_index != singleton
            && (rel_expr.derive_relational_prop_child(0)?.coordinator_only
                || rel_expr.derive_relational_prop_child(1)?.coordinator_only)
        {
            return Ok(None);
        }
        // Replicating the row-preserving side would duplicate its
        // null-extended rows on every worker.
        if self.join_type == JoinType::Left && request_index == broadcast_left {
            return Ok(None);
        }
        if self.join_type == JoinType::Right && request_index == broadcast_right {
            return Ok(None);
        }

        let distribution = if request_index < redistribute_count {
            if !ctx.config.enable_hash_redistribute {
                return Ok(None);
            }
            match child_index {
                0 => Distribution::Hashed(HashedDistribution::new(
                    self.left_request_keys(request_index),
                    true,
                    true,
                )),
                _ => {
                    let left_physical =
                        optimized_children.first().ok_or_else(|| {
                            ErrorCode::Internal("Join optimized without first child")
                        })?;
                    match &left_physical.distribution {
                        Distribution::Universal => Distribution::NonSingleton,
                        Distribution::Hashed(delivered) => {
                            match self.colocated_right_requirement(delivered) {
                                Some(translated) => Distribution::Hashed(translated),
                                None => return Ok(None),
                            }
                        }
                        _ => return Ok(None),
                    }
                }
            }
        } else if request_index == broadcast_right || request_index == broadcast_left {
            if !ctx.config.enable_broadcast {
                return Ok(None);
            }
            let replicated_child = if request_index == broadcast_right { 1 } else { 0 };
            if child_index == replicated_child {
                Distribution::Replicated
            } else if ctx.config.enable_redistribute_broadcast && !self.equi_conditions.is_empty() {
                let keys = if child_index == 0 {
                    self.left_request_keys(0)
                } else {
                    self.right_keys()
                };
                Distribution::Hashed(HashedDistribution::new(keys, true, true))
            } else {
                Distribution::NonSingleton
            }
        } else if request_index == singleton {
            match child_index {
                0 => Distribution::Singleton(SingletonSite::Coordinator),
                _ => {
                    let left_physical =
                        optimized_children.first().ok_or_else(|| {
                            ErrorCode::Internal("Join optimized without first child")
                        })?;
                    match &left_physical.distribution {
                        Distribution::Singleton(site) => Distribution::Singleton(*site),
                        // A universal first child adapts to wherever the
                        // second child actually lands, so force a real
                        // single stream there.
                        Distribution::Universal => {
                            Distribution::StrictSingleton(SingletonSite::Coordinator)
                        }
                        _ => Distribution::Singleton(SingletonSite::Coordinator),
                    }
                }
            }
        } else {
            return Err(ErrorCode::Internal(format!(
                "Invalid join request index: {}",
                request_index
            )));
        };

        Ok(Some(RequiredProperty {
            distribution,
            ordering: vec![],
            rewindability: Rewindability::None,
            partition_index_map: required.partition_index_map.clone(),
        }))
    }

    fn enforcement(
        &self,
        rel_expr: &RelExpr,
        kind: PropertyKind,
        _required: &RequiredProperty,
        _physical: &PhysicalProperty,
    ) -> Result<Enforcement> {
        match kind {
            // A correlated join is re-run per outer row; buffering its
            // output would freeze the first row's bindings.
            PropertyKind::Rewindability => {
                let rel_prop = rel_expr.derive_relational_prop()?;
                if !rel_prop.outer_columns.is_empty() {
                    Ok(Enforcement::Prohibited)
                } else {
                    Ok(Enforcement::Required)
                }
            }
            PropertyKind::PartitionPropagation => Ok(Enforcement::Prohibited),
            _ => Ok(Enforcement::Required),
        }
    }
}
