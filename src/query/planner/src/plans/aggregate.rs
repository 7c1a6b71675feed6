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

use scatter_common_exception::ErrorCode;
use scatter_common_exception::Result;

use crate::optimizer::property::Distribution;
use crate::optimizer::property::HashedDistribution;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::property::Rewindability;
use crate::optimizer::property::SingletonSite;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::plans::ScalarItem;
use crate::ColumnSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateMode {
    /// Local pre-aggregation, runs wherever the input already is.
    Partial,
    /// Combines partial states; needs all rows of a group colocated.
    Final,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aggregate {
    pub mode: AggregateMode,
    pub group_items: Vec<ScalarItem>,
    pub aggregate_functions: Vec<ScalarItem>,
}

impl Aggregate {
    fn output_columns(&self) -> ColumnSet {
        self.group_items
            .iter()
            .chain(self.aggregate_functions.iter())
            .map(|item| item.index)
            .collect()
    }

    fn group_keys(&self) -> Vec<crate::plans::ScalarExpr> {
        self.group_items
            .iter()
            .map(|item| item.scalar.clone())
            .collect()
    }
}

impl Operator for Aggregate {
    fn rel_op(&self) -> RelOp {
        RelOp::Aggregate
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        let child_prop = rel_expr.derive_relational_prop_child(0)?;
        let output_columns = self.output_columns();
        let mut item_columns = ColumnSet::new();
        for item in self.group_items.iter().chain(self.aggregate_functions.iter()) {
            item_columns.union_with(&item.scalar.used_columns());
        }
        let mut outer_columns = child_prop.outer_columns.clone();
        let correlated = item_columns.exclude(&child_prop.output_columns);
        outer_columns.union_with(&correlated);
        let mut used_columns = child_prop.used_columns.clone();
        used_columns.union_with(&item_columns);
        Ok(Arc::new(RelationalProperty {
            output_columns,
            outer_columns,
            used_columns,
            coordinator_only: child_prop.coordinator_only,
        }))
    }

    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        let child_prop = rel_expr.derive_physical_prop_child(0)?;
        let child_output = rel_expr.derive_relational_prop_child(0)?.output_columns.clone();
        let pruned = child_output.exclude(&self.output_columns());

        let distribution = match child_prop.distribution {
            Distribution::Hashed(hashed) => match hashed.exclude_columns(&pruned) {
                Some(remaining) => Distribution::Hashed(remaining),
                None => Distribution::Any,
            },
            other => other,
        };
        Ok(PhysicalProperty {
            distribution,
            ordering: vec![],
            rewindability: child_prop.rewindability.min(Rewindability::Rescannable),
            partition_index_map: child_prop.partition_index_map,
        })
    }

    fn distribution_request_count(&self) -> usize {
        match self.mode {
            AggregateMode::Partial => 1,
            // Colocate by group keys first, gather everything as the
            // fallback.
            AggregateMode::Final if !self.group_items.is_empty() => 2,
            AggregateMode::Final => 1,
        }
    }

    fn compute_required_prop_child(
        &self,
        ctx: Arc<OptimizerContext>,
        _rel_expr: &RelExpr,
        _child_index: usize,
        request_index: usize,
        _optimized_children: &[PhysicalProperty],
        required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>> {
        let distribution = match self.mode {
            AggregateMode::Partial => Distribution::Any,
            AggregateMode::Final => match (self.group_items.is_empty(), request_index) {
                (true, 0) => Distribution::Singleton(SingletonSite::Coordinator),
                (false, 0) => {
                    if !ctx.config.enable_hash_redistribute {
                        return Ok(None);
                    }
                    Distribution::Hashed(HashedDistribution::new(self.group_keys(), true, true))
                }
                (false, 1) => Distribution::Singleton(SingletonSite::Coordinator),
                _ => {
                    return Err(ErrorCode::Internal(format!(
                        "Invalid aggregate request index: {}",
                        request_index
                    )));
                }
            },
        };
        Ok(Some(RequiredProperty {
            distribution,
            ordering: vec![],
            rewindability: Rewindability::None,
            partition_index_map: required.partition_index_map.clone(),
        }))
    }
}
