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

use scatter_common_exception::Result;

use crate::optimizer::property::Distribution;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::plans::ScalarExpr;
use crate::plans::SortItem;
use crate::ColumnSet;
use crate::IndexType;

/// Strict projection: only the item indexes survive to the parent.
/// A pass-through column keeps its index; a computed expression is bound
/// to a fresh one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EvalScalar {
    pub items: Vec<ScalarItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScalarItem {
    pub scalar: ScalarExpr,
    pub index: IndexType,
}

impl EvalScalar {
    fn output_columns(&self) -> ColumnSet {
        self.items.iter().map(|item| item.index).collect()
    }
}

impl Operator for EvalScalar {
    fn rel_op(&self) -> RelOp {
        RelOp::EvalScalar
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        let child_prop = rel_expr.derive_relational_prop_child(0)?;
        let output_columns = self.output_columns();
        let mut item_columns = ColumnSet::new();
        for item in &self.items {
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
        let output_columns = self.output_columns();
        let pruned = child_output.exclude(&output_columns);

        let distribution = match child_prop.distribution {
            Distribution::Hashed(hashed) => match hashed.exclude_columns(&pruned) {
                Some(remaining) => Distribution::Hashed(remaining),
                // Every hash key mentioned a pruned column; the layout
                // can no longer be described to the parent.
                None => Distribution::Any,
            },
            other => other,
        };
        let ordering: Vec<SortItem> = child_prop
            .ordering
            .iter()
            .take_while(|item| output_columns.contains(item.index))
            .copied()
            .collect();
        Ok(PhysicalProperty {
            distribution,
            ordering,
            rewindability: child_prop.rewindability,
            partition_index_map: child_prop.partition_index_map,
        })
    }

    fn compute_required_prop_child(
        &self,
        _ctx: Arc<OptimizerContext>,
        rel_expr: &RelExpr,
        _child_index: usize,
        _request_index: usize,
        _optimized_children: &[PhysicalProperty],
        required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>> {
        let child_output = rel_expr.derive_relational_prop_child(0)?.output_columns.clone();
        let computed = self.output_columns().exclude(&child_output);

        // Keys over computed columns cannot be asked of the child;
        // dropping them keeps the request satisfiable by the subset rule.
        let distribution = match &required.distribution {
            Distribution::Hashed(hashed) => match hashed.exclude_columns(&computed) {
                Some(remaining) => Distribution::Hashed(remaining),
                None => Distribution::Any,
            },
            other => other.clone(),
        };
        let ordering: Vec<SortItem> = required
            .ordering
            .iter()
            .take_while(|item| child_output.contains(item.index))
            .copied()
            .collect();
        Ok(Some(RequiredProperty {
            distribution,
            ordering,
            rewindability: required.rewindability,
            partition_index_map: required.partition_index_map.clone(),
        }))
    }
}
