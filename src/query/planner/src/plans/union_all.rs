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
use crate::optimizer::property::Rewindability;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::ColumnSet;
use crate::IndexType;

/// Bag union. The two input column lists are mapped position-wise onto
/// fresh output indexes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnionAll {
    pub left_outputs: Vec<IndexType>,
    pub right_outputs: Vec<IndexType>,
    pub output_indexes: Vec<IndexType>,
}

impl Operator for UnionAll {
    fn rel_op(&self) -> RelOp {
        RelOp::UnionAll
    }

    fn arity(&self) -> usize {
        2
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        let left_prop = rel_expr.derive_relational_prop_child(0)?;
        let right_prop = rel_expr.derive_relational_prop_child(1)?;
        let output_columns: ColumnSet = self.output_indexes.iter().copied().collect();
        let mut used_columns = left_prop.used_columns.clone();
        used_columns.union_with(&right_prop.used_columns);
        used_columns.union_with(&self.left_outputs.iter().copied().collect());
        used_columns.union_with(&self.right_outputs.iter().copied().collect());
        let mut outer_columns = left_prop.outer_columns.clone();
        outer_columns.union_with(&right_prop.outer_columns);
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
        let distribution = match (&left_prop.distribution, &right_prop.distribution) {
            (Distribution::Singleton(left), Distribution::Singleton(right)) if left == right => {
                Distribution::Singleton(*left)
            }
            (Distribution::Replicated, Distribution::Replicated) => Distribution::Replicated,
            (Distribution::Universal, Distribution::Universal) => Distribution::Universal,
            _ => Distribution::NonSingleton,
        };
        Ok(PhysicalProperty {
            distribution,
            ordering: vec![],
            rewindability: Rewindability::None,
            partition_index_map,
        })
    }

    fn compute_required_prop_child(
        &self,
        _ctx: Arc<OptimizerContext>,
        _rel_expr: &RelExpr,
        _child_index: usize,
        _request_index: usize,
        _optimized_children: &[PhysicalProperty],
        required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>> {
        // The output indexes are fresh, so a hashed requirement cannot be
        // phrased over a branch's columns; only singleton requirements
        // push through.
        let distribution = match &required.distribution {
            Distribution::Singleton(site) => Distribution::Singleton(*site),
            Distribution::StrictSingleton(site) => Distribution::StrictSingleton(*site),
            _ => Distribution::Any,
        };
        Ok(Some(RequiredProperty {
            distribution,
            ordering: vec![],
            rewindability: Rewindability::None,
            partition_index_map: required.partition_index_map.clone(),
        }))
    }
}
