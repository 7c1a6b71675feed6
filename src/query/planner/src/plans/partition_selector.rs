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

use crate::optimizer::property::PartConstraint;
use crate::optimizer::property::PartitionIndexMap;
use crate::optimizer::property::PartitionTableInfo;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::IndexType;

/// Passes its input through while proving which partitions of a dynamic
/// scan elsewhere in the plan can actually match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartitionSelector {
    /// The dynamic scan being pruned.
    pub scan_id: IndexType,
    /// Identifies this selector in the proven-constraint map.
    pub selector_id: IndexType,
    pub relation_id: IndexType,
    pub key_columns: Vec<IndexType>,
    pub relation_constraint: PartConstraint,
    /// The constraint this selector proves.
    pub proven: PartConstraint,
}

impl Operator for PartitionSelector {
    fn rel_op(&self) -> RelOp {
        RelOp::PartitionSelector
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        rel_expr.derive_relational_prop_child(0)
    }

    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        let child_prop = rel_expr.derive_physical_prop_child(0)?;
        let mut own_map = PartitionIndexMap::default();
        own_map.insert(PartitionTableInfo::propagator(
            self.scan_id,
            self.relation_id,
            self.key_columns.clone(),
            self.relation_constraint.clone(),
            self.selector_id,
            self.proven.clone(),
        ))?;
        let partition_index_map = child_prop.partition_index_map.combine(&own_map)?;
        Ok(PhysicalProperty {
            distribution: child_prop.distribution,
            ordering: child_prop.ordering,
            rewindability: child_prop.rewindability,
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
        Ok(Some(required.clone()))
    }
}
