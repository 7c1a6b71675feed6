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

use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::property::Rewindability;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;

/// Buffers its input on first read so later reads replay it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Materialize;

impl Operator for Materialize {
    fn rel_op(&self) -> RelOp {
        RelOp::Materialize
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        rel_expr.derive_relational_prop_child(0)
    }

    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        let child_prop = rel_expr.derive_physical_prop_child(0)?;
        Ok(PhysicalProperty {
            distribution: child_prop.distribution,
            ordering: child_prop.ordering,
            rewindability: Rewindability::Rewindable,
            partition_index_map: child_prop.partition_index_map,
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
        Ok(Some(RequiredProperty {
            distribution: required.distribution.clone(),
            ordering: required.ordering.clone(),
            rewindability: Rewindability::None,
            partition_index_map: required.partition_index_map.clone(),
        }))
    }
}
