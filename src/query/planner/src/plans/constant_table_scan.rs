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
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::property::Rewindability;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::ColumnSet;
use crate::Scalar;

/// Literal rows materialized at plan time. The same rows are visible on
/// every node, which is what lets this operator deliver the universal
/// distribution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConstantTableScan {
    pub values: Vec<Vec<Scalar>>,
    pub columns: ColumnSet,
}

impl Operator for ConstantTableScan {
    fn rel_op(&self) -> RelOp {
        RelOp::ConstantTableScan
    }

    fn arity(&self) -> usize {
        0
    }

    fn derive_relational_prop(&self, _rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        Ok(Arc::new(RelationalProperty {
            output_columns: self.columns.clone(),
            outer_columns: ColumnSet::new(),
            used_columns: self.columns.clone(),
            coordinator_only: false,
        }))
    }

    fn derive_physical_prop(&self, _rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        Ok(PhysicalProperty {
            distribution: Distribution::Universal,
            ordering: vec![],
            rewindability: Rewindability::Rescannable,
            partition_index_map: Default::default(),
        })
    }

    fn compute_required_prop_child(
        &self,
        _ctx: Arc<OptimizerContext>,
        _rel_expr: &RelExpr,
        _child_index: usize,
        _request_index: usize,
        _optimized_children: &[PhysicalProperty],
        _required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>> {
        Err(ErrorCode::Internal("ConstantTableScan has no children"))
    }
}
