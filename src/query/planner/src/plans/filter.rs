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
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::plans::ScalarExpr;

/// Predicates are conjunctive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
    pub predicates: Vec<ScalarExpr>,
}

impl Operator for Filter {
    fn rel_op(&self) -> RelOp {
        RelOp::Filter
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        let child_prop = rel_expr.derive_relational_prop_child(0)?;
        let mut predicate_columns = crate::ColumnSet::new();
        for predicate in &self.predicates {
            predicate_columns.union_with(&predicate.used_columns());
        }
        let mut outer_columns = child_prop.outer_columns.clone();
        let correlated = predicate_columns.exclude(&child_prop.output_columns);
        outer_columns.union_with(&correlated);
        let mut used_columns = child_prop.used_columns.clone();
        used_columns.union_with(&predicate_columns);
        Ok(Arc::new(RelationalProperty {
            output_columns: child_prop.output_columns.clone(),
            outer_columns,
            used_columns,
            coordinator_only: child_prop.coordinator_only,
        }))
    }

    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        rel_expr.derive_physical_prop_child(0)
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
