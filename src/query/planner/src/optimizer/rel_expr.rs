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

use crate::optimizer::property::Enforcement;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::PropertyKind;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::OptimizerContext;
use crate::optimizer::SExpr;
use crate::plans::Operator;

/// A helper to access children of an `SExpr` and derive properties
/// through the operator protocol.
pub enum RelExpr<'a> {
    SExpr { expr: &'a SExpr },
}

impl<'a> RelExpr<'a> {
    pub fn with_s_expr(s_expr: &'a SExpr) -> Self {
        RelExpr::SExpr { expr: s_expr }
    }

    pub fn derive_relational_prop(&self) -> Result<Arc<RelationalProperty>> {
        match self {
            RelExpr::SExpr { expr } => {
                if let Some(rel_prop) = expr.rel_prop.lock().as_ref() {
                    return Ok(rel_prop.clone());
                }
                let rel_prop = expr.plan.derive_relational_prop(self)?;
                *expr.rel_prop.lock() = Some(rel_prop.clone());
                Ok(rel_prop)
            }
        }
    }

    pub fn derive_relational_prop_child(&self, index: usize) -> Result<Arc<RelationalProperty>> {
        match self {
            RelExpr::SExpr { expr } => {
                let child = expr.child(index)?;
                RelExpr::with_s_expr(child).derive_relational_prop()
            }
        }
    }

    pub fn derive_physical_prop(&self) -> Result<PhysicalProperty> {
        match self {
            RelExpr::SExpr { expr } => expr.plan.derive_physical_prop(self),
        }
    }

    pub fn derive_physical_prop_child(&self, index: usize) -> Result<PhysicalProperty> {
        match self {
            RelExpr::SExpr { expr } => {
                let child = expr.child(index)?;
                RelExpr::with_s_expr(child).derive_physical_prop()
            }
        }
    }

    pub fn distribution_request_count(&self) -> usize {
        match self {
            RelExpr::SExpr { expr } => expr.plan.distribution_request_count(),
        }
    }

    pub fn compute_required_prop_child(
        &self,
        ctx: Arc<OptimizerContext>,
        child_index: usize,
        request_index: usize,
        optimized_children: &[PhysicalProperty],
        required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>> {
        match self {
            RelExpr::SExpr { expr } => expr.plan.compute_required_prop_child(
                ctx,
                self,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
        }
    }

    pub fn enforcement(
        &self,
        kind: PropertyKind,
        required: &RequiredProperty,
        physical: &PhysicalProperty,
    ) -> Result<Enforcement> {
        match self {
            RelExpr::SExpr { expr } => expr.plan.enforcement(self, kind, required, physical),
        }
    }
}
