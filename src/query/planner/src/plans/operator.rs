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

use crate::impl_try_from_rel_operator;
use crate::optimizer::property::Enforcement;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::PropertyKind;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::Aggregate;
use crate::plans::ConstantTableScan;
use crate::plans::EvalScalar;
use crate::plans::Exchange;
use crate::plans::Filter;
use crate::plans::Join;
use crate::plans::Limit;
use crate::plans::Materialize;
use crate::plans::PartitionSelector;
use crate::plans::Scan;
use crate::plans::Sort;
use crate::plans::UnionAll;

pub trait Operator {
    /// Name of the operator.
    fn rel_op(&self) -> RelOp;

    /// Number of children.
    fn arity(&self) -> usize {
        1
    }

    /// Derive relational property of the operator.
    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>>;

    /// Derive the physical property delivered by the operator, given
    /// already-optimized children.
    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty>;

    /// Number of alternative distribution requests the operator issues
    /// for its children.
    fn distribution_request_count(&self) -> usize {
        1
    }

    /// Compute the required property for a child, under the given request
    /// alternative. Returning `None` abandons the request as infeasible.
    fn compute_required_prop_child(
        &self,
        ctx: Arc<OptimizerContext>,
        rel_expr: &RelExpr,
        child_index: usize,
        request_index: usize,
        optimized_children: &[PhysicalProperty],
        required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>>;

    /// Whether an enforcer for the given property kind may be planted
    /// directly above this operator.
    fn enforcement(
        &self,
        _rel_expr: &RelExpr,
        kind: PropertyKind,
        _required: &RequiredProperty,
        _physical: &PhysicalProperty,
    ) -> Result<Enforcement> {
        match kind {
            // There is no enforcer for partition propagation; it either
            // holds or the request dies.
            PropertyKind::PartitionPropagation => Ok(Enforcement::Prohibited),
            _ => Ok(Enforcement::Required),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelOp {
    Scan,
    ConstantTableScan,
    Filter,
    EvalScalar,
    Join,
    Aggregate,
    Sort,
    Limit,
    UnionAll,
    Exchange,
    Materialize,
    PartitionSelector,
}

impl Display for RelOp {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            RelOp::Scan => write!(f, "Scan"),
            RelOp::ConstantTableScan => write!(f, "ConstantTableScan"),
            RelOp::Filter => write!(f, "Filter"),
            RelOp::EvalScalar => write!(f, "EvalScalar"),
            RelOp::Join => write!(f, "Join"),
            RelOp::Aggregate => write!(f, "Aggregate"),
            RelOp::Sort => write!(f, "Sort"),
            RelOp::Limit => write!(f, "Limit"),
            RelOp::UnionAll => write!(f, "UnionAll"),
            RelOp::Exchange => write!(f, "Exchange"),
            RelOp::Materialize => write!(f, "Materialize"),
            RelOp::PartitionSelector => write!(f, "PartitionSelector"),
        }
    }
}

/// Relational operators.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelOperator {
    Scan(Scan),
    ConstantTableScan(ConstantTableScan),
    Filter(Filter),
    EvalScalar(EvalScalar),
    Join(Join),
    Aggregate(Aggregate),
    Sort(Sort),
    Limit(Limit),
    UnionAll(UnionAll),
    Exchange(Exchange),
    Materialize(Materialize),
    PartitionSelector(PartitionSelector),
}

impl Operator for RelOperator {
    fn rel_op(&self) -> RelOp {
        match self {
            RelOperator::Scan(rel_op) => rel_op.rel_op(),
            RelOperator::ConstantTableScan(rel_op) => rel_op.rel_op(),
            RelOperator::Filter(rel_op) => rel_op.rel_op(),
            RelOperator::EvalScalar(rel_op) => rel_op.rel_op(),
            RelOperator::Join(rel_op) => rel_op.rel_op(),
            RelOperator::Aggregate(rel_op) => rel_op.rel_op(),
            RelOperator::Sort(rel_op) => rel_op.rel_op(),
            RelOperator::Limit(rel_op) => rel_op.rel_op(),
            RelOperator::UnionAll(rel_op) => rel_op.rel_op(),
            RelOperator::Exchange(rel_op) => rel_op.rel_op(),
            RelOperator::Materialize(rel_op) => rel_op.rel_op(),
            RelOperator::PartitionSelector(rel_op) => rel_op.rel_op(),
        }
    }

    fn arity(&self) -> usize {
        match self {
            RelOperator::Scan(rel_op) => rel_op.arity(),
            RelOperator::ConstantTableScan(rel_op) => rel_op.arity(),
            RelOperator::Filter(rel_op) => rel_op.arity(),
            RelOperator::EvalScalar(rel_op) => rel_op.arity(),
            RelOperator::Join(rel_op) => rel_op.arity(),
            RelOperator::Aggregate(rel_op) => rel_op.arity(),
            RelOperator::Sort(rel_op) => rel_op.arity(),
            RelOperator::Limit(rel_op) => rel_op.arity(),
            RelOperator::UnionAll(rel_op) => rel_op.arity(),
            RelOperator::Exchange(rel_op) => rel_op.arity(),
            RelOperator::Materialize(rel_op) => rel_op.arity(),
            RelOperator::PartitionSelector(rel_op) => rel_op.arity(),
        }
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        match self {
            RelOperator::Scan(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::ConstantTableScan(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::Filter(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::EvalScalar(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::Join(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::Aggregate(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::Sort(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::Limit(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::UnionAll(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::Exchange(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::Materialize(rel_op) => rel_op.derive_relational_prop(rel_expr),
            RelOperator::PartitionSelector(rel_op) => rel_op.derive_relational_prop(rel_expr),
        }
    }

    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        match self {
            RelOperator::Scan(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::ConstantTableScan(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::Filter(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::EvalScalar(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::Join(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::Aggregate(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::Sort(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::Limit(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::UnionAll(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::Exchange(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::Materialize(rel_op) => rel_op.derive_physical_prop(rel_expr),
            RelOperator::PartitionSelector(rel_op) => rel_op.derive_physical_prop(rel_expr),
        }
    }

    fn distribution_request_count(&self) -> usize {
        match self {
            RelOperator::Scan(rel_op) => rel_op.distribution_request_count(),
            RelOperator::ConstantTableScan(rel_op) => rel_op.distribution_request_count(),
            RelOperator::Filter(rel_op) => rel_op.distribution_request_count(),
            RelOperator::EvalScalar(rel_op) => rel_op.distribution_request_count(),
            RelOperator::Join(rel_op) => rel_op.distribution_request_count(),
            RelOperator::Aggregate(rel_op) => rel_op.distribution_request_count(),
            RelOperator::Sort(rel_op) => rel_op.distribution_request_count(),
            RelOperator::Limit(rel_op) => rel_op.distribution_request_count(),
            RelOperator::UnionAll(rel_op) => rel_op.distribution_request_count(),
            RelOperator::Exchange(rel_op) => rel_op.distribution_request_count(),
            RelOperator::Materialize(rel_op) => rel_op.distribution_request_count(),
            RelOperator::PartitionSelector(rel_op) => rel_op.distribution_request_count(),
        }
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
        match self {
            RelOperator::Scan(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::ConstantTableScan(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::Filter(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::EvalScalar(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::Join(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::Aggregate(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::Sort(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::Limit(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::UnionAll(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::Exchange(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::Materialize(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
            RelOperator::PartitionSelector(rel_op) => rel_op.compute_required_prop_child(
                ctx,
                rel_expr,
                child_index,
                request_index,
                optimized_children,
                required,
            ),
        }
    }

    fn enforcement(
        &self,
        rel_expr: &RelExpr,
        kind: PropertyKind,
        required: &RequiredProperty,
        physical: &PhysicalProperty,
    ) -> Result<Enforcement> {
        match self {
            RelOperator::Scan(rel_op) => rel_op.enforcement(rel_expr, kind, required, physical),
            RelOperator::ConstantTableScan(rel_op) => {
                rel_op.enforcement(rel_expr, kind, required, physical)
            }
            RelOperator::Filter(rel_op) => rel_op.enforcement(rel_expr, kind, required, physical),
            RelOperator::EvalScalar(rel_op) => {
                rel_op.enforcement(rel_expr, kind, required, physical)
            }
            RelOperator::Join(rel_op) => rel_op.enforcement(rel_expr, kind, required, physical),
            RelOperator::Aggregate(rel_op) => {
                rel_op.enforcement(rel_expr, kind, required, physical)
            }
            RelOperator::Sort(rel_op) => rel_op.enforcement(rel_expr, kind, required, physical),
            RelOperator::Limit(rel_op) => rel_op.enforcement(rel_expr, kind, required, physical),
            RelOperator::UnionAll(rel_op) => rel_op.enforcement(rel_expr, kind, required, physical),
            RelOperator::Exchange(rel_op) => rel_op.enforcement(rel_expr, kind, required, physical),
            RelOperator::Materialize(rel_op) => {
                rel_op.enforcement(rel_expr, kind, required, physical)
            }
            RelOperator::PartitionSelector(rel_op) => {
                rel_op.enforcement(rel_expr, kind, required, physical)
            }
        }
    }
}

impl_try_from_rel_operator!(Scan);
impl_try_from_rel_operator!(ConstantTableScan);
impl_try_from_rel_operator!(Filter);
impl_try_from_rel_operator!(EvalScalar);
impl_try_from_rel_operator!(Join);
impl_try_from_rel_operator!(Aggregate);
impl_try_from_rel_operator!(Sort);
impl_try_from_rel_operator!(Limit);
impl_try_from_rel_operator!(UnionAll);
impl_try_from_rel_operator!(Exchange);
impl_try_from_rel_operator!(Materialize);
impl_try_from_rel_operator!(PartitionSelector);
