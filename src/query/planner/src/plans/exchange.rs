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
use crate::plans::SortItem;
use crate::IndexType;

/// Data movement between workers. Every variant restarts the stream, so
/// any ordering or rewindability below it is lost, except for the
/// order-preserving merge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// Redistribute rows by the hash of the key expressions.
    Hash(Vec<ScalarExpr>),
    /// Send every row to every worker.
    Broadcast,
    /// Gather all streams on the coordinator.
    Merge,
    /// Gather on the coordinator, merging streams that are already
    /// sorted this way.
    MergeSort(Vec<SortItem>),
    /// Route each row to the worker named by the column's value.
    Routed(IndexType),
}

impl Operator for Exchange {
    fn rel_op(&self) -> RelOp {
        RelOp::Exchange
    }

    fn derive_relational_prop(&self, rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        rel_expr.derive_relational_prop_child(0)
    }

    fn derive_physical_prop(&self, rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        let child_prop = rel_expr.derive_physical_prop_child(0)?;
        let (distribution, ordering) = match self {
            Exchange::Hash(keys) => (
                Distribution::Hashed(HashedDistribution::new(keys.clone(), true, true)),
                vec![],
            ),
            Exchange::Broadcast => (Distribution::Replicated, vec![]),
            Exchange::Merge => (Distribution::Singleton(SingletonSite::Coordinator), vec![]),
            Exchange::MergeSort(items) => (
                Distribution::Singleton(SingletonSite::Coordinator),
                items.clone(),
            ),
            Exchange::Routed(column) => (Distribution::Routed(*column), vec![]),
        };
        Ok(PhysicalProperty {
            distribution,
            ordering,
            rewindability: Rewindability::None,
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
        let ordering = match self {
            Exchange::MergeSort(items) => items.clone(),
            _ => vec![],
        };
        Ok(Some(RequiredProperty {
            distribution: Distribution::Any,
            ordering,
            rewindability: Rewindability::None,
            partition_index_map: required.partition_index_map.clone(),
        }))
    }

    fn enforcement(
        &self,
        _rel_expr: &RelExpr,
        kind: PropertyKind,
        _required: &RequiredProperty,
        _physical: &PhysicalProperty,
    ) -> Result<Enforcement> {
        match kind {
            // Motion directly on top of motion is never planned.
            PropertyKind::Distribution => Ok(Enforcement::Prohibited),
            PropertyKind::PartitionPropagation => Ok(Enforcement::Prohibited),
            _ => Ok(Enforcement::Required),
        }
    }
}
