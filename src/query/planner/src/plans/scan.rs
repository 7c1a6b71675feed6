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
use crate::optimizer::property::PartConstraint;
use crate::optimizer::property::PartitionIndexMap;
use crate::optimizer::property::PartitionTableInfo;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::PropagatorCount;
use crate::optimizer::property::RelationalProperty;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::property::Rewindability;
use crate::optimizer::property::SingletonSite;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::plans::BoundColumnRef;
use crate::plans::ColumnBinding;
use crate::plans::Operator;
use crate::plans::RelOp;
use crate::plans::ScalarExpr;
use crate::ColumnSet;
use crate::IndexType;
use crate::Metadata;
use crate::TableDistribution;

/// How the rows of the scanned table are laid out across the cluster.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScanDistribution {
    Hash(Vec<ColumnBinding>),
    Random,
    Replicated,
    Coordinator,
}

/// A dynamically partitioned scan acts as a partition consumer until a
/// selector elsewhere in the plan resolves it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScanPartition {
    pub key_columns: Vec<IndexType>,
    pub relation_constraint: PartConstraint,
    pub expected_propagators: PropagatorCount,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Scan {
    pub scan_id: IndexType,
    pub table_index: IndexType,
    pub columns: ColumnSet,
    pub distribution: ScanDistribution,
    pub partition: Option<ScanPartition>,
}

impl Scan {
    /// Build a scan with distribution and partitioning resolved from the
    /// table's metadata entry.
    pub fn try_create(
        metadata: &Metadata,
        scan_id: IndexType,
        table_index: IndexType,
        columns: ColumnSet,
    ) -> Result<Scan> {
        let table = metadata.table(table_index)?;
        let distribution = match table.distribution() {
            TableDistribution::Hash(key_columns) => {
                let mut bindings = Vec::with_capacity(key_columns.len());
                for index in key_columns {
                    let column = metadata.column(*index)?;
                    bindings.push(ColumnBinding::new(
                        *index,
                        column.name(),
                        column.data_type().clone(),
                    ));
                }
                ScanDistribution::Hash(bindings)
            }
            TableDistribution::Random => ScanDistribution::Random,
            TableDistribution::Replicated => ScanDistribution::Replicated,
            TableDistribution::Coordinator => ScanDistribution::Coordinator,
        };
        let partition = table.partition().map(|info| ScanPartition {
            key_columns: info.key_columns.clone(),
            relation_constraint: PartConstraint::new(
                info.partition_ids.iter().copied(),
                info.default_partition,
            ),
            expected_propagators: PropagatorCount::Unbounded,
        });
        Ok(Scan {
            scan_id,
            table_index,
            columns,
            distribution,
            partition,
        })
    }
}

impl Operator for Scan {
    fn rel_op(&self) -> RelOp {
        RelOp::Scan
    }

    fn arity(&self) -> usize {
        0
    }

    fn derive_relational_prop(&self, _rel_expr: &RelExpr) -> Result<Arc<RelationalProperty>> {
        Ok(Arc::new(RelationalProperty {
            output_columns: self.columns.clone(),
            outer_columns: ColumnSet::new(),
            used_columns: self.columns.clone(),
            coordinator_only: matches!(self.distribution, ScanDistribution::Coordinator),
        }))
    }

    fn derive_physical_prop(&self, _rel_expr: &RelExpr) -> Result<PhysicalProperty> {
        let distribution = match &self.distribution {
            ScanDistribution::Hash(bindings) => {
                let keys = bindings
                    .iter()
                    .map(|binding| {
                        ScalarExpr::BoundColumnRef(BoundColumnRef {
                            column: binding.clone(),
                        })
                    })
                    .collect();
                Distribution::Hashed(HashedDistribution::new(keys, true, true))
            }
            ScanDistribution::Random => Distribution::Any,
            ScanDistribution::Replicated => Distribution::Replicated,
            ScanDistribution::Coordinator => Distribution::Singleton(SingletonSite::Coordinator),
        };
        let mut partition_index_map = PartitionIndexMap::default();
        if let Some(partition) = &self.partition {
            partition_index_map.insert(PartitionTableInfo::consumer(
                self.scan_id,
                self.table_index,
                partition.key_columns.clone(),
                partition.relation_constraint.clone(),
                partition.expected_propagators,
            ))?;
        }
        Ok(PhysicalProperty {
            distribution,
            ordering: vec![],
            rewindability: Rewindability::Rescannable,
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
        _required: &RequiredProperty,
    ) -> Result<Option<RequiredProperty>> {
        Err(ErrorCode::Internal("Scan has no children"))
    }
}
