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

use itertools::Itertools;

use crate::optimizer::property::Distribution;
use crate::optimizer::property::PartitionIndexMap;
use crate::plans::SortItem;
use crate::ColumnSet;

/// How often a subplan can be re-read without re-execution.
///
/// The order of the variants is the strength order: a subplan delivering
/// a stronger level satisfies any weaker requirement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rewindability {
    /// Rows are produced once; a second read re-runs the subplan.
    #[default]
    None,
    /// The subplan can restart from the beginning on demand.
    Rescannable,
    /// Output is buffered and can be replayed without re-execution.
    Rewindable,
}

impl Display for Rewindability {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Rewindability::None => write!(f, "NONE"),
            Rewindability::Rescannable => write!(f, "RESCANNABLE"),
            Rewindability::Rewindable => write!(f, "REWINDABLE"),
        }
    }
}

/// The physical property kinds an operator is consulted about before an
/// enforcer is planted on top of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Distribution,
    Ordering,
    Rewindability,
    PartitionPropagation,
}

/// An operator's verdict on enforcing one property kind directly above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Enforcement {
    /// The operator guarantees the property itself; no enforcer needed.
    Unnecessary,
    /// An enforcer on top is acceptable.
    Required,
    /// An enforcer on top would be incorrect; the request is infeasible.
    Prohibited,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequiredProperty {
    pub distribution: Distribution,
    pub ordering: Vec<SortItem>,
    pub rewindability: Rewindability,
    pub partition_index_map: PartitionIndexMap,
}

impl RequiredProperty {
    pub fn with_distribution(distribution: Distribution) -> Self {
        RequiredProperty {
            distribution,
            ..Default::default()
        }
    }

    pub fn satisfied_by(&self, physical: &PhysicalProperty) -> bool {
        physical.distribution.satisfies(&self.distribution)
            && satisfies_ordering(&physical.ordering, &self.ordering)
            && physical.rewindability >= self.rewindability
            && physical
                .partition_index_map
                .satisfies(&self.partition_index_map)
    }
}

impl Display for RequiredProperty {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "distribution: {}, ordering: [{}], rewindability: {}",
            self.distribution,
            self.ordering.iter().map(|item| item.to_string()).join(", "),
            self.rewindability
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PhysicalProperty {
    pub distribution: Distribution,
    pub ordering: Vec<SortItem>,
    pub rewindability: Rewindability,
    pub partition_index_map: PartitionIndexMap,
}

/// An ordering is satisfied when the delivered ordering carries it as an
/// exact prefix.
pub fn satisfies_ordering(delivered: &[SortItem], required: &[SortItem]) -> bool {
    delivered.len() >= required.len() && delivered[..required.len()] == *required
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RelationalProperty {
    /// Columns the operator exposes to its parent.
    pub output_columns: ColumnSet,
    /// Columns referenced from outside the subtree, i.e. correlated.
    pub outer_columns: ColumnSet,
    /// All columns referenced anywhere inside the subtree.
    pub used_columns: ColumnSet,
    /// The subtree must run on the coordinator, e.g. it reads a
    /// coordinator-only catalog table.
    pub coordinator_only: bool,
}
