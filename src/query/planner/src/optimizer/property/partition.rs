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

use std::collections::BTreeMap;
use std::hash::Hash;
use std::hash::Hasher;

use roaring::RoaringTreemap;
use scatter_common_exception::ErrorCode;
use scatter_common_exception::Result;

use crate::IndexType;

/// The set of partitions a subplan has proven it will touch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartConstraint {
    partitions: RoaringTreemap,
    includes_default: bool,
}

impl PartConstraint {
    pub fn new(partitions: impl IntoIterator<Item = u64>, includes_default: bool) -> Self {
        PartConstraint {
            partitions: partitions.into_iter().collect(),
            includes_default,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty() && !self.includes_default
    }

    pub fn includes_default(&self) -> bool {
        self.includes_default
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len() as usize
    }

    pub fn combine(&self, other: &PartConstraint) -> PartConstraint {
        PartConstraint {
            partitions: &self.partitions | &other.partitions,
            includes_default: self.includes_default || other.includes_default,
        }
    }

    /// Whether `self` admits at least every partition `other` admits.
    pub fn covers(&self, other: &PartConstraint) -> bool {
        other.partitions.is_subset(&self.partitions)
            && (self.includes_default || !other.includes_default)
    }
}

impl Hash for PartConstraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.includes_default.hash(state);
        self.partitions.len().hash(state);
        for partition in self.partitions.iter().take(8) {
            partition.hash(state);
        }
    }
}

/// What a subplan does for one dynamically partitioned scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Manipulator {
    /// The subplan plants a partition-selector filter that will prune a
    /// dynamic scan living elsewhere in the plan.
    Propagator,
    /// The subplan contains the dynamic scan, still awaiting pruning.
    Consumer,
    /// Terminal: the scan is fully resolved.
    Resolver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropagatorCount {
    Bounded(usize),
    /// Unknown number of selectors; the consumer accepts any amount,
    /// including none.
    Unbounded,
}

/// Per-scan-id propagation bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartitionTableInfo {
    scan_id: IndexType,
    relation_id: IndexType,
    key_columns: Vec<IndexType>,
    relation_constraint: PartConstraint,
    manipulator: Manipulator,
    expected_propagators: PropagatorCount,
    /// Constraints proven so far, keyed by the plan-scan id of the
    /// subplan that proved each one.
    proven: BTreeMap<IndexType, PartConstraint>,
    is_partial: bool,
}

impl PartitionTableInfo {
    pub fn consumer(
        scan_id: IndexType,
        relation_id: IndexType,
        key_columns: Vec<IndexType>,
        relation_constraint: PartConstraint,
        expected_propagators: PropagatorCount,
    ) -> Self {
        let mut info = PartitionTableInfo {
            scan_id,
            relation_id,
            key_columns,
            relation_constraint,
            manipulator: Manipulator::Consumer,
            expected_propagators,
            proven: BTreeMap::new(),
            is_partial: true,
        };
        info.recompute_partial();
        info
    }

    pub fn propagator(
        scan_id: IndexType,
        relation_id: IndexType,
        key_columns: Vec<IndexType>,
        relation_constraint: PartConstraint,
        selector_id: IndexType,
        proven_constraint: PartConstraint,
    ) -> Self {
        let mut proven = BTreeMap::new();
        proven.insert(selector_id, proven_constraint);
        let mut info = PartitionTableInfo {
            scan_id,
            relation_id,
            key_columns,
            relation_constraint,
            manipulator: Manipulator::Propagator,
            expected_propagators: PropagatorCount::Bounded(0),
            proven,
            is_partial: true,
        };
        info.recompute_partial();
        info
    }

    pub fn scan_id(&self) -> IndexType {
        self.scan_id
    }

    pub fn relation_id(&self) -> IndexType {
        self.relation_id
    }

    pub fn key_columns(&self) -> &[IndexType] {
        &self.key_columns
    }

    pub fn manipulator(&self) -> Manipulator {
        self.manipulator
    }

    pub fn expected_propagators(&self) -> PropagatorCount {
        self.expected_propagators
    }

    pub fn proven(&self) -> &BTreeMap<IndexType, PartConstraint> {
        &self.proven
    }

    /// Whether the proven constraints still cover less than the whole
    /// relation, i.e. the scan remains non-exhaustive.
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    pub fn is_unresolved_consumer(&self) -> bool {
        self.manipulator == Manipulator::Consumer
    }

    fn recompute_partial(&mut self) {
        let union = self
            .proven
            .values()
            .fold(PartConstraint::default(), |acc, constraint| {
                acc.combine(constraint)
            });
        self.is_partial = !union.covers(&self.relation_constraint);
    }

    /// Merge two entries for the same scan id, as happens when sibling
    /// subplans meet at a join or union.
    pub fn combine(&self, other: &PartitionTableInfo) -> Result<PartitionTableInfo> {
        if self.scan_id != other.scan_id
            || self.relation_id != other.relation_id
            || self.key_columns != other.key_columns
        {
            return Err(ErrorCode::Internal(format!(
                "Cannot combine partition infos of scans {} and {}",
                self.scan_id, other.scan_id
            )));
        }
        let mut combined = self.clone();
        for (selector_id, constraint) in &other.proven {
            combined
                .proven
                .entry(*selector_id)
                .and_modify(|existing| *existing = existing.combine(constraint))
                .or_insert_with(|| constraint.clone());
        }
        use Manipulator::*;
        match (self.manipulator, other.manipulator) {
            (Resolver, _) | (_, Resolver) => {
                combined.manipulator = Resolver;
                combined.expected_propagators = PropagatorCount::Bounded(0);
            }
            (Propagator, Propagator) => {}
            (Consumer, Consumer) => {
                if self.expected_propagators != other.expected_propagators {
                    return Err(ErrorCode::Internal(format!(
                        "Mismatched expected propagator counts for scan {}",
                        self.scan_id
                    )));
                }
            }
            (Propagator, Consumer) | (Consumer, Propagator) => {
                let consumer = if self.manipulator == Consumer {
                    self
                } else {
                    other
                };
                match consumer.expected_propagators {
                    PropagatorCount::Unbounded => {
                        combined.manipulator = Consumer;
                        combined.expected_propagators = PropagatorCount::Unbounded;
                    }
                    PropagatorCount::Bounded(0) => {
                        return Err(ErrorCode::Internal(format!(
                            "Scan {} expected no propagators but one arrived",
                            self.scan_id
                        )));
                    }
                    PropagatorCount::Bounded(1) => {
                        combined.manipulator = Resolver;
                        combined.expected_propagators = PropagatorCount::Bounded(0);
                    }
                    PropagatorCount::Bounded(count) => {
                        combined.manipulator = Consumer;
                        combined.expected_propagators = PropagatorCount::Bounded(count - 1);
                    }
                }
            }
        }
        combined.recompute_partial();
        Ok(combined)
    }
}

/// Scan id to propagation state for one subplan, built bottom-up and
/// combined pairwise where sibling subplans merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PartitionIndexMap {
    entries: BTreeMap<IndexType, PartitionTableInfo>,
}

impl PartitionIndexMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, scan_id: IndexType) -> Option<&PartitionTableInfo> {
        self.entries.get(&scan_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PartitionTableInfo> {
        self.entries.values()
    }

    pub fn insert(&mut self, info: PartitionTableInfo) -> Result<()> {
        if self.entries.contains_key(&info.scan_id()) {
            return Err(ErrorCode::Internal(format!(
                "Duplicate partition info for scan {}",
                info.scan_id()
            )));
        }
        self.entries.insert(info.scan_id(), info);
        Ok(())
    }

    pub fn combine(&self, other: &PartitionIndexMap) -> Result<PartitionIndexMap> {
        let mut entries = self.entries.clone();
        for (scan_id, info) in &other.entries {
            let combined = match entries.get(scan_id) {
                Some(existing) => existing.combine(info)?,
                None => info.clone(),
            };
            entries.insert(*scan_id, combined);
        }
        Ok(PartitionIndexMap { entries })
    }

    /// Whether this delivered map discharges every consumer the required
    /// map still expects to see resolved.
    pub fn satisfies(&self, required: &PartitionIndexMap) -> bool {
        required
            .entries
            .values()
            .filter(|info| info.is_unresolved_consumer())
            .all(|required_info| match self.entry(required_info.scan_id()) {
                // Nothing here claims the scan still needs resolving.
                None => true,
                Some(info) => match info.manipulator() {
                    Manipulator::Resolver | Manipulator::Propagator => true,
                    Manipulator::Consumer => match info.expected_propagators() {
                        PropagatorCount::Unbounded => true,
                        PropagatorCount::Bounded(count) => {
                            count > 0
                                && required_info.expected_propagators()
                                    == PropagatorCount::Bounded(count)
                        }
                    },
                },
            })
    }

    pub fn unresolved_consumers(&self) -> usize {
        self.entries
            .values()
            .filter(|info| info.is_unresolved_consumer())
            .count()
    }

    /// Consumers no selector will ever satisfy.
    pub fn zero_expected_consumers(&self) -> usize {
        self.entries
            .values()
            .filter(|info| {
                info.is_unresolved_consumer()
                    && info.expected_propagators() == PropagatorCount::Bounded(0)
            })
            .count()
    }
}
