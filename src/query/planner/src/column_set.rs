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

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;

use itertools::Itertools;
use roaring::RoaringTreemap;

use crate::IndexType;

/// Number of members folded into the hash, besides the set size.
/// Hashing must stay O(1)-bounded even for very wide sets.
const HASH_SAMPLE: usize = 8;

/// A set of column indexes.
///
/// Deriving properties walks the same column sets over and over, so
/// membership and set algebra must stay cheap. The bitmap also gives us
/// ordered iteration for free, which keeps derived output deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnSet {
    bitmap: RoaringTreemap,
}

impl ColumnSet {
    pub fn new() -> Self {
        ColumnSet::default()
    }

    pub fn insert(&mut self, index: IndexType) -> bool {
        self.bitmap.insert(index as u64)
    }

    pub fn remove(&mut self, index: IndexType) -> bool {
        self.bitmap.remove(index as u64)
    }

    pub fn contains(&self, index: IndexType) -> bool {
        self.bitmap.contains(index as u64)
    }

    pub fn len(&self) -> usize {
        self.bitmap.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    pub fn union_with(&mut self, other: &ColumnSet) {
        self.bitmap |= &other.bitmap;
    }

    pub fn intersect_with(&mut self, other: &ColumnSet) {
        self.bitmap &= &other.bitmap;
    }

    /// Set difference: the members of `self` that are not in `other`.
    pub fn exclude(&self, other: &ColumnSet) -> ColumnSet {
        ColumnSet {
            bitmap: &self.bitmap - &other.bitmap,
        }
    }

    pub fn is_subset(&self, other: &ColumnSet) -> bool {
        self.bitmap.is_subset(&other.bitmap)
    }

    pub fn is_disjoint(&self, other: &ColumnSet) -> bool {
        self.bitmap.is_disjoint(&other.bitmap)
    }

    /// The canonical representative of the set: its smallest member.
    pub fn first(&self) -> Option<IndexType> {
        self.bitmap.min().map(|v| v as IndexType)
    }

    /// Iterate members in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = IndexType> + '_ {
        self.bitmap.iter().map(|v| v as IndexType)
    }

    /// Whether every member of `self` appears in at least one of `others`.
    ///
    /// The empty set is defined to be NOT covered: a consumer asking
    /// whether its columns are provided somewhere must not get a vacuous
    /// yes for having no columns at all.
    pub fn covered_by(&self, others: &[ColumnSet]) -> bool {
        if self.is_empty() {
            return false;
        }
        self.iter()
            .all(|index| others.iter().any(|set| set.contains(index)))
    }
}

impl Hash for ColumnSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bitmap.len().hash(state);
        for member in self.bitmap.iter().take(HASH_SAMPLE) {
            member.hash(state);
        }
    }
}

impl FromIterator<IndexType> for ColumnSet {
    fn from_iter<T: IntoIterator<Item = IndexType>>(iter: T) -> Self {
        let mut set = ColumnSet::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl From<Vec<IndexType>> for ColumnSet {
    fn from(indexes: Vec<IndexType>) -> Self {
        indexes.into_iter().collect()
    }
}

impl Display for ColumnSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().join(", "))
    }
}
