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

use itertools::Itertools;

use crate::format::format_scalar;
use crate::plans::ScalarExpr;
use crate::ColumnSet;
use crate::IndexType;

/// The worker a singleton distribution designates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SingletonSite {
    Coordinator,
    Worker,
}

/// How the rows of a plan fragment are placed across the cluster.
///
/// A `Distribution` plays two roles: operators derive one to describe what
/// they output, and requirements carry one to describe what a consumer
/// needs. `Any` and `NonSingleton` only make sense as requirements;
/// `StrictSingleton` is a requirement that, unlike `Singleton`, is not
/// discharged by `Universal` data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Distribution {
    #[default]
    Any,
    Singleton(SingletonSite),
    StrictSingleton(SingletonSite),
    Hashed(HashedDistribution),
    Replicated,
    /// Each row is sent to the worker named by the value of the given
    /// segment-id column.
    Routed(IndexType),
    NonSingleton,
    /// Logically constant across all workers, e.g. the output of a
    /// constant table.
    Universal,
}

impl Distribution {
    /// Whether a plan delivering `self` also fulfills a consumer that
    /// declared `required`. Not symmetric.
    pub fn satisfies(&self, required: &Distribution) -> bool {
        if self.matches(required) {
            return true;
        }
        match required {
            Distribution::Any => return true,
            Distribution::NonSingleton => {
                return !matches!(
                    self,
                    Distribution::Singleton(_) | Distribution::StrictSingleton(_)
                );
            }
            _ => {}
        }
        if matches!(self, Distribution::Universal) {
            // Constant data can stand in for any placement, except where a
            // requirement insists on one physical copy.
            return !matches!(required, Distribution::StrictSingleton(_));
        }
        match (self, required) {
            (Distribution::Hashed(delivered), Distribution::Hashed(required)) => {
                delivered.satisfies(required)
            }
            (Distribution::Singleton(site), Distribution::StrictSingleton(required_site)) => {
                site == required_site
            }
            _ => false,
        }
    }

    /// Symmetric equivalence. For `Hashed` specs this is cast-insensitive
    /// and consults declared equivalents; everything else is structural.
    pub fn matches(&self, other: &Distribution) -> bool {
        match (self, other) {
            (Distribution::Hashed(a), Distribution::Hashed(b)) => a.matches(b),
            _ => self == other,
        }
    }
}

impl Display for Distribution {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Distribution::Any => write!(f, "ANY"),
            Distribution::Singleton(SingletonSite::Coordinator) => {
                write!(f, "SINGLETON(COORDINATOR)")
            }
            Distribution::Singleton(SingletonSite::Worker) => write!(f, "SINGLETON(WORKER)"),
            Distribution::StrictSingleton(SingletonSite::Coordinator) => {
                write!(f, "STRICT SINGLETON(COORDINATOR)")
            }
            Distribution::StrictSingleton(SingletonSite::Worker) => {
                write!(f, "STRICT SINGLETON(WORKER)")
            }
            Distribution::Hashed(hashed) => write!(f, "{}", hashed),
            Distribution::Replicated => write!(f, "REPLICATED"),
            Distribution::Routed(column) => write!(f, "ROUTED(#{})", column),
            Distribution::NonSingleton => write!(f, "NON-SINGLETON"),
            Distribution::Universal => write!(f, "UNIVERSAL"),
        }
    }
}

/// Rows colocated by the hash of an ordered expression list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HashedDistribution {
    pub keys: Vec<ScalarExpr>,
    /// Whether null-valued rows are guaranteed grouped on one worker.
    pub nulls_colocated: bool,
    /// Whether each logical row occurs exactly once across the cluster.
    pub duplicate_sensitive: bool,
    /// An alternate expression list known to induce the same physical
    /// partitioning, e.g. the other side's keys after a colocated join.
    pub equivalent: Option<Box<HashedDistribution>>,
}

impl HashedDistribution {
    pub fn new(keys: Vec<ScalarExpr>, nulls_colocated: bool, duplicate_sensitive: bool) -> Self {
        HashedDistribution {
            keys,
            nulls_colocated,
            duplicate_sensitive,
            equivalent: None,
        }
    }

    pub fn with_equivalent(mut self, equivalent: HashedDistribution) -> Self {
        self.equivalent = Some(Box::new(equivalent));
        self
    }

    /// The delivered spec `self` satisfies `required` when its keys are a
    /// structural subset (modulo coercible casts) of the required keys
    /// with agreeing flags: grouping rows by fewer of the required keys
    /// still colocates every required-key group.
    pub fn satisfies(&self, required: &HashedDistribution) -> bool {
        if !self.keys.is_empty()
            && self.keys.len() <= required.keys.len()
            && self.nulls_colocated == required.nulls_colocated
            && self.duplicate_sensitive == required.duplicate_sensitive
            && self.keys.iter().all(|key| {
                required
                    .keys
                    .iter()
                    .any(|required_key| key.matches_ignoring_casts(required_key))
            })
        {
            return true;
        }
        match &self.equivalent {
            Some(equivalent) => equivalent.satisfies(required),
            None => false,
        }
    }

    pub fn matches(&self, other: &HashedDistribution) -> bool {
        self.equal_keys(other)
            || self
                .equivalent
                .as_ref()
                .is_some_and(|equivalent| equivalent.equal_keys(other))
            || other
                .equivalent
                .as_ref()
                .is_some_and(|equivalent| equivalent.equal_keys(self))
    }

    /// Full bidirectional coverage with equal counts and agreeing flags.
    fn equal_keys(&self, other: &HashedDistribution) -> bool {
        self.keys.len() == other.keys.len()
            && self.nulls_colocated == other.nulls_colocated
            && self.duplicate_sensitive == other.duplicate_sensitive
            && self
                .keys
                .iter()
                .all(|key| other.keys.iter().any(|o| key.matches_ignoring_casts(o)))
            && other
                .keys
                .iter()
                .all(|key| self.keys.iter().any(|s| key.matches_ignoring_casts(s)))
    }

    /// Drop the keys that refer to any of `columns`, used when an upper
    /// operator renames or prunes distribution columns. An emptied key
    /// list means no hashed spec describes the data any more, reported as
    /// `None` so the caller falls back to a coarser description.
    pub fn exclude_columns(&self, columns: &ColumnSet) -> Option<HashedDistribution> {
        let keys: Vec<ScalarExpr> = self
            .keys
            .iter()
            .filter(|key| key.used_columns().is_disjoint(columns))
            .cloned()
            .collect();
        if keys.is_empty() {
            return None;
        }
        let equivalent = self
            .equivalent
            .as_ref()
            .and_then(|equivalent| equivalent.exclude_columns(columns))
            .map(Box::new);
        Some(HashedDistribution {
            keys,
            nulls_colocated: self.nulls_colocated,
            duplicate_sensitive: self.duplicate_sensitive,
            equivalent,
        })
    }
}

impl Display for HashedDistribution {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "HASHED[{}",
            self.keys.iter().map(format_scalar).join(", ")
        )?;
        if self.nulls_colocated {
            write!(f, ", nulls colocated")?;
        }
        if self.duplicate_sensitive {
            write!(f, ", duplicate sensitive")?;
        }
        write!(f, "]")
    }
}
