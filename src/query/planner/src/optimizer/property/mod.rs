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

mod distribution;
mod enforcer;
mod partition;
#[allow(clippy::module_inception)]
mod property;

pub use distribution::Distribution;
pub use distribution::HashedDistribution;
pub use distribution::SingletonSite;
pub use enforcer::enforce_distribution;
pub use enforcer::enforce_property;
pub use partition::Manipulator;
pub use partition::PartConstraint;
pub use partition::PartitionIndexMap;
pub use partition::PartitionTableInfo;
pub use partition::PropagatorCount;
pub use property::satisfies_ordering;
pub use property::Enforcement;
pub use property::PhysicalProperty;
pub use property::PropertyKind;
pub use property::RelationalProperty;
pub use property::RequiredProperty;
pub use property::Rewindability;
