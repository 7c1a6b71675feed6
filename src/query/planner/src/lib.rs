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

//! Physical property planning for a sharded cluster.
//!
//! Given a physical plan tree, the planner decides which data-movement,
//! sort and materialization enforcers must be injected so that every
//! operator receives inputs with the distribution, ordering, rewindability
//! and partition-propagation properties it requires.

mod column_set;
mod format;
mod metadata;
pub mod optimizer;
pub mod plans;
mod types;

pub use column_set::ColumnSet;
pub use format::format_plan_tree;
pub use format::format_scalar;
pub use metadata::ColumnEntry;
pub use metadata::IndexType;
pub use metadata::Metadata;
pub use metadata::MetadataRef;
pub use metadata::TableDistribution;
pub use metadata::TableEntry;
pub use metadata::TablePartitionInfo;
pub use types::is_binary_coercible;
pub use types::DataType;
pub use types::NumberDataType;
pub use types::Scalar;
