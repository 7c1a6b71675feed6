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

mod aggregate;
mod constant_table_scan;
mod eval_scalar;
mod exchange;
mod filter;
mod join;
mod limit;
mod materialize;
mod operator;
mod operator_macros;
mod partition_selector;
mod scalar_expr;
mod scan;
mod sort;
mod union_all;

pub use aggregate::Aggregate;
pub use aggregate::AggregateMode;
pub use constant_table_scan::ConstantTableScan;
pub use eval_scalar::EvalScalar;
pub use eval_scalar::ScalarItem;
pub use exchange::Exchange;
pub use filter::Filter;
pub use join::Join;
pub use join::JoinEquiCondition;
pub use join::JoinType;
pub use join::JOIN_REDISTRIBUTE_REQUESTS_CAP;
pub use limit::Limit;
pub use materialize::Materialize;
pub use operator::Operator;
pub use operator::RelOp;
pub use operator::RelOperator;
pub use partition_selector::PartitionSelector;
pub use scalar_expr::BoundColumnRef;
pub use scalar_expr::CastExpr;
pub use scalar_expr::ColumnBinding;
pub use scalar_expr::ConstantExpr;
pub use scalar_expr::FunctionCall;
pub use scalar_expr::ScalarExpr;
pub use scan::Scan;
pub use scan::ScanDistribution;
pub use scan::ScanPartition;
pub use sort::Sort;
pub use sort::SortItem;
pub use union_all::UnionAll;
