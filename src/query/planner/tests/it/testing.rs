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

use parking_lot::RwLock;
use scatter_query_planner::optimizer::property::HashedDistribution;
use scatter_query_planner::optimizer::OptimizerConfig;
use scatter_query_planner::optimizer::OptimizerContext;
use scatter_query_planner::optimizer::SExpr;
use scatter_query_planner::plans::BoundColumnRef;
use scatter_query_planner::plans::CastExpr;
use scatter_query_planner::plans::ColumnBinding;
use scatter_query_planner::plans::Join;
use scatter_query_planner::plans::JoinEquiCondition;
use scatter_query_planner::plans::JoinType;
use scatter_query_planner::plans::RelOperator;
use scatter_query_planner::plans::ScalarExpr;
use scatter_query_planner::plans::Scan;
use scatter_query_planner::plans::SortItem;
use scatter_query_planner::ColumnSet;
use scatter_query_planner::DataType;
use scatter_query_planner::IndexType;
use scatter_query_planner::Metadata;
use scatter_query_planner::MetadataRef;
use scatter_query_planner::NumberDataType;
use scatter_query_planner::TableDistribution;
use scatter_query_planner::TablePartitionInfo;

pub fn int64() -> DataType {
    DataType::Number(NumberDataType::Int64)
}

pub fn int32() -> DataType {
    DataType::Number(NumberDataType::Int32)
}

pub fn column_ref(index: IndexType, name: &str, data_type: DataType) -> ScalarExpr {
    ScalarExpr::BoundColumnRef(BoundColumnRef {
        column: ColumnBinding::new(index, name, data_type),
    })
}

pub fn cast(argument: ScalarExpr, target_type: DataType) -> ScalarExpr {
    ScalarExpr::CastExpr(CastExpr {
        is_try: false,
        argument: Box::new(argument),
        target_type: Box::new(target_type),
    })
}

pub fn hashed(keys: Vec<ScalarExpr>) -> HashedDistribution {
    HashedDistribution::new(keys, true, true)
}

pub fn asc(index: IndexType) -> SortItem {
    SortItem {
        index,
        asc: true,
        nulls_first: false,
    }
}

/// A small catalog covering every table layout the planner reacts to.
pub struct TestFixture {
    pub metadata: MetadataRef,

    pub orders: IndexType,
    pub o_orderkey: IndexType,
    pub o_custkey: IndexType,

    pub customer: IndexType,
    pub c_custkey: IndexType,
    pub c_name: IndexType,

    pub lineitem: IndexType,
    pub l_orderkey: IndexType,
    pub l_suppkey: IndexType,

    pub nation: IndexType,
    pub n_nationkey: IndexType,

    pub settings: IndexType,
    pub s_key: IndexType,

    pub sales: IndexType,
    pub sale_id: IndexType,
    pub sale_region: IndexType,
}

pub fn fixture() -> TestFixture {
    let mut metadata = Metadata::default();

    let orders = metadata.add_table("orders");
    let o_orderkey = metadata.add_base_table_column("o_orderkey", int64(), orders);
    let o_custkey = metadata.add_base_table_column("o_custkey", int64(), orders);
    metadata
        .set_table_distribution(orders, TableDistribution::Hash(vec![o_custkey]))
        .unwrap();

    let customer = metadata.add_table("customer");
    let c_custkey = metadata.add_base_table_column("c_custkey", int64(), customer);
    let c_name = metadata.add_base_table_column("c_name", DataType::String, customer);
    metadata
        .set_table_distribution(customer, TableDistribution::Hash(vec![c_custkey]))
        .unwrap();

    let lineitem = metadata.add_table("lineitem");
    let l_orderkey = metadata.add_base_table_column("l_orderkey", int64(), lineitem);
    let l_suppkey = metadata.add_base_table_column("l_suppkey", int64(), lineitem);

    let nation = metadata.add_table("nation");
    let n_nationkey = metadata.add_base_table_column("n_nationkey", int64(), nation);
    metadata
        .set_table_distribution(nation, TableDistribution::Replicated)
        .unwrap();

    let settings = metadata.add_table("settings");
    let s_key = metadata.add_base_table_column("s_key", int64(), settings);
    metadata
        .set_table_distribution(settings, TableDistribution::Coordinator)
        .unwrap();

    let sales = metadata.add_table("sales");
    let sale_id = metadata.add_base_table_column("sale_id", int64(), sales);
    let sale_region = metadata.add_base_table_column("sale_region", int64(), sales);
    metadata
        .set_table_distribution(sales, TableDistribution::Hash(vec![sale_id]))
        .unwrap();
    metadata
        .set_table_partition(sales, TablePartitionInfo {
            key_columns: vec![sale_region],
            partition_ids: vec![1, 2, 3],
            default_partition: false,
        })
        .unwrap();

    TestFixture {
        metadata: Arc::new(RwLock::new(metadata)),
        orders,
        o_orderkey,
        o_custkey,
        customer,
        c_custkey,
        c_name,
        lineitem,
        l_orderkey,
        l_suppkey,
        nation,
        n_nationkey,
        settings,
        s_key,
        sales,
        sale_id,
        sale_region,
    }
}

pub fn ctx(metadata: &MetadataRef) -> Arc<OptimizerContext> {
    OptimizerContext::new(metadata.clone())
}

pub fn ctx_with_config(metadata: &MetadataRef, config: OptimizerConfig) -> Arc<OptimizerContext> {
    OptimizerContext::with_config(metadata.clone(), config)
}

pub fn scan_expr(metadata: &MetadataRef, scan_id: IndexType, table_index: IndexType) -> SExpr {
    let metadata = metadata.read();
    let columns: ColumnSet = metadata
        .columns_by_table_index(table_index)
        .iter()
        .map(|column| column.index())
        .collect();
    let scan = Scan::try_create(&metadata, scan_id, table_index, columns).unwrap();
    SExpr::create_leaf(Arc::new(RelOperator::Scan(scan)))
}

pub fn join_on(
    join_type: JoinType,
    left: SExpr,
    right: SExpr,
    conditions: Vec<(ScalarExpr, ScalarExpr)>,
) -> SExpr {
    let join = Join {
        join_type,
        equi_conditions: conditions
            .into_iter()
            .map(|(left, right)| JoinEquiCondition {
                left,
                right,
                is_null_safe: false,
            })
            .collect(),
        non_equi_conditions: vec![],
    };
    SExpr::create_binary(Arc::new(RelOperator::Join(join)), left, right)
}

pub fn count_matching(s_expr: &SExpr, predicate: &dyn Fn(&RelOperator) -> bool) -> usize {
    let mut count = usize::from(predicate(s_expr.plan()));
    for child in s_expr.children() {
        count += count_matching(child, predicate);
    }
    count
}
