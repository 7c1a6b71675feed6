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
use scatter_common_exception::ErrorCode;
use scatter_common_exception::Result;

use crate::DataType;

/// Index of a table or a column in [`Metadata`].
///
/// While a query is being planned, an index is the sole identity of a
/// column: every expression node referring to the same logical column
/// carries the same index.
pub type IndexType = usize;

/// A reference to `Metadata`, shared by everything that takes part in
/// planning one query.
pub type MetadataRef = Arc<RwLock<Metadata>>;

/// The catalog-independent registry of tables and columns touched by one
/// query. Entries are created once and addressed by index afterwards.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    tables: Vec<TableEntry>,
    columns: Vec<ColumnEntry>,
}

impl Metadata {
    pub fn table(&self, index: IndexType) -> Result<&TableEntry> {
        self.tables
            .get(index)
            .ok_or_else(|| ErrorCode::UnknownTable(format!("Unknown table index: {}", index)))
    }

    pub fn tables(&self) -> &[TableEntry] {
        &self.tables
    }

    pub fn column(&self, index: IndexType) -> Result<&ColumnEntry> {
        self.columns
            .get(index)
            .ok_or_else(|| ErrorCode::UnknownColumn(format!("Unknown column index: {}", index)))
    }

    pub fn columns(&self) -> &[ColumnEntry] {
        &self.columns
    }

    pub fn columns_by_table_index(&self, table_index: IndexType) -> Vec<ColumnEntry> {
        self.columns
            .iter()
            .filter(|column| column.table_index == Some(table_index))
            .cloned()
            .collect()
    }

    pub fn add_table(&mut self, name: impl Into<String>) -> IndexType {
        let table_index = self.tables.len();
        self.tables.push(TableEntry {
            index: table_index,
            name: name.into(),
            distribution: TableDistribution::Random,
            partition: None,
        });
        table_index
    }

    pub fn add_base_table_column(
        &mut self,
        name: impl Into<String>,
        data_type: DataType,
        table_index: IndexType,
    ) -> IndexType {
        let column_index = self.columns.len();
        self.columns.push(ColumnEntry {
            index: column_index,
            name: name.into(),
            data_type,
            table_index: Some(table_index),
        });
        column_index
    }

    pub fn add_derived_column(&mut self, name: impl Into<String>, data_type: DataType) -> IndexType {
        let column_index = self.columns.len();
        self.columns.push(ColumnEntry {
            index: column_index,
            name: name.into(),
            data_type,
            table_index: None,
        });
        column_index
    }

    pub fn set_table_distribution(
        &mut self,
        table_index: IndexType,
        distribution: TableDistribution,
    ) -> Result<()> {
        let table = self
            .tables
            .get_mut(table_index)
            .ok_or_else(|| ErrorCode::UnknownTable(format!("Unknown table index: {}", table_index)))?;
        table.distribution = distribution;
        Ok(())
    }

    pub fn set_table_partition(
        &mut self,
        table_index: IndexType,
        partition: TablePartitionInfo,
    ) -> Result<()> {
        let table = self
            .tables
            .get_mut(table_index)
            .ok_or_else(|| ErrorCode::UnknownTable(format!("Unknown table index: {}", table_index)))?;
        table.partition = Some(partition);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct TableEntry {
    index: IndexType,
    name: String,
    distribution: TableDistribution,
    partition: Option<TablePartitionInfo>,
}

impl TableEntry {
    pub fn index(&self) -> IndexType {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distribution(&self) -> &TableDistribution {
        &self.distribution
    }

    pub fn partition(&self) -> Option<&TablePartitionInfo> {
        self.partition.as_ref()
    }
}

/// How a table's rows are placed across the cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableDistribution {
    /// Rows are bucketed by the hash of the listed columns.
    Hash(Vec<IndexType>),
    /// Rows are scattered with no usable placement guarantee.
    Random,
    /// Every worker holds a full copy.
    Replicated,
    /// The table lives only on the coordinating worker, like catalog
    /// tables do.
    Coordinator,
}

/// Static partitioning of a table, used to seed the propagation
/// bookkeeping of dynamic scans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TablePartitionInfo {
    pub key_columns: Vec<IndexType>,
    pub partition_ids: Vec<u64>,
    pub default_partition: bool,
}

#[derive(Clone, Debug)]
pub struct ColumnEntry {
    index: IndexType,
    name: String,
    data_type: DataType,
    table_index: Option<IndexType>,
}

impl ColumnEntry {
    pub fn index(&self) -> IndexType {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn table_index(&self) -> Option<IndexType> {
        self.table_index
    }
}
