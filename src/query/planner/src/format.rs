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

use itertools::Itertools;

use crate::optimizer::SExpr;
use crate::plans::Exchange;
use crate::plans::RelOperator;
use crate::plans::ScalarExpr;

pub fn format_scalar(scalar: &ScalarExpr) -> String {
    match scalar {
        ScalarExpr::BoundColumnRef(column_ref) => format!(
            "{} (#{})",
            column_ref.column.column_name, column_ref.column.index
        ),
        ScalarExpr::ConstantExpr(constant) => constant.value.to_string(),
        ScalarExpr::FunctionCall(func) => format!(
            "{}({})",
            &func.func_name,
            func.arguments.iter().map(format_scalar).join(", ")
        ),
        ScalarExpr::CastExpr(cast) => format!(
            "CAST({} AS {})",
            format_scalar(&cast.argument),
            cast.target_type
        ),
    }
}

/// Render a plan as an indented tree, one operator per line.
pub fn format_plan_tree(s_expr: &SExpr) -> String {
    let mut output = String::new();
    format_node(s_expr, 0, &mut output);
    output
}

fn format_node(s_expr: &SExpr, indent: usize, output: &mut String) {
    for _ in 0..indent {
        output.push_str("    ");
    }
    output.push_str(&format_operator(s_expr.plan()));
    output.push('\n');
    for child in s_expr.children() {
        format_node(child, indent + 1, output);
    }
}

fn format_operator(op: &RelOperator) -> String {
    match op {
        RelOperator::Scan(scan) => {
            format!("Scan: table #{}, columns: {}", scan.table_index, scan.columns)
        }
        RelOperator::ConstantTableScan(scan) => {
            format!("ConstantTableScan: {} rows", scan.values.len())
        }
        RelOperator::Filter(filter) => format!(
            "Filter: [{}]",
            filter.predicates.iter().map(format_scalar).join(", ")
        ),
        RelOperator::EvalScalar(eval) => format!(
            "EvalScalar: [{}]",
            eval.items
                .iter()
                .map(|item| format!("{} AS #{}", format_scalar(&item.scalar), item.index))
                .join(", ")
        ),
        RelOperator::Join(join) => {
            let conditions = join
                .equi_conditions
                .iter()
                .map(|condition| {
                    format!(
                        "{} {} {}",
                        format_scalar(&condition.left),
                        if condition.is_null_safe { "<=>" } else { "=" },
                        format_scalar(&condition.right)
                    )
                })
                .chain(join.non_equi_conditions.iter().map(format_scalar))
                .join(", ");
            if conditions.is_empty() {
                format!("Join: {}", join.join_type)
            } else {
                format!("Join: {} [{}]", join.join_type, conditions)
            }
        }
        RelOperator::Aggregate(aggregate) => format!(
            "Aggregate({:?}): group: [{}], aggregates: [{}]",
            aggregate.mode,
            aggregate
                .group_items
                .iter()
                .map(|item| format!("#{}", item.index))
                .join(", "),
            aggregate
                .aggregate_functions
                .iter()
                .map(|item| format!("{} AS #{}", format_scalar(&item.scalar), item.index))
                .join(", ")
        ),
        RelOperator::Sort(sort) => format!(
            "Sort: [{}]",
            sort.items.iter().map(|item| item.to_string()).join(", ")
        ),
        RelOperator::Limit(limit) => match limit.limit {
            Some(n) => format!("Limit: {}, offset: {}", n, limit.offset),
            None => format!("Limit: NONE, offset: {}", limit.offset),
        },
        RelOperator::UnionAll(union_all) => format!(
            "UnionAll: [{}]",
            union_all
                .output_indexes
                .iter()
                .map(|index| format!("#{}", index))
                .join(", ")
        ),
        RelOperator::Exchange(exchange) => match exchange {
            Exchange::Hash(keys) => format!(
                "Exchange(Hash): [{}]",
                keys.iter().map(format_scalar).join(", ")
            ),
            Exchange::Broadcast => "Exchange(Broadcast)".to_string(),
            Exchange::Merge => "Exchange(Merge)".to_string(),
            Exchange::MergeSort(items) => format!(
                "Exchange(MergeSort): [{}]",
                items.iter().map(|item| item.to_string()).join(", ")
            ),
            Exchange::Routed(column) => format!("Exchange(Routed): #{}", column),
        },
        RelOperator::Materialize(_) => "Materialize".to_string(),
        RelOperator::PartitionSelector(selector) => format!(
            "PartitionSelector: scan #{}, selector #{}",
            selector.scan_id, selector.selector_id
        ),
    }
}
