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

use itertools::Itertools;
use log::debug;
use scatter_common_exception::Result;

use crate::optimizer::property::satisfies_ordering;
use crate::optimizer::property::Distribution;
use crate::optimizer::property::Enforcement;
use crate::optimizer::property::PhysicalProperty;
use crate::optimizer::property::PropertyKind;
use crate::optimizer::property::RequiredProperty;
use crate::optimizer::property::SingletonSite;
use crate::optimizer::OptimizerContext;
use crate::optimizer::RelExpr;
use crate::optimizer::SExpr;
use crate::plans::Exchange;
use crate::plans::Materialize;
use crate::plans::RelOperator;
use crate::plans::Sort;

/// Make `s_expr` deliver `required` by stacking enforcers on top of it:
/// an exchange for the distribution, then a sort, then a materialize.
/// Partition propagation has no enforcer, and an operator may veto an
/// enforcer above itself; either way the request dies with `Ok(None)`.
pub fn enforce_property(
    ctx: Arc<OptimizerContext>,
    s_expr: &SExpr,
    required: &RequiredProperty,
    physical: &PhysicalProperty,
) -> Result<Option<SExpr>> {
    let mut result = s_expr.clone();
    let mut physical = physical.clone();

    if !physical
        .partition_index_map
        .satisfies(&required.partition_index_map)
    {
        debug!("Abandoning request: unsatisfied partition propagation");
        return Ok(None);
    }

    if !physical.distribution.satisfies(&required.distribution) {
        let verdict = RelExpr::with_s_expr(&result).enforcement(
            PropertyKind::Distribution,
            required,
            &physical,
        )?;
        match verdict {
            Enforcement::Prohibited => return Ok(None),
            Enforcement::Unnecessary => {}
            Enforcement::Required => {
                let Some(enforced) =
                    enforce_distribution(&ctx, &required.distribution, &physical, &result)?
                else {
                    return Ok(None);
                };
                result = enforced;
                physical = RelExpr::with_s_expr(&result).derive_physical_prop()?;
            }
        }
    }

    if !satisfies_ordering(&physical.ordering, &required.ordering) {
        let verdict = RelExpr::with_s_expr(&result).enforcement(
            PropertyKind::Ordering,
            required,
            &physical,
        )?;
        match verdict {
            Enforcement::Prohibited => return Ok(None),
            Enforcement::Unnecessary => {}
            Enforcement::Required => {
                debug!(
                    "Enforcing ordering: [{}]",
                    required.ordering.iter().map(|item| item.to_string()).join(", ")
                );
                let sort = Sort {
                    items: required.ordering.clone(),
                };
                result = SExpr::create_unary(Arc::new(RelOperator::Sort(sort)), result);
                physical = RelExpr::with_s_expr(&result).derive_physical_prop()?;
            }
        }
    }

    if physical.rewindability < required.rewindability {
        let verdict = RelExpr::with_s_expr(&result).enforcement(
            PropertyKind::Rewindability,
            required,
            &physical,
        )?;
        match verdict {
            Enforcement::Prohibited => return Ok(None),
            Enforcement::Unnecessary => {}
            Enforcement::Required => {
                debug!("Enforcing rewindability: {}", required.rewindability);
                result = SExpr::create_unary(Arc::new(RelOperator::Materialize(Materialize)), result);
                physical = RelExpr::with_s_expr(&result).derive_physical_prop()?;
            }
        }
    }

    if required.satisfied_by(&physical) {
        Ok(Some(result))
    } else {
        Ok(None)
    }
}

/// Pick the exchange that delivers `required`, or `None` when no motion
/// can, either inherently or because the session disabled it.
pub fn enforce_distribution(
    ctx: &OptimizerContext,
    required: &Distribution,
    physical: &PhysicalProperty,
    s_expr: &SExpr,
) -> Result<Option<SExpr>> {
    let exchange = match required {
        Distribution::Hashed(hashed) => {
            if !ctx.config.enable_hash_redistribute {
                return Ok(None);
            }
            Exchange::Hash(hashed.keys.clone())
        }
        Distribution::Replicated => {
            if !ctx.config.enable_broadcast {
                return Ok(None);
            }
            Exchange::Broadcast
        }
        Distribution::Singleton(SingletonSite::Coordinator)
        | Distribution::StrictSingleton(SingletonSite::Coordinator) => {
            if physical.ordering.is_empty() {
                Exchange::Merge
            } else {
                Exchange::MergeSort(physical.ordering.clone())
            }
        }
        Distribution::Routed(column) => {
            if !ctx.config.enable_routed_distribute {
                return Ok(None);
            }
            Exchange::Routed(*column)
        }
        // Nothing can be gathered onto an unspecified worker, and the
        // remaining specs are not producible by a motion.
        Distribution::Singleton(SingletonSite::Worker)
        | Distribution::StrictSingleton(SingletonSite::Worker)
        | Distribution::Any
        | Distribution::NonSingleton
        | Distribution::Universal => return Ok(None),
    };
    debug!("Enforcing distribution: {}", required);
    Ok(Some(SExpr::create_unary(
        Arc::new(RelOperator::Exchange(exchange)),
        s_expr.clone(),
    )))
}
