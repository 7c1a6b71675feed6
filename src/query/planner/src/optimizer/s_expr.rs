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

use educe::Educe;
use parking_lot::Mutex;
use scatter_common_exception::ErrorCode;
use scatter_common_exception::Result;

use crate::optimizer::property::RelationalProperty;
use crate::plans::RelOperator;

/// `SExpr` is abbreviation of single expression, which is a tree of
/// relational operators.
#[derive(Clone, Debug, Educe)]
#[educe(PartialEq, Eq, Hash)]
pub struct SExpr {
    pub plan: Arc<RelOperator>,
    pub(crate) children: Arc<Vec<SExpr>>,

    /// A cache of relational property of the expression, will be lazily
    /// computed as soon as the property is needed.
    #[educe(Hash(ignore), PartialEq(ignore), Eq(ignore))]
    pub(crate) rel_prop: Arc<Mutex<Option<Arc<RelationalProperty>>>>,
}

impl SExpr {
    pub fn create(plan: impl Into<Arc<RelOperator>>, children: Vec<SExpr>) -> Self {
        SExpr {
            plan: plan.into(),
            children: Arc::new(children),
            rel_prop: Arc::new(Mutex::new(None)),
        }
    }

    pub fn create_unary(plan: impl Into<Arc<RelOperator>>, child: SExpr) -> Self {
        Self::create(plan, vec![child])
    }

    pub fn create_binary(plan: impl Into<Arc<RelOperator>>, left: SExpr, right: SExpr) -> Self {
        Self::create(plan, vec![left, right])
    }

    pub fn create_leaf(plan: impl Into<Arc<RelOperator>>) -> Self {
        Self::create(plan, vec![])
    }

    pub fn plan(&self) -> &RelOperator {
        &self.plan
    }

    pub fn children(&self) -> &[SExpr] {
        &self.children
    }

    pub fn child(&self, n: usize) -> Result<&SExpr> {
        self.children
            .get(n)
            .ok_or_else(|| ErrorCode::Internal(format!("Invalid children index: {}", n)))
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }

    pub fn replace_children(&self, children: impl IntoIterator<Item = SExpr>) -> Self {
        SExpr {
            plan: self.plan.clone(),
            children: Arc::new(children.into_iter().collect()),
            rel_prop: Arc::new(Mutex::new(None)),
        }
    }
}
