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

#[macro_export]
macro_rules! impl_try_from_rel_operator {
    ($op:ident) => {
        impl TryFrom<RelOperator> for $op {
            type Error = ErrorCode;

            fn try_from(value: RelOperator) -> Result<Self> {
                if let RelOperator::$op(value) = value {
                    Ok(value)
                } else {
                    Err(ErrorCode::Internal(format!(
                        "Cannot downcast RelOperator to {}",
                        stringify!($op)
                    )))
                }
            }
        }

        impl From<$op> for RelOperator {
            fn from(value: $op) -> Self {
                Self::$op(value)
            }
        }

        impl From<$op> for Arc<RelOperator> {
            fn from(value: $op) -> Self {
                Arc::new(RelOperator::$op(value))
            }
        }
    };
}
