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

use scatter_common_exception::ErrorCode;
use scatter_common_exception::Result;

use crate::types::is_binary_coercible;
use crate::ColumnSet;
use crate::DataType;
use crate::IndexType;
use crate::Scalar;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScalarExpr {
    BoundColumnRef(BoundColumnRef),
    ConstantExpr(ConstantExpr),
    FunctionCall(FunctionCall),
    CastExpr(CastExpr),
}

impl ScalarExpr {
    pub fn used_columns(&self) -> ColumnSet {
        let mut columns = ColumnSet::new();
        self.collect_used_columns(&mut columns);
        columns
    }

    #[recursive::recursive]
    fn collect_used_columns(&self, columns: &mut ColumnSet) {
        match self {
            ScalarExpr::BoundColumnRef(expr) => {
                columns.insert(expr.column.index);
            }
            ScalarExpr::ConstantExpr(_) => {}
            ScalarExpr::FunctionCall(expr) => {
                for argument in &expr.arguments {
                    argument.collect_used_columns(columns);
                }
            }
            ScalarExpr::CastExpr(expr) => {
                expr.argument.collect_used_columns(columns);
            }
        }
    }

    pub fn data_type(&self) -> Result<DataType> {
        match self {
            ScalarExpr::BoundColumnRef(expr) => Ok((*expr.column.data_type).clone()),
            ScalarExpr::ConstantExpr(expr) => Ok(expr.value.as_data_type()),
            ScalarExpr::CastExpr(expr) => Ok((*expr.target_type).clone()),
            ScalarExpr::FunctionCall(expr) => {
                if matches!(
                    expr.func_name.as_str(),
                    "eq" | "noteq"
                        | "gt"
                        | "gte"
                        | "lt"
                        | "lte"
                        | "and"
                        | "or"
                        | "not"
                        | "is_null"
                        | "is_not_null"
                ) {
                    Ok(DataType::Boolean)
                } else {
                    Err(ErrorCode::Internal(format!(
                        "Cannot infer data type of function {}",
                        expr.func_name
                    )))
                }
            }
        }
    }

    /// Peel off casts that keep a value in its hash bucket. Distribution
    /// keys are compared on the stripped form, so `CAST(a AS BIGINT)` and
    /// `a` describe the same placement.
    pub fn strip_coercible_casts(&self) -> &ScalarExpr {
        let mut current = self;
        while let ScalarExpr::CastExpr(cast) = current {
            let Ok(from) = cast.argument.data_type() else {
                break;
            };
            if !is_binary_coercible(&from, &cast.target_type) {
                break;
            }
            current = cast.argument.as_ref();
        }
        current
    }

    /// Structural equality modulo binary-coercible casts on either side.
    pub fn matches_ignoring_casts(&self, other: &ScalarExpr) -> bool {
        self.strip_coercible_casts() == other.strip_coercible_casts()
    }
}

/// A bound reference to a column produced somewhere below.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnBinding {
    pub index: IndexType,
    pub column_name: String,
    pub data_type: Box<DataType>,
}

impl ColumnBinding {
    pub fn new(index: IndexType, column_name: impl Into<String>, data_type: DataType) -> Self {
        ColumnBinding {
            index,
            column_name: column_name.into(),
            data_type: Box::new(data_type),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoundColumnRef {
    pub column: ColumnBinding,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConstantExpr {
    pub value: Scalar,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    pub func_name: String,
    pub params: Vec<Scalar>,
    pub arguments: Vec<ScalarExpr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CastExpr {
    pub is_try: bool,
    pub argument: Box<ScalarExpr>,
    pub target_type: Box<DataType>,
}

impl Scalar {
    pub fn as_data_type(&self) -> DataType {
        match self {
            Scalar::Null => DataType::Null,
            Scalar::Boolean(_) => DataType::Boolean,
            Scalar::Int64(_) => DataType::Number(crate::NumberDataType::Int64),
            Scalar::UInt64(_) => DataType::Number(crate::NumberDataType::UInt64),
            Scalar::Float64(_) => DataType::Number(crate::NumberDataType::Float64),
            Scalar::String(_) => DataType::String,
        }
    }
}

macro_rules! impl_scalar_expr_conversions {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for ScalarExpr {
                fn from(value: $ty) -> Self {
                    ScalarExpr::$ty(value)
                }
            }

            impl TryFrom<ScalarExpr> for $ty {
                type Error = ErrorCode;
                fn try_from(value: ScalarExpr) -> Result<Self> {
                    if let ScalarExpr::$ty(value) = value {
                        Ok(value)
                    } else {
                        Err(ErrorCode::Internal(format!(
                            "Cannot downcast scalar expression to {}",
                            stringify!($ty)
                        )))
                    }
                }
            }
        )*
    };
}

impl_scalar_expr_conversions! {
    BoundColumnRef,
    ConstantExpr,
    FunctionCall,
    CastExpr,
}
