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

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberDataType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl NumberDataType {
    pub const fn bit_width(&self) -> u8 {
        match self {
            NumberDataType::UInt8 | NumberDataType::Int8 => 8,
            NumberDataType::UInt16 | NumberDataType::Int16 => 16,
            NumberDataType::UInt32 | NumberDataType::Int32 | NumberDataType::Float32 => 32,
            NumberDataType::UInt64 | NumberDataType::Int64 | NumberDataType::Float64 => 64,
        }
    }

    pub const fn is_signed(&self) -> bool {
        matches!(
            self,
            NumberDataType::Int8
                | NumberDataType::Int16
                | NumberDataType::Int32
                | NumberDataType::Int64
                | NumberDataType::Float32
                | NumberDataType::Float64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, NumberDataType::Float32 | NumberDataType::Float64)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Boolean,
    String,
    Date,
    Timestamp,
    Number(NumberDataType),
    Nullable(Box<DataType>),
}

impl DataType {
    pub fn is_nullable(&self) -> bool {
        matches!(self, DataType::Nullable(_))
    }

    pub fn remove_nullable(&self) -> DataType {
        match self {
            DataType::Nullable(inner) => inner.as_ref().clone(),
            _ => self.clone(),
        }
    }

    pub fn wrap_nullable(&self) -> DataType {
        match self {
            DataType::Nullable(_) => self.clone(),
            _ => DataType::Nullable(Box::new(self.clone())),
        }
    }
}

impl Display for NumberDataType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Boolean => write!(f, "Boolean"),
            DataType::String => write!(f, "String"),
            DataType::Date => write!(f, "Date"),
            DataType::Timestamp => write!(f, "Timestamp"),
            DataType::Number(number) => write!(f, "{}", number),
            DataType::Nullable(inner) => write!(f, "Nullable({})", inner),
        }
    }
}

/// Whether a cast between the two types preserves the hash-bucket identity
/// of a value, so distribution keys may ignore it.
///
/// Nullability wrappers never move a value between buckets, and neither
/// does widening within one numeric signedness class.
pub fn is_binary_coercible(from: &DataType, to: &DataType) -> bool {
    let from = from.remove_nullable();
    let to = to.remove_nullable();
    if from == to {
        return true;
    }
    match (from, to) {
        (DataType::Number(from), DataType::Number(to)) => {
            if from.is_float() || to.is_float() {
                from.is_float() && to.is_float() && from.bit_width() <= to.bit_width()
            } else {
                from.is_signed() == to.is_signed() && from.bit_width() <= to.bit_width()
            }
        }
        (DataType::Date, DataType::Timestamp) => true,
        _ => false,
    }
}

#[derive(Clone, Debug)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a == b,
            (Scalar::Int64(a), Scalar::Int64(b)) => a == b,
            (Scalar::UInt64(a), Scalar::UInt64(b)) => a == b,
            // Bit-level comparison keeps Eq/Hash consistent for floats.
            (Scalar::Float64(a), Scalar::Float64(b)) => a.to_bits() == b.to_bits(),
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Boolean(v) => v.hash(state),
            Scalar::Int64(v) => v.hash(state),
            Scalar::UInt64(v) => v.hash(state),
            Scalar::Float64(v) => v.to_bits().hash(state),
            Scalar::String(v) => v.hash(state),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Boolean(v) => write!(f, "{}", v),
            Scalar::Int64(v) => write!(f, "{}", v),
            Scalar::UInt64(v) => write!(f, "{}", v),
            Scalar::Float64(v) => write!(f, "{}", v),
            Scalar::String(v) => write!(f, "'{}'", v),
        }
    }
}
