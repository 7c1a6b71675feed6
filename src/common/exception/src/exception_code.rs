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

use std::backtrace::Backtrace;

use crate::exception::ErrorCode;

macro_rules! build_exceptions {
    ($($(#[$meta:meta])* $body:ident($code:expr)),*$(,)*) => {
        impl ErrorCode {
            $(
                $(#[$meta])*
                pub fn $body(display_text: impl Into<String>) -> ErrorCode {
                    ErrorCode::create(
                        $code,
                        stringify!($body),
                        display_text.into(),
                        None,
                        Some(Backtrace::capture()),
                    )
                }
            )*
        }
    }
}

build_exceptions! {
    /// Internal means this is the internal error that no action
    /// can be taken by neither developers or users.
    Internal(1001),
    /// Unimplemented means this is a not implemented feature.
    Unimplemented(1002),
    BadArguments(1006),
    UnknownTable(1025),
    UnknownColumn(1058),
    /// A completed plan still carries a dynamic-partition consumer
    /// that no selector resolved.
    UnresolvedPartitionPropagation(1180),
}
