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
use std::backtrace::BacktraceStatus;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

pub type Result<T, E = ErrorCode> = std::result::Result<T, E>;

pub struct ErrorCode {
    code: u16,
    name: String,
    display_text: String,
    cause: Option<Box<dyn std::error::Error + Sync + Send>>,
    backtrace: Option<Backtrace>,
}

impl ErrorCode {
    pub(crate) fn create(
        code: u16,
        name: impl Into<String>,
        display_text: String,
        cause: Option<Box<dyn std::error::Error + Sync + Send>>,
        backtrace: Option<Backtrace>,
    ) -> ErrorCode {
        ErrorCode {
            code,
            name: name.into(),
            display_text,
            cause,
            backtrace,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn name(&self) -> String {
        self.name.clone()
    }

    pub fn display_text(&self) -> String {
        match self.cause.as_ref() {
            Some(cause) => format!("{}, cause: {}", self.display_text, cause),
            None => self.display_text.clone(),
        }
    }

    pub fn message(&self) -> String {
        self.display_text()
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}. Code: {}, Text = {}.",
            self.name,
            self.code,
            self.display_text(),
        )
    }
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}. Code: {}, Text = {}.",
            self.name,
            self.code,
            self.display_text(),
        )?;
        match self.backtrace.as_ref() {
            Some(b) if b.status() == BacktraceStatus::Captured => {
                write!(f, "\n\n{}", b)
            }
            _ => Ok(()),
        }
    }
}

impl std::error::Error for ErrorCode {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl Clone for ErrorCode {
    fn clone(&self) -> Self {
        ErrorCode::create(self.code, self.name.clone(), self.display_text(), None, None)
    }
}
