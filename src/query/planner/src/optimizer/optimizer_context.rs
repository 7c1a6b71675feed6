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

use crate::MetadataRef;

/// Settings that gate which enforcers and child requests the optimizer
/// may use. Everything is on by default; tests and sessions turn pieces
/// off to constrain plan shapes.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    /// Allow hash-redistribution exchanges and the child requests that
    /// would need them.
    pub enable_hash_redistribute: bool,
    /// Allow broadcast exchanges.
    pub enable_broadcast: bool,
    /// Allow routed exchanges.
    pub enable_routed_distribute: bool,
    /// Under a broadcast join, redistribute the non-broadcast side by
    /// its own keys instead of leaving it where it is.
    pub enable_redistribute_broadcast: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            enable_hash_redistribute: true,
            enable_broadcast: true,
            enable_routed_distribute: true,
            enable_redistribute_broadcast: true,
        }
    }
}

pub struct OptimizerContext {
    metadata: MetadataRef,
    pub config: OptimizerConfig,
}

impl OptimizerContext {
    pub fn new(metadata: MetadataRef) -> Arc<Self> {
        Self::with_config(metadata, OptimizerConfig::default())
    }

    pub fn with_config(metadata: MetadataRef, config: OptimizerConfig) -> Arc<Self> {
        Arc::new(OptimizerContext { metadata, config })
    }

    pub fn metadata(&self) -> MetadataRef {
        self.metadata.clone()
    }
}
