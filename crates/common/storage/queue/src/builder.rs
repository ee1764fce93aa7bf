// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use crate::{Queue, QueueConfig, Result, RollStrategy};

pub struct QueueBuilder {
    config: QueueConfig,
}

impl QueueBuilder {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            config: QueueConfig {
                dir: dir.into(),
                ..Default::default()
            },
        }
    }

    /// Base name of the rotation chain.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.config.file_name = name.into();
        self
    }

    /// Roll after the write file reaches `size` bytes; `0` disables rolling.
    pub fn max_file_size(mut self, size: u64) -> Self {
        self.config.roll_strategy = RollStrategy::from(size);
        self
    }

    pub fn roll_strategy(mut self, strategy: RollStrategy) -> Self {
        self.config.roll_strategy = strategy;
        self
    }

    pub fn build(self) -> Result<Queue> { Queue::new(self.config) }
}

impl From<QueueConfig> for QueueBuilder {
    fn from(config: QueueConfig) -> Self { Self { config } }
}
