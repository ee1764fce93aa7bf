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

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::naming::DEFAULT_FILE_NAME;

/// Directory used when none is configured.
pub const DEFAULT_QUEUE_DIR: &str = "./queue_data";

/// Size at which the default strategy rolls to a new file (24 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 24 * 1024 * 1024;

/// Queue settings.
///
/// Deserializes with `#[serde(default)]`, so it can be embedded as a section
/// of an application config file with any subset of fields present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct QueueConfig {
    /// Directory holding the data files. Created on open.
    #[default(_code = "PathBuf::from(DEFAULT_QUEUE_DIR)")]
    pub dir: PathBuf,

    /// Base name of the rotation chain.
    #[default(_code = "DEFAULT_FILE_NAME.to_owned()")]
    pub file_name: String,

    /// When the appender moves on to a new file.
    pub roll_strategy: RollStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollStrategy {
    /// Keep appending to the base file forever.
    Never,
    /// Roll once the write file has reached this many bytes. `0` never rolls.
    BySize(u64),
}

impl RollStrategy {
    pub const fn is_enabled(&self) -> bool { matches!(*self, Self::BySize(limit) if limit > 0) }

    pub const fn should_roll(&self, current_size: u64) -> bool {
        match *self {
            Self::Never => false,
            Self::BySize(limit) => limit > 0 && current_size >= limit,
        }
    }
}

impl Default for RollStrategy {
    fn default() -> Self { Self::BySize(DEFAULT_MAX_FILE_SIZE) }
}

impl From<u64> for RollStrategy {
    /// A size threshold; `0` disables rolling.
    fn from(max_file_size: u64) -> Self {
        if max_file_size == 0 {
            Self::Never
        } else {
            Self::BySize(max_file_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_by_size() {
        let strategy = RollStrategy::BySize(1000);
        assert!(strategy.is_enabled());
        assert!(!strategy.should_roll(999));
        assert!(strategy.should_roll(1000));
        assert!(strategy.should_roll(1001));
    }

    #[test]
    fn test_roll_disabled() {
        for strategy in [RollStrategy::Never, RollStrategy::BySize(0), RollStrategy::from(0)] {
            assert!(!strategy.is_enabled());
            assert!(!strategy.should_roll(0));
            assert!(!strategy.should_roll(u64::MAX));
        }
        assert_eq!(RollStrategy::from(12), RollStrategy::BySize(12));
    }

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.dir, PathBuf::from(DEFAULT_QUEUE_DIR));
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
        assert_eq!(
            config.roll_strategy,
            RollStrategy::BySize(DEFAULT_MAX_FILE_SIZE)
        );
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: QueueConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, QueueConfig::default());

        let config: QueueConfig = serde_json::from_str(
            r#"{"dir": "/var/spool/diskq", "roll_strategy": {"by_size": 4096}}"#,
        )
        .unwrap();
        assert_eq!(config.dir, PathBuf::from("/var/spool/diskq"));
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
        assert_eq!(config.roll_strategy, RollStrategy::BySize(4096));

        let config: QueueConfig = serde_json::from_str(r#"{"roll_strategy": "never"}"#).unwrap();
        assert_eq!(config.roll_strategy, RollStrategy::Never);
    }
}
