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

//! Disk-backed FIFO message queue.
//!
//! Producers append text messages to a log file in a directory; a single
//! consumer reads them back in order. The write file rolls over to
//! `<name>.1`, `<name>.2`, ... once it reaches a size threshold, and the
//! consumer deletes each rolled file as soon as it has read all of it. Use it
//! to move a backlog that would otherwise pile up in memory onto disk.
//!
//! See [`Queue`] for the operations.

mod appender;
pub mod builder;
pub mod config;
pub mod error;
pub mod naming;
pub mod queue;
mod record;
mod signal;
mod tailer;

pub use builder::QueueBuilder;
pub use config::{QueueConfig, RollStrategy};
pub use error::{QueueError, Result};
pub use naming::{DEFAULT_FILE_NAME, RotationChain};
pub use queue::Queue;
