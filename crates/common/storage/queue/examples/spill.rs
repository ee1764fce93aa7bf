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

//! Spill a bursty producer's backlog to disk and drain it in batches.
//!
//! This example shows:
//! - Opening a queue with small files so rotation is visible
//! - Several producer threads pushing concurrently
//! - A consumer draining with a batch size and timeout
//! - Cleaning up the data files afterwards
//!
//! Run with `cargo run -p diskq-queue --example spill`.

use std::{thread, time::Duration};

use diskq_common_telemetry::init_tracing_subscriber;
use diskq_queue::QueueBuilder;

const PRODUCERS: usize = 3;
const PER_PRODUCER: usize = 200;

fn main() -> diskq_queue::Result<()> {
    let _guards = init_tracing_subscriber("spill");

    let dir = std::env::temp_dir().join("diskq-spill-example");
    let mut queue = QueueBuilder::new(&dir)
        .file_name("events")
        .max_file_size(4 * 1024)
        .build()?;

    tracing::info!(dir = ?queue.dir(), "Spilling to disk");

    let consumed = thread::scope(|s| -> diskq_queue::Result<usize> {
        let queue = &queue;
        for producer in 0..PRODUCERS {
            s.spawn(move || -> diskq_queue::Result<()> {
                for seq in 0..PER_PRODUCER {
                    queue.push(format!(r#"{{"producer":{producer},"seq":{seq}}}"#))?;
                    if seq % 50 == 0 {
                        thread::sleep(Duration::from_millis(20));
                    }
                }
                Ok(())
            });
        }

        let mut consumed = 0;
        while consumed < PRODUCERS * PER_PRODUCER {
            let batch = queue.consume(64, Duration::from_millis(100))?;
            consumed += batch.len();
            tracing::info!(
                batch = batch.len(),
                consumed,
                backlog_bytes = queue.disk_usage()?,
                read_file = ?queue.read_file(),
                "Drained batch"
            );
        }
        Ok(consumed)
    })?;

    tracing::info!(consumed, "All messages drained");
    queue.clean()
}
