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

//! Benchmarks for the disk queue.
//!
//! Measures:
//! - Single message push latency
//! - Push latency when files roll often
//! - Drain throughput of a full backlog

use std::{hint::black_box, time::Duration};

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use diskq_queue::{Queue, QueueBuilder};
use tempfile::TempDir;

/// Message sizes to benchmark (bytes)
const MESSAGE_SIZES: &[usize] = &[64, 256, 1024, 4096];

/// Number of messages in a drained backlog
const BACKLOG: usize = 10_000;

fn create_queue(temp_dir: &TempDir, max_file_size: u64) -> Queue {
    QueueBuilder::new(temp_dir.path())
        .max_file_size(max_file_size)
        .build()
        .expect("Failed to create queue")
}

fn generate_message(size: usize) -> String { "x".repeat(size) }

fn bench_push_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_latency");

    for &size in MESSAGE_SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let queue = create_queue(&temp_dir, 0);
            let msg = generate_message(size);

            b.iter(|| queue.push(black_box(&msg)).unwrap());
        });
    }

    group.finish();
}

/// Push with a 64KB threshold, so a roll happens every few dozen messages.
fn bench_push_with_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_with_rotation");

    for &size in MESSAGE_SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let queue = create_queue(&temp_dir, 64 * 1024);
            let msg = generate_message(size);

            b.iter(|| queue.push(black_box(&msg)).unwrap());
        });
    }

    group.finish();
}

fn bench_drain_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_throughput");
    group.throughput(Throughput::Elements(BACKLOG as u64));
    group.measurement_time(Duration::from_secs(10));

    for batch_size in [1, 64, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                b.iter_batched(
                    || {
                        let temp_dir = TempDir::new().unwrap();
                        let queue = create_queue(&temp_dir, 1024 * 1024);
                        queue
                            .push_batch(std::iter::repeat_n(generate_message(256), BACKLOG))
                            .unwrap();
                        (temp_dir, queue)
                    },
                    |(_temp_dir, queue)| {
                        let mut drained = 0;
                        while drained < BACKLOG {
                            drained += queue.try_consume(batch_size).unwrap().len();
                        }
                        black_box(drained)
                    },
                    BatchSize::PerIteration,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_push_latency,
    bench_push_with_rotation,
    bench_drain_throughput
);
criterion_main!(benches);
