/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use mstats::Metric;

mod statsd;
pub use statsd::DogStatsd;

/// Wire encoding of metric events.
///
/// Each method appends the encoded event to `buf`. On error the event is
/// discarded, implementations should avoid leaving partial output behind.
pub trait Protocol: Send + Sync {
    fn write_set(&self, buf: &mut Vec<u8>, metric: &Metric, value: f64) -> io::Result<()>;

    fn write_add(&self, buf: &mut Vec<u8>, metric: &Metric, value: f64) -> io::Result<()>;

    fn write_observe(&self, buf: &mut Vec<u8>, metric: &Metric, value: Duration)
    -> io::Result<()>;
}
