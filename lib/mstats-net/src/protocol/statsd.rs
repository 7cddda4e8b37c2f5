/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use mstats::Metric;

use super::Protocol;

enum MetricType {
    Gauge,
    Count,
    Timing,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "g",
            MetricType::Count => "c",
            MetricType::Timing => "ms",
        }
    }
}

/// DogStatsD line protocol, one `name:value|type|#tags` line per event.
#[derive(Clone, Debug, Default)]
pub struct DogStatsd {
    prefix: String,
}

impl DogStatsd {
    pub fn new() -> Self {
        DogStatsd::default()
    }

    pub fn with_prefix<T: Into<String>>(prefix: T) -> Self {
        DogStatsd {
            prefix: prefix.into(),
        }
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn write_metric(
        &self,
        buf: &mut Vec<u8>,
        metric: &Metric,
        metric_type: MetricType,
        value: f64,
    ) -> io::Result<()> {
        if !value.is_finite() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("non-finite value {value}"),
            ));
        }
        if metric.name().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty metric name",
            ));
        }

        if !self.prefix.is_empty() {
            buf.extend_from_slice(self.prefix.as_bytes());
            buf.push(b'.');
        }
        buf.extend_from_slice(metric.name().as_bytes());
        buf.push(b':');
        push_value(buf, value);
        buf.push(b'|');
        buf.extend_from_slice(metric_type.as_str().as_bytes());

        let tags = metric.tags();
        if !tags.is_empty() {
            buf.extend_from_slice(b"|#");
            for (i, tag) in tags.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                buf.extend_from_slice(tag.name().as_bytes());
                if !tag.value().is_empty() {
                    buf.push(b':');
                    buf.extend_from_slice(tag.value().as_bytes());
                }
            }
        }

        buf.push(b'\n');
        Ok(())
    }
}

// integral values are written without a fraction part
fn push_value(buf: &mut Vec<u8>, value: f64) {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let mut buffer = itoa::Buffer::new();
        buf.extend_from_slice(buffer.format(value as i64).as_bytes());
    } else {
        let mut buffer = ryu::Buffer::new();
        buf.extend_from_slice(buffer.format_finite(value).as_bytes());
    }
}

impl Protocol for DogStatsd {
    fn write_set(&self, buf: &mut Vec<u8>, metric: &Metric, value: f64) -> io::Result<()> {
        self.write_metric(buf, metric, MetricType::Gauge, value)
    }

    fn write_add(&self, buf: &mut Vec<u8>, metric: &Metric, value: f64) -> io::Result<()> {
        self.write_metric(buf, metric, MetricType::Count, value)
    }

    fn write_observe(
        &self,
        buf: &mut Vec<u8>,
        metric: &Metric,
        value: Duration,
    ) -> io::Result<()> {
        let millis = value.as_nanos() as f64 / 1_000_000.0;
        self.write_metric(buf, metric, MetricType::Timing, millis)
    }
}
