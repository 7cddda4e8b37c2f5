/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use mstats::Metric;

use crate::Protocol;

pub(crate) enum JobValue {
    Set(f64),
    Add(f64),
    Observe(Duration),
}

pub(crate) struct Job {
    pub(crate) metric: Metric,
    pub(crate) value: JobValue,
}

impl Job {
    pub(crate) fn new(metric: &Metric, value: JobValue) -> Self {
        Job {
            metric: metric.clone(),
            value,
        }
    }

    pub(crate) fn encode(&self, protocol: &dyn Protocol, buf: &mut Vec<u8>) -> io::Result<()> {
        match self.value {
            JobValue::Set(v) => protocol.write_set(buf, &self.metric, v),
            JobValue::Add(v) => protocol.write_add(buf, &self.metric, v),
            JobValue::Observe(v) => protocol.write_observe(buf, &self.metric, v),
        }
    }
}
