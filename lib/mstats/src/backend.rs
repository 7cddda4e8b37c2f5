/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use crate::{Metric, StatsError};

/// Receiver of metric events.
///
/// `set` records a gauge value, `add` increments a counter and `observe`
/// records a timing. Implementations must be usable from many threads.
pub trait Backend: Send + Sync {
    fn set(&self, metric: &Metric, value: f64) -> Result<(), StatsError>;

    fn add(&self, metric: &Metric, value: f64) -> Result<(), StatsError>;

    fn observe(&self, metric: &Metric, value: Duration) -> Result<(), StatsError>;

    fn close(&self) -> Result<(), StatsError>;
}

pub type ArcBackend = Arc<dyn Backend>;

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn set(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        (**self).set(metric, value)
    }

    fn add(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        (**self).add(metric, value)
    }

    fn observe(&self, metric: &Metric, value: Duration) -> Result<(), StatsError> {
        (**self).observe(metric, value)
    }

    fn close(&self) -> Result<(), StatsError> {
        (**self).close()
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn set(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        (**self).set(metric, value)
    }

    fn add(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        (**self).add(metric, value)
    }

    fn observe(&self, metric: &Metric, value: Duration) -> Result<(), StatsError> {
        (**self).observe(metric, value)
    }

    fn close(&self) -> Result<(), StatsError> {
        (**self).close()
    }
}
