/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use crate::{ArcBackend, Backend, Metric, StatsError};

/// Backend duplicating every event to all of its children.
///
/// A failing child does not stop the event from reaching the others, the
/// errors are collected and returned together.
#[derive(Clone, Default)]
pub struct MultiBackend {
    backends: Vec<ArcBackend>,
}

impl MultiBackend {
    pub fn new(backends: Vec<ArcBackend>) -> Self {
        MultiBackend { backends }
    }

    pub fn push(&mut self, backend: ArcBackend) {
        self.backends.push(backend);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    fn for_each<F>(&self, f: F) -> Result<(), StatsError>
    where
        F: Fn(&dyn Backend) -> Result<(), StatsError>,
    {
        let errors = self
            .backends
            .iter()
            .filter_map(|b| f(b.as_ref()).err())
            .collect();
        StatsError::from_errors(errors)
    }
}

impl Backend for MultiBackend {
    fn set(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        self.for_each(|b| b.set(metric, value))
    }

    fn add(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        self.for_each(|b| b.add(metric, value))
    }

    fn observe(&self, metric: &Metric, value: Duration) -> Result<(), StatsError> {
        self.for_each(|b| b.observe(metric, value))
    }

    fn close(&self) -> Result<(), StatsError> {
        self.for_each(|b| b.close())
    }
}
