/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("discarding {name} because the metric queue is full")]
    QueueFull { name: String },
    #[error("discarding {name} because the metric queue was closed")]
    QueueClosed { name: String },
    #[error("failed to dial {network} {address}: {source}")]
    Dial {
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode metric {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {len} buffered bytes: {source}")]
    Write {
        len: usize,
        #[source]
        source: io::Error,
    },
    #[error("discarding {len} buffered bytes: {reason}")]
    Discard { len: usize, reason: &'static str },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("{}", join_errors(.0))]
    Multiple(Vec<StatsError>),
}

impl StatsError {
    /// Fold a list of errors into a single result.
    pub fn from_errors(mut errors: Vec<StatsError>) -> Result<(), StatsError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(StatsError::Multiple(errors)),
        }
    }

    pub fn is_dropped_metric(&self) -> bool {
        matches!(
            self,
            StatsError::QueueFull { .. } | StatsError::QueueClosed { .. }
        )
    }
}

fn join_errors(errors: &[StatsError]) -> String {
    let mut s = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            s.push_str("; ");
        }
        s.push_str(&e.to_string());
    }
    s
}
