/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, BufWriter, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::{Backend, Metric, StatsError, Tags};

#[derive(Serialize)]
struct JsonEvent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    help: &'a str,
    value: f64,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    tags: &'a Tags,
}

/// Backend that records every event as one JSON object per line.
///
/// Output is buffered, call `close` to get everything written out.
pub struct JsonBackend<W: Write> {
    out: Mutex<BufWriter<W>>,
}

impl<W: Write> JsonBackend<W> {
    pub fn new(w: W) -> Self {
        JsonBackend {
            out: Mutex::new(BufWriter::new(w)),
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        let out = self.out.into_inner().unwrap_or_else(PoisonError::into_inner);
        out.into_inner().map_err(|e| e.into_error())
    }

    fn send(&self, kind: &'static str, metric: &Metric, value: f64) -> Result<(), StatsError> {
        let event = JsonEvent {
            kind,
            name: metric.name(),
            help: metric.help(),
            value,
            tags: metric.tags(),
        };

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer(&mut *out, &event).map_err(io::Error::from)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write + Send> Backend for JsonBackend<W> {
    fn set(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        self.send("gauge", metric, value)
    }

    fn add(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        self.send("counter", metric, value)
    }

    fn observe(&self, metric: &Metric, value: Duration) -> Result<(), StatsError> {
        self.send("histogram", metric, value.as_secs_f64())
    }

    fn close(&self) -> Result<(), StatsError> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_events() {
        let backend = JsonBackend::new(Vec::new());

        let m = Metric::new("queue.depth");
        backend.set(&m, 3.0).unwrap();

        let m = Metric::new("requests")
            .with_help("served requests")
            .with_tag("method", "GET");
        backend.add(&m, 1.0).unwrap();

        let m = Metric::new("latency");
        backend.observe(&m, Duration::from_millis(250)).unwrap();
        backend.close().unwrap();

        let out = String::from_utf8(backend.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"type":"gauge","name":"queue.depth","value":3.0}"#,
                r#"{"type":"counter","name":"requests","help":"served requests","value":1.0,"tags":{"method":"GET"}}"#,
                r#"{"type":"histogram","name":"latency","value":0.25}"#,
            ]
        );
    }

    #[test]
    fn buffered_until_close() {
        let backend = JsonBackend::new(Vec::new());
        backend.set(&Metric::new("a"), 1.0).unwrap();
        {
            let out = backend.out.lock().unwrap();
            assert!(out.get_ref().is_empty());
        }
        backend.close().unwrap();
        let out = backend.out.lock().unwrap();
        assert!(!out.get_ref().is_empty());
    }
}
