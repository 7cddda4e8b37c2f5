/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mstats::{Metric, StatsError};

use crate::fail::{DiagnosticSink, FailFn, FailHandler};
use crate::{BoxConnection, Connection, Protocol};

#[derive(Default)]
struct MockConnInner {
    written: Vec<u8>,
    broken: bool,
    write_timeout: Option<Duration>,
    max_chunk: Option<usize>,
    delay: Duration,
}

/// In memory connection, clones share the same state.
#[derive(Clone, Default)]
pub(crate) struct MockConn {
    inner: Arc<Mutex<MockConnInner>>,
}

impl MockConn {
    pub(crate) fn boxed(&self) -> BoxConnection {
        Box::new(self.clone())
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written.clone()
    }

    pub(crate) fn set_broken(&self, broken: bool) {
        self.inner.lock().unwrap().broken = broken;
    }

    /// Accept at most `max_chunk` bytes per write, each after `delay`.
    pub(crate) fn set_slow(&self, max_chunk: usize, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.max_chunk = Some(max_chunk);
        inner.delay = delay;
    }

    pub(crate) fn write_timeout(&self) -> Option<Duration> {
        self.inner.lock().unwrap().write_timeout
    }
}

impl Write for MockConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let delay = self.inner.lock().unwrap().delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.broken {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        let len = inner.max_chunk.map_or(buf.len(), |max| buf.len().min(max));
        inner.written.extend_from_slice(&buf[..len]);
        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for MockConn {
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.inner.lock().unwrap().write_timeout = timeout;
        Ok(())
    }
}

/// Writes the metric name and a newline, fails on empty names.
pub(crate) struct FixedProtocol;

impl FixedProtocol {
    fn write_name(buf: &mut Vec<u8>, metric: &Metric) -> io::Result<()> {
        if metric.name().is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty name"));
        }
        buf.extend_from_slice(metric.name().as_bytes());
        buf.push(b'\n');
        Ok(())
    }
}

impl Protocol for FixedProtocol {
    fn write_set(&self, buf: &mut Vec<u8>, metric: &Metric, _value: f64) -> io::Result<()> {
        FixedProtocol::write_name(buf, metric)
    }

    fn write_add(&self, buf: &mut Vec<u8>, metric: &Metric, _value: f64) -> io::Result<()> {
        FixedProtocol::write_name(buf, metric)
    }

    fn write_observe(
        &self,
        buf: &mut Vec<u8>,
        metric: &Metric,
        _value: Duration,
    ) -> io::Result<()> {
        FixedProtocol::write_name(buf, metric)
    }
}

#[derive(Clone, Default)]
pub(crate) struct SharedBuf {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    pub(crate) fn sink(&self) -> DiagnosticSink {
        Arc::new(Mutex::new(self.clone()))
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) type ErrorLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn recording_fail_fn() -> (FailFn, ErrorLog) {
    let errors = ErrorLog::default();
    let errors_i = errors.clone();
    let fail: FailFn = Arc::new(move |e: &StatsError| {
        errors_i.lock().unwrap().push(e.to_string());
    });
    (fail, errors)
}

pub(crate) fn recorded_fail() -> (FailHandler, ErrorLog) {
    let (fail, errors) = recording_fail_fn();
    let handler = FailHandler::new(fail, SharedBuf::default().sink());
    (handler, errors)
}
