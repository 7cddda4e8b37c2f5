/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fail::{DiagnosticSink, FailFn, stderr_diagnostic, stderr_fail};
use crate::{BoxConnection, Protocol, dial};

#[cfg(feature = "yaml")]
mod yaml;

pub type DialFn = Arc<dyn Fn(&str, &str) -> io::Result<BoxConnection> + Send + Sync>;

const DEFAULT_BUFFER_SIZE: usize = 512;
const DEFAULT_QUEUE_SIZE: usize = 1000;
const DEFAULT_RETRY_AFTER_MIN: Duration = Duration::from_millis(100);
const DEFAULT_RETRY_AFTER_MAX: Duration = Duration::from_secs(15);
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_THREAD_NAME: &str = "mstats-net";

/// Settings of a [`crate::NetBackend`].
///
/// Zero sizes and durations are replaced by their defaults when the backend
/// is created.
#[derive(Clone)]
pub struct NetBackendConfig {
    pub(crate) protocol: Arc<dyn Protocol>,
    pub(crate) network: String,
    pub(crate) address: String,
    pub(crate) buffer_size: usize,
    pub(crate) queue_size: usize,
    pub(crate) retry_after_min: Duration,
    pub(crate) retry_after_max: Duration,
    pub(crate) flush_interval: Duration,
    pub(crate) write_timeout: Duration,
    pub(crate) dial: DialFn,
    pub(crate) fail: FailFn,
    pub(crate) diagnostic: DiagnosticSink,
    pub(crate) thread_name: String,
}

impl NetBackendConfig {
    pub fn new<P, N, A>(protocol: P, network: N, address: A) -> Self
    where
        P: Protocol + 'static,
        N: Into<String>,
        A: Into<String>,
    {
        NetBackendConfig {
            protocol: Arc::new(protocol),
            network: network.into(),
            address: address.into(),
            buffer_size: 0,
            queue_size: 0,
            retry_after_min: Duration::ZERO,
            retry_after_max: Duration::ZERO,
            flush_interval: Duration::ZERO,
            write_timeout: Duration::ZERO,
            dial: Arc::new(dial),
            fail: stderr_fail(),
            diagnostic: stderr_diagnostic(),
            thread_name: String::new(),
        }
    }

    pub fn set_protocol(&mut self, protocol: Arc<dyn Protocol>) {
        self.protocol = protocol;
    }

    pub fn set_network<T: Into<String>>(&mut self, network: T) {
        self.network = network.into();
    }

    pub fn set_address<T: Into<String>>(&mut self, address: T) {
        self.address = address.into();
    }

    /// Buffered bytes that trigger a flush.
    pub fn set_buffer_size(&mut self, size: usize) {
        self.buffer_size = size;
    }

    /// Capacity of the job queue.
    pub fn set_queue_size(&mut self, size: usize) {
        self.queue_size = size;
    }

    pub fn set_retry_after(&mut self, min: Duration, max: Duration) {
        self.retry_after_min = min;
        self.retry_after_max = max;
    }

    pub fn set_flush_interval(&mut self, interval: Duration) {
        self.flush_interval = interval;
    }

    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }

    pub fn set_dial(&mut self, dial: DialFn) {
        self.dial = dial;
    }

    pub fn set_fail(&mut self, fail: FailFn) {
        self.fail = fail;
    }

    /// Where to report panics raised inside the fail callback.
    pub fn set_diagnostic_writer<W: Write + Send + 'static>(&mut self, w: W) {
        self.diagnostic = Arc::new(Mutex::new(w));
    }

    pub fn set_thread_name<T: Into<String>>(&mut self, name: T) {
        self.thread_name = name.into();
    }

    #[inline]
    pub fn network(&self) -> &str {
        &self.network
    }

    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    #[inline]
    pub fn retry_after(&self) -> (Duration, Duration) {
        (self.retry_after_min, self.retry_after_max)
    }

    #[inline]
    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    #[inline]
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn with_defaults(mut self) -> Self {
        if self.buffer_size == 0 {
            self.buffer_size = DEFAULT_BUFFER_SIZE;
        }
        if self.queue_size == 0 {
            self.queue_size = DEFAULT_QUEUE_SIZE;
        }
        if self.retry_after_min.is_zero() {
            self.retry_after_min = DEFAULT_RETRY_AFTER_MIN;
        }
        if self.retry_after_max.is_zero() {
            self.retry_after_max = DEFAULT_RETRY_AFTER_MAX;
        }
        if self.flush_interval.is_zero() {
            self.flush_interval = DEFAULT_FLUSH_INTERVAL;
        }
        if self.write_timeout.is_zero() {
            self.write_timeout = DEFAULT_WRITE_TIMEOUT;
        }
        if self.thread_name.is_empty() {
            self.thread_name = DEFAULT_THREAD_NAME.to_string();
        }
        self
    }
}
