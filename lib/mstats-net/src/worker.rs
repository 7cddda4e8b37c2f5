/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError};
use log::debug;

use mstats::StatsError;

use crate::buffer::FlushBuffer;
use crate::conn::Connector;
use crate::fail::FailHandler;
use crate::job::Job;
use crate::stats::NetStats;
use crate::{BoxConnection, Protocol};

pub(crate) struct Worker {
    pub(crate) receiver: Receiver<Job>,
    pub(crate) protocol: Arc<dyn Protocol>,
    pub(crate) connector: Connector,
    pub(crate) buffer: FlushBuffer,
    pub(crate) flush_interval: Duration,
    pub(crate) fail: FailHandler,
    pub(crate) stats: Arc<NetStats>,
    pub(crate) conn: Option<BoxConnection>,
}

impl Worker {
    /// Serve jobs until every sender is gone and the queue is drained.
    pub(crate) fn run_to_end(mut self) {
        debug!("metrics worker started");

        let mut next_flush = Instant::now() + self.flush_interval;
        loop {
            match self.receiver.recv_deadline(next_flush) {
                Ok(job) => {
                    self.ensure_connected();
                    let r = self
                        .buffer
                        .write(&mut self.conn, &job, self.protocol.as_ref());
                    self.check(r);
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.ensure_connected();
                    let r = self.buffer.flush_all(&mut self.conn);
                    self.check(r);
                    next_flush = Instant::now() + self.flush_interval;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.shutdown();
        debug!("metrics worker stopped");
    }

    fn ensure_connected(&mut self) {
        if self.conn.is_none() {
            self.conn = Some(self.connector.connect(&self.fail, &self.stats));
        }
    }

    fn check(&self, r: Result<(), StatsError>) {
        if let Err(e) = r {
            self.fail.report(e);
        }
    }

    fn shutdown(&mut self) {
        if !self.buffer.is_empty() {
            self.ensure_connected();
            let r = self.buffer.flush_all(&mut self.conn);
            self.check(r);
        }

        if !self.buffer.is_empty() {
            self.fail.report(StatsError::Discard {
                len: self.buffer.len(),
                reason: "final write failed at shutdown",
            });
        }

        // close the connection
        self.conn = None;
    }
}
