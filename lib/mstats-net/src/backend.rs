/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use flume::{Sender, TrySendError};
use log::{debug, warn};

use mstats::{Backend, Metric, StatsError};

use crate::buffer::FlushBuffer;
use crate::conn::Connector;
use crate::fail::FailHandler;
use crate::job::{Job, JobValue};
use crate::stats::{NetSnapshot, NetStats};
use crate::worker::Worker;
use crate::NetBackendConfig;

/// Backend streaming metrics to a remote endpoint from a background thread.
///
/// The setters never block: when the queue is full or already closed the
/// metric is dropped and the failure is given to the fail callback.
pub struct NetBackend {
    sender: ArcSwapOption<Sender<Job>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    fail: FailHandler,
    stats: Arc<NetStats>,
}

impl NetBackend {
    pub fn new(config: NetBackendConfig) -> io::Result<Self> {
        let config = config.with_defaults();

        let (sender, receiver) = flume::bounded::<Job>(config.queue_size);
        let stats = Arc::new(NetStats::default());
        let fail = FailHandler::new(config.fail, config.diagnostic);

        let worker = Worker {
            receiver,
            protocol: config.protocol,
            connector: Connector {
                network: config.network,
                address: config.address,
                dial: config.dial,
                retry_after_min: config.retry_after_min,
                retry_after_max: config.retry_after_max,
            },
            buffer: FlushBuffer::new(config.buffer_size, config.write_timeout, stats.clone()),
            flush_interval: config.flush_interval,
            fail: fail.clone(),
            stats: stats.clone(),
            conn: None,
        };
        let handle = thread::Builder::new()
            .name(config.thread_name)
            .spawn(move || worker.run_to_end())?;

        Ok(NetBackend {
            sender: ArcSwapOption::from_pointee(sender),
            worker: Mutex::new(Some(handle)),
            fail,
            stats,
        })
    }

    pub fn set(&self, metric: &Metric, value: f64) {
        self.enqueue(Job::new(metric, JobValue::Set(value)));
    }

    pub fn add(&self, metric: &Metric, value: f64) {
        self.enqueue(Job::new(metric, JobValue::Add(value)));
    }

    pub fn observe(&self, metric: &Metric, value: Duration) {
        self.enqueue(Job::new(metric, JobValue::Observe(value)));
    }

    /// Stop accepting metrics and wait for the worker to write out what is
    /// left in the queue. Calling it again does nothing.
    ///
    /// When called from the fail callback, which runs on the worker thread,
    /// the queue is closed but nothing is joined. A later call from another
    /// thread waits for the worker.
    pub fn close(&self) {
        drop(self.sender.swap(None));

        let handle = {
            let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            match worker.take() {
                Some(handle) if handle.thread().id() == thread::current().id() => {
                    *worker = Some(handle);
                    debug!("metrics queue closed from the worker thread");
                    None
                }
                handle => handle,
            }
        };
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            warn!("metrics worker thread panicked");
        }
    }

    pub fn stats(&self) -> NetSnapshot {
        self.stats.snapshot()
    }

    fn enqueue(&self, job: Job) {
        let guard = self.sender.load();
        let Some(sender) = guard.as_ref() else {
            self.stats.drop.add_queue_closed();
            self.fail.report(StatsError::QueueClosed {
                name: job.metric.name().to_string(),
            });
            return;
        };

        match sender.try_send(job) {
            Ok(_) => self.stats.add_queued(),
            Err(TrySendError::Full(job)) => {
                self.stats.drop.add_queue_full();
                self.fail.report(StatsError::QueueFull {
                    name: job.metric.name().to_string(),
                });
            }
            Err(TrySendError::Disconnected(job)) => {
                self.stats.drop.add_queue_closed();
                self.fail.report(StatsError::QueueClosed {
                    name: job.metric.name().to_string(),
                });
            }
        }
    }
}

impl Drop for NetBackend {
    fn drop(&mut self) {
        self.close();
    }
}

impl Backend for NetBackend {
    fn set(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        NetBackend::set(self, metric, value);
        Ok(())
    }

    fn add(&self, metric: &Metric, value: f64) -> Result<(), StatsError> {
        NetBackend::add(self, metric, value);
        Ok(())
    }

    fn observe(&self, metric: &Metric, value: Duration) -> Result<(), StatsError> {
        NetBackend::observe(self, metric, value);
        Ok(())
    }

    fn close(&self) -> Result<(), StatsError> {
        NetBackend::close(self);
        Ok(())
    }
}
