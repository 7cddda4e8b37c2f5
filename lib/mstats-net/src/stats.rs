/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Debug, Eq, PartialEq)]
pub struct NetSnapshot {
    pub queued: u64,
    pub io: NetIoSnapshot,
    pub drop: NetDropSnapshot,
    pub conn: NetConnSnapshot,
}

#[derive(Default, Debug, Eq, PartialEq)]
pub struct NetIoSnapshot {
    pub flushes: u64,
    pub bytes_written: u64,
    pub write_failed: u64,
}

#[derive(Default, Debug, Eq, PartialEq)]
pub struct NetDropSnapshot {
    pub queue_full: u64,
    pub queue_closed: u64,
    pub encode_failed: u64,
}

#[derive(Default, Debug, Eq, PartialEq)]
pub struct NetConnSnapshot {
    pub established: u64,
    pub dial_failed: u64,
}

#[derive(Default)]
pub struct NetStats {
    queued: AtomicU64,
    pub io: NetIoStats,
    pub drop: NetDropStats,
    pub conn: NetConnStats,
}

impl NetStats {
    pub fn snapshot(&self) -> NetSnapshot {
        NetSnapshot {
            queued: self.queued.load(Ordering::Relaxed),
            io: self.io.snapshot(),
            drop: self.drop.snapshot(),
            conn: self.conn.snapshot(),
        }
    }

    pub(crate) fn add_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct NetIoStats {
    flushes: AtomicU64,
    bytes_written: AtomicU64,
    write_failed: AtomicU64,
}

impl NetIoStats {
    pub fn snapshot(&self) -> NetIoSnapshot {
        NetIoSnapshot {
            flushes: self.flushes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_failed: self.write_failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_flush(&self, size: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub(crate) fn add_write_failed(&self) {
        self.write_failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct NetDropStats {
    queue_full: AtomicU64,
    queue_closed: AtomicU64,
    encode_failed: AtomicU64,
}

impl NetDropStats {
    pub fn snapshot(&self) -> NetDropSnapshot {
        NetDropSnapshot {
            queue_full: self.queue_full.load(Ordering::Relaxed),
            queue_closed: self.queue_closed.load(Ordering::Relaxed),
            encode_failed: self.encode_failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_queue_full(&self) {
        self.queue_full.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_queue_closed(&self) {
        self.queue_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_encode_failed(&self) {
        self.encode_failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct NetConnStats {
    established: AtomicU64,
    dial_failed: AtomicU64,
}

impl NetConnStats {
    pub fn snapshot(&self) -> NetConnSnapshot {
        NetConnSnapshot {
            established: self.established.load(Ordering::Relaxed),
            dial_failed: self.dial_failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_established(&self) {
        self.established.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_dial_failed(&self) {
        self.dial_failed.fetch_add(1, Ordering::Relaxed);
    }
}
