/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mstats::StatsError;

use crate::job::Job;
use crate::stats::NetStats;
use crate::{BoxConnection, Protocol};

/// Encoded bytes waiting to be written to the connection.
pub(crate) struct FlushBuffer {
    buf: Vec<u8>,
    flush_size: usize,
    write_timeout: Duration,
    stats: Arc<NetStats>,
}

impl FlushBuffer {
    pub(crate) fn new(flush_size: usize, write_timeout: Duration, stats: Arc<NetStats>) -> Self {
        FlushBuffer {
            buf: Vec::with_capacity(flush_size),
            flush_size,
            write_timeout,
            stats,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode the job and flush if the flush size has been reached.
    ///
    /// Only the bytes buffered before this job are flushed, unless the buffer
    /// was empty, in which case the whole content goes out. So the bytes of
    /// the job that crossed the threshold wait for the next flush.
    pub(crate) fn write(
        &mut self,
        conn: &mut Option<BoxConnection>,
        job: &Job,
        protocol: &dyn Protocol,
    ) -> Result<(), StatsError> {
        let before = self.buf.len();

        if let Err(e) = job.encode(protocol, &mut self.buf) {
            self.stats.drop.add_encode_failed();
            return Err(StatsError::Encode {
                name: job.metric.name().to_string(),
                source: e,
            });
        }

        let after = self.buf.len();
        if after < self.flush_size {
            return Ok(());
        }

        let n = if before == 0 { after } else { before };
        self.flush_n(conn, n)
    }

    pub(crate) fn flush_all(&mut self, conn: &mut Option<BoxConnection>) -> Result<(), StatsError> {
        self.flush_n(conn, self.buf.len())
    }

    /// Write the first `n` bytes. Without a connection the bytes stay
    /// buffered. On error the connection is dropped and the bytes are kept
    /// for the next one.
    pub(crate) fn flush_n(
        &mut self,
        conn: &mut Option<BoxConnection>,
        n: usize,
    ) -> Result<(), StatsError> {
        let Some(c) = conn.as_mut() else {
            return Ok(());
        };
        if n == 0 {
            return Ok(());
        }

        let deadline = Instant::now() + self.write_timeout;
        let r = write_before(c, &self.buf[..n], deadline).and_then(|_| c.flush());
        match r {
            Ok(_) => {
                self.stats.io.add_flush(n);
                self.buf.drain(..n);
                Ok(())
            }
            Err(e) => {
                self.stats.io.add_write_failed();
                *conn = None;
                Err(StatsError::Write { len: n, source: e })
            }
        }
    }
}

/// Write all of `data` before `deadline`. The socket timeout only bounds a
/// single write call, so it is lowered to the time left before each one.
fn write_before(conn: &mut BoxConnection, mut data: &[u8], deadline: Instant) -> io::Result<()> {
    while !data.is_empty() {
        let left = deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
            .ok_or_else(|| io::Error::from(io::ErrorKind::TimedOut))?;
        conn.set_write_timeout(Some(left))?;
        match conn.write(data) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(len) => data = &data[len..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mstats::Metric;

    use crate::job::JobValue;
    use crate::testing::{FixedProtocol, MockConn};

    fn job(name: &str) -> Job {
        Job::new(&Metric::new(name), JobValue::Set(1.0))
    }

    fn buffer(flush_size: usize) -> FlushBuffer {
        FlushBuffer::new(flush_size, Duration::from_secs(1), Arc::new(NetStats::default()))
    }

    #[test]
    fn below_threshold() {
        let mock = MockConn::default();
        let mut conn = Some(mock.boxed());
        let mut buf = buffer(16);

        buf.write(&mut conn, &job("aaaa"), &FixedProtocol).unwrap();
        buf.write(&mut conn, &job("bbbb"), &FixedProtocol).unwrap();
        assert_eq!(buf.len(), 10);
        assert!(mock.written().is_empty());
    }

    #[test]
    fn single_job_over_threshold() {
        let mock = MockConn::default();
        let mut conn = Some(mock.boxed());
        let mut buf = buffer(8);

        buf.write(&mut conn, &job("aaaaaaaaaaaa"), &FixedProtocol)
            .unwrap();
        assert!(buf.is_empty());
        assert_eq!(mock.written(), b"aaaaaaaaaaaa\n");
    }

    #[test]
    fn threshold_job_is_deferred() {
        let mock = MockConn::default();
        let mut conn = Some(mock.boxed());
        let mut buf = buffer(10);

        buf.write(&mut conn, &job("aaaaa"), &FixedProtocol).unwrap();
        assert_eq!(buf.len(), 6);
        buf.write(&mut conn, &job("bbbbb"), &FixedProtocol).unwrap();
        // only the bytes queued before the second job are written
        assert_eq!(mock.written(), b"aaaaa\n");
        assert_eq!(buf.len(), 6);

        buf.write(&mut conn, &job("ccccc"), &FixedProtocol).unwrap();
        assert_eq!(mock.written(), b"aaaaa\nbbbbb\n");
        assert_eq!(buf.len(), 6);

        buf.flush_all(&mut conn).unwrap();
        assert_eq!(mock.written(), b"aaaaa\nbbbbb\nccccc\n");
        assert!(buf.is_empty());
    }

    #[test]
    fn no_connection_keeps_bytes() {
        let mut conn = None;
        let mut buf = buffer(4);

        buf.write(&mut conn, &job("aaaaa"), &FixedProtocol).unwrap();
        buf.write(&mut conn, &job("bbbbb"), &FixedProtocol).unwrap();
        buf.flush_all(&mut conn).unwrap();
        assert_eq!(buf.len(), 12);

        let mock = MockConn::default();
        let mut conn = Some(mock.boxed());
        buf.flush_all(&mut conn).unwrap();
        assert_eq!(mock.written(), b"aaaaa\nbbbbb\n");
    }

    #[test]
    fn write_error_drops_connection() {
        let mock = MockConn::default();
        mock.set_broken(true);
        let mut conn = Some(mock.boxed());
        let mut buf = buffer(4);

        let r = buf.write(&mut conn, &job("aaaaa"), &FixedProtocol);
        assert!(matches!(r, Err(StatsError::Write { len: 6, .. })));
        assert!(conn.is_none());
        assert_eq!(buf.len(), 6);
        assert!(mock.write_timeout().unwrap() <= Duration::from_secs(1));

        let mock = MockConn::default();
        let mut conn = Some(mock.boxed());
        buf.flush_all(&mut conn).unwrap();
        assert_eq!(mock.written(), b"aaaaa\n");
    }

    #[test]
    fn deadline_covers_whole_flush() {
        let mock = MockConn::default();
        mock.set_slow(1, Duration::from_millis(20));
        let mut conn = Some(mock.boxed());
        let mut buf = FlushBuffer::new(
            4,
            Duration::from_millis(50),
            Arc::new(NetStats::default()),
        );

        let r = buf.write(&mut conn, &job("aaaaaaaaa"), &FixedProtocol);
        match r {
            Err(StatsError::Write { len: 10, source }) => {
                assert_eq!(source.kind(), io::ErrorKind::TimedOut)
            }
            _ => panic!("expected a timed out write"),
        }
        assert!(conn.is_none());
        assert_eq!(buf.len(), 10);
        // each call got at most the time left
        assert!(mock.write_timeout().unwrap() < Duration::from_millis(50));
        assert!(mock.written().len() < 10);
    }

    #[test]
    fn encode_error_no_flush() {
        let mock = MockConn::default();
        let mut conn = Some(mock.boxed());
        let mut buf = buffer(4);

        let r = buf.write(&mut conn, &job(""), &FixedProtocol);
        assert!(matches!(r, Err(StatsError::Encode { .. })));
        assert!(conn.is_some());
        assert!(mock.written().is_empty());
        assert_eq!(buf.stats.snapshot().drop.encode_failed, 1);
    }
}
