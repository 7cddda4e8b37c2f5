/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use log::debug;

use mstats::StatsError;

use crate::fail::FailHandler;
use crate::stats::NetStats;
use crate::DialFn;

/// Byte stream the encoded metrics are written to.
pub trait Connection: Write + Send {
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

pub type BoxConnection = Box<dyn Connection>;

impl Connection for TcpStream {
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl Connection for UnixStream {
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        UnixStream::set_write_timeout(self, timeout)
    }
}

/// Open a stream connection.
///
/// Supported networks are `tcp`, `tcp4`, `tcp6` and, on unix, `unix`.
pub fn dial(network: &str, address: &str) -> io::Result<BoxConnection> {
    match network {
        "tcp" => {
            let stream = TcpStream::connect(address)?;
            Ok(Box::new(stream))
        }
        "tcp4" | "tcp6" => {
            let want_v4 = network == "tcp4";
            let addrs: Vec<SocketAddr> = address
                .to_socket_addrs()?
                .filter(|a| a.is_ipv4() == want_v4)
                .collect();
            if addrs.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no {network} address found for {address}"),
                ));
            }
            let stream = TcpStream::connect(addrs.as_slice())?;
            Ok(Box::new(stream))
        }
        #[cfg(unix)]
        "unix" => {
            let stream = UnixStream::connect(address)?;
            Ok(Box::new(stream))
        }
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported network {network}"),
        )),
    }
}

/// Exponential retry delay, doubled after each use and capped at `max`.
pub(crate) struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub(crate) fn new(min: Duration, max: Duration) -> Self {
        Backoff { next: min, max }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = delay.saturating_add(delay).min(self.max);
        delay
    }
}

pub(crate) struct Connector {
    pub(crate) network: String,
    pub(crate) address: String,
    pub(crate) dial: DialFn,
    pub(crate) retry_after_min: Duration,
    pub(crate) retry_after_max: Duration,
}

impl Connector {
    /// Dial until it succeeds. Each call starts again from the minimum delay.
    pub(crate) fn connect(&self, fail: &FailHandler, stats: &NetStats) -> BoxConnection {
        self.connect_with(fail, stats, std::thread::sleep)
    }

    pub(crate) fn connect_with<S>(
        &self,
        fail: &FailHandler,
        stats: &NetStats,
        mut sleep: S,
    ) -> BoxConnection
    where
        S: FnMut(Duration),
    {
        let mut backoff = Backoff::new(self.retry_after_min, self.retry_after_max);
        loop {
            match (self.dial)(&self.network, &self.address) {
                Ok(conn) => {
                    stats.conn.add_established();
                    debug!("connected to {} {}", self.network, self.address);
                    return conn;
                }
                Err(e) => {
                    stats.conn.add_dial_failed();
                    fail.report(StatsError::Dial {
                        network: self.network.clone(),
                        address: self.address.clone(),
                        source: e,
                    });
                    let delay = backoff.next_delay();
                    debug!("will retry to connect to {} in {delay:?}", self.address);
                    sleep(delay);
                }
            }
        }
    }
}
