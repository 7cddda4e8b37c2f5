/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::any::Any;
use std::backtrace::Backtrace;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use log::error;

use mstats::StatsError;

/// Callback receiving every operational error of the backend.
pub type FailFn = Arc<dyn Fn(&StatsError) + Send + Sync>;

/// Writer receiving the report of a panicking [`FailFn`].
pub type DiagnosticSink = Arc<Mutex<dyn Write + Send>>;

pub fn stderr_fail() -> FailFn {
    Arc::new(|e: &StatsError| eprintln!("stats: {e}"))
}

pub(crate) fn stderr_diagnostic() -> DiagnosticSink {
    Arc::new(Mutex::new(io::stderr()))
}

#[derive(Clone)]
pub(crate) struct FailHandler {
    fail: FailFn,
    diagnostic: DiagnosticSink,
}

impl FailHandler {
    pub(crate) fn new(fail: FailFn, diagnostic: DiagnosticSink) -> Self {
        FailHandler { fail, diagnostic }
    }

    /// Hand the error to the callback. A panic inside the callback is
    /// reported to the diagnostic sink and never reaches the caller.
    pub(crate) fn report(&self, err: StatsError) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| (self.fail)(&err))) {
            self.report_panic(payload.as_ref());
        }
    }

    fn report_panic(&self, payload: &(dyn Any + Send)) {
        let msg = panic_message(payload);
        error!("metrics fail callback panicked: {msg}");

        let backtrace = Backtrace::force_capture();
        let mut w = self
            .diagnostic
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(w, "panic: {msg} [recovered]");
        let _ = writeln!(w, "{backtrace}");
        let _ = w.flush();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::SharedBuf;

    fn panic_with_error(e: &StatsError) {
        panic!("boom: {e}")
    }

    fn panic_static(_: &StatsError) {
        panic!("static")
    }

    #[test]
    fn report_to_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_i = seen.clone();
        let fail: FailFn = Arc::new(move |e: &StatsError| {
            seen_i.lock().unwrap().push(e.to_string());
        });
        let handler = FailHandler::new(fail, stderr_diagnostic());

        handler.report(StatsError::QueueFull {
            name: "m".to_string(),
        });
        assert_eq!(
            *seen.lock().unwrap(),
            ["discarding m because the metric queue is full"]
        );
    }

    #[test]
    fn isolate_panic() {
        let diag = SharedBuf::default();
        let fail: FailFn = Arc::new(panic_with_error);
        let handler = FailHandler::new(fail, diag.sink());

        handler.report(StatsError::QueueClosed {
            name: "m".to_string(),
        });
        handler.report(StatsError::QueueClosed {
            name: "n".to_string(),
        });

        let out = diag.contents();
        assert!(out.starts_with(
            "panic: boom: discarding m because the metric queue was closed [recovered]\n"
        ));
        assert!(out.contains("panic: boom: discarding n because the metric queue was closed"));
    }

    #[test]
    fn static_str_payload() {
        let diag = SharedBuf::default();
        let fail: FailFn = Arc::new(panic_static);
        let handler = FailHandler::new(fail, diag.sink());
        handler.report(StatsError::Io(io::Error::other("x")));
        assert!(diag.contents().starts_with("panic: static [recovered]"));
    }
}
