// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy and the replaceable error handler.
//!
//! Every fallible operation returns an explicit `Result`. Resource exhaustion is
//! additionally routed through an [`ErrorHandler`] *before* the error is returned,
//! so the default (fatal) handler terminates the requesting process
//! deterministically while the daemon and all other processes stay unaffected.
//!
//! The handler is stored in an [`ArcSwap`] so it can be replaced without locking
//! the reporting path. Tests install a non-terminating observer with
//! [`ErrorHandler::set_temporary`].

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Exhaustion of one of the registry pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum PortPoolError {
    #[error("publisher port list full")]
    PublisherPortListFull,
    #[error("subscriber port list full")]
    SubscriberPortListFull,
    #[error("interface port list full")]
    InterfacePortListFull,
    #[error("application port list full")]
    ApplicationPortListFull,
    #[error("node data list full")]
    NodeDataListFull,
    #[error("condition variable list full")]
    ConditionVariableListFull,
    #[error("event variable list full")]
    EventVariableListFull,
}

/// Failure of [`try_get_chunk`](crate::popo::SubscriberPort::try_get_chunk).
///
/// Recoverable; never routed through the error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ChunkReceiveError {
    #[error("no chunk available")]
    NoChunkAvailable,
    #[error("too many chunks held in parallel")]
    TooManyChunksHeldInParallel,
}

/// Failure of a publisher chunk loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AllocationError {
    #[error("payload pool is running out of chunks")]
    RunningOutOfChunks,
    #[error("invalid chunk size: {0} bytes")]
    InvalidChunkSize(usize),
}

/// Failure of a wait-set attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum WaitSetError {
    #[error("wait-set capacity exceeded")]
    WaitSetFull,
    #[error("event is already attached to this wait-set")]
    AlreadyAttached,
    #[error("condition variable of the wait-set has been destroyed")]
    ConditionVariableDestroyed,
}

/// What is reported to the [`ErrorHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A registry pool is exhausted.
    PortPool(PortPoolError),
    /// A facade was used after its registry entry was purged.
    PortUsedAfterDestruction(&'static str),
    /// A condition variable handle was resolved after being purged.
    ConditionVariableUsedAfterDestruction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortPool(err) => write!(f, "port pool error: {err}"),
            Self::PortUsedAfterDestruction(kind) => {
                write!(f, "{kind} used after its registry entry was destroyed")
            }
            Self::ConditionVariableUsedAfterDestruction => {
                write!(f, "condition variable used after destruction")
            }
        }
    }
}

impl From<PortPoolError> for ErrorKind {
    fn from(err: PortPoolError) -> Self {
        Self::PortPool(err)
    }
}

/// How severe a reported error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Moderate,
    Severe,
    Fatal,
}

/// Signature of an error handler callback.
pub type HandlerFn = dyn Fn(ErrorKind, Option<&dyn Fn()>, Severity) + Send + Sync;

struct Handler(Box<HandlerFn>);

/// Replaceable sink for every reported error.
pub struct ErrorHandler {
    current: ArcSwap<Handler>,
}

impl ErrorHandler {
    /// Handler with the default behavior: fatal errors terminate the process.
    #[must_use]
    pub fn new() -> Self {
        Self::with_handler(default_handler)
    }

    /// Handler with a custom callback.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(ErrorKind, Option<&dyn Fn()>, Severity) + Send + Sync + 'static,
    {
        Self {
            current: ArcSwap::from_pointee(Handler(Box::new(handler))),
        }
    }

    /// Report an error to the currently installed handler.
    pub fn report(&self, kind: ErrorKind, recovery: Option<&dyn Fn()>, severity: Severity) {
        let handler = self.current.load();
        (handler.0)(kind, recovery, severity);
    }

    /// Replace the handler permanently.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(ErrorKind, Option<&dyn Fn()>, Severity) + Send + Sync + 'static,
    {
        self.current.store(Arc::new(Handler(Box::new(handler))));
    }

    /// Replace the handler until the returned guard is dropped.
    #[must_use = "the previous handler is restored when the guard is dropped"]
    pub fn set_temporary<F>(&self, handler: F) -> TemporaryErrorHandlerGuard<'_>
    where
        F: Fn(ErrorKind, Option<&dyn Fn()>, Severity) + Send + Sync + 'static,
    {
        let previous = self.current.swap(Arc::new(Handler(Box::new(handler))));
        TemporaryErrorHandlerGuard {
            owner: self,
            previous: Some(previous),
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler").finish_non_exhaustive()
    }
}

/// Restores the previous handler on drop.
pub struct TemporaryErrorHandlerGuard<'a> {
    owner: &'a ErrorHandler,
    previous: Option<Arc<Handler>>,
}

impl Drop for TemporaryErrorHandlerGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.owner.current.store(previous);
        }
    }
}

fn default_handler(kind: ErrorKind, recovery: Option<&dyn Fn()>, severity: Severity) {
    match severity {
        Severity::Fatal => {
            log::error!("[error] fatal: {}", kind);
            if let Some(recover) = recovery {
                recover();
            }
            std::process::abort();
        }
        Severity::Severe => {
            log::error!("[error] severe: {}", kind);
            if let Some(recover) = recovery {
                recover();
            }
        }
        Severity::Moderate => log::warn!("[error] moderate: {}", kind),
    }
}
