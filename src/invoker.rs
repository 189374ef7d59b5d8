//! Transition handler invocation
//!
//! The handler is an external executable run once per imminent transition
//! with three positional arguments: location, direction (`1`/`-1`) and the
//! current offset in hours. Its stdio is inherited and the call waits for it
//! to exit.

use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

use crate::error::{DstError, Result};
use crate::record::Direction;

/// Exit status of a handler run; `code` is `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerStatus {
    pub code: Option<i32>,
}

impl HandlerStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[allow(async_fn_in_trait)]
pub trait ActionInvoker {
    /// Run the handler. `Err` means it could not be launched at all.
    async fn invoke(&self, location: &str, direction: Direction, offset_hours: i32)
        -> Result<HandlerStatus>;
}

impl<T: ActionInvoker + ?Sized> ActionInvoker for &T {
    async fn invoke(&self, location: &str, direction: Direction, offset_hours: i32)
        -> Result<HandlerStatus> {
        (**self).invoke(location, direction, offset_hours).await
    }
}

pub struct ProcessInvoker {
    handler: PathBuf,
}

impl ProcessInvoker {
    pub fn new(handler: impl Into<PathBuf>) -> Self {
        Self {
            handler: handler.into(),
        }
    }
}

/// Positional arguments in handler order.
pub fn handler_args(location: &str, direction: Direction, offset_hours: i32) -> [String; 3] {
    [
        location.to_string(),
        direction.to_string(),
        offset_hours.to_string(),
    ]
}

impl ActionInvoker for ProcessInvoker {
    async fn invoke(
        &self,
        location: &str,
        direction: Direction,
        offset_hours: i32,
    ) -> Result<HandlerStatus> {
        let args = handler_args(location, direction, offset_hours);
        info!(
            "Executing handler: {} {} {} {}",
            self.handler.display(),
            args[0],
            args[1],
            args[2]
        );

        let status = Command::new(&self.handler)
            .args(&args)
            .status()
            .await
            .map_err(|e| {
                DstError::InvokerFailure(format!(
                    "could not launch {}: {}",
                    self.handler.display(),
                    e
                ))
            })?;

        Ok(HandlerStatus {
            code: status.code(),
        })
    }
}
