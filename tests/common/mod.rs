//! Shared fakes for the reconciliation tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use dstcheck::error::{DstError, Result};
use dstcheck::invoker::{ActionInvoker, HandlerStatus};
use dstcheck::offset::OffsetKey;
use dstcheck::oracle::TransitionOracle;
use dstcheck::record::{Direction, TransitionInfo};

pub const NOW: i64 = 1_700_000_000;

/// Oracle answering from a fixed table keyed by whole-hour offset
#[derive(Default)]
pub struct FakeOracle {
    answers: HashMap<i32, TransitionInfo>,
    pub calls: RefCell<Vec<OffsetKey>>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, hours: i32, info: TransitionInfo) -> Self {
        self.answers.insert(hours, info);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl TransitionOracle for FakeOracle {
    async fn lookup(&self, key: &OffsetKey) -> Result<TransitionInfo> {
        self.calls.borrow_mut().push(*key);
        self.answers
            .get(&key.hours())
            .copied()
            .ok_or_else(|| DstError::OracleUnavailable(format!("HTTP 500 for {}", key)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerCall {
    pub location: String,
    pub direction: Direction,
    pub offset_hours: i32,
}

/// Invoker that records calls and returns a scripted result
pub struct FakeInvoker {
    exit_code: Option<i32>,
    launch_fails: bool,
    pub calls: RefCell<Vec<HandlerCall>>,
}

impl FakeInvoker {
    pub fn succeeding() -> Self {
        Self {
            exit_code: Some(0),
            launch_fails: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn exiting_with(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::succeeding()
        }
    }

    pub fn failing_to_launch() -> Self {
        Self {
            launch_fails: true,
            ..Self::succeeding()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ActionInvoker for FakeInvoker {
    async fn invoke(
        &self,
        location: &str,
        direction: Direction,
        offset_hours: i32,
    ) -> Result<HandlerStatus> {
        self.calls.borrow_mut().push(HandlerCall {
            location: location.to_string(),
            direction,
            offset_hours,
        });
        if self.launch_fails {
            return Err(DstError::InvokerFailure("could not launch handler".into()));
        }
        Ok(HandlerStatus {
            code: self.exit_code,
        })
    }
}
