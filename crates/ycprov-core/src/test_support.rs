//! In-memory operation API double used by unit tests

use crate::error::TransportError;
use crate::fetcher::OperationApi;
use crate::operation::{Operation, OperationStatus};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Reply = std::result::Result<Operation, TransportError>;

/// Replays a per-operation script of replies; the last reply repeats forever.
#[derive(Default)]
pub struct ScriptedApi {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, operation_id: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(operation_id.to_string(), replies.into());
    }

    pub fn fetches(&self, operation_id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(operation_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl OperationApi for ScriptedApi {
    async fn get_operation(&self, operation_id: &str) -> Reply {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(operation_id.to_string())
            .or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(operation_id) else {
            return Err(TransportError::with_status("operation not found", 404));
        };
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply
            .map(|r| {
                r.map(|mut op| {
                    op.id = operation_id.to_string();
                    op
                })
            })
            .unwrap_or_else(|| Err(TransportError::new("empty script")))
    }
}

pub fn running() -> Operation {
    Operation::default()
}

pub fn succeeded(response: Value) -> Operation {
    Operation {
        done: true,
        response: Some(response),
        ..Operation::default()
    }
}

pub fn failed(code: i32, message: &str, done: bool) -> Operation {
    Operation {
        done,
        error: Some(OperationStatus {
            code,
            message: message.to_string(),
            details: vec![],
        }),
        ..Operation::default()
    }
}
