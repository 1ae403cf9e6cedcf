use super::traits::{TransactionRequest, TransactionSubmitter};
use crate::foundation::{FlowTxError, TransactionId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitBehavior {
    /// Accept with ids `tx1`, `tx2`, ... in submission order.
    Succeed,
    Fail(String),
    /// Never resolve; exercises the submit timeout.
    Hang,
}

#[derive(Default)]
struct MockSubmitterState {
    scripted: VecDeque<SubmitBehavior>,
    requests: Vec<TransactionRequest>,
    accepted: u64,
}

/// Scriptable submitter. Queued behaviors are used first, then the default.
pub struct MockSubmitter {
    default: SubmitBehavior,
    state: Mutex<MockSubmitterState>,
}

impl MockSubmitter {
    pub fn new(default: SubmitBehavior) -> Self {
        Self { default, state: Mutex::new(MockSubmitterState::default()) }
    }

    pub fn succeeding() -> Self {
        Self::new(SubmitBehavior::Succeed)
    }

    pub fn failing(details: impl Into<String>) -> Self {
        Self::new(SubmitBehavior::Fail(details.into()))
    }

    pub fn hanging() -> Self {
        Self::new(SubmitBehavior::Hang)
    }

    pub fn push_behavior(&self, behavior: SubmitBehavior) {
        self.state.lock().scripted.push_back(behavior);
    }

    pub fn requests(&self) -> Vec<TransactionRequest> {
        self.state.lock().requests.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().requests.len()
    }
}

#[async_trait]
impl TransactionSubmitter for MockSubmitter {
    async fn submit(&self, request: TransactionRequest) -> Result<TransactionId, FlowTxError> {
        let key_index = request.proposer.key_index.get();
        let outcome = {
            let mut state = self.state.lock();
            state.requests.push(request);
            let behavior = state.scripted.pop_front().unwrap_or_else(|| self.default.clone());
            match behavior {
                SubmitBehavior::Succeed => {
                    state.accepted += 1;
                    Some(Ok(TransactionId::new(format!("tx{}", state.accepted))))
                }
                SubmitBehavior::Fail(details) => Some(Err(FlowTxError::SubmissionFailed { key_index, details })),
                SubmitBehavior::Hang => None,
            }
        };
        match outcome {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}
