use crate::foundation::{CommandId, FlowTxError, KeyIndex, TransactionId};
use std::fmt;

/// Per-command dispatch progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DispatchStage {
    Start,
    KeyAcquired,
    Submitted,
    Confirmed,
    Failed,
    NoKeyAvailable,
}

impl DispatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::KeyAcquired => "key_acquired",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::NoKeyAvailable => "no_key_available",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::NoKeyAvailable)
    }
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Start -> Failed covers an unknown transaction kind; KeyAcquired -> Failed covers
// a submission that errors or times out before the gateway reports acceptance.
const VALID_TRANSITIONS: &[(DispatchStage, DispatchStage)] = &[
    (DispatchStage::Start, DispatchStage::KeyAcquired),
    (DispatchStage::Start, DispatchStage::NoKeyAvailable),
    (DispatchStage::Start, DispatchStage::Failed),
    (DispatchStage::KeyAcquired, DispatchStage::Submitted),
    (DispatchStage::KeyAcquired, DispatchStage::Failed),
    (DispatchStage::Submitted, DispatchStage::Confirmed),
];

pub fn is_valid_transition(from: DispatchStage, to: DispatchStage) -> bool {
    VALID_TRANSITIONS.contains(&(from, to))
}

pub fn ensure_valid_transition(from: DispatchStage, to: DispatchStage) -> Result<(), FlowTxError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(FlowTxError::InvalidStageTransition { from: from.to_string(), to: to.to_string() })
    }
}

/// Successful outcome of one dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub command_id: CommandId,
    pub transaction_id: TransactionId,
    pub key_index: KeyIndex,
}
