use crate::foundation::{KeyIndex, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-stage ownership of a proposer key.
///
/// `Provisional` covers the window between reservation and knowing the transaction id;
/// such a lease is recoverable only by expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseState {
    Provisional,
    Confirmed,
}

impl fmt::Display for LeaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisional => write!(f, "provisional"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub key_index: KeyIndex,
    pub state: LeaseState,
    pub holder: Option<TransactionId>,
    pub expires_at_nanos: u64,
}

impl LeaseRecord {
    pub fn provisional(key_index: KeyIndex, expires_at_nanos: u64) -> Self {
        Self { key_index, state: LeaseState::Provisional, holder: None, expires_at_nanos }
    }

    pub fn confirm(&mut self, holder: TransactionId) {
        self.state = LeaseState::Confirmed;
        self.holder = Some(holder);
    }

    pub fn is_expired(&self, now_nanos: u64) -> bool {
        now_nanos >= self.expires_at_nanos
    }

    pub fn is_held_by(&self, holder: &TransactionId) -> bool {
        self.state == LeaseState::Confirmed && self.holder.as_ref() == Some(holder)
    }
}

/// Mapping from a holder token back to the key it secures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderBinding {
    pub holder: TransactionId,
    pub key_index: KeyIndex,
    pub expires_at_nanos: u64,
}

const CONFIRMED_TAG_PREFIX: &str = "confirmed:";
const PROVISIONAL_TAG: &str = "provisional";

pub fn encode_lease_tag(state: LeaseState, holder: Option<&TransactionId>) -> String {
    match (state, holder) {
        (LeaseState::Confirmed, Some(holder)) => format!("{CONFIRMED_TAG_PREFIX}{holder}"),
        _ => PROVISIONAL_TAG.to_string(),
    }
}

/// Parses a stored tag. Unknown values (e.g. a bare index written by older deployments) read as provisional.
pub fn decode_lease_tag(tag: &str) -> (LeaseState, Option<TransactionId>) {
    match tag.strip_prefix(CONFIRMED_TAG_PREFIX) {
        Some(holder) if !holder.is_empty() => (LeaseState::Confirmed, Some(TransactionId::from(holder))),
        _ => (LeaseState::Provisional, None),
    }
}

/// Fixed-size pool of proposer keys `1..=size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPool {
    size: u32,
}

impl KeyPool {
    pub const fn new(size: u32) -> Self {
        Self { size }
    }

    pub const fn size(&self) -> u32 {
        self.size
    }

    pub fn indices(&self) -> impl Iterator<Item = KeyIndex> {
        (1..=self.size).map(KeyIndex::new)
    }
}
