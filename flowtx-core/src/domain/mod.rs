pub mod command;
pub mod dispatch;
pub mod event;
pub mod lease;
pub mod transaction;

pub use command::{Command, CommandCallback};
pub use dispatch::{ensure_valid_transition, is_valid_transition, DispatchReceipt, DispatchStage};
pub use event::ChainEvent;
pub use lease::{decode_lease_tag, encode_lease_tag, HolderBinding, KeyPool, LeaseRecord, LeaseState};
pub use transaction::{import_map, ImportMap, ResolvedTemplate, TemplateRegistry, TransactionKind};
