use crate::domain::{DispatchReceipt, DispatchStage};
use crate::foundation::{CommandId, ErrorCode};

pub trait DispatchObserver: Send + Sync {
    fn on_stage_changed(&self, _command_id: &CommandId, _from: DispatchStage, _to: DispatchStage) {}
    fn on_confirmed(&self, _receipt: &DispatchReceipt) {}
    fn on_failed(&self, _command_id: &CommandId, _stage: DispatchStage, _code: ErrorCode) {}
}

pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::{ObservedDispatch, RecordingObserver};

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use super::DispatchObserver;
    use crate::domain::{DispatchReceipt, DispatchStage};
    use crate::foundation::{CommandId, ErrorCode};
    use parking_lot::Mutex;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum ObservedDispatch {
        Stage { command_id: CommandId, from: DispatchStage, to: DispatchStage },
        Confirmed(DispatchReceipt),
        Failed { command_id: CommandId, stage: DispatchStage, code: ErrorCode },
    }

    #[derive(Default)]
    pub struct RecordingObserver {
        events: Mutex<Vec<ObservedDispatch>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<ObservedDispatch> {
            self.events.lock().clone()
        }

        /// Stages `command_id` passed through, starting with `Start`.
        pub fn stages_for(&self, command_id: &CommandId) -> Vec<DispatchStage> {
            let events = self.events.lock();
            let mut stages = vec![DispatchStage::Start];
            stages.extend(events.iter().filter_map(|event| match event {
                ObservedDispatch::Stage { command_id: id, to, .. } if id == command_id => Some(*to),
                _ => None,
            }));
            stages
        }

        pub fn reached(&self, stage: DispatchStage) -> usize {
            self.events.lock().iter().filter(|event| matches!(event, ObservedDispatch::Stage { to, .. } if *to == stage)).count()
        }
    }

    impl DispatchObserver for RecordingObserver {
        fn on_stage_changed(&self, command_id: &CommandId, from: DispatchStage, to: DispatchStage) {
            self.events.lock().push(ObservedDispatch::Stage { command_id: command_id.clone(), from, to });
        }

        fn on_confirmed(&self, receipt: &DispatchReceipt) {
            self.events.lock().push(ObservedDispatch::Confirmed(receipt.clone()));
        }

        fn on_failed(&self, command_id: &CommandId, stage: DispatchStage, code: ErrorCode) {
            self.events.lock().push(ObservedDispatch::Failed { command_id: command_id.clone(), stage, code });
        }
    }
}
