mod event_flow;
pub mod harness;
