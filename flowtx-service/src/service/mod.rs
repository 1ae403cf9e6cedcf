pub mod commands;
pub mod events;
pub mod flow;
pub mod intake;
pub mod metrics;
