//! Stream and connection receive-side flow control.

mod controller;
mod queue;

pub use controller::{ConnFlowController, StreamFlowController, WindowUpdate};
pub use queue::{DeliverFrame, WindowUpdateQueue};
