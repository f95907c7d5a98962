//! # LUMEN Core
//!
//! The core runtime for the LUMEN vehicle simulator.
//!
//! - **Nodes**: units of work ticked by the scheduler
//! - **Scheduling**: fixed-rate tick loop with overrun handling and Ctrl+C shutdown
//! - **Errors**: the shared [`LumenError`] taxonomy
//!
//! ## Quick Start
//!
//! ```rust
//! use lumen_core::{LumenResult, Node, NodeInfo, Scheduler};
//!
//! struct Counter(u64);
//!
//! impl Node for Counter {
//!     fn name(&self) -> &str { "counter" }
//!
//!     fn tick(&mut self, _ctx: &mut NodeInfo) -> LumenResult<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut scheduler = Scheduler::new().name("Example");
//! scheduler.add(Box::new(Counter(0)), 0);
//! scheduler.step().unwrap();
//! ```

pub mod core;
pub mod error;
pub mod scheduling;

pub use core::{Node, NodeInfo, NodeMetrics, NodeState};
pub use error::{LumenError, LumenResult};
pub use scheduling::{RateTimer, Scheduler, StopHandle};
