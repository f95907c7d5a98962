//! # LUMEN Scheduling
//!
//! - **Scheduler**: fixed-rate tick loop over registered nodes
//! - **RateTimer**: the sleep schedule shared by the scheduler and the input poller
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lumen_core::Scheduler;
//!
//! let mut scheduler = Scheduler::new().name("Sim").with_rate(100.0).handle_ctrl_c();
//! scheduler.add(Box::new(sim_node), 0);
//! scheduler.run_for(Duration::from_secs(10))?;
//! ```

pub mod rate;
pub mod scheduler;

pub use rate::RateTimer;
pub use scheduler::{Scheduler, StopHandle};
