//! Rotation of the current slot
//!
//! [`Rotation`] owns the current index; [`Scheduler`] advances it on a fixed
//! period and dispatches regeneration of the half about to go stale.

pub mod scheduler;
pub mod state;

pub use scheduler::{Regenerate, Scheduler, SchedulerHandle};
pub use state::{Rotation, RotationHandle};
