//! Component tasks: job lifecycle, update lifecycle, presence tracking.
//!
//! Each component owns its state inside a single task and exposes a cloneable
//! handle plus a watch snapshot. External calls are spawned; their completions
//! are posted back onto the owning queue, so no handler ever mutates state
//! across an await point.

mod job;
mod presence;
mod updater;

pub use job::JobHandle;
pub use presence::spawn_presence_reporter;
pub use updater::UpdaterHandle;
