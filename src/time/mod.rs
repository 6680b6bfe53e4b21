//! Time and scheduling for the animation domain
//!
//! The animation domain never sleeps inside its own logic. Every delay is an
//! event handed to a `Scheduler`, which fires it once its clock reaches the
//! due time. Production code uses `SystemClock`; tests use `ManualClock` and
//! advance virtual time deterministically.

pub mod clock;
pub mod events;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventQueue, Scheduled, Scheduler, TimerToken};
