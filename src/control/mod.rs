// Control loop - Host clock and cooperative timers driving the transport

pub mod clock;
pub mod timers;

pub use clock::{HostClock, ManualClock, SystemClock};
pub use timers::{CancelHandle, TimerId, TimerQueue, TimerTask};
