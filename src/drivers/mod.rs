//! Output drivers, sense lines, hardware initialisation and the tick timer.

pub mod hw_init;
pub mod hw_timer;
pub mod pump;
pub mod sense;
pub mod status_led;
