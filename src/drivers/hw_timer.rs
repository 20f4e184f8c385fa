//! System tick timer using ESP-IDF's esp_timer API.
//!
//! One periodic timer at [`BoardConfig::tick_period_us`] (1 ms) drives the
//! board clock and the dispense deadline.  The callback runs in the ESP
//! timer task context (not ISR), at higher priority than the console task.
//!
//! [`BoardConfig::tick_period_us`]: crate::config::BoardConfig::tick_period_us

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

/// Raw esp_timer callback signature.
pub type TickCallback = unsafe extern "C" fn(*mut core::ffi::c_void);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwTimerError {
    CreateFailed(i32),
    StartFailed(i32),
}

impl core::fmt::Display for HwTimerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CreateFailed(rc) => write!(f, "tick timer create failed (rc={})", rc),
            Self::StartFailed(rc) => write!(f, "tick timer start failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwTimerError {}

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: TICK_TIMER is written once in `start_tick_timer()` before the
/// callback can fire.  Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn tick_timer() -> esp_timer_handle_t { unsafe { TICK_TIMER } }

/// Start the periodic tick timer.
#[cfg(target_os = "espidf")]
pub fn start_tick_timer(period_us: u64, callback: TickCallback) -> Result<(), HwTimerError> {
    // SAFETY: TICK_TIMER is written here once at boot from the main task
    // before the timer is started.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(callback),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"tick\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK as i32 {
            return Err(HwTimerError::CreateFailed(ret));
        }
        let ret = esp_timer_start_periodic(tick_timer(), period_us);
        if ret != ESP_OK as i32 {
            return Err(HwTimerError::StartFailed(ret));
        }
    }
    info!("hw_timer: tick@{}us started", period_us);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_tick_timer(_period_us: u64, _callback: TickCallback) -> Result<(), HwTimerError> {
    log::info!("hw_timer(sim): tick timer not started (tests drive on_tick directly)");
    Ok(())
}
