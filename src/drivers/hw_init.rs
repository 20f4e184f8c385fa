//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions and the sense-line interrupts using raw
//! ESP-IDF sys calls.  Called once from `main()` before the board starts
//! ticking.  On the host every function is a no-op so the rest of the
//! driver layer compiles and tests unchanged.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick timer starts;
    // single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_gpio_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    // Pumps boot LOW (off), LEDs boot HIGH (active-low, off).
    let pump_mask = pins::PUMP_GPIOS
        .iter()
        .fold(0u64, |mask, &pin| mask | (1u64 << pin));
    let led_mask = (1u64 << pins::HEARTBEAT_LED_GPIO) | (1u64 << pins::DISPENSE_LED_GPIO);

    for (mask, idle_level) in [(pump_mask, 0), (led_mask, 1)] {
        let cfg = gpio_config_t {
            pin_bit_mask: mask,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        for pin in 0..64 {
            if mask & (1u64 << pin) != 0 {
                unsafe { gpio_set_level(pin, idle_level) };
            }
        }
    }

    info!("hw_init: GPIO outputs configured (20 pumps, 2 LEDs)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // a single register write, safe from task and ISR context.
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

/// Drive every pump output low without going through the board state.
/// Used by the sense-line ISR so the hardware is off before the fault is
/// dispatched on the next tick.
pub fn kill_all_pumps() {
    for &pin in &pins::PUMP_GPIOS {
        gpio_write(pin, false);
    }
}

/// A raw GPIO configured as output by [`init_peripherals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOutput {
    pin: i32,
}

impl RawOutput {
    pub const fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for RawOutput {
    type Error = Infallible;
}

impl OutputPin for RawOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, true);
        Ok(())
    }
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // External pull-ups exist on the sense lines; the internal ones are a
    // backup for boards assembled without them.
    for &pin in &pins::SENSE_BANK_GPIOS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: sense inputs configured");
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::sense::FAULT_LINES;
#[cfg(target_os = "espidf")]
use crate::safety::FaultBank;

/// Falling edge on a sense line.  `arg` carries the bank index.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn sense_gpio_isr(arg: *mut core::ffi::c_void) {
    kill_all_pumps();
    if let Some(bank) = FaultBank::from_index(arg as usize) {
        FAULT_LINES.raise(bank);
    }
}

/// Install the per-pin GPIO ISR service and attach the sense-line
/// handlers.  Call after [`init_peripherals`].
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handler only writes
    // output registers and an atomic latch.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for (index, &pin) in pins::SENSE_BANK_GPIOS.iter().enumerate() {
            let ret = gpio_isr_handler_add(pin, Some(sense_gpio_isr), index as *mut core::ffi::c_void);
            if ret != ESP_OK as i32 { return Err(HwInitError::IsrHandlerFailed(ret)); }
            gpio_intr_enable(pin);

            // A line already low at boot means a driver is in fault.
            if gpio_get_level(pin) == 0 {
                if let Some(bank) = FaultBank::from_index(index) {
                    FAULT_LINES.raise(bank);
                }
            }
        }

        info!("hw_init: ISR service installed (sense banks x{})", pins::SENSE_BANK_GPIOS.len());
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
