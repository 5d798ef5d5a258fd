//! One-shot peripheral initialization and thin register helpers.
//!
//! Configures relay/driver-enable outputs, operator inputs, the ADC1
//! oneshot unit and the RS-485 UART using raw ESP-IDF sys calls.  Called
//! once from `main()` before the executor starts.
//!
//! On the host every helper is backed by atomics so adapters and tests
//! can observe pin levels and inject ADC codes.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::error::Error;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::UartInitFailed(rc)   => write!(f, "UART init failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Error::Init("ADC1 oneshot unit"),
            HwInitError::GpioConfigFailed(_) => Error::Init("GPIO configuration"),
            HwInitError::UartInitFailed(_) => Error::Init("RS-485 UART"),
        }
    }
}

// ── GPIO outputs ──────────────────────────────────────────────

/// Configure every relay and the driver-enable line as outputs, driven LOW
/// (relays released, transceiver receiving).
#[cfg(target_os = "espidf")]
pub fn init_outputs() -> Result<(), HwInitError> {
    for &pin in &pins::OUTPUT_GPIOS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: single-threaded boot path; cfg outlives the call.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK { return Err(HwInitError::GpioConfigFailed(ret)); }
        // SAFETY: pin was configured as an output just above.
        unsafe { gpio_set_level(pin, 0) };
    }
    info!("hw_init: {} outputs configured LOW", pins::OUTPUT_GPIOS.len());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_outputs() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): outputs skipped");
    Ok(())
}

// ── GPIO inputs ───────────────────────────────────────────────

/// Button with pull-up, mode switches with pull-down.
#[cfg(target_os = "espidf")]
pub fn init_inputs() -> Result<(), HwInitError> {
    let inputs = [
        (pins::BUTTON_GPIO, true),
        (pins::MODE_SW1_GPIO, false),
        (pins::MODE_SW2_GPIO, false),
    ];
    for &(pin, pull_up) in &inputs {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: if pull_up {
                gpio_pullup_t_GPIO_PULLUP_ENABLE
            } else {
                gpio_pullup_t_GPIO_PULLUP_DISABLE
            },
            pull_down_en: if pull_up {
                gpio_pulldown_t_GPIO_PULLDOWN_DISABLE
            } else {
                gpio_pulldown_t_GPIO_PULLDOWN_ENABLE
            },
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: single-threaded boot path.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK { return Err(HwInitError::GpioConfigFailed(ret)); }
    }
    info!("hw_init: button and mode switches configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_inputs() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): inputs skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static ADC1_HANDLE: core::sync::atomic::AtomicPtr<adc_oneshot_unit_ctx_t> =
    core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());

/// Bring up ADC1 and configure every probe channel (12 dB, 12-bit).
#[cfg(target_os = "espidf")]
pub fn init_adc() -> Result<(), HwInitError> {
    use core::sync::atomic::Ordering;

    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    // SAFETY: boot path; `handle` is a valid out-pointer.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
    if ret != ESP_OK { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for &ch in &pins::ADC_CHANNELS {
        // SAFETY: handle was created above and is not shared yet.
        let ret = unsafe { adc_oneshot_config_channel(handle, ch, &chan_cfg) };
        if ret != ESP_OK { return Err(HwInitError::AdcInitFailed(ret)); }
    }
    ADC1_HANDLE.store(handle, Ordering::Release);

    info!("hw_init: ADC1 configured (CH{:?})", pins::ADC_CHANNELS);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC1 skipped");
    Ok(())
}

/// Raw 12-bit code, or the ESP-IDF error code.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    let handle = ADC1_HANDLE.load(core::sync::atomic::Ordering::Acquire);
    if handle.is_null() {
        return Err(ESP_ERR_INVALID_STATE);
    }
    let mut raw: i32 = 0;
    // SAFETY: handle is non-null and was fully configured by init_adc().
    // Only the core executor thread reads the ADC.
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK {
        return Err(ret);
    }
    Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    sim::adc_code(channel)
}

// ── GPIO access ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: register write on a pin configured by init_outputs().
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK { Err(ret) } else { Ok(()) }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    sim::set_level(pin, high)
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::level(pin)
}

// ── RS-485 UART ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const UART_RX_BUFFER: i32 = 256;

/// Install the UART driver on `port` (8N1, no flow control).
#[cfg(target_os = "espidf")]
pub fn init_uart(port: i32, baud_rate: u32, tx: i32, rx: i32) -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: baud_rate as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    // SAFETY: boot path, one call per port; pointers are to locals.
    unsafe {
        let ret = uart_driver_install(port, UART_RX_BUFFER, 0, 0, core::ptr::null_mut(), 0);
        if ret != ESP_OK { return Err(HwInitError::UartInitFailed(ret)); }
        let ret = uart_param_config(port, &cfg);
        if ret != ESP_OK { return Err(HwInitError::UartInitFailed(ret)); }
        let ret = uart_set_pin(port, tx, rx, UART_PIN_NO_CHANGE, UART_PIN_NO_CHANGE);
        if ret != ESP_OK { return Err(HwInitError::UartInitFailed(ret)); }
    }
    info!("hw_init: UART{} at {} baud (tx={}, rx={})", port, baud_rate, tx, rx);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_uart(port: i32, baud_rate: u32, _tx: i32, _rx: i32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): UART{} at {} baud", port, baud_rate);
    Ok(())
}

/// Queue `frame` and wait for the shift register to drain.
#[cfg(target_os = "espidf")]
pub fn uart_write(port: i32, frame: &[u8]) -> Result<(), i32> {
    // SAFETY: driver installed by init_uart(); the slice is valid for the call.
    let written = unsafe { uart_write_bytes(port, frame.as_ptr().cast(), frame.len()) };
    if written < 0 || written as usize != frame.len() {
        return Err(written);
    }
    // SAFETY: as above.
    let ret = unsafe { uart_wait_tx_done(port, 100) };
    if ret != ESP_OK { Err(ret) } else { Ok(()) }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_write(_port: i32, _frame: &[u8]) -> Result<(), i32> {
    Ok(())
}

/// Non-blocking read of whatever is buffered.
#[cfg(target_os = "espidf")]
pub fn uart_read(port: i32, buf: &mut [u8]) -> Result<usize, i32> {
    if buf.is_empty() {
        return Ok(0);
    }
    // SAFETY: driver installed; buf is valid for `len` bytes; zero ticks
    // means the call never blocks.
    let n = unsafe { uart_read_bytes(port, buf.as_mut_ptr().cast(), buf.len() as u32, 0) };
    if n < 0 { Err(n) } else { Ok(n as usize) }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_read(_port: i32, _buf: &mut [u8]) -> Result<usize, i32> {
    Ok(0)
}

#[cfg(target_os = "espidf")]
pub fn uart_flush_input(port: i32) -> Result<(), i32> {
    // SAFETY: driver installed by init_uart().
    let ret = unsafe { uart_flush_input(port) };
    if ret != ESP_OK { Err(ret) } else { Ok(()) }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_flush_input(_port: i32) -> Result<(), i32> {
    Ok(())
}

// ── Host simulation ───────────────────────────────────────────

/// Host-side stand-ins for pin levels and ADC codes.
#[cfg(not(target_os = "espidf"))]
pub mod sim {
    use core::sync::atomic::{AtomicU16, AtomicU64, Ordering};

    static LEVELS: AtomicU64 = AtomicU64::new(0);
    static ADC: [AtomicU16; 10] = [const { AtomicU16::new(0) }; 10];

    pub fn level(pin: i32) -> bool {
        (0..64).contains(&pin) && LEVELS.load(Ordering::Relaxed) & (1u64 << pin) != 0
    }

    pub fn set_level(pin: i32, high: bool) -> Result<(), i32> {
        if !(0..64).contains(&pin) {
            return Err(-1);
        }
        if high {
            LEVELS.fetch_or(1u64 << pin, Ordering::Relaxed);
        } else {
            LEVELS.fetch_and(!(1u64 << pin), Ordering::Relaxed);
        }
        Ok(())
    }

    pub fn set_adc(channel: u32, code: u16) {
        if let Some(slot) = ADC.get(channel as usize) {
            slot.store(code, Ordering::Relaxed);
        }
    }

    pub fn adc_code(channel: u32) -> Result<u16, i32> {
        ADC.get(channel as usize)
            .map(|slot| slot.load(Ordering::Relaxed))
            .ok_or(-1)
    }
}
