//! GPIO / peripheral pin assignments for the bioreactor controller board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relays (active HIGH relay module)
// ---------------------------------------------------------------------------

/// Compressor A is wired to two relay channels switched together.
pub const AERATOR_A_GPIOS: [i32; 2] = [2, 13];
/// Compressor B is wired to two relay channels switched together.
pub const AERATOR_B_GPIOS: [i32; 2] = [4, 27];
/// Dosing pump relay.
pub const PUMP_RELAY_GPIO: i32 = 14;
/// The relay module energises its coil on a HIGH input.
pub const RELAYS_ACTIVE_HIGH: bool = true;

// ---------------------------------------------------------------------------
// Operator inputs
// ---------------------------------------------------------------------------

/// Momentary push-button (active LOW with pull-up).  Toggles the pump.
pub const BUTTON_GPIO: i32 = 19;
/// Mode selector switch 1 (pull-down; HIGH = closed).
pub const MODE_SW1_GPIO: i32 = 25;
/// Mode selector switch 2 (pull-down; HIGH = closed).
pub const MODE_SW2_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Analog front end (ADC1, 12 dB attenuation, 12-bit)
// ---------------------------------------------------------------------------

/// pH probe, GPIO 32.
pub const PH_ADC_CHANNEL: u32 = 4;
/// Dissolved-oxygen probe, GPIO 33.
pub const O2_ADC_CHANNEL: u32 = 5;
/// Ammonia sensor, GPIO 34.
pub const NH3_ADC_CHANNEL: u32 = 6;
/// Hydrogen-sulfide sensor, GPIO 35.
pub const H2S_ADC_CHANNEL: u32 = 7;

// ---------------------------------------------------------------------------
// RS-485 transducer bus (UART2 + MAX485 DE/RE)
// ---------------------------------------------------------------------------

pub const RS485_UART_PORT: i32 = 2;
pub const RS485_TX_GPIO: i32 = 17;
pub const RS485_RX_GPIO: i32 = 16;
/// Tied DE and /RE: HIGH = transmit, LOW = receive.
pub const RS485_DE_RE_GPIO: i32 = 5;

/// Every GPIO that `hw_init` configures as a push-pull output.
pub const OUTPUT_GPIOS: [i32; 6] = [
    AERATOR_A_GPIOS[0],
    AERATOR_A_GPIOS[1],
    AERATOR_B_GPIOS[0],
    AERATOR_B_GPIOS[1],
    PUMP_RELAY_GPIO,
    RS485_DE_RE_GPIO,
];

/// Every ADC1 channel the analog reader samples.
pub const ADC_CHANNELS: [u32; 4] = [
    PH_ADC_CHANNEL,
    O2_ADC_CHANNEL,
    NH3_ADC_CHANNEL,
    H2S_ADC_CHANNEL,
];
