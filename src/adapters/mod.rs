//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements           | Connects to                  |
//! |------------|----------------------|------------------------------|
//! | `display`  | DisplayPort          | LCD probe / null stub        |
//! | `hardware` | OutputPin, InputPin  | ESP32 GPIO                   |
//! |            | AdcPort              | ESP32 ADC1 oneshot           |
//! |            | SerialBus            | UART2 + MAX485 DE/RE         |
//! | `log_sink` | EventSink            | Serial log output            |
//! | `time`     | Clock, Timebase      | ESP32 system timer           |

pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod time;
