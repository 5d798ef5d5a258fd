//! Bioreactor Firmware: Main Entry Point
//!
//! Hexagonal architecture on a single cooperative executor.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioLine/GpioInput   EspAdc     Rs485Bus    SystemTimebase    │
//! │  (relays, button)     (AdcPort)  (SerialBus) (Clock+Timebase)  │
//! │  LogEventSink         NullDisplay            Watchdog          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  ActuatorController · SensorPoller · TransducerClient  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ControlScheduler (aeration · dosing · sensors)                │
//! │  TaskSupervisor (executor, watchdog feed, task reaping)        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use bioreactor::adapters::display::{display_loop, select_display};
use bioreactor::adapters::hardware::{EspAdc, GpioInput, GpioLine, Rs485Bus};
use bioreactor::adapters::log_sink::LogEventSink;
use bioreactor::adapters::time::SystemTimebase;
use bioreactor::app::commands::{command_loop, COMMAND_CHANNEL};
use bioreactor::app::controller::ActuatorController;
use bioreactor::app::events::AppEvent;
use bioreactor::app::ports::EventSink;
use bioreactor::config::SystemConfig;
use bioreactor::drivers::button::button_loop;
use bioreactor::drivers::hw_init;
use bioreactor::drivers::relay::{Polarity, Relay, RelayGroup};
use bioreactor::drivers::watchdog::Watchdog;
use bioreactor::mode::OperatingMode;
use bioreactor::pins;
use bioreactor::scheduler::{ControlScheduler, SchedulePlan};
use bioreactor::sensors::analog::{AdcScale, AnalogChannelReader};
use bioreactor::sensors::SensorPoller;
use bioreactor::snapshot;
use bioreactor::supervisor::TaskSupervisor;
use bioreactor::transducer::TransducerClient;

fn relay_group(gpios: [i32; 2], polarity: Polarity) -> bioreactor::error::Result<RelayGroup<GpioLine>> {
    RelayGroup::from_relays(gpios.map(|g| Relay::new(GpioLine::new(g), polarity)))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Bioreactor v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;

    // ── 2. Outputs safe, inputs readable ──────────────────────
    hw_init::init_outputs()?;
    hw_init::init_inputs()?;

    let mode = OperatingMode::from_switches(
        hw_init::gpio_read(pins::MODE_SW1_GPIO),
        hw_init::gpio_read(pins::MODE_SW2_GPIO),
    );
    let mut log_sink = LogEventSink::new();
    log_sink.emit(&AppEvent::ModeSelected(mode));

    let timebase = SystemTimebase::new();
    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let feed_ms = u64::from(config.watchdog_feed_secs) * 1000;
    let plan = SchedulePlan::for_mode(&config, mode);

    if mode == OperatingMode::Program {
        info!("PROGRAM mode: relays held off, no core tasks");
        let supervisor = TaskSupervisor::new();
        supervisor.run(supervisor.supervise(&mut watchdog, &timebase, feed_ms, &mut log_sink));
        return Ok(());
    }

    // ── 3. Actuators ──────────────────────────────────────────
    let polarity = if pins::RELAYS_ACTIVE_HIGH {
        Polarity::ActiveHigh
    } else {
        Polarity::ActiveLow
    };
    let controller = ActuatorController::new(
        relay_group(pins::AERATOR_A_GPIOS, polarity)?,
        relay_group(pins::AERATOR_B_GPIOS, polarity)?,
        Relay::new(GpioLine::new(pins::PUMP_RELAY_GPIO), polarity),
        timebase,
        LogEventSink::new(),
    );
    let actuators = std::rc::Rc::new(core::cell::RefCell::new(controller));

    // ── 4. Sensors ────────────────────────────────────────────
    let scale = AdcScale {
        reference_volts: config.adc_reference_volts,
        gain_correction: config.adc_gain_correction,
        ..AdcScale::default()
    };
    let analog = EspAdc::open().map(|adc| AnalogChannelReader::new(adc, scale));
    let transducer = config.rs485_enabled.then(|| {
        Rs485Bus::open(&config.transducer)
            .map(|bus| TransducerClient::new(bus, timebase, config.transducer))
    });
    let readings = snapshot::shared();
    let poller = SensorPoller::new(analog, transducer, readings.clone(), LogEventSink::new());

    // ── 5. Tasks ──────────────────────────────────────────────
    let scheduler = ControlScheduler::new(actuators.clone(), timebase, plan);
    let supervisor = TaskSupervisor::new();

    let core_tasks = scheduler.spawn_into(&supervisor, poller)?;
    supervisor.spawn("commands", command_loop(&COMMAND_CHANNEL, actuators.clone()))?;
    supervisor.spawn(
        "button",
        button_loop(GpioInput::new(pins::BUTTON_GPIO), &timebase, &COMMAND_CHANNEL),
    )?;
    // The LCD driver is linked in by the display collaborator; none here.
    supervisor.spawn(
        "display",
        display_loop(select_display(None), mode, actuators.clone(), readings, &timebase),
    )?;

    info!("Boot complete: {} mode, {} core tasks", mode, core_tasks);

    // ── 6. Supervise forever ──────────────────────────────────
    supervisor.run(supervisor.supervise(&mut watchdog, &timebase, feed_ms, &mut log_sink));
    Ok(())
}
