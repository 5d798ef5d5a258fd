//! Runtime symbols that third-party crates expect the firmware to provide.
//!
//! - embassy-time driver (pulled in under `async_io_mini::Timer`): `now`
//!   returns monotonic microseconds, `schedule_wake` parks a helper thread
//!   until the deadline and then wakes the timer's task.  On target the
//!   clock is esp_timer; on the host it is a process-start `Instant`.
//! - `critical-section` 1.x, target only: `COMMAND_CHANNEL` locks through
//!   `CriticalSectionRawMutex`, which resolves to the acquire/release pair
//!   below.  Nesting is tracked per thread; the outermost acquire holds a
//!   process-wide mutex.  Host builds take the pair from
//!   `critical-section/std`.

use core::task::Waker;
use core::time::Duration;

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

// ── critical-section ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
static CS_LOCK: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static CS_DEPTH: Cell<u8> = const { Cell::new(0) };
    static CS_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    CS_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            let guard = CS_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            CS_GUARD.with(|slot| *slot.borrow_mut() = Some(guard));
        }
        let next = d.saturating_add(1);
        depth.set(next);
        next
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    CS_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            CS_GUARD.with(|slot| *slot.borrow_mut() = None);
        }
    })
}

// ── embassy-time driver ───────────────────────────────────────

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_now() -> u64 {
    // SAFETY: reads the free-running esp_timer counter.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

#[cfg(not(target_os = "espidf"))]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_now() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_micros() as u64
}

#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_schedule_wake(at: u64, waker: *mut core::ffi::c_void) {
    if waker.is_null() {
        return;
    }
    // SAFETY: the driver hands us a live `&Waker` for the duration of the
    // call; it is cloned before returning.
    let waker = unsafe { (*(waker as *const Waker)).clone() };
    let spawned = std::thread::Builder::new()
        .name("time-wake".into())
        .spawn(move || {
            let now = _embassy_time_now();
            if at > now {
                std::thread::sleep(Duration::from_micros(at - now));
            }
            waker.wake();
        });
    if spawned.is_err() {
        log::warn!("Time: no thread for wake at {}us", at);
    }
}
