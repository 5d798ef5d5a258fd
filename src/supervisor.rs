//! Task supervisor.
//!
//! Owns the cooperative executor and a handle to every core task, so a
//! task that returns (or panics inside the executor) is noticed and
//! reported instead of silently vanishing.
//!
//! ```text
//!  futures_lite::block_on
//!   └─ LocalExecutor::run(supervise)
//!        ├─ aeration ─┐
//!        ├─ dosing    ├─ spawned, handles kept in `tasks`
//!        ├─ sensors   │
//!        ├─ commands  │
//!        └─ button ───┘
//!  supervise: feed watchdog, reap finished tasks, sleep, repeat
//! ```

use core::cell::RefCell;
use core::future::Future;

use edge_executor::{LocalExecutor, Task};
use heapless::Vec;
use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, Timebase, WatchdogPort};
use crate::error::Error;

/// Upper bound on supervised tasks.
pub const MAX_TASKS: usize = 8;

struct SupervisedTask {
    name: &'static str,
    task: Task<()>,
    reported: bool,
}

pub struct TaskSupervisor<'a> {
    // Handles drop (cancel) before the executor.
    tasks: RefCell<Vec<SupervisedTask, MAX_TASKS>>,
    executor: LocalExecutor<'a, 16>,
}

impl Default for TaskSupervisor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TaskSupervisor<'a> {
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(Vec::new()),
            executor: LocalExecutor::new(),
        }
    }

    /// Spawn `fut` under `name` and keep its handle.
    pub fn spawn(&self, name: &'static str, fut: impl Future<Output = ()> + 'a) -> Result<(), Error> {
        let mut tasks = self.tasks.borrow_mut();
        if tasks.is_full() {
            error!("Supervisor: no slot for task '{}'", name);
            return Err(Error::Init("supervisor task table full"));
        }
        let task = self.executor.spawn(fut);
        let _ = tasks.push(SupervisedTask {
            name,
            task,
            reported: false,
        });
        info!("Supervisor: spawned '{}'", name);
        Ok(())
    }

    /// Names of tasks that finished since the last call.
    pub fn reap(&self) -> Vec<&'static str, MAX_TASKS> {
        let mut out = Vec::new();
        for t in self.tasks.borrow_mut().iter_mut() {
            if !t.reported && t.task.is_finished() {
                t.reported = true;
                let _ = out.push(t.name);
            }
        }
        out
    }

    /// Tasks that have not finished.
    pub fn running(&self) -> usize {
        self.tasks
            .borrow()
            .iter()
            .filter(|t| !t.task.is_finished())
            .count()
    }

    /// Run one ready task, if any.
    pub fn try_tick(&self) -> bool {
        self.executor.try_tick()
    }

    /// Top-level loop: feed the watchdog every `feed_ms` and report any
    /// task that has exited.  Never returns.
    pub async fn supervise<W, T, S>(&self, watchdog: &mut W, timebase: &T, feed_ms: u64, sink: &mut S)
    where
        W: WatchdogPort,
        T: Timebase,
        S: EventSink,
    {
        loop {
            watchdog.feed();
            for name in self.reap() {
                error!("Supervisor: task '{}' exited", name);
                sink.emit(&AppEvent::TaskExited { name });
            }
            timebase.sleep_ms(feed_ms).await;
        }
    }

    /// Drive the executor until `fut` completes.
    pub fn run<F: Future>(&self, fut: F) -> F::Output {
        futures_lite::future::block_on(self.executor.run(fut))
    }
}
