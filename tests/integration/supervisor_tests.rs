//! Task supervisor: spawn bookkeeping, exit reporting and watchdog feeding.

use bioreactor::app::events::AppEvent;
use bioreactor::app::ports::Clock;
use bioreactor::supervisor::{MAX_TASKS, TaskSupervisor};
use futures_lite::future::{or, pending, yield_now};

use crate::mock_hw::{CountingWatchdog, RecordingSink, VirtualTimebase};

#[test]
fn finished_task_is_reaped_once() {
    let supervisor = TaskSupervisor::new();
    supervisor.spawn("short", async {}).unwrap();
    supervisor.spawn("long", pending::<()>()).unwrap();
    assert_eq!(supervisor.running(), 2);

    supervisor.try_tick();
    supervisor.try_tick();

    assert_eq!(supervisor.reap().as_slice(), &["short"]);
    assert!(supervisor.reap().is_empty());
    assert_eq!(supervisor.running(), 1);
}

#[test]
fn task_table_has_a_hard_limit() {
    let supervisor = TaskSupervisor::new();
    for _ in 0..MAX_TASKS {
        supervisor.spawn("idle", pending::<()>()).unwrap();
    }
    assert!(supervisor.spawn("extra", pending::<()>()).is_err());
    assert_eq!(supervisor.running(), MAX_TASKS);
}

#[test]
fn supervise_feeds_watchdog_and_reports_exit() {
    let supervisor = TaskSupervisor::new();
    supervisor.spawn("short", async {}).unwrap();
    supervisor.spawn("long", pending::<()>()).unwrap();

    let mut watchdog = CountingWatchdog::default();
    let feeds = watchdog.clone();
    let mut sink = RecordingSink::default();
    let events = sink.clone();
    let time = VirtualTimebase::new();

    let stop = async {
        for _ in 0..20 {
            yield_now().await;
        }
    };
    supervisor.run(or(
        supervisor.supervise(&mut watchdog, &time, 1_000, &mut sink),
        stop,
    ));

    assert!(feeds.feeds() >= 2);
    assert!(time.now_ms() >= 2_000);
    let exits: Vec<_> = events
        .events()
        .into_iter()
        .filter(|e| matches!(e, AppEvent::TaskExited { .. }))
        .collect();
    assert_eq!(exits, vec![AppEvent::TaskExited { name: "short" }]);
}
