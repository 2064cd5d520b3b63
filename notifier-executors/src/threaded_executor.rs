//!
//! The Threaded Executor gives every manager its own named OS thread.
//!
//! This mirrors the firmware model where each manager is a task with its
//! own stack and priority.  Each thread runs the manager's update loop at
//! the manager's update period and sleeps in between, so a manager that
//! blocks on a receive only holds up itself.
//!
//! OS thread priorities are not portable, so a manager's [`Priority`] only
//! decides the order managers are started in and is recorded on the
//! manager thread's tracing span.
//!
//! [`Priority`]: notifier_core::Priority
//!

use std::thread::{self, JoinHandle};
use std::time::Duration;

use quanta::{Clock, Instant};

use crossbeam::channel::{unbounded, Receiver, Sender};

use tracing::{debug, error, info, info_span};

use notifier_core::{Executor, ExecutorState, Manager};

/// The longest a manager thread sleeps before checking for a stop signal
const MAX_IDLE: Duration = Duration::from_millis(1);

/// Threaded Executor
///
/// The Threaded Executor moves every manager onto its own thread for the
/// duration of `update_for_ms` or `update_loop` and collects them back once
/// every thread has stopped.
pub struct ThreadedExecutor {
    /// The managers, most urgent first, while they are not running
    managers: Vec<Box<dyn Manager>>,
    /// The quanta high-precision clock
    clock: Clock,
    /// The Instant the executor was started
    start_instant: Instant,
    /// The current state of the executor
    state: ExecutorState,
    /// The interrupt receiver channel
    interrupt: Receiver<bool>,
    /// The interrupt senders used to propagate the interrupt to manager threads
    interrupt_propagators: Vec<Sender<bool>>,
    /// Whether or not the executor has been interrupted
    interrupted: bool,
}

impl ThreadedExecutor {
    /// Create a new Threaded Executor without any Managers
    pub fn new(interrupt: Receiver<bool>) -> Self {
        Self::new_with(interrupt, Vec::new())
    }

    /// Creates a new Threaded Executor with a number of Managers
    pub fn new_with(interrupt: Receiver<bool>, managers: Vec<Box<dyn Manager>>) -> Self {
        let clock = Clock::new();
        let now = clock.now();

        let mut executor = Self {
            managers,
            clock,
            start_instant: now,
            state: ExecutorState::Stopped,
            interrupt,
            interrupt_propagators: Vec::new(),
            interrupted: false,
        };
        executor.sort_by_priority();
        executor
    }

    /// The number of managers in the executor
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Whether the executor has no managers
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    fn sort_by_priority(&mut self) {
        self.managers
            .sort_by_key(|manager| std::cmp::Reverse(manager.priority()));
    }

    /// Move every manager onto its own thread
    fn spawn_managers(&mut self) -> Vec<JoinHandle<Box<dyn Manager>>> {
        let mut handles = Vec::new();
        for manager in self.managers.drain(..) {
            let (tx, rx) = unbounded();
            self.interrupt_propagators.push(tx);

            let name = manager.name().to_string();
            let builder = thread::Builder::new()
                .name(name.clone())
                .stack_size(manager.stack_size());
            let clock = self.clock.clone();

            match builder.spawn(move || run_manager(manager, rx, clock)) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    error!(manager = %name, error = %err, "Unable to spawn manager thread");
                    panic!("unable to spawn thread for manager {}: {}", name, err);
                }
            }
        }
        handles
    }

    /// Tell every manager thread to stop and collect the managers back
    fn join_managers(&mut self, handles: Vec<JoinHandle<Box<dyn Manager>>>) {
        for tx in self.interrupt_propagators.drain(..) {
            // A thread that already exited has dropped its receiver
            let _ = tx.send(true);
        }

        for handle in handles {
            let name = handle.thread().name().unwrap_or("manager").to_string();
            match handle.join() {
                Ok(manager) => self.managers.push(manager),
                Err(_) => error!(manager = %name, "Manager thread panicked"),
            }
        }

        self.sort_by_priority();
        self.state = ExecutorState::Stopped;
        info!(interrupted = self.interrupted, "Threaded executor stopped");
    }

    fn elapsed_ms(&self) -> u128 {
        self.clock
            .now()
            .duration_since(self.start_instant)
            .as_millis()
    }
}

/// The body of a manager thread.
///
/// The manager is updated every `get_update_delay_us` microseconds until a
/// stop signal arrives, then shut down and handed back.
fn run_manager(
    mut manager: Box<dyn Manager>,
    stop: Receiver<bool>,
    clock: Clock,
) -> Box<dyn Manager> {
    let span = info_span!(
        "manager",
        name = manager.name(),
        priority = manager.priority().0
    );
    let _enter = span.enter();
    debug!("Manager thread running");

    let start = clock.now();
    let mut next_update: u128 = 0;
    loop {
        if let Ok(true) = stop.try_recv() {
            break;
        }

        let now = clock.now().duration_since(start).as_micros();
        if now >= next_update {
            manager.update();
            next_update += manager.get_update_delay_us();
        } else {
            let remaining = u64::try_from(next_update - now).unwrap_or(u64::MAX);
            thread::sleep(Duration::from_micros(remaining).min(MAX_IDLE));
        }
    }

    manager.shutdown();
    debug!("Manager thread stopped");
    manager
}

impl Executor for ThreadedExecutor {
    /// Start every manager in descending priority order on the calling
    /// thread
    fn start(&mut self) {
        for manager in self.managers.iter_mut() {
            debug!(
                manager = manager.name(),
                priority = %manager.priority(),
                "Starting manager"
            );
            manager.start();
        }

        self.interrupted = false;
        self.state = ExecutorState::Started;
        self.start_instant = self.clock.now();
        info!(managers = self.managers.len(), "Threaded executor started");
    }

    fn update_for_ms(&mut self, ms: u128) {
        self.start();
        let handles = self.spawn_managers();

        self.state = ExecutorState::Running;
        while self.elapsed_ms() < ms && !self.check_interrupt() {
            thread::sleep(MAX_IDLE);
        }

        self.join_managers(handles);
    }

    fn update_loop(&mut self) {
        self.start();
        let handles = self.spawn_managers();

        self.state = ExecutorState::Running;
        while !self.check_interrupt() {
            thread::sleep(MAX_IDLE);
        }

        self.join_managers(handles);
    }

    /// Check the interrupt receiver for an interrupt, forwarding it to every
    /// manager thread
    fn check_interrupt(&mut self) -> bool {
        if let Ok(interrupt) = self.interrupt.try_recv() {
            self.interrupted = interrupt;
            for tx in self.interrupt_propagators.iter() {
                let _ = tx.send(interrupt);
            }
        }

        self.interrupted
    }

    /// Add a manager to the Threaded Executor.
    ///
    /// Note: the manager gets its thread the next time the executor runs.
    fn add_manager(&mut self, manager: Box<dyn Manager>) {
        self.managers.push(manager);
        self.sort_by_priority();
    }

    fn state(&self) -> ExecutorState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use notifier_core::Priority;

    struct ThreadManager {
        name: &'static str,
        priority: Priority,
        update_delay: u128,
        updates: Arc<AtomicUsize>,
        started: Sender<&'static str>,
        thread_names: Sender<Option<String>>,
    }

    impl Manager for ThreadManager {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> Priority {
            self.priority
        }

        fn get_update_delay_us(&self) -> u128 {
            self.update_delay
        }

        fn start(&mut self) {
            self.started.send(self.name).unwrap();
        }

        fn update(&mut self) {
            if self.updates.fetch_add(1, Ordering::SeqCst) == 0 {
                let name = thread::current().name().map(str::to_string);
                self.thread_names.send(name).unwrap();
            }
        }
    }

    struct Harness {
        started: Receiver<&'static str>,
        thread_names: Receiver<Option<String>>,
        started_tx: Sender<&'static str>,
        thread_names_tx: Sender<Option<String>>,
    }

    impl Harness {
        fn new() -> Self {
            let (started_tx, started) = unbounded();
            let (thread_names_tx, thread_names) = unbounded();
            Self {
                started,
                thread_names,
                started_tx,
                thread_names_tx,
            }
        }

        fn manager(
            &self,
            name: &'static str,
            priority: Priority,
            update_delay: u128,
        ) -> (Box<dyn Manager>, Arc<AtomicUsize>) {
            let updates = Arc::new(AtomicUsize::new(0));
            (
                Box::new(ThreadManager {
                    name,
                    priority,
                    update_delay,
                    updates: updates.clone(),
                    started: self.started_tx.clone(),
                    thread_names: self.thread_names_tx.clone(),
                }),
                updates,
            )
        }
    }

    #[test]
    fn test_start_in_priority_order() {
        let (_, rx) = unbounded();
        let harness = Harness::new();
        let (idle, _) = harness.manager("idle", Priority::IDLE, 10_000);
        let (pump, _) = harness.manager("pump", Priority::DISPATCH, 10_000);
        let (keypad, _) = harness.manager("keypad", Priority::HIGH, 10_000);

        let mut executor = ThreadedExecutor::new_with(rx, vec![idle, pump, keypad]);
        let original_start_instant = executor.start_instant;
        executor.start();

        let started: Vec<_> = harness.started.try_iter().collect();
        assert_eq!(started, vec!["pump", "keypad", "idle"]);
        assert_eq!(executor.state(), ExecutorState::Started);
        assert!(executor.start_instant > original_start_instant);
    }

    #[test]
    fn test_update_for_ms_runs_each_manager_on_its_own_thread() {
        let (_, rx) = unbounded();
        let harness = Harness::new();
        let (fast, fast_updates) = harness.manager("fast", Priority::NORMAL, 10_000);
        let (slow, slow_updates) = harness.manager("slow", Priority::LOW, 25_000);

        let mut executor = ThreadedExecutor::new_with(rx, vec![fast, slow]);
        executor.update_for_ms(100);

        let fast_updates = fast_updates.load(Ordering::SeqCst);
        let slow_updates = slow_updates.load(Ordering::SeqCst);
        assert!((8..=12).contains(&fast_updates), "fast updated {fast_updates} times");
        assert!((3..=6).contains(&slow_updates), "slow updated {slow_updates} times");

        let mut names: Vec<_> = harness.thread_names.try_iter().flatten().collect();
        names.sort();
        assert_eq!(names, vec!["fast".to_string(), "slow".to_string()]);

        assert_eq!(executor.len(), 2);
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }

    #[test]
    fn test_blocking_manager_does_not_stall_others() {
        struct Sleeper;

        impl Manager for Sleeper {
            fn name(&self) -> &str {
                "sleeper"
            }

            fn get_update_delay_us(&self) -> u128 {
                0
            }

            fn update(&mut self) {
                thread::sleep(Duration::from_millis(40));
            }
        }

        let (_, rx) = unbounded();
        let harness = Harness::new();
        let (fast, fast_updates) = harness.manager("fast", Priority::NORMAL, 5_000);

        let mut executor = ThreadedExecutor::new_with(rx, vec![Box::new(Sleeper), fast]);
        executor.update_for_ms(100);

        assert!(fast_updates.load(Ordering::SeqCst) >= 10);
    }

    #[test]
    fn test_update_loop_stops_on_interrupt() {
        let (tx, rx) = unbounded();
        let harness = Harness::new();
        let (fast, fast_updates) = harness.manager("fast", Priority::NORMAL, 10_000);

        let mut executor = ThreadedExecutor::new_with(rx, vec![fast]);
        let handle = thread::spawn(move || {
            executor.update_loop();
            executor
        });

        thread::sleep(Duration::from_millis(50));
        tx.send(true).unwrap();

        let executor = handle.join().unwrap();
        assert!(fast_updates.load(Ordering::SeqCst) >= 2);
        assert!(executor.interrupted);
        assert_eq!(executor.state(), ExecutorState::Stopped);
        assert_eq!(executor.len(), 1);
    }

    #[test]
    fn test_add_manager_keeps_priority_order() {
        let (_, rx) = unbounded();
        let harness = Harness::new();
        let mut executor = ThreadedExecutor::new(rx);
        assert!(executor.is_empty());

        let (low, _) = harness.manager("low", Priority::LOW, 1_000);
        let (high, _) = harness.manager("high", Priority::HIGH, 1_000);
        executor.add_manager(low);
        executor.add_manager(high);

        executor.start();
        let started: Vec<_> = harness.started.try_iter().collect();
        assert_eq!(started, vec!["high", "low"]);
    }
}
