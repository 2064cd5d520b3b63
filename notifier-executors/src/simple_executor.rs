//!
//! The Simple Executor
//!
//! The simple executor is the most simple and easy to understand executor
//! for managers.  It is a singular thread that stores each manager in a
//! sorted vector and pops off the most urgent manager, executes its update
//! method and then inserts it back into the sorted vector with an updated
//! next update time.
//!
//! Managers that block in `update` (for example on a subscriber receive)
//! hold up every other manager in the executor, so the blocking timeouts of
//! managers sharing a simple executor should be short.
//!

use std::thread;

use crossbeam::channel::Receiver;

use quanta::{Clock, Instant};

use tracing::{debug, info};

use notifier_core::{Executor, ExecutorState, Manager};

use crate::{insert_into, ManagerWrapper};

/// Simple Executor
///
/// This simple executor stores Managers in a sorted vector where the
/// manager whose next update is closest to the current timestamp is run
/// first.  Managers due at the same instant run in priority order.
///
/// Note: The Simple Executor can be interrupted by sending a true value
/// over the channel whose receiving end is owned by the SimpleExecutor
pub struct SimpleExecutor {
    /// The sorted backing vector for the executor
    pub(crate) backing: Vec<ManagerWrapper>,
    /// The quanta high-precision clock backing the SimpleExecutor
    clock: Clock,
    /// The current state of the executor
    state: ExecutorState,
    /// The Instant the executor was started
    start_instant: Instant,
    /// The Interrupt receiver channel
    interrupt: Receiver<bool>,
    /// Whether or not the executor has been interrupted
    interrupted: bool,
}

impl SimpleExecutor {
    /// Create a new Simple Executor without any Managers
    pub fn new(interrupt: Receiver<bool>) -> Self {
        Self::new_with(interrupt, Vec::new())
    }

    /// Creates a new Simple Executor with a number of Managers
    pub fn new_with(interrupt: Receiver<bool>, mut managers: Vec<Box<dyn Manager>>) -> Self {
        let mut backing = Vec::new();
        for manager in managers.drain(..) {
            insert_into(&mut backing, ManagerWrapper::new(manager, 0));
        }

        let clock = Clock::new();
        let now = clock.now();

        Self {
            backing,
            clock,
            start_instant: now,
            state: ExecutorState::Stopped,
            interrupt,
            interrupted: false,
        }
    }

    /// The number of managers in the executor
    pub fn len(&self) -> usize {
        self.backing.len()
    }

    /// Whether the executor has no managers
    pub fn is_empty(&self) -> bool {
        self.backing.is_empty()
    }

    /// Microseconds since the executor was started
    fn elapsed_us(&self) -> u128 {
        self.clock
            .now()
            .duration_since(self.start_instant)
            .as_micros()
    }

    /// Update the most urgent manager if it is due, otherwise give up the
    /// rest of this time slice
    fn update_due(&mut self) {
        let now = self.elapsed_us();
        if !self
            .backing
            .last()
            .is_some_and(|wrapper| now >= wrapper.next_update)
        {
            thread::yield_now();
            return;
        }

        if let Some(mut wrapper) = self.backing.pop() {
            wrapper.manager.update();
            wrapper.next_update += wrapper.manager.get_update_delay_us();
            insert_into(&mut self.backing, wrapper);
        }
    }

    /// Shut every manager down and reset the schedule
    fn stop(&mut self) {
        for wrapper in self.backing.iter_mut() {
            wrapper.next_update = 0;
            wrapper.manager.shutdown();
        }
        self.backing.sort();
        self.state = ExecutorState::Stopped;
        info!(interrupted = self.interrupted, "Simple executor stopped");
    }
}

impl Executor for SimpleExecutor {
    /// Reset every manager's schedule and start the managers in descending
    /// priority order.  The start instant is also set to the current time.
    ///
    /// Note: this method is always called by `update_for_ms` and
    /// `update_loop` so calling it beforehand is redundant.
    fn start(&mut self) {
        for wrapper in self.backing.iter_mut() {
            wrapper.next_update = 0;
        }
        self.backing.sort();

        // The most urgent manager is at the back
        for wrapper in self.backing.iter_mut().rev() {
            debug!(
                manager = wrapper.manager.name(),
                priority = %wrapper.priority,
                "Starting manager"
            );
            wrapper.manager.start();
        }

        self.interrupted = false;
        self.state = ExecutorState::Started;
        self.start_instant = self.clock.now();
        info!(managers = self.backing.len(), "Simple executor started");
    }

    /// Start the executor and run the executor for a given number of
    /// milliseconds before stopping the executor.  An interrupt will also
    /// stop the executor early.
    fn update_for_ms(&mut self, ms: u128) {
        self.start();

        self.state = ExecutorState::Running;
        while self.elapsed_us() < ms * 1_000 && !self.check_interrupt() {
            self.update_due();
        }

        self.stop();
    }

    /// Start the executor and run until an interrupt is received.
    fn update_loop(&mut self) {
        self.start();

        self.state = ExecutorState::Running;
        while !self.check_interrupt() {
            self.update_due();
        }

        self.stop();
    }

    /// Check the interrupt receiver for an interrupt.  If an interrupt
    /// signal was sent over the channel then this executor should report
    /// that it was interrupted.
    fn check_interrupt(&mut self) -> bool {
        if let Ok(interrupt) = self.interrupt.try_recv() {
            self.interrupted = interrupt;
        }
        self.interrupted
    }

    /// Add a manager to the Simple Executor.
    ///
    /// Note: If managers are added while the executor is started they are
    /// due immediately.
    fn add_manager(&mut self, manager: Box<dyn Manager>) {
        let next_update = match self.state {
            ExecutorState::Stopped => 0,
            _ => self.elapsed_us(),
        };
        insert_into(&mut self.backing, ManagerWrapper::new(manager, next_update));
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
    use std::time::Duration;

    use crossbeam::channel::{unbounded, Sender};

    use notifier_core::Priority;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Event {
        Started,
        Updated,
        Stopped,
    }

    struct CountingManager {
        name: &'static str,
        priority: Priority,
        update_delay: u128,
        updates: Arc<AtomicUsize>,
        events: Sender<(&'static str, Event)>,
    }

    impl CountingManager {
        fn new(
            name: &'static str,
            priority: Priority,
            update_delay: u128,
            events: &Sender<(&'static str, Event)>,
        ) -> (Self, Arc<AtomicUsize>) {
            let updates = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    priority,
                    update_delay,
                    updates: updates.clone(),
                    events: events.clone(),
                },
                updates,
            )
        }
    }

    impl Manager for CountingManager {
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
            self.events.send((self.name, Event::Started)).unwrap();
        }

        fn update(&mut self) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.events.send((self.name, Event::Updated)).unwrap();
        }

        fn shutdown(&mut self) {
            self.events.send((self.name, Event::Stopped)).unwrap();
        }
    }

    #[test]
    /// Start should reset every schedule, start every manager in priority
    /// order, clear the interrupt and set the start instant
    fn test_simple_executor_start() {
        let (_, rx) = unbounded();
        let (events_tx, events) = unbounded();
        let (low, _) = CountingManager::new("low", Priority::LOW, 100_000, &events_tx);
        let (high, _) = CountingManager::new("high", Priority::HIGH, 250_000, &events_tx);

        let mut executor = SimpleExecutor::new_with(rx, vec![Box::new(low), Box::new(high)]);
        let original_start_instant = executor.start_instant;

        executor.start();

        let started: Vec<_> = events.try_iter().collect();
        assert_eq!(
            started,
            vec![("high", Event::Started), ("low", Event::Started)]
        );
        for wrapper in executor.backing.iter() {
            assert_eq!(wrapper.next_update, 0);
        }
        assert!(!executor.interrupted);
        assert_eq!(executor.state(), ExecutorState::Started);
        assert!(executor.start_instant > original_start_instant);
    }

    #[test]
    fn test_update_for_ms() {
        let (_, rx) = unbounded();
        let (events_tx, events) = unbounded();
        let (fast, fast_updates) =
            CountingManager::new("fast", Priority::NORMAL, 10_000, &events_tx);
        let (slow, slow_updates) =
            CountingManager::new("slow", Priority::NORMAL, 25_000, &events_tx);

        let mut executor = SimpleExecutor::new_with(rx, vec![Box::new(fast), Box::new(slow)]);

        let start = executor.clock.now();
        executor.update_for_ms(100);
        let end = executor.clock.now();

        // Updates at 0, 10, ..., 90 ms and at 0, 25, 50, 75 ms
        assert!((9..=11).contains(&fast_updates.load(Ordering::SeqCst)));
        assert!((3..=5).contains(&slow_updates.load(Ordering::SeqCst)));

        let stopped = events
            .try_iter()
            .filter(|(_, event)| *event == Event::Stopped)
            .count();
        assert_eq!(stopped, 2);
        for wrapper in executor.backing.iter() {
            assert_eq!(wrapper.next_update, 0);
        }

        assert_eq!(executor.state(), ExecutorState::Stopped);
        assert!(Duration::from_millis(95) < end - start);
        assert!(end - start < Duration::from_millis(150));
    }

    #[test]
    fn test_due_managers_update_in_priority_order() {
        let (_, rx) = unbounded();
        let (events_tx, events) = unbounded();
        let (low, _) = CountingManager::new("low", Priority::LOW, 1_000_000, &events_tx);
        let (pump, _) = CountingManager::new("pump", Priority::DISPATCH, 1_000_000, &events_tx);
        let (normal, _) = CountingManager::new("normal", Priority::NORMAL, 1_000_000, &events_tx);

        let mut executor =
            SimpleExecutor::new_with(rx, vec![Box::new(low), Box::new(pump), Box::new(normal)]);
        executor.update_for_ms(20);

        let updated: Vec<_> = events
            .try_iter()
            .filter(|(_, event)| *event == Event::Updated)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(updated, vec!["pump", "normal", "low"]);
    }

    #[test]
    fn test_check_interrupt() {
        let (tx, rx) = unbounded();
        let (events_tx, _events) = unbounded();
        let (manager, _) = CountingManager::new("manager", Priority::NORMAL, 10_000, &events_tx);

        let mut executor = SimpleExecutor::new_with(rx, vec![Box::new(manager)]);
        assert!(!executor.check_interrupt());

        tx.send(true).unwrap();
        assert!(executor.check_interrupt());
    }

    #[test]
    fn test_add_manager_stopped() {
        let (_, rx) = unbounded();
        let (events_tx, _events) = unbounded();
        let mut executor = SimpleExecutor::new(rx);
        assert!(executor.is_empty());

        for _ in 0..3 {
            let (manager, _) = CountingManager::new("manager", Priority::NORMAL, 1_000, &events_tx);
            executor.add_manager(Box::new(manager));
        }

        assert_eq!(executor.len(), 3);
    }

    #[test]
    fn test_update_loop() {
        let (tx, rx) = unbounded();
        let (events_tx, _events) = unbounded();
        let (fast, fast_updates) =
            CountingManager::new("fast", Priority::NORMAL, 10_000, &events_tx);

        let mut executor = SimpleExecutor::new_with(rx, vec![Box::new(fast)]);

        let handle = thread::spawn(move || {
            executor.update_loop();
            executor
        });

        thread::sleep(Duration::from_millis(100));
        tx.send(true).unwrap();

        let executor = handle.join().unwrap();
        assert!(fast_updates.load(Ordering::SeqCst) >= 5);
        assert!(executor.interrupted);
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }
}
