//!
//! The Error Reporter
//!
//! Deliveries dropped on full subscriber queues are absorbed by the
//! dispatcher and only counted.  The error reporter watches those counters
//! and logs whenever one of them moves, so a subscriber that cannot keep up
//! shows up in the logs instead of silently losing notifiers.
//!

use std::sync::Arc;

use tracing::warn;

use notifier_core::{Manager, Priority};
use notifier_pubsub::{Dispatcher, QueueSubscriber};

/// A change in one of the watched error counters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReport {
    /// The watched subscriber, or `None` for the dispatcher's total
    pub subscriber: Option<String>,
    /// The counter's current value
    pub errors: u32,
    /// How much the counter moved since the last report
    pub new: u32,
}

/// A watched subscriber and the last error count reported for it
struct Watched {
    name: String,
    subscriber: Arc<QueueSubscriber>,
    reported: u32,
}

/// A manager that logs changed delivery error counters
pub struct ErrorReporter {
    /// The dispatcher whose counters are watched
    dispatcher: Arc<Dispatcher>,
    /// The reporting period (in us)
    update_delay_us: u128,
    /// The last reported dispatcher total
    reported: u32,
    /// Subscribers reported individually
    watched: Vec<Watched>,
}

impl ErrorReporter {
    /// Create a reporter checking `dispatcher` every `update_delay_us`
    /// microseconds
    pub fn new(dispatcher: Arc<Dispatcher>, update_delay_us: u128) -> Self {
        let reported = dispatcher.error_count();
        Self {
            dispatcher,
            update_delay_us,
            reported,
            watched: Vec::new(),
        }
    }

    /// Also report the error counter of a single subscriber under `name`
    pub fn watch(&mut self, name: impl Into<String>, subscriber: &Arc<QueueSubscriber>) {
        let reported = self.dispatcher.subscriber_errors(subscriber).unwrap_or(0);
        self.watched.push(Watched {
            name: name.into(),
            subscriber: subscriber.clone(),
            reported,
        });
    }

    /// Compare every counter with its last reported value, logging and
    /// returning the ones that moved
    pub fn report(&mut self) -> Vec<ErrorReport> {
        let mut reports = Vec::new();

        let errors = self.dispatcher.error_count();
        if errors != self.reported {
            let new = errors.wrapping_sub(self.reported);
            warn!(errors, new, "Dispatcher dropped notifiers");
            reports.push(ErrorReport {
                subscriber: None,
                errors,
                new,
            });
            self.reported = errors;
        }

        for watched in self.watched.iter_mut() {
            // An unregistered subscriber has no counter anymore
            let Some(errors) = self.dispatcher.subscriber_errors(&watched.subscriber) else {
                watched.reported = 0;
                continue;
            };
            if errors != watched.reported {
                let new = errors.wrapping_sub(watched.reported);
                warn!(
                    subscriber = %watched.name,
                    errors,
                    new,
                    pending = watched.subscriber.pending(),
                    "Subscriber is not keeping up"
                );
                reports.push(ErrorReport {
                    subscriber: Some(watched.name.clone()),
                    errors,
                    new,
                });
                watched.reported = errors;
            }
        }

        reports
    }
}

impl Manager for ErrorReporter {
    fn name(&self) -> &str {
        "error-reporter"
    }

    fn priority(&self) -> Priority {
        Priority::LOW
    }

    fn get_update_delay_us(&self) -> u128 {
        self.update_delay_us
    }

    fn update(&mut self) {
        self.report();
    }
}
