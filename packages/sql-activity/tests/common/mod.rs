#![allow(dead_code)]

use std::sync::Arc;

use sql_activity::{Category, InstrumentationBus, Recorder, StatementEvent, Subscription, SQL_EVENT};

/// Minimal stand-in for a driver: "executes" statements by publishing them.
pub struct FakeDriver {
    bus: InstrumentationBus,
}

impl FakeDriver {
    pub fn new(bus: InstrumentationBus) -> Self {
        Self { bus }
    }

    pub fn run(&self, sql: &str, category: Category) {
        self.bus
            .publish(SQL_EVENT, &StatementEvent::executed(sql, category));
    }

    pub fn run_cached(&self, sql: &str) {
        self.bus
            .publish(SQL_EVENT, &StatementEvent::cached(sql, Category::Query));
    }

    pub fn query(&self, sql: &str) {
        self.run(sql, Category::Query);
    }
}

pub struct Setup {
    pub driver: FakeDriver,
    pub recorder: Arc<Recorder>,
    _subscription: Subscription,
}

pub fn setup() -> Setup {
    let bus = InstrumentationBus::new();
    let recorder = Arc::new(Recorder::new());
    let subscription = bus.subscribe(SQL_EVENT, recorder.clone());
    Setup {
        driver: FakeDriver::new(bus),
        recorder,
        _subscription: subscription,
    }
}
