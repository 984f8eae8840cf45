mod common;

use common::Fixture;
use packwall::run::{ProgressEvent, ProgressReporter};
use packwall::{Config, FileSet, InterruptFlag, RunContext, RunDriver, RunStatus};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pulls the interrupt flag once `after` files have been inspected.
struct InterruptAfter {
    after: usize,
    seen: AtomicUsize,
    flag: InterruptFlag,
}

impl ProgressReporter for InterruptAfter {
    fn report(&self, event: ProgressEvent<'_>) {
        if let ProgressEvent::Inspected { .. } | ProgressEvent::Failed { .. } = event {
            if self.seen.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
                self.flag.interrupt();
            }
        }
    }
}

fn ten_offending_files() -> Fixture {
    let fixture = Fixture::new();
    fixture.write(
        "packs/billing/package.toml",
        "enforce_dependencies = true\n",
    );
    fixture.write("packs/shipping/package.toml", "");
    fixture.write(
        "packs/shipping/app/models/shipping/label.rb",
        "module Shipping\n  class Label\n  end\nend\n",
    );
    for i in 0..9 {
        fixture.write(
            &format!("packs/billing/app/models/billing/order_{}.rb", i),
            &format!(
                "module Billing\n  class Order{}\n    LABEL = Shipping::Label\n  end\nend\n",
                i
            ),
        );
    }
    fixture
}

fn serial_context(fixture: &Fixture) -> RunContext {
    let config = Config {
        parallel: false,
        cache: false,
        ..Config::default()
    };
    RunContext::builder(fixture.root(), config).build().unwrap()
}

#[test]
fn test_interrupt_after_three_of_ten_files() {
    let fixture = ten_offending_files();
    let context = serial_context(&fixture);
    let files = FileSet::discover(fixture.root(), &Config::default()).unwrap();
    assert_eq!(files.len(), 10);

    let flag = InterruptFlag::new();
    let reporter = InterruptAfter {
        after: 3,
        seen: AtomicUsize::new(0),
        flag: flag.clone(),
    };

    let report = RunDriver::new(&context, &files)
        .with_progress(&reporter)
        .with_interrupt(flag)
        .check()
        .unwrap();

    assert_eq!(report.status, RunStatus::Interrupted);
    assert_eq!(report.files_inspected, 3);
    assert!(report.offenses.len() <= 3);
    assert!(!report.success());
}

#[test]
fn test_interrupted_update_writes_nothing() {
    let fixture = ten_offending_files();
    let context = serial_context(&fixture);
    let files = FileSet::discover(fixture.root(), &Config::default()).unwrap();

    let flag = InterruptFlag::new();
    let reporter = InterruptAfter {
        after: 1,
        seen: AtomicUsize::new(0),
        flag: flag.clone(),
    };

    let report = RunDriver::new(&context, &files)
        .with_progress(&reporter)
        .with_interrupt(flag)
        .update_todo()
        .unwrap();

    assert!(report.is_interrupted());
    assert!(!report.todo_updated);
    assert!(!fixture.exists("packs/billing/package_todo.toml"));
}

#[test]
fn test_uninterrupted_run_inspects_everything() {
    let fixture = ten_offending_files();
    let context = serial_context(&fixture);
    let files = FileSet::discover(fixture.root(), &Config::default()).unwrap();

    let report = RunDriver::new(&context, &files).check().unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.files_inspected, 10);
    assert_eq!(report.outstanding.len(), 9);
}
