//! Integration tests for the packwall library API.

mod common;

use common::{Fixture, INVOICE, LABEL};
use packwall::model::ViolationType;
use packwall::packages::GraphIssue;
use packwall::run::RunError;
use packwall::{CheckOptions, PackwallError, check, references, update_todo, validate};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn serial() -> CheckOptions {
    CheckOptions {
        parallel: Some(false),
        ..Default::default()
    }
}

#[test]
fn test_undeclared_dependency_is_reported_once() {
    let fixture = Fixture::billing_and_shipping();

    let report = check(fixture.root(), serial()).unwrap();

    assert!(!report.success());
    assert_eq!(report.outstanding.len(), 1);
    let offense = &report.outstanding[0];
    assert_eq!(offense.file(), INVOICE);
    assert_eq!(offense.package(), "packs/billing");
    assert_eq!(offense.symbol(), "Shipping::Label");
    assert_eq!(offense.symbol_package(), Some("packs/shipping"));
    assert_eq!(offense.violation_type, ViolationType::Dependency);
    assert_eq!(offense.reference.location.line, 10);
    assert!(report.stale.is_empty());
    assert!(report.strict.is_empty());
}

#[test]
fn test_update_todo_then_check_has_no_outstanding_offenses() {
    let fixture = Fixture::billing_and_shipping();

    let updated = update_todo(fixture.root(), serial()).unwrap();
    assert!(updated.todo_updated);
    assert!(updated.outstanding.is_empty());

    let todo = fixture.read("packs/billing/package_todo.toml");
    assert!(todo.contains("[dependency]"));
    assert!(todo.contains("\"Shipping::Label\" = [\"packs/billing/app/models/billing/invoice.rb\"]"));
    assert!(!fixture.exists("packs/shipping/package_todo.toml"));
    assert!(!fixture.exists("package_todo.toml"));

    let report = check(fixture.root(), serial()).unwrap();
    assert!(report.success(), "unexpected findings: {:?}", report.outstanding);
    assert_eq!(report.offenses.len(), 1);
}

#[test]
fn test_fixed_violation_becomes_stale() {
    let fixture = Fixture::billing_and_shipping();
    update_todo(fixture.root(), serial()).unwrap();

    fixture.write(
        INVOICE,
        "module Billing\n  class Invoice\n    def total\n      Core::Money.new(1)\n    end\n  end\nend\n",
    );
    let report = check(fixture.root(), serial()).unwrap();

    assert!(report.outstanding.is_empty());
    assert_eq!(report.stale.len(), 1);
    assert_eq!(report.stale[0].symbol, "Shipping::Label");
    assert_eq!(report.stale[0].file, INVOICE);
    assert!(!report.success());
}

#[test]
fn test_stale_entries_outside_checked_paths_are_ignored() {
    let fixture = Fixture::billing_and_shipping();
    update_todo(fixture.root(), serial()).unwrap();
    fixture.write(INVOICE, "module Billing\n  class Invoice\n  end\nend\n");

    let options = CheckOptions {
        paths: vec![PathBuf::from("packs/shipping")],
        ..serial()
    };
    let report = check(fixture.root(), options).unwrap();

    assert!(report.stale.is_empty());
    assert!(report.success());
}

#[test]
fn test_strict_package_reports_tolerated_violations() {
    let fixture = Fixture::billing_and_shipping();
    fixture.write(
        "packs/billing/package.toml",
        "dependencies = [\"packs/core\"]\nenforce_dependencies = \"strict\"\n",
    );

    let updated = update_todo(fixture.root(), serial()).unwrap();
    assert_eq!(updated.strict.len(), 1);

    let report = check(fixture.root(), serial()).unwrap();
    assert!(report.outstanding.is_empty());
    assert_eq!(report.strict.len(), 1);
    assert_eq!(report.strict[0].package, "packs/billing");
    assert!(!report.success());

    // still reported once the entry has gone stale
    fixture.write(INVOICE, "module Billing\n  class Invoice\n  end\nend\n");
    let report = check(fixture.root(), serial()).unwrap();
    assert_eq!(report.stale.len(), 1);
    assert_eq!(report.strict.len(), 1);
}

#[test]
fn test_unresolved_references_never_offend() {
    let fixture = Fixture::billing_and_shipping();
    fixture.write(
        INVOICE,
        "module Billing\n  class Invoice\n    def x\n      Warehouse::Crate.new\n      ::Nowhere\n    end\n  end\nend\n",
    );

    let report = check(fixture.root(), serial()).unwrap();
    assert!(report.offenses.is_empty());
    assert!(report.success());
}

#[test]
fn test_capitalized_method_call_is_not_a_constant_reference() {
    let fixture = Fixture::billing_and_shipping();
    fixture.write(
        "packs/shipping/app/models/parcel.rb",
        "class Parcel\nend\n",
    );
    fixture.write(
        INVOICE,
        "module Billing\n  class Invoice\n    def weight\n      Parcel(1)\n    end\n  end\nend\n",
    );

    let report = check(fixture.root(), serial()).unwrap();
    assert!(report.offenses.is_empty(), "unexpected: {:?}", report.offenses);
}

#[test]
fn test_unparseable_file_keeps_its_allow_list_entries() {
    let fixture = Fixture::billing_and_shipping();
    update_todo(fixture.root(), serial()).unwrap();
    let before = fixture.read("packs/billing/package_todo.toml");

    fixture.write(
        INVOICE,
        "module Billing\n  class Invoice\n    def ship(\n      Shipping::Label.print(self)\n  end\nend\n",
    );
    let report = check(fixture.root(), serial()).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.stale.is_empty());
    assert!(report.success());

    update_todo(fixture.root(), serial()).unwrap();
    assert_eq!(fixture.read("packs/billing/package_todo.toml"), before);
}

#[test]
fn test_update_todo_refuses_explicit_paths() {
    let fixture = Fixture::billing_and_shipping();
    let options = CheckOptions {
        paths: vec![PathBuf::from("packs/billing")],
        ..serial()
    };

    let result = update_todo(fixture.root(), options);

    assert!(matches!(result, Err(PackwallError::Run(RunError::Scope))));
    assert!(!fixture.exists("packs/billing/package_todo.toml"));
}

#[test]
fn test_cached_and_fresh_runs_agree() {
    let fixture = Fixture::billing_and_shipping();
    let cached = CheckOptions {
        cache: Some(true),
        ..serial()
    };

    let first = check(fixture.root(), cached.clone()).unwrap();
    assert!(fixture.exists("tmp/cache/packwall"));
    let second = check(fixture.root(), cached).unwrap();
    let uncached = check(
        fixture.root(),
        CheckOptions {
            cache: Some(false),
            ..serial()
        },
    )
    .unwrap();

    let encode = |report: &packwall::Report| serde_json::to_string(&report.offenses).unwrap();
    assert_eq!(encode(&first), encode(&second));
    assert_eq!(encode(&first), encode(&uncached));
}

#[test]
fn test_cache_is_invalidated_by_package_changes() {
    let fixture = Fixture::billing_and_shipping();
    let cached = CheckOptions {
        cache: Some(true),
        ..serial()
    };
    assert_eq!(check(fixture.root(), cached.clone()).unwrap().outstanding.len(), 1);

    fixture.write(
        "packs/billing/package.toml",
        "dependencies = [\"packs/core\", \"packs/shipping\"]\nenforce_dependencies = true\n",
    );
    assert!(check(fixture.root(), cached).unwrap().outstanding.is_empty());
}

#[test]
fn test_serial_and_parallel_runs_agree() {
    let fixture = Fixture::billing_and_shipping();
    for i in 0..12 {
        fixture.write(
            &format!("packs/billing/app/services/billing/step_{}.rb", i),
            &format!(
                "module Billing\n  class Step{}\n    def call\n      Shipping::Label\n    end\n  end\nend\n",
                i
            ),
        );
    }

    let serial_report = check(fixture.root(), serial()).unwrap();
    let parallel_report = check(
        fixture.root(),
        CheckOptions {
            parallel: Some(true),
            ..Default::default()
        },
    )
    .unwrap();

    let encode = |report: &packwall::Report| serde_json::to_string(&report.offenses).unwrap();
    assert_eq!(serial_report.offenses.len(), 13);
    assert_eq!(encode(&serial_report), encode(&parallel_report));
}

#[test]
fn test_parse_errors_are_warnings() {
    let fixture = Fixture::billing_and_shipping();
    fixture.write("packs/core/app/models/core/broken.rb", "class Broken < \n  def\n");

    let report = check(fixture.root(), serial()).unwrap();

    assert_eq!(report.outstanding.len(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].to_string().contains("broken.rb"));
}

#[test]
fn test_references_export_cross_package_usages() {
    let fixture = Fixture::billing_and_shipping();

    let references = references(fixture.root(), serial()).unwrap();
    let summary: Vec<(&str, &str, &str)> = references
        .iter()
        .map(|r| {
            let symbol = r.symbol.as_ref().unwrap();
            (r.file.as_str(), symbol.name.as_str(), symbol.package.as_str())
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            (INVOICE, "Core::Money", "packs/core"),
            (INVOICE, "Shipping::Label", "packs/shipping"),
        ]
    );
    assert_eq!(references[1].symbol.as_ref().unwrap().file, LABEL);
}

#[test]
fn test_validate_reports_cycles_and_unknown_dependencies() {
    let fixture = Fixture::billing_and_shipping();
    fixture.write("packs/core/package.toml", "dependencies = [\"packs/billing\"]\n");
    fixture.write("packs/shipping/package.toml", "dependencies = [\"packs/ghost\"]\n");

    let issues = validate(fixture.root()).unwrap();

    assert_eq!(
        issues,
        vec![
            GraphIssue::UnknownDependency {
                package: "packs/shipping".to_string(),
                dependency: "packs/ghost".to_string(),
            },
            GraphIssue::Cycle(vec!["packs/billing".to_string(), "packs/core".to_string()]),
        ]
    );
}

#[test]
fn test_invalid_root() {
    let result = check(Path::new("/nonexistent/path"), CheckOptions::default());
    assert!(matches!(result, Err(PackwallError::PathNotFound(_))));
}
