//! Fixture codebases for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const INVOICE: &str = "packs/billing/app/models/billing/invoice.rb";
pub const LABEL: &str = "packs/shipping/app/models/shipping/label.rb";
pub const MONEY: &str = "packs/core/app/models/core/money.rb";

pub const INVOICE_SOURCE: &str = r#"module Billing
  class Invoice < ApplicationRecord
    belongs_to :customer

    def total
      Core::Money.new(amount)
    end

    def ship!
      Shipping::Label.print(self)
    end
  end
end
"#;

pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// billing depends on core only; shipping and core are free-standing.
    pub fn billing_and_shipping() -> Self {
        let fixture = Self::new();
        fixture.write(
            "packs/billing/package.toml",
            "dependencies = [\"packs/core\"]\nenforce_dependencies = true\n",
        );
        fixture.write("packs/shipping/package.toml", "enforce_dependencies = true\n");
        fixture.write("packs/core/package.toml", "");
        fixture.write(INVOICE, INVOICE_SOURCE);
        fixture.write(
            LABEL,
            "module Shipping\n  class Label\n    def self.print(_invoice); end\n  end\nend\n",
        );
        fixture.write(MONEY, "module Core\n  class Money\n  end\nend\n");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}
