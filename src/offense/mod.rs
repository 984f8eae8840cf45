//! Offenses of a run measured against the allow-list.

use crate::files::FileSet;
use crate::model::{Offense, OffenseKey};
use crate::packages::PackageGraph;
use crate::todo::{AllowList, PackageTodo, TodoEntry, TodoError, TodoStore};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

pub struct OffenseCollection {
    offenses: Vec<Offense>,
    positions: HashMap<OffenseKey, usize>,
    allow_list: AllowList,
    strict_packages: BTreeSet<String>,
}

impl OffenseCollection {
    pub fn new(allow_list: AllowList, packages: &PackageGraph) -> Self {
        Self {
            offenses: Vec::new(),
            positions: HashMap::new(),
            allow_list,
            strict_packages: packages
                .iter()
                .filter(|p| p.strict)
                .map(|p| p.name.clone())
                .collect(),
        }
    }

    /// Record `offense`. A repeat of the same (file, symbol, violation type)
    /// keeps whichever occurrence comes first in the file.
    pub fn add_offense(&mut self, offense: Offense) {
        let key = offense.key();
        match self.positions.get(&key) {
            Some(&i) => {
                if offense.reference.location < self.offenses[i].reference.location {
                    self.offenses[i] = offense;
                }
            }
            None => {
                self.positions.insert(key, self.offenses.len());
                self.offenses.push(offense);
            }
        }
    }

    pub fn extend<I>(&mut self, offenses: I)
    where
        I: IntoIterator<Item = Offense>,
    {
        for offense in offenses {
            self.add_offense(offense);
        }
    }

    /// Whether the allow-list already tolerates `offense`.
    pub fn listed(&self, offense: &Offense) -> bool {
        self.allow_list.contains(&offense.key())
    }

    /// Every current offense in report order.
    pub fn offenses(&self) -> Vec<&Offense> {
        let mut offenses: Vec<&Offense> = self.offenses.iter().collect();
        offenses.sort_by(|a, b| Offense::report_order(a, b));
        offenses
    }

    /// Offenses the allow-list doesn't tolerate.
    pub fn outstanding_offenses(&self) -> Vec<&Offense> {
        self.offenses()
            .into_iter()
            .filter(|offense| !self.listed(offense))
            .collect()
    }

    /// Allow-list entries for files in `files` that no current offense
    /// reproduces. Entries for files outside the set are left alone.
    pub fn stale_violations(&self, files: &FileSet) -> Vec<TodoEntry> {
        let current: HashSet<&OffenseKey> = self.positions.keys().collect();
        self.allow_list
            .entries()
            .into_iter()
            .filter(|entry| files.contains(&entry.file))
            .filter(|entry| !current.contains(&entry.key()))
            .collect()
    }

    /// Allow-list entries of packages that must not carry any.
    pub fn strict_mode_violations(&self) -> Vec<TodoEntry> {
        self.allow_list
            .entries()
            .into_iter()
            .filter(|entry| self.strict_packages.contains(&entry.package))
            .collect()
    }

    /// An allow-list tolerating the current offenses plus `retained`.
    ///
    /// `retained` carries entries of files whose offenses are unknown this
    /// run, e.g. because they failed to parse.
    pub fn fresh_allow_list(&self, retained: &[TodoEntry]) -> AllowList {
        let mut allow_list = AllowList::new();
        for offense in &self.offenses {
            allow_list.add(&offense.key());
        }
        for entry in retained {
            allow_list.add(&entry.key());
        }
        allow_list
    }

    /// Replace every package's stored allow-list with the current offenses
    /// plus `retained`.
    pub fn persist_allow_list(
        &self,
        packages: &PackageGraph,
        store: &dyn TodoStore,
        retained: &[TodoEntry],
    ) -> Result<AllowList, TodoError> {
        let fresh = self.fresh_allow_list(retained);
        let empty = PackageTodo::new();
        for package in packages.iter() {
            let todo = fresh.get(&package.name).unwrap_or(&empty);
            debug!(package = %package.name, entries = todo.len(), "writing allow-list");
            store.save(package, todo)?;
        }
        Ok(fresh)
    }
}
