//! Drives a check (or allow-list update) across a file set.

mod progress;

pub use progress::{InterruptFlag, NoProgress, ProgressEvent, ProgressReporter};

use crate::context::{FileError, FileOutcome, RunContext};
use crate::files::FileSet;
use crate::index::SymbolConflict;
use crate::model::{Offense, Reference};
use crate::offense::OffenseCollection;
use crate::todo::{AllowList, TodoEntry, TodoError};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("update-todo must be run without file arguments; the allow-list always covers the whole codebase")]
    Scope,
    #[error("Failed to load or save the allow-list: {0}")]
    Todo(#[from] TodoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Cancelled before every file was dispatched; results are partial.
    Interrupted,
}

/// Problems that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    File(FileError),
    SymbolConflict(SymbolConflict),
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::File(e) => write!(f, "{}", e),
            RunWarning::SymbolConflict(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub status: RunStatus,
    /// Every offense found, in report order.
    pub offenses: Vec<Offense>,
    /// Offenses the allow-list does not tolerate.
    pub outstanding: Vec<Offense>,
    pub stale: Vec<TodoEntry>,
    pub strict: Vec<TodoEntry>,
    pub warnings: Vec<RunWarning>,
    pub files_inspected: usize,
    /// Populated by reference dumps only.
    pub references: Vec<Reference>,
    /// True when the allow-list was rewritten by this run.
    pub todo_updated: bool,
}

impl Report {
    pub fn success(&self) -> bool {
        self.status == RunStatus::Completed
            && self.outstanding.is_empty()
            && self.stale.is_empty()
            && self.strict.is_empty()
    }

    pub fn is_interrupted(&self) -> bool {
        self.status == RunStatus::Interrupted
    }
}

/// What came back from dispatching the file set.
struct Collected {
    results: Vec<(String, Result<FileOutcome, FileError>)>,
    interrupted: bool,
}

impl Collected {
    /// Files whose offenses are known. A file that couldn't be read or
    /// parsed proves nothing about its allow-list entries.
    fn checked_files(&self) -> FileSet {
        FileSet::specified(
            self.results
                .iter()
                .filter(|(_, result)| result.is_ok())
                .map(|(file, _)| file.clone()),
        )
    }

    fn failed_files(&self) -> FileSet {
        FileSet::specified(
            self.results
                .iter()
                .filter(|(_, result)| result.is_err())
                .map(|(file, _)| file.clone()),
        )
    }
}

pub struct RunDriver<'a> {
    context: &'a RunContext,
    files: &'a FileSet,
    progress: &'a dyn ProgressReporter,
    interrupt: InterruptFlag,
}

impl<'a> RunDriver<'a> {
    pub fn new(context: &'a RunContext, files: &'a FileSet) -> Self {
        Self {
            context,
            files,
            progress: &NoProgress,
            interrupt: InterruptFlag::new(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Check the file set against the stored allow-list.
    pub fn check(&self) -> Result<Report, RunError> {
        let allow_list = self
            .context
            .todo_store()
            .load_all(self.context.packages())?;
        let collected = self.collect(Some(&allow_list));

        let mut collection = OffenseCollection::new(allow_list, self.context.packages());
        let (warnings, references) = self.absorb(&collected, &mut collection);

        let stale = collection.stale_violations(&collected.checked_files());
        Ok(self.report(&collected, &collection, stale, warnings, references))
    }

    /// Rewrite every package's allow-list from a full run.
    ///
    /// Refused for a restricted file set. An interrupted run writes nothing.
    pub fn update_todo(&self) -> Result<Report, RunError> {
        if self.files.is_specified() {
            return Err(RunError::Scope);
        }

        let collected = self.collect(None);
        let mut collection = OffenseCollection::new(AllowList::new(), self.context.packages());
        let (warnings, references) = self.absorb(&collected, &mut collection);

        if collected.interrupted {
            warn!("run interrupted; allow-list left unchanged");
            return Ok(self.report(&collected, &collection, Vec::new(), warnings, references));
        }

        // Entries of unreadable files survive until the file can be checked again.
        let failed = collected.failed_files();
        let retained: Vec<TodoEntry> = if failed.is_empty() {
            Vec::new()
        } else {
            self.context
                .todo_store()
                .load_all(self.context.packages())?
                .entries()
                .into_iter()
                .filter(|entry| failed.contains(&entry.file))
                .collect()
        };

        let fresh = collection.persist_allow_list(
            self.context.packages(),
            self.context.todo_store(),
            &retained,
        )?;
        info!(entries = fresh.entries().len(), "allow-list updated");

        let mut updated = OffenseCollection::new(fresh, self.context.packages());
        updated.extend(collection.offenses().into_iter().cloned());
        let mut report = self.report(&collected, &updated, Vec::new(), warnings, references);
        report.todo_updated = true;
        Ok(report)
    }

    /// Every resolved cross-package reference in the file set.
    ///
    /// The context must have been built in export mode.
    pub fn dump_references(&self) -> Result<Report, RunError> {
        let collected = self.collect(None);
        let mut collection = OffenseCollection::new(AllowList::new(), self.context.packages());
        let (warnings, mut references) = self.absorb(&collected, &mut collection);

        references.retain(Reference::crosses_packages);
        references.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.location.cmp(&b.location))
                .then(a.written_name.cmp(&b.written_name))
        });
        Ok(self.report(&collected, &collection, Vec::new(), warnings, references))
    }

    fn collect(&self, allow_list: Option<&AllowList>) -> Collected {
        let total = self.files.len();
        self.progress.report(ProgressEvent::Started { total });

        let process = |file: &str| -> Result<FileOutcome, FileError> {
            let result = self.context.process_file(file);
            let failed = match &result {
                Err(_) => true,
                Ok(outcome) => allow_list.is_some_and(|allow_list| {
                    outcome
                        .offenses
                        .iter()
                        .any(|offense| !allow_list.contains(&offense.key()))
                }),
            };
            self.progress.report(if failed {
                ProgressEvent::Failed { file }
            } else {
                ProgressEvent::Inspected { file }
            });
            result
        };

        let collected = if self.context.parallel() {
            self.parallel_collect(&process)
        } else {
            self.serial_collect(&process)
        };

        if collected.interrupted {
            self.progress.report(ProgressEvent::Interrupted);
        }
        self.progress.report(ProgressEvent::Finished {
            inspected: collected.results.len(),
        });
        debug!(
            inspected = collected.results.len(),
            total,
            interrupted = collected.interrupted,
            "file set processed"
        );
        collected
    }

    fn serial_collect<F>(&self, process: &F) -> Collected
    where
        F: Fn(&str) -> Result<FileOutcome, FileError>,
    {
        let mut results = Vec::with_capacity(self.files.len());
        let mut interrupted = false;
        for file in self.files.iter() {
            if self.interrupt.is_interrupted() {
                interrupted = true;
                break;
            }
            results.push((file.to_string(), process(file)));
        }
        Collected {
            results,
            interrupted,
        }
    }

    fn parallel_collect<F>(&self, process: &F) -> Collected
    where
        F: Fn(&str) -> Result<FileOutcome, FileError> + Sync,
    {
        // Results come back in file-set order regardless of scheduling.
        let slots: Vec<Option<(String, Result<FileOutcome, FileError>)>> =
            self.context.pool().install(|| {
                self.files
                    .as_slice()
                    .par_iter()
                    .map(|file| {
                        if self.interrupt.is_interrupted() {
                            return None;
                        }
                        Some((file.clone(), process(file.as_str())))
                    })
                    .collect()
            });

        let interrupted = slots.iter().any(Option::is_none);
        Collected {
            results: slots.into_iter().flatten().collect(),
            interrupted,
        }
    }

    /// Merge per-file results into `collection`, returning warnings and references.
    fn absorb(
        &self,
        collected: &Collected,
        collection: &mut OffenseCollection,
    ) -> (Vec<RunWarning>, Vec<Reference>) {
        let mut warnings: Vec<RunWarning> = self
            .context
            .index()
            .conflicts()
            .iter()
            .cloned()
            .map(RunWarning::SymbolConflict)
            .collect();
        let mut references = Vec::new();

        for (_, result) in &collected.results {
            match result {
                Ok(outcome) => {
                    collection.extend(outcome.offenses.iter().cloned());
                    references.extend(outcome.references.iter().cloned());
                }
                Err(e) => {
                    warn!(file = %e.file(), error = %e, "file skipped");
                    warnings.push(RunWarning::File(e.clone()));
                }
            }
        }
        (warnings, references)
    }

    fn report(
        &self,
        collected: &Collected,
        collection: &OffenseCollection,
        stale: Vec<TodoEntry>,
        warnings: Vec<RunWarning>,
        references: Vec<Reference>,
    ) -> Report {
        Report {
            status: if collected.interrupted {
                RunStatus::Interrupted
            } else {
                RunStatus::Completed
            },
            offenses: collection.offenses().into_iter().cloned().collect(),
            outstanding: collection
                .outstanding_offenses()
                .into_iter()
                .cloned()
                .collect(),
            stale,
            strict: collection.strict_mode_violations(),
            warnings,
            files_inspected: collected.results.len(),
            references,
            todo_updated: false,
        }
    }
}
