use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::record::SequenceRecord;
use crate::engine::config::ExtractOptions;
use crate::engine::events::{EngineObserver, Progress};
use crate::index::locator::{LocateError, RecordLocator};
use crate::parsing::script::{parse_line, Statement};

pub const SEARCH_LABEL: &str = "Searching for your sequences...";

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read records: {0}")]
    Locate(#[from] LocateError),

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Counts reported after a script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScriptSummary {
    /// Non-comment lines executed
    pub statements: usize,
    /// Records written to the sink
    pub records_written: usize,
    /// Statements whose pattern could not be compiled
    pub skipped: usize,
}

/// Executes extraction scripts against a [`RecordLocator`]
///
/// Lines run strictly in order and output is streamed to the sink as each
/// record is produced, every record preceded by a newline.
pub struct ScriptInterpreter<'a> {
    locator: &'a RecordLocator,
    options: ExtractOptions,
    observer: &'a dyn EngineObserver,
}

impl<'a> ScriptInterpreter<'a> {
    pub fn new(
        locator: &'a RecordLocator,
        options: ExtractOptions,
        observer: &'a dyn EngineObserver,
    ) -> Self {
        Self {
            locator,
            options,
            observer,
        }
    }

    /// Run every line of `script`, writing results to `sink`.
    ///
    /// A pattern that matches nothing contributes no output, and a pattern
    /// that cannot be compiled is logged and skipped; neither stops the run.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Locate` if the working file cannot be read, or
    /// `ScriptError::Output` if writing to the sink fails.
    pub fn run<W: Write + ?Sized>(
        &self,
        script: &str,
        sink: &mut W,
    ) -> Result<ScriptSummary, ScriptError> {
        let lines: Vec<&str> = script.lines().collect();
        let mut summary = ScriptSummary::default();

        for (i, line) in lines.iter().enumerate() {
            let statement = parse_line(line);
            if statement != Statement::Comment {
                summary.statements += 1;
                self.execute(&statement, sink, &mut summary)?;
            }
            self.observer
                .on_progress(SEARCH_LABEL, Progress::of(i + 1, lines.len()));
        }

        sink.flush().map_err(ScriptError::Output)?;
        self.observer.on_progress(SEARCH_LABEL, Progress::Fraction(1.0));

        debug!(
            "Script finished: {} statement(s), {} record(s) written",
            summary.statements, summary.records_written
        );
        Ok(summary)
    }

    fn execute<W: Write + ?Sized>(
        &self,
        statement: &Statement,
        sink: &mut W,
        summary: &mut ScriptSummary,
    ) -> Result<(), ScriptError> {
        let (pattern, new_name, range) = match statement {
            Statement::Comment => return Ok(()),
            Statement::RenameRange {
                new_name,
                pattern,
                start,
                stop,
            } => (pattern, Some(new_name), Some((*start, *stop))),
            Statement::Range {
                pattern,
                start,
                stop,
            } => (pattern, None, Some((*start, *stop))),
            Statement::Pattern(pattern) => (pattern, None, None),
        };

        let records = match self.locator.find_many(
            pattern,
            self.options.match_description,
            self.options.ignore_case,
        ) {
            Ok(records) => records,
            Err(e @ LocateError::InvalidPattern { .. }) => {
                warn!("{e}; line skipped");
                summary.skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let multiple = records.len() > 1;
        for (i, mut record) in records.into_iter().enumerate() {
            if let Some(name) = new_name {
                if multiple {
                    record.rename(format!("{name}_{i}"));
                } else {
                    record.rename(name.as_str());
                }
            }

            if let Some((start, stop)) = range {
                record.slice(start, stop);
                if start > stop {
                    record.complement();
                }
            }

            self.emit(&record, sink)?;
            summary.records_written += 1;
            self.observer.on_progress(SEARCH_LABEL, Progress::Indeterminate);
        }

        Ok(())
    }

    fn emit<W: Write + ?Sized>(
        &self,
        record: &SequenceRecord,
        sink: &mut W,
    ) -> Result<(), ScriptError> {
        sink.write_all(b"\n").map_err(ScriptError::Output)?;
        sink.write_all(&record.format(self.options.line_width))
            .map_err(ScriptError::Output)
    }
}
