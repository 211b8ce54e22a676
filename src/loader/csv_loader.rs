// src/loader/csv_loader.rs

//! Streams a CSV file through the planner and issues each planned command
//! over the synchronous transport, accumulating the load summary.

use crate::client::SyncConnection;
use crate::core::OpalisError;
use crate::core::output::ReplyAtom;
use crate::core::protocol::RespFrame;
use crate::loader::planner::{RecordPlanner, TargetType};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Final counts for one load invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records seen, comment rows and the hash header row included.
    pub lines: u64,
    /// Write commands acknowledged by the store.
    pub entries: u64,
    /// Write commands the store answered with an error reply.
    pub errors: u64,
}

impl LoadSummary {
    /// The fixed 7-element status report emitted after a load:
    /// `csv-load-status lines <n> entries <n> error <n>`.
    pub fn to_atoms(&self) -> Vec<ReplyAtom> {
        vec![
            ReplyAtom::Text("csv-load-status".to_string()),
            ReplyAtom::Text("lines".to_string()),
            ReplyAtom::Int(self.lines as i64),
            ReplyAtom::Text("entries".to_string()),
            ReplyAtom::Int(self.entries as i64),
            ReplyAtom::Text("error".to_string()),
            ReplyAtom::Int(self.errors as i64),
        ]
    }
}

/// Drives one bulk load over a borrowed synchronous connection.
pub struct CsvLoader<'a, S = std::net::TcpStream> {
    conn: &'a mut SyncConnection<S>,
    target: TargetType,
}

impl<'a, S: Read + Write> CsvLoader<'a, S> {
    pub fn new(conn: &'a mut SyncConnection<S>, target: TargetType) -> Self {
        Self { conn, target }
    }

    /// Runs the load to completion.
    ///
    /// Failure to open the file aborts with no counts. A tokenizer error is
    /// fatal: the load stops and nothing further is reported. A store error
    /// reply counts against `errors` and the load continues; a transport
    /// failure aborts the load.
    pub fn run(&mut self, path: &Path) -> Result<LoadSummary, OpalisError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| OpalisError::Csv(format!("failed to open {}: {e}", path.display())))?;

        let mut planner = RecordPlanner::new(self.target);
        let mut summary = LoadSummary::default();

        for record in reader.byte_records() {
            let record = record?;
            for cmd in planner.plan_record(&record)? {
                match self.conn.send_raw(&cmd)? {
                    RespFrame::Error(msg) => {
                        summary.errors += 1;
                        warn!("csv load store error: {msg}");
                    }
                    _ => summary.entries += 1,
                }
            }
            summary.lines += 1;
        }

        info!(
            lines = summary.lines,
            entries = summary.entries,
            errors = summary.errors,
            "csv load finished"
        );
        Ok(summary)
    }
}
