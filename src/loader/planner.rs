// src/loader/planner.rs

//! The per-record command planner: the pure state machine at the heart of
//! the CSV loader, keyed by target container type.

use crate::core::OpalisError;
use crate::core::protocol::Command;
use bytes::Bytes;
use csv::ByteRecord;
use std::str::FromStr;
use tracing::warn;

/// The container type a load writes into, with its implied write verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    String,
    List,
    Set,
    Hash,
    Zset,
}

impl TargetType {
    /// The store command this target type loads with.
    pub fn verb(&self) -> &'static str {
        match self {
            TargetType::String => "SET",
            TargetType::List => "RPUSH",
            TargetType::Set => "SADD",
            TargetType::Hash => "HSET",
            TargetType::Zset => "ZADD",
        }
    }
}

impl FromStr for TargetType {
    type Err = OpalisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(TargetType::String),
            "list" => Ok(TargetType::List),
            "set" => Ok(TargetType::Set),
            "hash" => Ok(TargetType::Hash),
            "zset" => Ok(TargetType::Zset),
            other => Err(OpalisError::InvalidRequest(format!(
                "unknown csv target type '{other}'"
            ))),
        }
    }
}

/// Plans the write commands for one CSV record at a time.
///
/// Field cadence per target type:
/// - string/list/set: field 1 is the key; every further field issues one
///   `{verb, key, field}` command.
/// - hash: the first record is captured verbatim as the ordered header list;
///   afterwards field 1 is the key and field `j` issues
///   `{HSET, key, header[j], field}`.
/// - zset: field 1 is the key; the remaining fields alternate score/member,
///   each completed pair issuing `{ZADD, key, score, member}`. A trailing
///   unpaired score dies with the row.
///
/// A data row whose key begins with `#` is a comment: it produces no
/// commands but still counts as a record.
#[derive(Debug)]
pub struct RecordPlanner {
    target: TargetType,
    headers: Vec<Bytes>,
    saw_header: bool,
}

impl RecordPlanner {
    pub fn new(target: TargetType) -> Self {
        Self {
            target,
            headers: Vec::new(),
            saw_header: false,
        }
    }

    /// The ordered header list captured from a hash load's first record.
    pub fn headers(&self) -> &[Bytes] {
        &self.headers
    }

    /// Translates one record into zero or more write commands, advancing the
    /// planner's state.
    pub fn plan_record(&mut self, record: &ByteRecord) -> Result<Vec<Command>, OpalisError> {
        if record.is_empty() {
            return Ok(Vec::new());
        }

        if self.target == TargetType::Hash && !self.saw_header {
            self.headers = record.iter().map(Bytes::copy_from_slice).collect();
            self.saw_header = true;
            return Ok(Vec::new());
        }

        let key = Bytes::copy_from_slice(&record[0]);
        if key.first() == Some(&b'#') {
            return Ok(Vec::new());
        }

        let verb = Bytes::from_static(self.target.verb().as_bytes());
        match self.target {
            TargetType::String | TargetType::List | TargetType::Set => record
                .iter()
                .skip(1)
                .map(|field| {
                    Command::from_parts([
                        verb.clone(),
                        key.clone(),
                        Bytes::copy_from_slice(field),
                    ])
                })
                .collect(),
            TargetType::Hash => {
                let mut commands = Vec::new();
                for (index, field) in record.iter().enumerate().skip(1) {
                    let Some(header) = self.headers.get(index) else {
                        warn!(
                            column = index,
                            "csv record wider than header row, skipping field"
                        );
                        continue;
                    };
                    commands.push(Command::from_parts([
                        verb.clone(),
                        key.clone(),
                        header.clone(),
                        Bytes::copy_from_slice(field),
                    ])?);
                }
                Ok(commands)
            }
            TargetType::Zset => {
                let mut commands = Vec::new();
                let mut pending_score: Option<Bytes> = None;
                for field in record.iter().skip(1) {
                    match pending_score.take() {
                        None => pending_score = Some(Bytes::copy_from_slice(field)),
                        Some(score) => {
                            commands.push(Command::from_parts([
                                verb.clone(),
                                key.clone(),
                                score,
                                Bytes::copy_from_slice(field),
                            ])?);
                        }
                    }
                }
                Ok(commands)
            }
        }
    }
}
