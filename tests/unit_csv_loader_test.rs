// tests/unit_csv_loader_test.rs

//! Unit tests for the CSV loader: the per-record planner state machine and
//! full loads driven over a stub stream.

mod common;

use bytes::Bytes;
use common::StubStream;
use csv::ByteRecord;
use opalis::client::SyncConnection;
use opalis::core::ReplyAtom;
use opalis::loader::{CsvLoader, LoadSummary, RecordPlanner, TargetType};
use std::io::Write as _;
use tempfile::NamedTempFile;

fn record(fields: &[&str]) -> ByteRecord {
    let mut rec = ByteRecord::new();
    for field in fields {
        rec.push_field(field.as_bytes());
    }
    rec
}

fn args_of(cmd: &opalis::core::Command) -> Vec<Bytes> {
    cmd.args().to_vec()
}

fn fixture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_planner_string_row_issues_one_set_per_value() {
    let mut planner = RecordPlanner::new(TargetType::String);
    let commands = planner.plan_record(&record(&["k", "v1", "v2"])).unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(args_of(&commands[0]), vec!["SET", "k", "v1"]);
    assert_eq!(args_of(&commands[1]), vec!["SET", "k", "v2"]);
}

#[test]
fn test_planner_list_and_set_verbs() {
    let mut planner = RecordPlanner::new(TargetType::List);
    let commands = planner.plan_record(&record(&["l", "x"])).unwrap();
    assert_eq!(args_of(&commands[0]), vec!["RPUSH", "l", "x"]);

    let mut planner = RecordPlanner::new(TargetType::Set);
    let commands = planner.plan_record(&record(&["s", "x"])).unwrap();
    assert_eq!(args_of(&commands[0]), vec!["SADD", "s", "x"]);
}

#[test]
fn test_planner_hash_captures_headers_then_pairs_fields() {
    let mut planner = RecordPlanner::new(TargetType::Hash);

    // First record is the header row, never a write.
    let commands = planner.plan_record(&record(&["id", "name", "score"])).unwrap();
    assert!(commands.is_empty());
    assert_eq!(planner.headers(), &["id", "name", "score"]);

    let commands = planner.plan_record(&record(&["1", "alice", "10"])).unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(args_of(&commands[0]), vec!["HSET", "1", "name", "alice"]);
    assert_eq!(args_of(&commands[1]), vec!["HSET", "1", "score", "10"]);
}

#[test]
fn test_planner_comment_key_skips_row_but_keeps_headers() {
    let mut planner = RecordPlanner::new(TargetType::Hash);
    planner.plan_record(&record(&["id", "name"])).unwrap();

    assert!(planner.plan_record(&record(&["#1", "alice"])).unwrap().is_empty());
    // The header row is still in force for the next data row.
    let commands = planner.plan_record(&record(&["2", "bob"])).unwrap();
    assert_eq!(args_of(&commands[0]), vec!["HSET", "2", "name", "bob"]);
}

#[test]
fn test_planner_hash_row_wider_than_headers_skips_extra_fields() {
    let mut planner = RecordPlanner::new(TargetType::Hash);
    planner.plan_record(&record(&["id", "name"])).unwrap();

    let commands = planner.plan_record(&record(&["1", "alice", "stray"])).unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(args_of(&commands[0]), vec!["HSET", "1", "name", "alice"]);
}

#[test]
fn test_planner_zset_pairs_scores_with_members() {
    let mut planner = RecordPlanner::new(TargetType::Zset);
    let commands = planner
        .plan_record(&record(&["board", "10", "alice", "20", "bob"]))
        .unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(args_of(&commands[0]), vec!["ZADD", "board", "10", "alice"]);
    assert_eq!(args_of(&commands[1]), vec!["ZADD", "board", "20", "bob"]);
}

#[test]
fn test_planner_zset_trailing_score_is_dropped() {
    let mut planner = RecordPlanner::new(TargetType::Zset);
    let commands = planner
        .plan_record(&record(&["board", "10", "alice", "99"]))
        .unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(args_of(&commands[0]), vec!["ZADD", "board", "10", "alice"]);
}

#[test]
fn test_target_type_parsing() {
    assert_eq!("string".parse::<TargetType>().unwrap(), TargetType::String);
    assert_eq!("zset".parse::<TargetType>().unwrap(), TargetType::Zset);
    assert!("blob".parse::<TargetType>().is_err());
}

#[test]
fn test_string_load_counts_lines_and_entries() {
    let file = fixture("k1,v1\nk2,v2\n");
    let mut conn = SyncConnection::from_stream(StubStream::with_input(b"+OK\r\n+OK\r\n"));

    let summary = CsvLoader::new(&mut conn, TargetType::String).run(file.path()).unwrap();
    assert_eq!(summary, LoadSummary { lines: 2, entries: 2, errors: 0 });
}

#[test]
fn test_hash_load_sends_one_hset_per_paired_field() {
    let file = fixture("id,name,score\n1,alice,10\n2,bob,20\n");
    let mut conn = SyncConnection::from_stream(StubStream::with_input(b":1\r\n:1\r\n:1\r\n:1\r\n"));

    let summary = CsvLoader::new(&mut conn, TargetType::Hash).run(file.path()).unwrap();
    assert_eq!(summary, LoadSummary { lines: 3, entries: 4, errors: 0 });

    let written = String::from_utf8(conn.get_ref().written.clone()).unwrap();
    assert_eq!(written.matches("$4\r\nHSET\r\n").count(), 4);
    assert!(written.contains("$5\r\nalice\r\n"));
}

#[test]
fn test_store_error_reply_counts_and_load_continues() {
    let file = fixture("a,1\nb,2\nc,3\n");
    let mut conn = SyncConnection::from_stream(StubStream::with_input(
        b"+OK\r\n-ERR wrong kind of value\r\n+OK\r\n",
    ));

    let summary = CsvLoader::new(&mut conn, TargetType::String).run(file.path()).unwrap();
    assert_eq!(summary, LoadSummary { lines: 3, entries: 2, errors: 1 });
}

#[test]
fn test_comment_rows_count_as_lines_only() {
    let file = fixture("#note,ignored\nk,v\n");
    let mut conn = SyncConnection::from_stream(StubStream::with_input(b"+OK\r\n"));

    let summary = CsvLoader::new(&mut conn, TargetType::String).run(file.path()).unwrap();
    assert_eq!(summary, LoadSummary { lines: 2, entries: 1, errors: 0 });
}

#[test]
fn test_missing_file_aborts_with_no_counts() {
    let mut conn = SyncConnection::from_stream(StubStream::new());
    let result = CsvLoader::new(&mut conn, TargetType::String)
        .run(std::path::Path::new("/nonexistent/data.csv"));
    assert!(result.is_err());
    assert!(conn.get_ref().written.is_empty());
}

#[test]
fn test_summary_report_shape() {
    let summary = LoadSummary { lines: 3, entries: 4, errors: 1 };
    assert_eq!(
        summary.to_atoms(),
        vec![
            ReplyAtom::Text("csv-load-status".to_string()),
            ReplyAtom::Text("lines".to_string()),
            ReplyAtom::Int(3),
            ReplyAtom::Text("entries".to_string()),
            ReplyAtom::Int(4),
            ReplyAtom::Text("error".to_string()),
            ReplyAtom::Int(1),
        ]
    );
}
