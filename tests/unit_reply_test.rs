// tests/unit_reply_test.rs

//! Unit tests for reply flattening: scalar conversion, the `nil` literal,
//! depth-first ordering, and the hard output capacity.

use bytes::Bytes;
use opalis::OpalisError;
use opalis::core::protocol::RespFrame;
use opalis::core::{MAX_REPLY_ATOMS, ReplyAtom, flatten};

#[test]
fn test_scalars_flatten_to_single_atoms() {
    assert_eq!(
        flatten(&RespFrame::SimpleString("OK".to_string())).unwrap(),
        vec![ReplyAtom::Text("OK".to_string())]
    );
    assert_eq!(
        flatten(&RespFrame::Integer(-3)).unwrap(),
        vec![ReplyAtom::Int(-3)]
    );
    assert_eq!(
        flatten(&RespFrame::BulkString(Bytes::from_static(b"payload"))).unwrap(),
        vec![ReplyAtom::Text("payload".to_string())]
    );
}

#[test]
fn test_both_null_variants_become_the_nil_literal() {
    assert_eq!(
        flatten(&RespFrame::Null).unwrap(),
        vec![ReplyAtom::Text("nil".to_string())]
    );
    assert_eq!(
        flatten(&RespFrame::NullArray).unwrap(),
        vec![ReplyAtom::Text("nil".to_string())]
    );
}

#[test]
fn test_error_reply_is_plain_text_output() {
    // A store error is ordinary output, not an OpalisError.
    assert_eq!(
        flatten(&RespFrame::Error("ERR wrong type".to_string())).unwrap(),
        vec![ReplyAtom::Text("ERR wrong type".to_string())]
    );
}

#[test]
fn test_nested_arrays_flatten_depth_first() {
    let frame = RespFrame::Array(vec![
        RespFrame::Integer(1),
        RespFrame::Array(vec![
            RespFrame::Integer(2),
            RespFrame::Array(vec![RespFrame::Integer(3)]),
            RespFrame::Integer(4),
        ]),
        RespFrame::Integer(5),
    ]);
    assert_eq!(
        flatten(&frame).unwrap(),
        vec![
            ReplyAtom::Int(1),
            ReplyAtom::Int(2),
            ReplyAtom::Int(3),
            ReplyAtom::Int(4),
            ReplyAtom::Int(5),
        ]
    );
}

#[test]
fn test_empty_array_flattens_to_nothing() {
    assert_eq!(flatten(&RespFrame::Array(vec![])).unwrap(), vec![]);
}

#[test]
fn test_capacity_overflow_is_an_error_not_truncation() {
    let at_cap = RespFrame::Array(vec![RespFrame::Integer(0); MAX_REPLY_ATOMS]);
    assert_eq!(flatten(&at_cap).unwrap().len(), MAX_REPLY_ATOMS);

    let over_cap = RespFrame::Array(vec![RespFrame::Integer(0); MAX_REPLY_ATOMS + 1]);
    assert_eq!(
        flatten(&over_cap).unwrap_err(),
        OpalisError::ReplyTooLarge(MAX_REPLY_ATOMS)
    );
}

#[test]
fn test_atom_accessors_and_display() {
    let text = ReplyAtom::Text("hi".to_string());
    let int = ReplyAtom::Int(9);
    assert_eq!(text.as_text(), Some("hi"));
    assert_eq!(text.as_int(), None);
    assert_eq!(int.as_int(), Some(9));
    assert_eq!(int.to_string(), "9");
}
