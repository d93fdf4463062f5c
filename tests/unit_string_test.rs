// tests/unit_string_test.rs

//! SET / GET / INCR behavior, including TTL expiry.

mod common;

use bytes::Bytes;
use citrinedb::core::CitrineError;
use citrinedb::core::RespValue;
use citrinedb::core::commands::ParseCommand;
use citrinedb::core::commands::string::set::{Set, TtlOption};
use common::{TestContext, bulk, frame_args, simple};
use std::time::Duration;

#[tokio::test]
async fn test_set_then_get() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.run(&["SET", "foo", "bar"]).await.unwrap(), simple("OK"));
    assert_eq!(ctx.run(&["GET", "foo"]).await.unwrap(), bulk("bar"));
}

#[tokio::test]
async fn test_get_missing_key_is_null() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.run(&["GET", "nope"]).await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_set_with_px_expires() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "foo", "bar", "PX", "10"]).await.unwrap();
    assert_eq!(ctx.run(&["GET", "foo"]).await.unwrap(), bulk("bar"));

    tokio::time::sleep(Duration::from_millis(25)).await;
    assert_eq!(ctx.run(&["GET", "foo"]).await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_set_with_ex_sets_seconds_ttl() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "foo", "bar", "EX", "100"]).await.unwrap();
    assert_eq!(ctx.run(&["GET", "foo"]).await.unwrap(), bulk("bar"));
}

#[test]
fn test_set_parse_rejects_trailing_garbage() {
    let err = Set::parse(&frame_args(&["key", "value", "bogus"])).unwrap_err();
    assert!(matches!(err, CitrineError::SyntaxError));
}

#[test]
fn test_set_parse_px() {
    let cmd = Set::parse(&frame_args(&["key", "value", "px", "250"])).unwrap();
    assert_eq!(cmd.key, Bytes::from_static(b"key"));
    assert_eq!(cmd.ttl, TtlOption::Milliseconds(250));
}

#[test]
fn test_set_parse_too_few_args() {
    let err = Set::parse(&frame_args(&["key"])).unwrap_err();
    assert!(matches!(err, CitrineError::WrongArgumentCount(_)));
}

#[tokio::test]
async fn test_incr_from_absent_starts_at_one() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["INCR", "counter"]).await.unwrap(),
        RespValue::Integer(1)
    );
    assert_eq!(
        ctx.run(&["INCR", "counter"]).await.unwrap(),
        RespValue::Integer(2)
    );
    assert_eq!(ctx.run(&["GET", "counter"]).await.unwrap(), bulk("2"));
}

#[tokio::test]
async fn test_incr_existing_numeric_string() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "counter", "41"]).await.unwrap();
    assert_eq!(
        ctx.run(&["INCR", "counter"]).await.unwrap(),
        RespValue::Integer(42)
    );
}

#[tokio::test]
async fn test_incr_non_numeric_errors() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "counter", "abc"]).await.unwrap();
    let err = ctx.run(&["INCR", "counter"]).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "value is not an integer or out of range"
    );
}

#[tokio::test]
async fn test_unknown_command_is_rejected() {
    let mut ctx = TestContext::new();
    let err = ctx.run(&["FROB", "x"]).await.unwrap_err();
    assert!(matches!(err, CitrineError::UnknownCommand(name) if name == "frob"));
}
