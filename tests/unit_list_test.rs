// tests/unit_list_test.rs

//! List command behavior: pushes, pops, ranges, lengths.

mod common;

use citrinedb::core::RespValue;
use common::{TestContext, bulk};

fn bulk_array(items: &[&str]) -> RespValue {
    RespValue::Array(items.iter().map(|s| bulk(s)).collect())
}

#[tokio::test]
async fn test_rpush_appends_in_order() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["RPUSH", "fruit", "apple", "banana"]).await.unwrap(),
        RespValue::Integer(2)
    );
    assert_eq!(
        ctx.run(&["RPUSH", "fruit", "cherry"]).await.unwrap(),
        RespValue::Integer(3)
    );
    assert_eq!(
        ctx.run(&["LRANGE", "fruit", "0", "-1"]).await.unwrap(),
        bulk_array(&["apple", "banana", "cherry"])
    );
}

#[tokio::test]
async fn test_lpush_prepends_each_value() {
    let mut ctx = TestContext::new();
    ctx.run(&["LPUSH", "fruit", "a", "b", "c"]).await.unwrap();
    assert_eq!(
        ctx.run(&["LRANGE", "fruit", "0", "-1"]).await.unwrap(),
        bulk_array(&["c", "b", "a"])
    );
}

#[tokio::test]
async fn test_llen() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["LLEN", "missing"]).await.unwrap(),
        RespValue::Integer(0)
    );
    ctx.run(&["RPUSH", "l", "x", "y"]).await.unwrap();
    assert_eq!(ctx.run(&["LLEN", "l"]).await.unwrap(), RespValue::Integer(2));
}

#[tokio::test]
async fn test_lpop_single_and_counted() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "l", "a", "b", "c", "d"]).await.unwrap();

    assert_eq!(ctx.run(&["LPOP", "l"]).await.unwrap(), bulk("a"));
    assert_eq!(
        ctx.run(&["LPOP", "l", "2"]).await.unwrap(),
        bulk_array(&["b", "c"])
    );
    // Count larger than the list drains it.
    assert_eq!(
        ctx.run(&["LPOP", "l", "10"]).await.unwrap(),
        bulk_array(&["d"])
    );
    assert_eq!(ctx.run(&["LPOP", "l"]).await.unwrap(), RespValue::Null);
}

#[tokio::test]
async fn test_popping_dry_removes_the_key() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "l", "only"]).await.unwrap();
    ctx.run(&["LPOP", "l"]).await.unwrap();
    assert_eq!(ctx.run(&["TYPE", "l"]).await.unwrap(), common::simple("none"));
}

#[tokio::test]
async fn test_lrange_negative_indices() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "l", "a", "b", "c", "d", "e"]).await.unwrap();

    assert_eq!(
        ctx.run(&["LRANGE", "l", "-2", "-1"]).await.unwrap(),
        bulk_array(&["d", "e"])
    );
    assert_eq!(
        ctx.run(&["LRANGE", "l", "1", "3"]).await.unwrap(),
        bulk_array(&["b", "c", "d"])
    );
    // Inverted range after normalization is empty.
    assert_eq!(
        ctx.run(&["LRANGE", "l", "3", "1"]).await.unwrap(),
        bulk_array(&[])
    );
    // Out-of-bounds end is clamped.
    assert_eq!(
        ctx.run(&["LRANGE", "l", "3", "100"]).await.unwrap(),
        bulk_array(&["d", "e"])
    );
}

#[tokio::test]
async fn test_lrange_missing_key_is_empty() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["LRANGE", "missing", "0", "-1"]).await.unwrap(),
        bulk_array(&[])
    );
}

#[tokio::test]
async fn test_wrong_type_is_rejected() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "s", "scalar"]).await.unwrap();
    let err = ctx.run(&["RPUSH", "s", "x"]).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Operation against a key holding the wrong kind of value"
    );
}
