// tests/unit_stream_test.rs

//! Stream semantics: id resolution and monotonicity, XRANGE bounds, and
//! XREAD in both its immediate and blocking forms.

mod common;

use citrinedb::core::RespValue;
use common::{TestContext, bulk, simple};
use std::time::Duration;

fn entry(id: &str, fields: &[&str]) -> RespValue {
    RespValue::Array(vec![
        bulk(id),
        RespValue::Array(fields.iter().map(|f| bulk(f)).collect()),
    ])
}

#[tokio::test]
async fn test_xadd_explicit_ids_and_monotonicity() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["XADD", "stream", "1-1", "foo", "bar"]).await.unwrap(),
        bulk("1-1")
    );
    // `1-*` continues the sequence within the same millisecond.
    assert_eq!(
        ctx.run(&["XADD", "stream", "1-*", "bar", "baz"]).await.unwrap(),
        bulk("1-2")
    );
    // A smaller id is rejected with the canonical message.
    let err = ctx
        .run(&["XADD", "stream", "0-1", "bar", "baz"])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The ID specified in XADD is equal or smaller than the target stream top item"
    );
}

#[tokio::test]
async fn test_xadd_rejects_zero_id() {
    let mut ctx = TestContext::new();
    let err = ctx.run(&["XADD", "s", "0-0", "f", "v"]).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "The ID specified in XADD must be greater than 0-0"
    );
}

#[tokio::test]
async fn test_xadd_zero_ms_auto_sequence_starts_at_one() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["XADD", "s", "0-*", "f", "v"]).await.unwrap(),
        bulk("0-1")
    );
}

#[tokio::test]
async fn test_xadd_auto_ids_are_strictly_increasing() {
    let mut ctx = TestContext::new();
    let mut previous = None;
    for _ in 0..5 {
        let RespValue::BulkString(id) = ctx.run(&["XADD", "s", "*", "f", "v"]).await.unwrap()
        else {
            panic!("expected bulk id");
        };
        let id = String::from_utf8(id.to_vec()).unwrap();
        let (ms, seq) = id.split_once('-').unwrap();
        let pair: (u64, u64) = (ms.parse().unwrap(), seq.parse().unwrap());
        if let Some(prev) = previous {
            assert!(pair > prev, "{pair:?} should exceed {prev:?}");
        }
        previous = Some(pair);
    }
}

#[tokio::test]
async fn test_xadd_odd_field_count_is_rejected() {
    let mut ctx = TestContext::new();
    assert!(ctx.run(&["XADD", "s", "*", "f"]).await.is_err());
    assert!(ctx.run(&["XADD", "s", "*", "f", "v", "g"]).await.is_err());
}

#[tokio::test]
async fn test_type_reports_stream() {
    let mut ctx = TestContext::new();
    ctx.run(&["XADD", "s", "1-1", "f", "v"]).await.unwrap();
    assert_eq!(ctx.run(&["TYPE", "s"]).await.unwrap(), simple("stream"));
}

#[tokio::test]
async fn test_xrange_bounds_are_inclusive() {
    let mut ctx = TestContext::new();
    for id in ["1-1", "1-2", "2-0", "3-5"] {
        ctx.run(&["XADD", "s", id, "n", id]).await.unwrap();
    }

    assert_eq!(
        ctx.run(&["XRANGE", "s", "1-2", "2-0"]).await.unwrap(),
        RespValue::Array(vec![entry("1-2", &["n", "1-2"]), entry("2-0", &["n", "2-0"])])
    );
    // `-`/`+` cover everything; a bare ms bound spans its whole sequence range.
    assert_eq!(
        ctx.run(&["XRANGE", "s", "-", "+"]).await.unwrap(),
        RespValue::Array(vec![
            entry("1-1", &["n", "1-1"]),
            entry("1-2", &["n", "1-2"]),
            entry("2-0", &["n", "2-0"]),
            entry("3-5", &["n", "3-5"]),
        ])
    );
    assert_eq!(
        ctx.run(&["XRANGE", "s", "1", "1"]).await.unwrap(),
        RespValue::Array(vec![entry("1-1", &["n", "1-1"]), entry("1-2", &["n", "1-2"])])
    );
}

#[tokio::test]
async fn test_xread_returns_entries_after_id() {
    let mut ctx = TestContext::new();
    ctx.run(&["XADD", "s", "1-1", "a", "1"]).await.unwrap();
    ctx.run(&["XADD", "s", "2-1", "b", "2"]).await.unwrap();

    assert_eq!(
        ctx.run(&["XREAD", "STREAMS", "s", "1-1"]).await.unwrap(),
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("s"),
            RespValue::Array(vec![entry("2-1", &["b", "2"])]),
        ])])
    );
}

#[tokio::test]
async fn test_xread_multiple_streams() {
    let mut ctx = TestContext::new();
    ctx.run(&["XADD", "s1", "1-1", "a", "1"]).await.unwrap();
    ctx.run(&["XADD", "s2", "5-1", "b", "2"]).await.unwrap();

    assert_eq!(
        ctx.run(&["XREAD", "STREAMS", "s1", "s2", "0-0", "0-0"])
            .await
            .unwrap(),
        RespValue::Array(vec![
            RespValue::Array(vec![
                bulk("s1"),
                RespValue::Array(vec![entry("1-1", &["a", "1"])]),
            ]),
            RespValue::Array(vec![
                bulk("s2"),
                RespValue::Array(vec![entry("5-1", &["b", "2"])]),
            ]),
        ])
    );
}

#[tokio::test]
async fn test_blocking_xread_woken_by_xadd() {
    let ctx = TestContext::new();

    let reader = {
        let state = ctx.state.clone();
        tokio::spawn(async move {
            let mut c = TestContext::with_state(state);
            c.run(&["XREAD", "BLOCK", "1000", "STREAMS", "s", "0-0"])
                .await
                .unwrap()
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut writer = TestContext::with_state(ctx.state.clone());
    writer.run(&["XADD", "s", "7-7", "f", "v"]).await.unwrap();

    assert_eq!(
        reader.await.unwrap(),
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("s"),
            RespValue::Array(vec![entry("7-7", &["f", "v"])]),
        ])])
    );
}

#[tokio::test]
async fn test_blocking_xread_times_out_to_null() {
    let mut ctx = TestContext::new();
    let reply = ctx
        .run(&["XREAD", "BLOCK", "50", "STREAMS", "s", "0-0"])
        .await
        .unwrap();
    assert_eq!(reply, RespValue::Null);
}

#[tokio::test]
async fn test_blocking_xread_dollar_sees_only_new_entries() {
    let ctx = TestContext::new();
    let mut seed = TestContext::with_state(ctx.state.clone());
    seed.run(&["XADD", "s", "1-1", "old", "1"]).await.unwrap();

    // `$` resolves at parse time: the pre-existing entry must not satisfy it.
    let reader = {
        let state = ctx.state.clone();
        tokio::spawn(async move {
            let mut c = TestContext::with_state(state);
            c.run(&["XREAD", "BLOCK", "1000", "STREAMS", "s", "$"])
                .await
                .unwrap()
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    seed.run(&["XADD", "s", "9-9", "new", "2"]).await.unwrap();

    assert_eq!(
        reader.await.unwrap(),
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("s"),
            RespValue::Array(vec![entry("9-9", &["new", "2"])]),
        ])])
    );
}
