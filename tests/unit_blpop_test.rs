// tests/unit_blpop_test.rs

//! Blocking list pop: rendezvous with a concurrent push, timeouts, FIFO
//! wake-up, and waiter bookkeeping.

mod common;

use bytes::Bytes;
use citrinedb::core::RespValue;
use common::{TestContext, bulk};
use std::time::Duration;

#[tokio::test]
async fn test_blpop_returns_immediately_when_list_has_data() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "k", "ready"]).await.unwrap();
    assert_eq!(
        ctx.run(&["BLPOP", "k", "1"]).await.unwrap(),
        RespValue::Array(vec![bulk("k"), bulk("ready")])
    );
    assert_eq!(ctx.run(&["LLEN", "k"]).await.unwrap(), RespValue::Integer(0));
}

#[tokio::test]
async fn test_blpop_woken_by_rpush() {
    let ctx = TestContext::new();
    let state = ctx.state.clone();

    let blocked = tokio::spawn(async move {
        let mut waiter_ctx = TestContext::with_state(state);
        waiter_ctx.run(&["BLPOP", "k", "1"]).await.unwrap()
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut pusher = TestContext::with_state(ctx.state.clone());
    let push_reply = pusher.run(&["RPUSH", "k", "mango"]).await.unwrap();

    // The pusher sees the length after its own push, the waiter receives the
    // element, and the list ends up empty.
    assert_eq!(push_reply, RespValue::Integer(1));
    assert_eq!(
        blocked.await.unwrap(),
        RespValue::Array(vec![bulk("k"), bulk("mango")])
    );
    assert_eq!(
        pusher.run(&["LLEN", "k"]).await.unwrap(),
        RespValue::Integer(0)
    );
}

#[tokio::test]
async fn test_blpop_times_out_to_null() {
    let mut ctx = TestContext::new();
    let reply = ctx.run(&["BLPOP", "k", "0.05"]).await.unwrap();
    assert_eq!(reply, RespValue::Null);
    // The timed-out waiter must not linger in the registry.
    assert_eq!(ctx.state.list_blockers.waiter_count(&Bytes::from_static(b"k")), 0);
}

#[tokio::test]
async fn test_blpop_waiters_wake_fifo() {
    let ctx = TestContext::new();

    let first = {
        let state = ctx.state.clone();
        tokio::spawn(async move {
            let mut c = TestContext::with_state(state);
            c.run(&["BLPOP", "k", "2"]).await.unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = {
        let state = ctx.state.clone();
        tokio::spawn(async move {
            let mut c = TestContext::with_state(state);
            c.run(&["BLPOP", "k", "2"]).await.unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut pusher = TestContext::with_state(ctx.state.clone());
    pusher.run(&["RPUSH", "k", "one", "two"]).await.unwrap();

    assert_eq!(
        first.await.unwrap(),
        RespValue::Array(vec![bulk("k"), bulk("one")])
    );
    assert_eq!(
        second.await.unwrap(),
        RespValue::Array(vec![bulk("k"), bulk("two")])
    );
}

#[tokio::test]
async fn test_push_skips_stale_waiters() {
    let ctx = TestContext::new();

    // This waiter gives up before the push arrives.
    let expired = {
        let state = ctx.state.clone();
        tokio::spawn(async move {
            let mut c = TestContext::with_state(state);
            c.run(&["BLPOP", "k", "0.05"]).await.unwrap()
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let survivor = {
        let state = ctx.state.clone();
        tokio::spawn(async move {
            let mut c = TestContext::with_state(state);
            c.run(&["BLPOP", "k", "2"]).await.unwrap()
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(expired.await.unwrap(), RespValue::Null);

    let mut pusher = TestContext::with_state(ctx.state.clone());
    pusher.run(&["RPUSH", "k", "fresh"]).await.unwrap();
    assert_eq!(
        survivor.await.unwrap(),
        RespValue::Array(vec![bulk("k"), bulk("fresh")])
    );
}
