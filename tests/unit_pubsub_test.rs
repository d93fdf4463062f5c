// tests/unit_pubsub_test.rs

//! Subscription bookkeeping, delivery counts, the command gate, and the
//! subscription-mode PING reply.

mod common;

use citrinedb::connection::SubscriptionReceiver;
use citrinedb::core::commands::Command;
use citrinedb::core::{RespFrame, RespValue};
use common::{TestContext, bulk, frame_args};

#[tokio::test]
async fn test_subscribe_reply_and_session_bookkeeping() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["SUBSCRIBE", "news"]).await.unwrap(),
        RespValue::Array(vec![bulk("subscribe"), bulk("news"), RespValue::Integer(1)])
    );
    assert_eq!(
        ctx.run(&["SUBSCRIBE", "sports"]).await.unwrap(),
        RespValue::Array(vec![bulk("subscribe"), bulk("sports"), RespValue::Integer(2)])
    );
    // Subscribing twice to one channel does not double-register.
    assert_eq!(
        ctx.run(&["SUBSCRIBE", "news"]).await.unwrap(),
        RespValue::Array(vec![bulk("subscribe"), bulk("news"), RespValue::Integer(2)])
    );
    assert_eq!(ctx.session.subscription_count(), 2);
    assert_eq!(ctx.session.pubsub_receivers.len(), 2);
}

#[tokio::test]
async fn test_unsubscribe_removes_both_sides() {
    let mut ctx = TestContext::new();
    ctx.run(&["SUBSCRIBE", "news"]).await.unwrap();
    assert_eq!(
        ctx.run(&["UNSUBSCRIBE", "news"]).await.unwrap(),
        RespValue::Array(vec![bulk("unsubscribe"), bulk("news"), RespValue::Integer(0)])
    );
    assert_eq!(ctx.session.subscription_count(), 0);
    assert!(ctx.session.pubsub_receivers.is_empty());
}

#[tokio::test]
async fn test_publish_counts_only_subscribers() {
    let mut publisher = TestContext::new();
    assert_eq!(
        publisher.run(&["PUBLISH", "quiet", "msg"]).await.unwrap(),
        RespValue::Integer(0)
    );

    let mut subscriber = TestContext::with_state(publisher.state.clone());
    subscriber.run(&["SUBSCRIBE", "loud"]).await.unwrap();

    assert_eq!(
        publisher.run(&["PUBLISH", "loud", "hello"]).await.unwrap(),
        RespValue::Integer(1)
    );

    // The message is sitting in the subscriber's receiver.
    let SubscriptionReceiver::Channel(_, rx) = &mut subscriber.session.pubsub_receivers[0] else {
        panic!("expected a channel receiver");
    };
    assert_eq!(rx.recv().await.unwrap(), bytes::Bytes::from_static(b"hello"));
}

#[tokio::test]
async fn test_pattern_subscription_receives_matching_channels() {
    let mut subscriber = TestContext::new();
    subscriber.run(&["PSUBSCRIBE", "news.*"]).await.unwrap();

    let mut publisher = TestContext::with_state(subscriber.state.clone());
    assert_eq!(
        publisher.run(&["PUBLISH", "news.tech", "story"]).await.unwrap(),
        RespValue::Integer(1)
    );
    assert_eq!(
        publisher.run(&["PUBLISH", "weather", "rain"]).await.unwrap(),
        RespValue::Integer(0)
    );

    let SubscriptionReceiver::Pattern(_, rx) = &mut subscriber.session.pubsub_receivers[0] else {
        panic!("expected a pattern receiver");
    };
    let (pattern, channel, msg) = rx.recv().await.unwrap();
    assert_eq!(&pattern[..], b"news.*");
    assert_eq!(&channel[..], b"news.tech");
    assert_eq!(&msg[..], b"story");
}

#[tokio::test]
async fn test_ping_in_subscription_mode_is_an_array() {
    let mut ctx = TestContext::new();
    ctx.run(&["SUBSCRIBE", "ch"]).await.unwrap();
    assert_eq!(
        ctx.run(&["PING"]).await.unwrap(),
        RespValue::Array(vec![bulk("pong"), bulk("")])
    );
}

#[test]
fn test_subscribe_mode_whitelist() {
    let allowed = ["SUBSCRIBE ch", "UNSUBSCRIBE ch", "PSUBSCRIBE p", "PUNSUBSCRIBE p", "PING", "QUIT"];
    for line in allowed {
        let parts: Vec<&str> = line.split(' ').collect();
        let frame = RespFrame::Array(frame_args(&parts));
        let command = Command::try_from(frame).unwrap();
        assert!(command.is_allowed_in_subscribe_mode(), "{line} should pass the gate");
    }
    for line in ["GET k", "SET k v", "PUBLISH ch m", "EXEC"] {
        let parts: Vec<&str> = line.split(' ').collect();
        let frame = RespFrame::Array(frame_args(&parts));
        let command = Command::try_from(frame).unwrap();
        assert!(!command.is_allowed_in_subscribe_mode(), "{line} should be gated");
    }
}
