// tests/unit_replication_test.rs

//! Replication state: roles, INFO output, the WAIT short-circuit, and offset
//! accounting over the command stream framing.

mod common;

use citrinedb::config::{Config, ReplicaOf};
use citrinedb::core::RespValue;
use citrinedb::core::protocol::decode_commands;
use citrinedb::core::replication::{ReplicationRole, ReplicationState};
use common::{TestContext, bulk};
use std::sync::atomic::Ordering;

#[test]
fn test_replid_is_forty_hex_chars() {
    let state = ReplicationState::new(ReplicationRole::Master);
    assert_eq!(state.master_replid.len(), 40);
    assert!(state.master_replid.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_info_section_for_master_and_replica() {
    let master = ReplicationState::new(ReplicationRole::Master);
    let info = master.info_section();
    assert!(info.starts_with("role:master"));
    assert!(info.contains(&format!("master_replid:{}", master.master_replid)));
    assert!(info.contains("master_repl_offset:0"));

    let replica = ReplicationState::new(ReplicationRole::Replica {
        master_host: "localhost".to_string(),
        master_port: 6379,
    });
    assert_eq!(replica.info_section(), "role:slave");
}

#[tokio::test]
async fn test_info_command_reports_role() {
    let mut master_ctx = TestContext::new();
    let RespValue::BulkString(body) = master_ctx.run(&["INFO", "replication"]).await.unwrap()
    else {
        panic!("expected bulk");
    };
    assert!(body.starts_with(b"role:master"));

    let replica_config = Config {
        replicaof: Some(ReplicaOf {
            host: "localhost".to_string(),
            port: 1,
        }),
        ..Config::default()
    };
    let mut replica_ctx = TestContext::with_config(replica_config);
    assert_eq!(
        replica_ctx.run(&["INFO", "replication"]).await.unwrap(),
        bulk("role:slave")
    );
}

#[tokio::test]
async fn test_wait_with_no_pending_writes_returns_replica_count() {
    let mut ctx = TestContext::new();
    // No writes propagated yet, no replicas connected.
    assert_eq!(
        ctx.run(&["WAIT", "0", "100"]).await.unwrap(),
        RespValue::Integer(0)
    );
}

#[tokio::test]
async fn test_wait_clears_the_ack_flag() {
    let ctx = TestContext::new();
    ctx.state
        .replication
        .need_replica_ack
        .store(true, Ordering::SeqCst);

    // With the flag set but no replicas attached, WAIT reports zero
    // responders and resets the flag.
    assert_eq!(ctx.state.replication.wait_for_acks(50).await.unwrap(), 0);
    assert!(!ctx.state.replication.need_replica_ack.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_propagated_writes_advance_the_master_offset() {
    let mut ctx = TestContext::new();
    let before = ctx
        .state
        .replication
        .master_repl_offset
        .load(Ordering::SeqCst);
    ctx.run(&["SET", "foo", "bar"]).await.unwrap();
    let after = ctx
        .state
        .replication
        .master_repl_offset
        .load(Ordering::SeqCst);

    // `*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n` is 31 bytes.
    assert_eq!(after - before, 31);
}

#[test]
fn test_replica_offset_deltas_from_stream_framing() {
    // The byte deltas a replica adds per applied frame come straight out of
    // the command-stream decoder.
    let mut raw = Vec::new();
    raw.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
    raw.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$3\r\nbaz\r\n$3\r\nqux\r\n");
    raw.extend_from_slice(b"*3\r\n$8\r\nREPLCONF\r\n$6\r\nGETACK\r\n$1\r\n*\r\n");

    let (commands, consumed) = decode_commands(&raw).unwrap();
    assert_eq!(consumed, raw.len());
    let lengths: Vec<usize> = commands.iter().map(|(_, len)| *len).collect();
    assert_eq!(lengths, vec![31, 31, 37]);

    // After applying the two SETs, the ACK for the GETACK frame reports 62:
    // the cumulative bytes up to but not including the GETACK itself.
    let offset_before_getack: usize = lengths[..2].iter().sum();
    assert_eq!(offset_before_getack, 62);
}

#[tokio::test]
async fn test_replica_does_not_fan_out() {
    let replica_config = Config {
        replicaof: Some(ReplicaOf {
            host: "localhost".to_string(),
            port: 1,
        }),
        ..Config::default()
    };
    let mut ctx = TestContext::with_config(replica_config);
    ctx.run(&["SET", "foo", "bar"]).await.unwrap();
    // Nothing was propagated, so the master-side offset stays put.
    assert_eq!(
        ctx.state
            .replication
            .master_repl_offset
            .load(Ordering::SeqCst),
        0
    );
}
