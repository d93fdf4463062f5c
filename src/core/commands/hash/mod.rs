// src/core/commands/hash/mod.rs

pub mod hget;
pub mod hgetall;
pub mod hset;

pub use hget::HGet;
pub use hgetall::HGetAll;
pub use hset::HSet;
