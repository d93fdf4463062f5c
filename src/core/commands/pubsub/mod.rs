// src/core/commands/pubsub/mod.rs

pub mod psubscribe;
pub mod publish;
pub mod punsubscribe;
pub mod subscribe;
pub mod unsubscribe;

pub use psubscribe::PSubscribe;
pub use publish::Publish;
pub use punsubscribe::PUnsubscribe;
pub use subscribe::Subscribe;
pub use unsubscribe::Unsubscribe;
