// src/core/commands/generic/mod.rs

pub mod command_info;
pub mod config_cmd;
pub mod echo;
pub mod info;
pub mod keys;
pub mod ping;
pub mod psync;
pub mod quit;
pub mod replconf;
pub mod transaction;
pub mod type_info;
pub mod wait;

pub use command_info::CommandInfo;
pub use config_cmd::ConfigGet;
pub use echo::Echo;
pub use info::Info;
pub use keys::Keys;
pub use ping::Ping;
pub use psync::Psync;
pub use quit::Quit;
pub use replconf::Replconf;
pub use transaction::{Discard, Exec, Multi};
pub use type_info::TypeInfo;
pub use wait::Wait;
