#![doc = include_str!("../README.md")]

pub mod dict;
pub mod family;
pub mod message;
pub mod tlv;
pub mod trace;
pub mod value;

// Re-export main types without glob imports to avoid conflicts
pub use dict::AttrContext;
pub use message::DecodedMessage;
pub use tlv::{AttrNode, AttrTree};
pub use trace::Envelope;
pub use value::AttrValue;

/// Family id assumed when the host's generic netlink registry cannot be queried.
pub const DEFAULT_FAMILY_ID: u16 = 31;

/// Generic Netlink header: command, version, reserved.
pub const GENL_HEADER_LEN: usize = 4;

/// Netlink message header: length, type, flags, sequence, pid.
pub const NLMSG_HEADER_LEN: usize = 16;
