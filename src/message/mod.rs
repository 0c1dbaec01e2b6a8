//! Message Dispatch and Presentation
//!
//! A reassembled buffer starts with the 4-byte Generic Netlink header
//! `{command: u8, version: u8, reserved: u16}`. The command selects which
//! attribute context interprets the remaining bytes; this is the only place
//! command identity influences decoding.

use std::borrow::Cow;
use std::fmt;

use crate::dict::{command_name, context_for_command};
use crate::tlv::{parse_attrs, AttrTree};
use crate::trace::Envelope;
use crate::GENL_HEADER_LEN;

/// One fully decoded control message.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub envelope: Envelope,
    pub command: Cow<'static, str>,
    pub version: u8,
    pub attrs: AttrTree,
}

/// Decode a reassembled message buffer.
///
/// Returns `None` when the buffer cannot hold the Generic Netlink header;
/// the extractor already filters those, so this is purely defensive.
pub fn decode(envelope: Envelope, buf: &[u8]) -> Option<DecodedMessage> {
    if buf.len() < GENL_HEADER_LEN {
        return None;
    }
    let command_code = buf[0];
    let version = buf[1];

    let ctx = context_for_command(command_code);
    let attrs = parse_attrs(&buf[GENL_HEADER_LEN..], ctx);

    Some(DecodedMessage {
        envelope,
        command: command_name(command_code),
        version,
        attrs,
    })
}

impl fmt::Display for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let banner = "-".repeat(60);
        writeln!(f, "{}", banner)?;
        writeln!(f, "GTP5G MESSAGE")?;
        writeln!(
            f,
            "Len: {}, FamilyID: {}, Seq: {}",
            self.envelope.declared_len, self.envelope.family, self.envelope.seq
        )?;
        writeln!(f, "Command: {} (v{})", self.command, self.version)?;
        writeln!(f, "Attributes:")?;
        self.attrs.write_indented(f, 0)?;
        writeln!(f)?;
        write!(f, "{}", banner)
    }
}
