//! Capture-Line Scanning and Message Reassembly
//!
//! Input lines are `strace -xx` renderings of `sendmsg`/`recvmsg` calls on a
//! netlink socket. Depending on whether strace recognised a leading
//! `nlmsghdr` inside an iovec, the same bytes can appear in three shapes:
//!
//! - a flat escaped-hex string: `iov_base="\x08\x00\x01\x00..."`;
//! - a decoded header followed by trailing hex:
//!   `iov_base={{len=36, type=0x1f, flags=NLM_F_REQUEST, seq=1, pid=0}, "\x.."}`;
//! - a decoded header alone: `iov_base={len=20, type=0x14, ...}`, an
//!   embedded header strace pulled apart with no inline payload.
//!
//! Reassembly collects every matched segment, orders them by their position
//! in the source text, and concatenates: decoded headers are re-serialised
//! back into their 16-byte wire layout (all fields host byte order) so that
//! attribute offsets computed later line up with the original scatter-gather
//! vector.
//!
//! A decoded header whose type text names the target family is handled
//! asymmetrically, matching the behavior observed in live captures: with
//! trailing hex only the hex is kept (strace consumed exactly the header the
//! envelope already accounts for), and without trailing hex the segment is
//! dropped.

use std::sync::LazyLock;

use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, warn};
use regex::Regex;

/// Marker strace substitutes for the resolved generic family name.
const FAMILY_MARKER: &str = "gtp5g";

/// Header-level metadata for one captured message.
///
/// Used for filtering and display only; payload boundaries always come from
/// the TLV records themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Total length declared in the captured netlink header.
    pub declared_len: u32,
    /// Resolved numeric message type; equals the target family after filtering.
    pub family: u16,
    pub seq: u32,
}

static FIRST_IOV_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"msg_iov=\[\{iov_base=\{len=(\d+),\s*type=([^,]+),\s*flags=([^,]+),\s*seq=(\d+),\s*pid=(\d+)\}")
        .unwrap()
});

static FIRST_IOV_HEADER_BRACED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"msg_iov=\[\{iov_base=\{\{len=(\d+),\s*type=([^,]+),\s*flags=([^,]+),\s*seq=(\d+),\s*pid=(\d+)\}")
        .unwrap()
});

static TOP_LEVEL_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"msg_iov=\[\{iov_base=\{[^}]*type=NLMSG_ERROR").unwrap());

static HEX_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"iov_base="((?:\\x[0-9a-fA-F]{2})+)""#).unwrap());

static FULL_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"iov_base=\{\{len=(\d+),\s*type=([^,]+),\s*flags=([^,]+),\s*seq=(\d+),\s*pid=(\d+)\},\s*"((?:\\x[0-9a-fA-F]{2})+)"\}"#,
    )
    .unwrap()
});

static HEADER_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"iov_base=\{len=(\d+),\s*type=([^,]+),\s*flags=([^,]+),\s*seq=(\d+),\s*pid=(\d+)\}")
        .unwrap()
});

// regex has no lookahead; this is checked against the text after a
// HEADER_SEGMENT match to reject headers that carry trailing hex.
static TRAILING_HEX_OPENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^,\s*""#).unwrap());

static HEX_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"0x([0-9a-fA-F]+)").unwrap());

static LEADING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0x[0-9a-fA-F]+|\d+)").unwrap());

const NLM_FLAGS: &[(&str, u32)] = &[
    ("NLM_F_REQUEST", 0x01),
    ("NLM_F_MULTI", 0x02),
    ("NLM_F_ACK", 0x04),
    ("NLM_F_ECHO", 0x08),
    ("NLM_F_DUMP_INTR", 0x10),
    ("NLM_F_DUMP_FILTERED", 0x20),
    // GET request modifiers
    ("NLM_F_ROOT", 0x100),
    ("NLM_F_MATCH", 0x200),
    ("NLM_F_ATOMIC", 0x400),
    ("NLM_F_DUMP", 0x300),
    // NEW request modifiers share the same bits
    ("NLM_F_REPLACE", 0x100),
    ("NLM_F_EXCL", 0x200),
    ("NLM_F_CREATE", 0x400),
    ("NLM_F_APPEND", 0x800),
];

/// A captured header annotation's fields, still textual where strace left
/// them symbolic.
#[derive(Debug)]
struct HeaderFields<'a> {
    len: &'a str,
    type_text: &'a str,
    flags_text: &'a str,
    seq: &'a str,
    pid: &'a str,
}

#[derive(Debug)]
enum Segment<'a> {
    /// Escaped-hex bytes, kept verbatim.
    Hex(&'a str),
    /// Trailing hex of a target-family header; the header itself is not rebuilt.
    FamilyPayload(&'a str),
    /// Decoded header plus trailing hex; both are re-serialised.
    Full(HeaderFields<'a>, &'a str),
    /// Decoded header alone.
    Header(HeaderFields<'a>),
}

/// Scan one capture line; return the envelope and reassembled message bytes,
/// or `None` when the line is skipped.
pub fn extract_message(line: &str, target_family: u16) -> Option<(Envelope, Bytes)> {
    // An error notification at the outermost position means there is no
    // protocol payload worth decoding. Nested occurrences do not count.
    if line.contains("NLMSG_ERROR") && TOP_LEVEL_ERROR.is_match(line) {
        debug!("skipping top-level error notification");
        return None;
    }
    if line.to_lowercase().contains("unfinished") {
        return None;
    }
    if !line.contains("sendmsg") && !line.contains("recvmsg") {
        return None;
    }

    let caps = FIRST_IOV_HEADER
        .captures(line)
        .or_else(|| FIRST_IOV_HEADER_BRACED.captures(line))?;

    let declared_len: u32 = caps[1].parse().ok()?;
    let type_text = caps[2].trim();
    let seq: u32 = caps[4].parse().ok()?;

    let msg_type = resolve_envelope_type(type_text, target_family);
    if msg_type != u64::from(target_family) {
        debug!("filtered message of type {} (target {})", msg_type, target_family);
        return None;
    }

    let buf = reassemble(line);
    if buf.len() < 4 {
        return None;
    }

    let envelope = Envelope {
        declared_len,
        family: target_family,
        seq,
    };
    Some((envelope, buf))
}

/// Envelope-position type text: the family marker, or a hex literal.
fn resolve_envelope_type(type_text: &str, target_family: u16) -> u64 {
    if type_text.contains(FAMILY_MARKER) {
        return u64::from(target_family);
    }
    match HEX_LITERAL.captures(type_text) {
        Some(caps) => u64::from_str_radix(&caps[1], 16).unwrap_or(0),
        None => 0,
    }
}

/// Collect every segment on the line and concatenate them in source order.
fn reassemble(line: &str) -> Bytes {
    let mut segments: Vec<(usize, Segment<'_>)> = Vec::new();

    for m in HEX_SEGMENT.captures_iter(line) {
        let whole = m.get(0).unwrap();
        segments.push((whole.start(), Segment::Hex(m.get(1).unwrap().as_str())));
    }

    for m in FULL_SEGMENT.captures_iter(line) {
        let whole = m.get(0).unwrap();
        let fields = HeaderFields {
            len: m.get(1).unwrap().as_str(),
            type_text: m.get(2).unwrap().as_str(),
            flags_text: m.get(3).unwrap().as_str(),
            seq: m.get(4).unwrap().as_str(),
            pid: m.get(5).unwrap().as_str(),
        };
        let hex = m.get(6).unwrap().as_str();
        if fields.type_text.contains(FAMILY_MARKER) {
            // strace already consumed the header the envelope accounts for;
            // the hex is the generic header plus attributes
            segments.push((whole.start(), Segment::FamilyPayload(hex)));
        } else if whole.as_str().contains(FAMILY_MARKER) {
            continue;
        } else {
            segments.push((whole.start(), Segment::Full(fields, hex)));
        }
    }

    for m in HEADER_SEGMENT.captures_iter(line) {
        let whole = m.get(0).unwrap();
        if TRAILING_HEX_OPENS.is_match(&line[whole.end()..]) {
            continue;
        }
        if whole.as_str().contains(FAMILY_MARKER) {
            continue;
        }
        let fields = HeaderFields {
            len: m.get(1).unwrap().as_str(),
            type_text: m.get(2).unwrap().as_str(),
            flags_text: m.get(3).unwrap().as_str(),
            seq: m.get(4).unwrap().as_str(),
            pid: m.get(5).unwrap().as_str(),
        };
        segments.push((whole.start(), Segment::Header(fields)));
    }

    // Wire order is source-text order, not match order
    segments.sort_by_key(|(pos, _)| *pos);

    let mut buf = BytesMut::new();
    for (pos, segment) in segments {
        if let Err(err) = append_segment(&mut buf, &segment) {
            warn!("failed to rebuild segment at byte {}: {}", pos, err);
        }
    }
    buf.freeze()
}

fn append_segment(buf: &mut BytesMut, segment: &Segment<'_>) -> Result<(), String> {
    match segment {
        Segment::Hex(text) | Segment::FamilyPayload(text) => {
            buf.extend_from_slice(&decode_hex_escapes(text)?);
        }
        Segment::Full(fields, hex) => {
            append_header(buf, fields)?;
            buf.extend_from_slice(&decode_hex_escapes(hex)?);
        }
        Segment::Header(fields) => {
            append_header(buf, fields)?;
        }
    }
    Ok(())
}

/// Re-serialise a decoded header annotation into its 16-byte wire layout.
fn append_header(buf: &mut BytesMut, fields: &HeaderFields<'_>) -> Result<(), String> {
    let len: u32 = fields
        .len
        .parse()
        .map_err(|_| format!("bad len field {:?}", fields.len))?;
    let type_val = u16::try_from(parse_nlmsg_type(fields.type_text))
        .map_err(|_| format!("type field {:?} out of range", fields.type_text))?;
    let flags = parse_nlm_flags(fields.flags_text)
        .ok_or_else(|| format!("bad flags field {:?}", fields.flags_text))
        .and_then(|v| {
            u16::try_from(v).map_err(|_| format!("flags field {:?} out of range", fields.flags_text))
        })?;
    let seq: u32 = fields
        .seq
        .parse()
        .map_err(|_| format!("bad seq field {:?}", fields.seq))?;
    let pid: u32 = fields
        .pid
        .parse()
        .map_err(|_| format!("bad pid field {:?}", fields.pid))?;

    buf.put_u32_ne(len);
    buf.put_u16_ne(type_val);
    buf.put_u16_ne(flags);
    buf.put_u32_ne(seq);
    buf.put_u32_ne(pid);
    Ok(())
}

/// Turn `\x68\x65...` capture text into bytes.
fn decode_hex_escapes(text: &str) -> Result<Vec<u8>, String> {
    let stripped = text.replace("\\x", "");
    hex::decode(&stripped).map_err(|err| format!("bad hex escape sequence: {}", err))
}

/// Resolve a captured `type=` field to its numeric value.
///
/// Accepts the overrun marker, a literal annotated with an unresolved-name
/// comment, and bare hex or decimal text. Anything else resolves to 0.
pub fn parse_nlmsg_type(text: &str) -> u64 {
    let text = text.trim();

    if text == "NLMSG_OVERRUN" {
        return 4;
    }

    // e.g. "0x7 /* NLMSG_??? */" from strace's unresolved-type comments
    if text.contains("NLMSG_???") || text.contains("GENERIC_FAMILY_???") {
        if let Some(caps) = LEADING_LITERAL.captures(text) {
            return parse_literal(&caps[1]);
        }
    }

    if text.starts_with("0x") {
        if let Some(caps) = LEADING_LITERAL.captures(text) {
            return parse_literal(&caps[1]);
        }
    }

    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().unwrap_or(0);
    }

    0
}

/// Resolve a captured `flags=` field: a bare literal, or a `|`-joined mixture
/// of symbolic names and literals. Unrecognized symbols in the mixture are
/// ignored; a literal that fails to parse yields `None`, and the caller drops
/// the segment it belongs to.
pub fn parse_nlm_flags(text: &str) -> Option<u64> {
    let text = text.trim();

    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().ok();
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).ok();
    }

    let mut total = 0u64;
    for part in text.split('|') {
        let part = part.trim();
        if let Some((_, bits)) = NLM_FLAGS.iter().find(|(name, _)| *name == part) {
            total |= u64::from(*bits);
        } else if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            total |= part.parse::<u64>().ok()?;
        } else if let Some(hex) = part.strip_prefix("0x") {
            total |= u64::from_str_radix(hex, 16).ok()?;
        }
    }
    Some(total)
}

fn parse_literal(text: &str) -> u64 {
    match text.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).unwrap_or(0),
        None => text.parse().unwrap_or(0),
    }
}
