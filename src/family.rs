//! Generic Netlink Family Lookup
//!
//! The gtp5g family id is assigned dynamically by the kernel, so at startup
//! the decoder asks the host's `genl` control utility for it. Failure here is
//! never fatal: the caller falls back to [`crate::DEFAULT_FAMILY_ID`] with a
//! warning.

use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FamilyLookupError {
    #[error("failed to run genl: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("genl exited with {0}")]
    CommandFailed(std::process::ExitStatus),
    #[error("gtp5g family not present in genl output")]
    NotFound,
}

static ID_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ID:\s+(0x[0-9a-fA-F]+)").unwrap());

static INLINE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Name:\s+gtp5g\s+ID:\s+(0x[0-9a-fA-F]+)").unwrap());

/// Query the host registry for the gtp5g family id.
pub fn detect_family_id() -> Result<u16, FamilyLookupError> {
    let output = Command::new("genl")
        .args(["ctrl", "list", "name", "gtp5g"])
        .output()?;
    if !output.status.success() {
        return Err(FamilyLookupError::CommandFailed(output.status));
    }
    let text = String::from_utf8_lossy(&output.stdout);
    parse_family_listing(&text).ok_or(FamilyLookupError::NotFound)
}

/// Find the gtp5g entry in `genl ctrl list` output.
///
/// The listing puts `ID:` on a line following `Name: gtp5g`; scanning stops
/// at the next `Name:` entry so another family's id is never picked up. Some
/// genl builds emit both on one line, handled by the fallback pattern.
fn parse_family_listing(text: &str) -> Option<u16> {
    let mut in_entry = false;
    for line in text.lines() {
        if line.contains("Name: gtp5g") {
            in_entry = true;
            continue;
        }
        if in_entry {
            if let Some(caps) = ID_FIELD.captures(line) {
                if let Some(id) = parse_hex_id(&caps[1]) {
                    return Some(id);
                }
            }
            if line.contains("Name:") {
                break;
            }
        }
    }

    let caps = INLINE_ENTRY.captures(text)?;
    parse_hex_id(&caps[1])
}

fn parse_hex_id(text: &str) -> Option<u16> {
    let hex = text.strip_prefix("0x")?;
    u16::from_str_radix(hex, 16).ok()
}
