//! Typed Value Decoding
//!
//! Leaf attribute payloads carry no type information on the wire beyond
//! their context-relative code, so the wire category of each attribute is
//! fixed by its symbolic name. Classification is ordered and first-match-wins:
//! address-like names first, then the 64-bit identifier/counter families,
//! then the explicit 32/16/8-bit scalar lists, then strings.
//!
//! Decoding never fails. A payload shorter than its category's width, or a
//! name with no category at all, degrades to a raw hex rendering of the
//! payload bytes (`0x...`, or `(empty)` for a zero-length payload). This is
//! what keeps the pipeline alive on truncated or unknown-revision captures.

use std::fmt;
use std::net::Ipv4Addr;

use log::warn;

/// A decoded leaf attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Unsigned(u64),
    /// Dotted-decimal rendering, bytes in transmitted order.
    Ipv4(Ipv4Addr),
    Text(String),
    /// Inclusive port ranges; a degenerate range prints as a single port.
    PortRanges(Vec<(u16, u16)>),
    /// Raw payload kept verbatim when no typed decoding applies.
    Opaque(Vec<u8>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Unsigned(v) => write!(f, "{}", v),
            AttrValue::Ipv4(addr) => write!(f, "{}", addr),
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::PortRanges(ranges) => {
                if ranges.is_empty() {
                    return write!(f, "(none)");
                }
                for (i, (lo, hi)) in ranges.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if lo == hi {
                        write!(f, "{}", lo)?;
                    } else {
                        write!(f, "{}-{}", lo, hi)?;
                    }
                }
                Ok(())
            }
            AttrValue::Opaque(data) => {
                if data.is_empty() {
                    write!(f, "(empty)")
                } else {
                    write!(f, "0x{}", hex::encode(data))
                }
            }
        }
    }
}

/// Wire category of a leaf attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Ipv4,
    U64,
    /// 64-bit counter with a 32-bit legacy fallback.
    Volume,
    U32,
    /// Big-endian 32-bit value rendered dotted-decimal.
    NetMask,
    PortRange,
    U16,
    U8,
    Utf8,
    /// No typed decoding known; hex fallback only.
    Opaque,
}

const VOLUME_NAMES: &[&str] = &[
    "GTP5G_URR_VOLUME_THRESHOLD_TOVOL",
    "GTP5G_URR_VOLUME_THRESHOLD_UVOL",
    "GTP5G_URR_VOLUME_THRESHOLD_DVOL",
    "GTP5G_URR_VOLUME_QUOTA_TOVOL",
    "GTP5G_URR_VOLUME_QUOTA_UVOL",
    "GTP5G_URR_VOLUME_QUOTA_DVOL",
    "GTP5G_UR_VOLUME_MEASUREMENT_TOVOL",
    "GTP5G_UR_VOLUME_MEASUREMENT_UVOL",
    "GTP5G_UR_VOLUME_MEASUREMENT_DVOL",
    "GTP5G_UR_VOLUME_MEASUREMENT_TOPACKET",
    "GTP5G_UR_VOLUME_MEASUREMENT_UPACKET",
    "GTP5G_UR_VOLUME_MEASUREMENT_DPACKET",
];

const U32_NAMES: &[&str] = &[
    "GTP5G_LINK",
    "GTP5G_NET_NS_FD",
    "GTP5G_FAR_ID",
    "GTP5G_QER_ID",
    "GTP5G_QER_CORR_ID",
    "GTP5G_PDR_FAR_ID",
    "GTP5G_PDR_QER_ID",
    "GTP5G_PDR_URR_ID",
    "GTP5G_URR_ID",
    "GTP5G_URR_MEASUREMENT_METHOD",
    "GTP5G_URR_REPORTING_TRIGGER",
    "GTP5G_URR_MEASUREMENT_PERIOD",
    "GTP5G_URR_NUM",
    "GTP5G_PDR_PRECEDENCE",
    "GTP5G_F_TEID_I_TEID",
    "GTP5G_OUTER_HEADER_CREATION_O_TEID",
    "GTP5G_SDF_FILTER_SECURITY_PARAMETER_INDEX",
    "GTP5G_SDF_FILTER_FLOW_LABEL",
    "GTP5G_SDF_FILTER_SDF_FILTER_ID",
    "GTP5G_UR_URRID",
    "GTP5G_UR_URSEQN",
    "GTP5G_UR_QUERY_URR_REFERENCE",
    "GTP5G_UR_USAGE_REPORT_TRIGGER",
    "GTP5G_QER_MBR_UL_HIGH32",
    "GTP5G_QER_MBR_DL_HIGH32",
    "GTP5G_QER_GBR_UL_HIGH32",
    "GTP5G_QER_GBR_DL_HIGH32",
];

const MASK_NAMES: &[&str] = &[
    "GTP5G_FLOW_DESCRIPTION_SRC_MASK",
    "GTP5G_FLOW_DESCRIPTION_DEST_MASK",
];

const PORT_RANGE_NAMES: &[&str] = &[
    "GTP5G_FLOW_DESCRIPTION_SRC_PORT",
    "GTP5G_FLOW_DESCRIPTION_DEST_PORT",
];

const U16_NAMES: &[&str] = &[
    "GTP5G_PDR_ID",
    "GTP5G_FAR_RELATED_TO_PDR",
    "GTP5G_QER_RELATED_TO_PDR",
    "GTP5G_URR_RELATED_TO_PDR",
    "GTP5G_OUTER_HEADER_CREATION_PORT",
    "GTP5G_OUTER_HEADER_CREATION_DESCRIPTION",
    "GTP5G_SDF_FILTER_TOS_TRAFFIC_CLASS",
    "GTP5G_BUFFERING_PACKETS_COUNT",
    "GTP5G_FAR_APPLY_ACTION",
];

const U8_NAMES: &[&str] = &[
    "GTP5G_OUTER_HEADER_REMOVAL",
    "GTP5G_PDI_SRC_INTF",
    "GTP5G_QER_GATE",
    "GTP5G_BAR_ID",
    "GTP5G_QER_RQI",
    "GTP5G_QER_QFI",
    "GTP5G_QER_PPI",
    "GTP5G_QER_RCSR",
    "GTP5G_URR_MEASUREMENT_INFO",
    "GTP5G_DOWNLINK_DATA_NOTIFICATION_DELAY",
    "GTP5G_QER_MBR_UL_LOW8",
    "GTP5G_QER_MBR_DL_LOW8",
    "GTP5G_QER_GBR_UL_LOW8",
    "GTP5G_QER_GBR_DL_LOW8",
    "GTP5G_FORWARDING_PARAMETER_PFCPSM_REQ_FLAGS",
    "GTP5G_FORWARDING_PARAMETER_TOS_TC",
    "GTP5G_UR_VOLUME_MEASUREMENT_FLAGS",
    "GTP5G_URR_VOLUME_THRESHOLD_FLAG",
    "GTP5G_URR_VOLUME_QUOTA_FLAG",
    "GTP5G_FLOW_DESCRIPTION_ACTION",
    "GTP5G_FLOW_DESCRIPTION_DIRECTION",
    "GTP5G_FLOW_DESCRIPTION_PROTOCOL",
];

const UTF8_NAMES: &[&str] = &[
    "GTP5G_PDR_UNIX_SOCKET_PATH",
    "GTP5G_FORWARDING_PARAMETER_FORWARDING_POLICY",
    "GTP5G_SDF_FILTER_FLOW_DESCRIPTION",
];

/// Classify a symbolic attribute name into its wire category.
pub fn wire_kind(name: &str) -> WireKind {
    if name.contains("IPV4") {
        return WireKind::Ipv4;
    }
    if name.contains("SEID") || name.contains("TIME") {
        return WireKind::U64;
    }
    if VOLUME_NAMES.contains(&name) {
        return WireKind::Volume;
    }
    if U32_NAMES.contains(&name) {
        return WireKind::U32;
    }
    if MASK_NAMES.contains(&name) {
        return WireKind::NetMask;
    }
    if PORT_RANGE_NAMES.contains(&name) {
        return WireKind::PortRange;
    }
    if U16_NAMES.contains(&name) {
        return WireKind::U16;
    }
    if U8_NAMES.contains(&name) {
        return WireKind::U8;
    }
    if UTF8_NAMES.contains(&name) {
        return WireKind::Utf8;
    }
    WireKind::Opaque
}

/// Decode a leaf payload according to its name's wire category.
pub fn decode_value(name: &str, data: &[u8]) -> AttrValue {
    match wire_kind(name) {
        WireKind::Ipv4 if data.len() >= 4 => {
            AttrValue::Ipv4(Ipv4Addr::new(data[0], data[1], data[2], data[3]))
        }
        WireKind::U64 if data.len() >= 8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&data[..8]);
            AttrValue::Unsigned(u64::from_ne_bytes(bytes))
        }
        WireKind::Volume if data.len() >= 8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&data[..8]);
            AttrValue::Unsigned(u64::from_ne_bytes(bytes))
        }
        // Legacy kernels report volumes as 32-bit
        WireKind::Volume if data.len() >= 4 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&data[..4]);
            AttrValue::Unsigned(u32::from_ne_bytes(bytes) as u64)
        }
        WireKind::U32 if data.len() >= 4 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&data[..4]);
            AttrValue::Unsigned(u32::from_ne_bytes(bytes) as u64)
        }
        // Network byte order, so the dotted quad follows the wire bytes directly
        WireKind::NetMask if data.len() >= 4 => {
            AttrValue::Ipv4(Ipv4Addr::new(data[0], data[1], data[2], data[3]))
        }
        WireKind::PortRange => {
            let ranges = data
                .chunks_exact(4)
                .map(|chunk| {
                    let mut bytes = [0u8; 4];
                    bytes.copy_from_slice(chunk);
                    let packed = u32::from_ne_bytes(bytes);
                    let first = (packed & 0xFFFF) as u16;
                    let second = (packed >> 16) as u16;
                    (first.min(second), first.max(second))
                })
                .collect();
            AttrValue::PortRanges(ranges)
        }
        WireKind::U16 if data.len() >= 2 => {
            AttrValue::Unsigned(u16::from_ne_bytes([data[0], data[1]]) as u64)
        }
        WireKind::U8 if !data.is_empty() => AttrValue::Unsigned(data[0] as u64),
        WireKind::Utf8 => {
            let text = utf8_ignoring_invalid(data);
            AttrValue::Text(text.trim_end_matches('\0').to_string())
        }
        WireKind::Opaque => AttrValue::Opaque(data.to_vec()),
        // Sized category without enough bytes: keep the raw payload instead
        kind => {
            warn!(
                "attribute {} too short for {:?} ({} bytes), keeping raw payload",
                name,
                kind,
                data.len()
            );
            AttrValue::Opaque(data.to_vec())
        }
    }
}

/// Decode UTF-8, dropping invalid byte sequences outright rather than
/// substituting replacement characters.
fn utf8_ignoring_invalid(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    let mut rest = data;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(err) => {
                let valid_len = err.valid_up_to();
                if let Ok(valid) = std::str::from_utf8(&rest[..valid_len]) {
                    out.push_str(valid);
                }
                // error_len is None only when the buffer ends mid-sequence
                let invalid_len = err.error_len().unwrap_or(rest.len() - valid_len);
                rest = &rest[valid_len + invalid_len..];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_decode() {
        let value = decode_value("GTP5G_PDI_UE_ADDR_IPV4", &[192, 168, 1, 1]);
        assert_eq!(value.to_string(), "192.168.1.1");
    }

    #[test]
    fn test_u64_seid() {
        let value = decode_value("GTP5G_PDR_SEID", &0x1122334455667788u64.to_ne_bytes());
        assert_eq!(value, AttrValue::Unsigned(0x1122334455667788));
    }

    #[test]
    fn test_volume_legacy_width() {
        let name = "GTP5G_URR_VOLUME_QUOTA_TOVOL";
        let wide = decode_value(name, &900u64.to_ne_bytes());
        assert_eq!(wide, AttrValue::Unsigned(900));
        // 4-byte legacy payloads still decode as integers
        let narrow = decode_value(name, &900u32.to_ne_bytes());
        assert_eq!(narrow, AttrValue::Unsigned(900));
    }

    #[test]
    fn test_u32_scalar() {
        let value = decode_value("GTP5G_LINK", &5u32.to_ne_bytes());
        assert_eq!(value, AttrValue::Unsigned(5));
    }

    #[test]
    fn test_netmask_renders_dotted() {
        let value = decode_value("GTP5G_FLOW_DESCRIPTION_SRC_MASK", &[255, 255, 255, 0]);
        assert_eq!(value.to_string(), "255.255.255.0");
    }

    #[test]
    fn test_u16_and_u8_scalars() {
        let value = decode_value("GTP5G_PDR_ID", &7u16.to_ne_bytes());
        assert_eq!(value, AttrValue::Unsigned(7));
        let value = decode_value("GTP5G_QER_QFI", &[9]);
        assert_eq!(value, AttrValue::Unsigned(9));
    }

    #[test]
    fn test_string_strips_trailing_nul() {
        let value = decode_value("GTP5G_PDR_UNIX_SOCKET_PATH", b"/tmp/free5gc_unix_sock\0\0");
        assert_eq!(value, AttrValue::Text("/tmp/free5gc_unix_sock".to_string()));
    }

    #[test]
    fn test_string_drops_invalid_bytes() {
        // Invalid bytes are ignored, not replaced with U+FFFD
        let value = decode_value("GTP5G_PDR_UNIX_SOCKET_PATH", b"/tmp/sock\xff\0");
        assert_eq!(value, AttrValue::Text("/tmp/sock".to_string()));

        // Also mid-string, and for truncated multi-byte sequences at the end
        let value = decode_value("GTP5G_SDF_FILTER_FLOW_DESCRIPTION", b"permit\xfe\xff out");
        assert_eq!(value, AttrValue::Text("permit out".to_string()));
        let value = decode_value("GTP5G_PDR_UNIX_SOCKET_PATH", b"/run/upf\xe2\x82");
        assert_eq!(value, AttrValue::Text("/run/upf".to_string()));
    }

    #[test]
    fn test_port_range_rendering() {
        let packed = ((2048u32) << 16) | 1024;
        let value = decode_value("GTP5G_FLOW_DESCRIPTION_SRC_PORT", &packed.to_ne_bytes());
        assert_eq!(value.to_string(), "1024-2048");

        // Equal halves collapse to a single port
        let packed = ((80u32) << 16) | 80;
        let value = decode_value("GTP5G_FLOW_DESCRIPTION_DEST_PORT", &packed.to_ne_bytes());
        assert_eq!(value.to_string(), "80");

        // Two units join with a comma
        let mut data = Vec::new();
        data.extend_from_slice(&(((443u32) << 16) | 443).to_ne_bytes());
        data.extend_from_slice(&(((9000u32) << 16) | 8000).to_ne_bytes());
        let value = decode_value("GTP5G_FLOW_DESCRIPTION_DEST_PORT", &data);
        assert_eq!(value.to_string(), "443,8000-9000");
    }

    #[test]
    fn test_empty_port_range_marker() {
        let value = decode_value("GTP5G_FLOW_DESCRIPTION_SRC_PORT", &[]);
        assert_eq!(value.to_string(), "(none)");
    }

    #[test]
    fn test_truncated_scalar_falls_back_to_hex() {
        let value = decode_value("GTP5G_FAR_ID", &[0xab, 0xcd]);
        assert_eq!(value, AttrValue::Opaque(vec![0xab, 0xcd]));
        assert_eq!(value.to_string(), "0xabcd");
    }

    #[test]
    fn test_unknown_name_empty_payload() {
        let value = decode_value("UNKNOWN_ATTR_77", &[]);
        assert_eq!(value.to_string(), "(empty)");
    }

    #[test]
    fn test_classification_precedence() {
        // IPV4 wins over any list membership
        assert_eq!(wire_kind("GTP5G_F_TEID_GTPU_ADDR_IPV4"), WireKind::Ipv4);
        // SEID/TIME substrings win before the scalar lists are consulted
        assert_eq!(wire_kind("GTP5G_UR_START_TIME"), WireKind::U64);
        assert_eq!(wire_kind("GTP5G_BAR_SEID"), WireKind::U64);
        assert_eq!(wire_kind("GTP5G_QER_GATE"), WireKind::U8);
        assert_eq!(wire_kind("UNKNOWN_ATTR_3"), WireKind::Opaque);
    }
}
