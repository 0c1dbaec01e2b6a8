//! Netlink TLV Attribute Parsing
//!
//! Walks a byte buffer as a stream of netlink attributes: a 4-byte header
//! (16-bit length including the header, 16-bit type) followed by the payload,
//! with each record padded out to a 4-byte boundary. Records whose resolved
//! name maps to a child context recurse with that context; type code 0 is a
//! transparent container whose contents are flattened into the current tree
//! with the *same* context.
//!
//! The walk is deliberately forgiving: a zero length is skipped, a length
//! that is short or overruns the remaining buffer ends the walk, and trailing
//! slack under one header is expected alignment residue. None of these are
//! errors.

use std::borrow::Cow;
use std::fmt;

use crate::dict::{nested_context_for, AttrContext};
use crate::value::{decode_value, AttrValue};

/// Attribute header: 16-bit length plus 16-bit type.
pub const NLA_HDR_LEN: usize = 4;

/// Mask clearing NLA_F_NESTED and NLA_F_NET_BYTEORDER from the type field.
pub const NLA_TYPE_MASK: u16 = 0x3FFF;

/// Length of a record including header, rounded up to the 4-byte boundary.
pub fn nla_align(len: usize) -> usize {
    (len + 3) & !3
}

/// One entry in a decoded tree: a leaf value or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrNode {
    Value(AttrValue),
    Tree(AttrTree),
}

/// Ordered name-to-node mapping mirroring wire order.
///
/// Re-inserting an existing name replaces its node in place, keeping the
/// position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrTree {
    entries: Vec<(Cow<'static, str>, AttrNode)>,
}

impl AttrTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, name: Cow<'static, str>, node: AttrNode) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = node,
            None => self.entries.push((name, node)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrNode> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrNode)> {
        self.entries.iter().map(|(n, node)| (n.as_ref(), node))
    }

    /// Fold another tree's entries into this one, last-wins per name.
    fn merge(&mut self, other: AttrTree) {
        for (name, node) in other.entries {
            self.insert(name, node);
        }
    }

    /// Indented rendering, two spaces per level starting at `indent + 1`.
    pub fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "  (empty)");
        }
        let prefix = "  ".repeat(indent + 1);
        let mut first = true;
        for (name, node) in self.iter() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            match node {
                AttrNode::Value(value) => write!(f, "{}{}: {}", prefix, name, value)?,
                AttrNode::Tree(tree) => {
                    writeln!(f, "{}{}:", prefix, name)?;
                    tree.write_indented(f, indent + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for AttrTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Parse a TLV attribute stream under the given context.
///
/// Always returns a tree; malformed regions degrade per the module rules
/// rather than erroring.
pub fn parse_attrs(data: &[u8], ctx: AttrContext) -> AttrTree {
    let mut attrs = AttrTree::new();
    let mut offset = 0usize;

    while offset + NLA_HDR_LEN <= data.len() {
        let nla_len = u16::from_ne_bytes([data[offset], data[offset + 1]]) as usize;
        let raw_type = u16::from_ne_bytes([data[offset + 2], data[offset + 3]]);

        // Degenerate record: skip the header and keep going
        if nla_len == 0 {
            offset += NLA_HDR_LEN;
            continue;
        }
        // Short or overrunning length means the rest is not valid attribute data
        if nla_len < NLA_HDR_LEN || nla_len > data.len() - offset {
            break;
        }

        let code = raw_type & NLA_TYPE_MASK;
        let payload = &data[offset + NLA_HDR_LEN..offset + nla_len];

        if code == 0 {
            // Transparent container: flatten into the current tree, same context
            attrs.merge(parse_attrs(payload, ctx));
        } else {
            let name = ctx.resolve(code);
            match nested_context_for(&name) {
                Some(child) => {
                    attrs.insert(name, AttrNode::Tree(parse_attrs(payload, child)));
                }
                None => {
                    let value = decode_value(&name, payload);
                    attrs.insert(name, AttrNode::Value(value));
                }
            }
        }

        offset += nla_align(nla_len);
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Encode one attribute record with alignment padding.
    fn nla(code: u16, payload: &[u8]) -> Vec<u8> {
        let len = NLA_HDR_LEN + payload.len();
        let mut out = Vec::with_capacity(nla_align(len));
        out.extend_from_slice(&(len as u16).to_ne_bytes());
        out.extend_from_slice(&code.to_ne_bytes());
        out.extend_from_slice(payload);
        out.resize(nla_align(len), 0);
        out
    }

    #[test]
    fn test_scalar_round_trip() {
        let mut buf = nla(1, &5u32.to_ne_bytes());
        buf.extend(nla(3, &1u32.to_ne_bytes()));
        let tree = parse_attrs(&buf, AttrContext::Far);

        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.get("GTP5G_LINK"),
            Some(&AttrNode::Value(AttrValue::Unsigned(5)))
        );
        assert_eq!(
            tree.get("GTP5G_FAR_ID"),
            Some(&AttrNode::Value(AttrValue::Unsigned(1)))
        );
    }

    #[test]
    fn test_ipv4_round_trip() {
        let buf = nla(1, &[192, 168, 1, 1]);
        let tree = parse_attrs(&buf, AttrContext::Pdi);
        let AttrNode::Value(v) = tree.get("GTP5G_PDI_UE_ADDR_IPV4").unwrap() else {
            panic!("expected leaf");
        };
        assert_eq!(v.to_string(), "192.168.1.1");
    }

    #[test]
    fn test_alignment_consumption() {
        // 5-byte payload: record length 9, padded stride 12
        let mut buf = nla(9, b"/tmp\0");
        assert_eq!(buf.len(), 12);
        buf.extend(nla(3, &77u16.to_ne_bytes()));
        let tree = parse_attrs(&buf, AttrContext::Pdr);

        assert_eq!(
            tree.get("GTP5G_PDR_UNIX_SOCKET_PATH"),
            Some(&AttrNode::Value(AttrValue::Text("/tmp".into())))
        );
        // The record after the padded one is still found
        assert_eq!(
            tree.get("GTP5G_PDR_ID"),
            Some(&AttrNode::Value(AttrValue::Unsigned(77)))
        );
    }

    #[test]
    fn test_nested_round_trip() {
        // PDI holding a single source-interface leaf, nested flag set
        let inner = nla(4, &[1]);
        let buf = nla(5 | 0x8000, &inner);
        let tree = parse_attrs(&buf, AttrContext::Pdr);

        let AttrNode::Tree(pdi) = tree.get("GTP5G_PDR_PDI").unwrap() else {
            panic!("expected nested tree");
        };
        assert_eq!(pdi.len(), 1);
        assert_eq!(
            pdi.get("GTP5G_PDI_SRC_INTF"),
            Some(&AttrNode::Value(AttrValue::Unsigned(1)))
        );
    }

    #[test]
    fn test_container_flattening() {
        // Type 0 wraps two FAR attributes; they land in the outer tree
        let mut body = nla(3, &9u32.to_ne_bytes());
        body.extend(nla(4, &2u16.to_ne_bytes()));
        let buf = nla(0, &body);
        let tree = parse_attrs(&buf, AttrContext::Far);

        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.get("GTP5G_FAR_ID"),
            Some(&AttrNode::Value(AttrValue::Unsigned(9)))
        );
        assert_eq!(
            tree.get("GTP5G_FAR_APPLY_ACTION"),
            Some(&AttrNode::Value(AttrValue::Unsigned(2)))
        );
    }

    #[test]
    fn test_zero_length_record_skipped() {
        let mut buf = vec![0, 0, 0, 0]; // length 0: advance 4 and continue
        buf.extend(nla(3, &1u32.to_ne_bytes()));
        let tree = parse_attrs(&buf, AttrContext::Far);
        assert_eq!(
            tree.get("GTP5G_FAR_ID"),
            Some(&AttrNode::Value(AttrValue::Unsigned(1)))
        );
    }

    #[test]
    fn test_overrunning_length_stops_walk() {
        let mut buf = nla(3, &1u32.to_ne_bytes());
        // Claims 200 bytes but only the header follows
        buf.extend_from_slice(&200u16.to_ne_bytes());
        buf.extend_from_slice(&4u16.to_ne_bytes());
        let tree = parse_attrs(&buf, AttrContext::Far);

        assert_eq!(tree.len(), 1);
        assert!(tree.get("GTP5G_FAR_ID").is_some());
    }

    #[test]
    fn test_trailing_slack_ignored() {
        let mut buf = nla(3, &1u32.to_ne_bytes());
        buf.extend_from_slice(&[0xaa, 0xbb]); // under one header
        let tree = parse_attrs(&buf, AttrContext::Far);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_unknown_code_gets_placeholder() {
        let buf = nla(99, &[0xde, 0xad]);
        let tree = parse_attrs(&buf, AttrContext::Far);
        assert_eq!(
            tree.get("UNKNOWN_ATTR_99"),
            Some(&AttrNode::Value(AttrValue::Opaque(vec![0xde, 0xad])))
        );
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let mut buf = nla(3, &1u32.to_ne_bytes());
        buf.extend(nla(4, &7u16.to_ne_bytes()));
        buf.extend(nla(3, &2u32.to_ne_bytes()));
        let tree = parse_attrs(&buf, AttrContext::Far);

        assert_eq!(
            tree.get("GTP5G_FAR_ID"),
            Some(&AttrNode::Value(AttrValue::Unsigned(2)))
        );
        // Position of the first occurrence is retained
        let names: Vec<&str> = tree.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["GTP5G_FAR_ID", "GTP5G_FAR_APPLY_ACTION"]);
    }

    #[test]
    fn test_three_level_nesting() {
        // PDR -> PDI -> SDF filter -> flow description
        let flow = nla(3, &[17]); // protocol
        let sdf = nla(1 | 0x8000, &flow);
        let pdi = nla(3 | 0x8000, &sdf);
        let buf = nla(5 | 0x8000, &pdi);
        let tree = parse_attrs(&buf, AttrContext::Pdr);

        let AttrNode::Tree(pdi) = tree.get("GTP5G_PDR_PDI").unwrap() else {
            panic!("expected PDI tree");
        };
        let AttrNode::Tree(sdf) = pdi.get("GTP5G_PDI_SDF_FILTER").unwrap() else {
            panic!("expected SDF tree");
        };
        let AttrNode::Tree(flow) = sdf.get("GTP5G_SDF_FILTER_FLOW_DESCRIPTION").unwrap() else {
            panic!("expected flow description tree");
        };
        assert_eq!(
            flow.get("GTP5G_FLOW_DESCRIPTION_PROTOCOL"),
            Some(&AttrNode::Value(AttrValue::Unsigned(17)))
        );
    }

    proptest! {
        // The walk terminates and never reads out of bounds for any input
        #[test]
        fn parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = parse_attrs(&data, AttrContext::Pdr);
        }
    }
}
