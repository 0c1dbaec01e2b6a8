//! End-to-end decoding of captured strace lines through the public API.

use gtp5g_decode::{message, trace};

const FAMILY: u16 = 31;

fn hex_escape(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("\\x{:02x}", b)).collect()
}

fn nla(code: u16, payload: &[u8]) -> Vec<u8> {
    let len = 4 + payload.len();
    let mut out = Vec::new();
    out.extend_from_slice(&(len as u16).to_ne_bytes());
    out.extend_from_slice(&code.to_ne_bytes());
    out.extend_from_slice(payload);
    out.resize((len + 3) & !3, 0);
    out
}

#[test]
fn del_far_line_decodes_end_to_end() {
    // GenL header: DEL_FAR (5), version 1, then LINK=5 and FAR_ID=1
    let mut payload = vec![5u8, 1, 0, 0];
    payload.extend(nla(1, &5u32.to_ne_bytes()));
    payload.extend(nla(3, &1u32.to_ne_bytes()));

    let line = format!(
        "sendmsg(3, {{msg_name={{sa_family=AF_NETLINK, nl_pid=0, nl_groups=00000000}}, msg_namelen=12, \
         msg_iov=[{{iov_base={{{{len={}, type=gtp5g, flags=NLM_F_REQUEST|NLM_F_ACK, seq=2, pid=0}}, \"{}\"}}, \
         iov_len={}}}], msg_iovlen=1, msg_controllen=0, msg_flags=0}}, 0) = {}",
        16 + payload.len(),
        hex_escape(&payload),
        16 + payload.len(),
        16 + payload.len(),
    );

    let (envelope, buf) = trace::extract_message(&line, FAMILY).expect("line should decode");
    let decoded = message::decode(envelope, &buf).expect("payload should decode");
    let text = decoded.to_string();

    assert!(text.contains("GTP5G MESSAGE"));
    assert!(text.contains("FamilyID: 31"));
    assert!(text.contains("Command: GTP5G_CMD_DEL_FAR (v1)"));
    assert!(text.contains("GTP5G_LINK: 5\n"));
    assert!(text.contains("GTP5G_FAR_ID: 1\n"));
}

#[test]
fn add_pdr_with_nested_pdi_decodes_end_to_end() {
    // PDI holding the UE address and an F-TEID group
    let mut f_teid = nla(1, &1234u32.to_ne_bytes());
    f_teid.extend(nla(2, &[10, 200, 200, 102]));
    let mut pdi = nla(1, &[60, 60, 0, 1]);
    pdi.extend(nla(2 | 0x8000, &f_teid));

    let mut payload = vec![1u8, 1, 0, 0]; // ADD_PDR v1
    payload.extend(nla(3, &8u16.to_ne_bytes()));
    payload.extend(nla(5 | 0x8000, &pdi));

    let line = format!(
        "sendmsg(7, {{msg_name={{sa_family=AF_NETLINK, nl_pid=0, nl_groups=00000000}}, msg_namelen=12, \
         msg_iov=[{{iov_base={{{{len={}, type=gtp5g, flags=NLM_F_REQUEST|NLM_F_ACK, seq=11, pid=0}}, \"{}\"}}, \
         iov_len={}}}], msg_iovlen=1, msg_controllen=0, msg_flags=0}}, 0) = {}",
        16 + payload.len(),
        hex_escape(&payload),
        16 + payload.len(),
        16 + payload.len(),
    );

    let (envelope, buf) = trace::extract_message(&line, FAMILY).expect("line should decode");
    let decoded = message::decode(envelope, &buf).expect("payload should decode");
    let text = decoded.to_string();

    assert!(text.contains("Command: GTP5G_CMD_ADD_PDR (v1)"));
    assert!(text.contains("  GTP5G_PDR_ID: 8"));
    assert!(text.contains("  GTP5G_PDR_PDI:"));
    assert!(text.contains("    GTP5G_PDI_UE_ADDR_IPV4: 60.60.0.1"));
    assert!(text.contains("    GTP5G_PDI_F_TEID:"));
    assert!(text.contains("      GTP5G_F_TEID_I_TEID: 1234"));
    assert!(text.contains("      GTP5G_F_TEID_GTPU_ADDR_IPV4: 10.200.200.102"));
}

#[test]
fn foreign_family_produces_no_output() {
    let payload = vec![5u8, 1, 0, 0];
    let line = format!(
        "sendmsg(3, {{msg_iov=[{{iov_base={{{{len=20, type=0x10 /* NLMSG_??? */, flags=NLM_F_REQUEST, \
         seq=1, pid=0}}, \"{}\"}}, iov_len=20}}], msg_iovlen=1}}, 0) = 20",
        hex_escape(&payload),
    );
    assert!(trace::extract_message(&line, FAMILY).is_none());
}
