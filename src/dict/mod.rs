//! GTP5G Attribute Dictionary
//!
//! Static tables mapping numeric attribute type codes to symbolic names.
//! Codes are only meaningful relative to an [`AttrContext`]: the same code
//! carries a different name in the PDR group than in the FAR group, and the
//! nested sub-groups (PDI, F-TEID, SDF filter, ...) each reuse the code space
//! from 1 again. Resolution is therefore always `(context, code) -> name`,
//! never global.
//!
//! Everything in this module is pure data: unknown codes and commands resolve
//! to synthesized placeholder names so that decoding a newer or partially
//! unknown protocol revision still produces output.

use std::borrow::Cow;

/// Attribute-group context selecting which code table is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrContext {
    /// Header-level attributes shared by every command.
    Common,
    Pdr,
    Far,
    Qer,
    Urr,
    Bar,
    /// Usage report contents (`GTP5G_UR_*`).
    Report,
    MultiReport,
    UsageStatistic,
    Pdi,
    FTeid,
    SdfFilter,
    FlowDescription,
    ForwardingParameter,
    OuterHeaderCreation,
    QerMbr,
    QerGbr,
    VolumeThreshold,
    VolumeQuota,
    VolumeMeasurement,
    MultiSeidUrrId,
}

const COMMON_ATTRS: &[(u16, &str)] = &[(1, "GTP5G_LINK"), (2, "GTP5G_NET_NS_FD")];

const PDR_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_LINK"),
    (2, "GTP5G_NET_NS_FD"),
    (3, "GTP5G_PDR_ID"),
    (4, "GTP5G_PDR_PRECEDENCE"),
    (5, "GTP5G_PDR_PDI"),
    (6, "GTP5G_OUTER_HEADER_REMOVAL"),
    (7, "GTP5G_PDR_FAR_ID"),
    (8, "GTP5G_PDR_ROLE_ADDR_IPV4"),
    (9, "GTP5G_PDR_UNIX_SOCKET_PATH"),
    (10, "GTP5G_PDR_QER_ID"),
    (11, "GTP5G_PDR_SEID"),
    (12, "GTP5G_PDR_URR_ID"),
];

const FAR_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_LINK"),
    (2, "GTP5G_NET_NS_FD"),
    (3, "GTP5G_FAR_ID"),
    (4, "GTP5G_FAR_APPLY_ACTION"),
    (5, "GTP5G_FAR_FORWARDING_PARAMETER"),
    (6, "GTP5G_FAR_RELATED_TO_PDR"),
    (7, "GTP5G_FAR_SEID"),
    (8, "GTP5G_FAR_BAR_ID"),
];

const QER_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_LINK"),
    (2, "GTP5G_NET_NS_FD"),
    (3, "GTP5G_QER_ID"),
    (4, "GTP5G_QER_GATE"),
    (5, "GTP5G_QER_MBR"),
    (6, "GTP5G_QER_GBR"),
    (7, "GTP5G_QER_CORR_ID"),
    (8, "GTP5G_QER_RQI"),
    (9, "GTP5G_QER_QFI"),
    (10, "GTP5G_QER_PPI"),
    (11, "GTP5G_QER_RCSR"),
    (12, "GTP5G_QER_RELATED_TO_PDR"),
    (13, "GTP5G_QER_SEID"),
];

const URR_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_LINK"),
    (2, "GTP5G_NET_NS_FD"),
    (3, "GTP5G_URR_ID"),
    (4, "GTP5G_URR_MEASUREMENT_METHOD"),
    (5, "GTP5G_URR_REPORTING_TRIGGER"),
    (6, "GTP5G_URR_MEASUREMENT_PERIOD"),
    (7, "GTP5G_URR_MEASUREMENT_INFO"),
    (8, "GTP5G_URR_SEID"),
    (9, "GTP5G_URR_VOLUME_THRESHOLD"),
    (10, "GTP5G_URR_VOLUME_QUOTA"),
    (11, "GTP5G_URR_MULTI_SEID_URRID"),
    (12, "GTP5G_URR_NUM"),
    (13, "GTP5G_URR_RELATED_TO_PDR"),
];

const BAR_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_LINK"),
    (2, "GTP5G_NET_NS_FD"),
    (3, "GTP5G_BAR_ID"),
    (4, "GTP5G_DOWNLINK_DATA_NOTIFICATION_DELAY"),
    (5, "GTP5G_BUFFERING_PACKETS_COUNT"),
    (6, "GTP5G_BAR_SEID"),
];

const REPORT_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_LINK"),
    (2, "GTP5G_NET_NS_FD"),
    (3, "GTP5G_UR_URRID"),
    (4, "GTP5G_UR_USAGE_REPORT_TRIGGER"),
    (5, "GTP5G_UR_URSEQN"),
    (6, "GTP5G_UR_VOLUME_MEASUREMENT"),
    (7, "GTP5G_UR_QUERY_URR_REFERENCE"),
    (8, "GTP5G_UR_START_TIME"),
    (9, "GTP5G_UR_END_TIME"),
    (10, "GTP5G_UR_SEID"),
];

const MULTI_REPORT_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_LINK"),
    (2, "GTP5G_NET_NS_FD"),
    (5, "GTP5G_UR"),
    (11, "GTP5G_URR_MULTI_SEID_URRID"),
    (12, "GTP5G_URR_NUM"),
];

// Codes 1 and 2 shadow the common LINK/NET_NS_FD names in this group.
const USAGE_STATISTIC_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_USTAT_UL_VOL_RX"),
    (2, "GTP5G_USTAT_UL_VOL_TX"),
    (3, "GTP5G_USTAT_DL_VOL_RX"),
    (4, "GTP5G_USTAT_DL_VOL_TX"),
    (5, "GTP5G_USTAT_UL_PKT_RX"),
    (6, "GTP5G_USTAT_UL_PKT_TX"),
    (7, "GTP5G_USTAT_DL_PKT_RX"),
    (8, "GTP5G_USTAT_DL_PKT_TX"),
];

const PDI_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_PDI_UE_ADDR_IPV4"),
    (2, "GTP5G_PDI_F_TEID"),
    (3, "GTP5G_PDI_SDF_FILTER"),
    (4, "GTP5G_PDI_SRC_INTF"),
];

const F_TEID_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_F_TEID_I_TEID"),
    (2, "GTP5G_F_TEID_GTPU_ADDR_IPV4"),
];

const SDF_FILTER_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_SDF_FILTER_FLOW_DESCRIPTION"),
    (2, "GTP5G_SDF_FILTER_TOS_TRAFFIC_CLASS"),
    (3, "GTP5G_SDF_FILTER_SECURITY_PARAMETER_INDEX"),
    (4, "GTP5G_SDF_FILTER_FLOW_LABEL"),
    (5, "GTP5G_SDF_FILTER_SDF_FILTER_ID"),
];

const FLOW_DESCRIPTION_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_FLOW_DESCRIPTION_ACTION"),
    (2, "GTP5G_FLOW_DESCRIPTION_DIRECTION"),
    (3, "GTP5G_FLOW_DESCRIPTION_PROTOCOL"),
    (4, "GTP5G_FLOW_DESCRIPTION_SRC_IPV4"),
    (5, "GTP5G_FLOW_DESCRIPTION_SRC_MASK"),
    (6, "GTP5G_FLOW_DESCRIPTION_DEST_IPV4"),
    (7, "GTP5G_FLOW_DESCRIPTION_DEST_MASK"),
    (8, "GTP5G_FLOW_DESCRIPTION_SRC_PORT"),
    (9, "GTP5G_FLOW_DESCRIPTION_DEST_PORT"),
];

const FORWARDING_PARAMETER_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_FORWARDING_PARAMETER_OUTER_HEADER_CREATION"),
    (2, "GTP5G_FORWARDING_PARAMETER_FORWARDING_POLICY"),
    (3, "GTP5G_FORWARDING_PARAMETER_PFCPSM_REQ_FLAGS"),
    (4, "GTP5G_FORWARDING_PARAMETER_TOS_TC"),
];

const OUTER_HEADER_CREATION_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_OUTER_HEADER_CREATION_DESCRIPTION"),
    (2, "GTP5G_OUTER_HEADER_CREATION_O_TEID"),
    (3, "GTP5G_OUTER_HEADER_CREATION_PEER_ADDR_IPV4"),
    (4, "GTP5G_OUTER_HEADER_CREATION_PORT"),
];

const QER_MBR_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_QER_MBR_UL_HIGH32"),
    (2, "GTP5G_QER_MBR_UL_LOW8"),
    (3, "GTP5G_QER_MBR_DL_HIGH32"),
    (4, "GTP5G_QER_MBR_DL_LOW8"),
];

const QER_GBR_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_QER_GBR_UL_HIGH32"),
    (2, "GTP5G_QER_GBR_UL_LOW8"),
    (3, "GTP5G_QER_GBR_DL_HIGH32"),
    (4, "GTP5G_QER_GBR_DL_LOW8"),
];

const VOLUME_THRESHOLD_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_URR_VOLUME_THRESHOLD_FLAG"),
    (2, "GTP5G_URR_VOLUME_THRESHOLD_TOVOL"),
    (3, "GTP5G_URR_VOLUME_THRESHOLD_UVOL"),
    (4, "GTP5G_URR_VOLUME_THRESHOLD_DVOL"),
];

const VOLUME_QUOTA_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_URR_VOLUME_QUOTA_FLAG"),
    (2, "GTP5G_URR_VOLUME_QUOTA_TOVOL"),
    (3, "GTP5G_URR_VOLUME_QUOTA_UVOL"),
    (4, "GTP5G_URR_VOLUME_QUOTA_DVOL"),
];

const VOLUME_MEASUREMENT_ATTRS: &[(u16, &str)] = &[
    (1, "GTP5G_UR_VOLUME_MEASUREMENT_FLAGS"),
    (2, "GTP5G_UR_VOLUME_MEASUREMENT_TOVOL"),
    (3, "GTP5G_UR_VOLUME_MEASUREMENT_UVOL"),
    (4, "GTP5G_UR_VOLUME_MEASUREMENT_DVOL"),
    (5, "GTP5G_UR_VOLUME_MEASUREMENT_TOPACKET"),
    (6, "GTP5G_UR_VOLUME_MEASUREMENT_UPACKET"),
    (7, "GTP5G_UR_VOLUME_MEASUREMENT_DPACKET"),
];

const MULTI_SEID_URRID_ATTRS: &[(u16, &str)] = &[(3, "GTP5G_URR_ID"), (8, "GTP5G_URR_SEID")];

/// Which child context a nested attribute's payload is parsed with.
const NESTED_CONTEXTS: &[(&str, AttrContext)] = &[
    ("GTP5G_PDR_PDI", AttrContext::Pdi),
    ("GTP5G_PDI_F_TEID", AttrContext::FTeid),
    ("GTP5G_PDI_SDF_FILTER", AttrContext::SdfFilter),
    ("GTP5G_SDF_FILTER_FLOW_DESCRIPTION", AttrContext::FlowDescription),
    ("GTP5G_FAR_FORWARDING_PARAMETER", AttrContext::ForwardingParameter),
    (
        "GTP5G_FORWARDING_PARAMETER_OUTER_HEADER_CREATION",
        AttrContext::OuterHeaderCreation,
    ),
    ("GTP5G_QER_MBR", AttrContext::QerMbr),
    ("GTP5G_QER_GBR", AttrContext::QerGbr),
    ("GTP5G_URR_VOLUME_THRESHOLD", AttrContext::VolumeThreshold),
    ("GTP5G_URR_VOLUME_QUOTA", AttrContext::VolumeQuota),
    ("GTP5G_UR_VOLUME_MEASUREMENT", AttrContext::VolumeMeasurement),
    ("GTP5G_UR", AttrContext::Report),
    ("GTP5G_URR_MULTI_SEID_URRID", AttrContext::MultiSeidUrrId),
];

const COMMANDS: &[(u8, &str)] = &[
    (0, "GTP5G_CMD_UNSPEC"),
    (1, "GTP5G_CMD_ADD_PDR"),
    (2, "GTP5G_CMD_ADD_FAR"),
    (3, "GTP5G_CMD_ADD_QER"),
    (4, "GTP5G_CMD_DEL_PDR"),
    (5, "GTP5G_CMD_DEL_FAR"),
    (6, "GTP5G_CMD_DEL_QER"),
    (7, "GTP5G_CMD_GET_PDR"),
    (8, "GTP5G_CMD_GET_FAR"),
    (9, "GTP5G_CMD_GET_QER"),
    (10, "GTP5G_CMD_ADD_URR"),
    (11, "GTP5G_CMD_ADD_BAR"),
    (12, "GTP5G_CMD_DEL_URR"),
    (13, "GTP5G_CMD_DEL_BAR"),
    (14, "GTP5G_CMD_GET_URR"),
    (15, "GTP5G_CMD_GET_BAR"),
    (16, "GTP5G_CMD_GET_VERSION"),
    (17, "GTP5G_CMD_GET_REPORT"),
    (18, "GTP5G_CMD_BUFFER_GTPU"),
    (19, "GTP5G_CMD_GET_MULTI_REPORTS"),
    (20, "GTP5G_CMD_GET_USAGE_STATISTIC"),
];

impl AttrContext {
    fn table(self) -> &'static [(u16, &'static str)] {
        match self {
            AttrContext::Common => COMMON_ATTRS,
            AttrContext::Pdr => PDR_ATTRS,
            AttrContext::Far => FAR_ATTRS,
            AttrContext::Qer => QER_ATTRS,
            AttrContext::Urr => URR_ATTRS,
            AttrContext::Bar => BAR_ATTRS,
            AttrContext::Report => REPORT_ATTRS,
            AttrContext::MultiReport => MULTI_REPORT_ATTRS,
            AttrContext::UsageStatistic => USAGE_STATISTIC_ATTRS,
            AttrContext::Pdi => PDI_ATTRS,
            AttrContext::FTeid => F_TEID_ATTRS,
            AttrContext::SdfFilter => SDF_FILTER_ATTRS,
            AttrContext::FlowDescription => FLOW_DESCRIPTION_ATTRS,
            AttrContext::ForwardingParameter => FORWARDING_PARAMETER_ATTRS,
            AttrContext::OuterHeaderCreation => OUTER_HEADER_CREATION_ATTRS,
            AttrContext::QerMbr => QER_MBR_ATTRS,
            AttrContext::QerGbr => QER_GBR_ATTRS,
            AttrContext::VolumeThreshold => VOLUME_THRESHOLD_ATTRS,
            AttrContext::VolumeQuota => VOLUME_QUOTA_ATTRS,
            AttrContext::VolumeMeasurement => VOLUME_MEASUREMENT_ATTRS,
            AttrContext::MultiSeidUrrId => MULTI_SEID_URRID_ATTRS,
        }
    }

    /// Look up the symbolic name for a type code in this context.
    pub fn attr_name(self, code: u16) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
    }

    /// Resolve a type code to its symbolic name, synthesizing
    /// `UNKNOWN_ATTR_{code}` for codes this context does not define.
    pub fn resolve(self, code: u16) -> Cow<'static, str> {
        match self.attr_name(code) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("UNKNOWN_ATTR_{}", code)),
        }
    }
}

/// Child context for attributes whose payload is itself a TLV stream.
pub fn nested_context_for(name: &str) -> Option<AttrContext> {
    NESTED_CONTEXTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ctx)| *ctx)
}

/// Attribute context used to interpret a command's payload.
///
/// GET_REPORT requests carry URR_ID/URR_SEID, so they use the URR context;
/// unrecognized commands fall back to the common header fields.
pub fn context_for_command(cmd: u8) -> AttrContext {
    match cmd {
        1 | 4 | 7 => AttrContext::Pdr,
        2 | 5 | 8 => AttrContext::Far,
        3 | 6 | 9 => AttrContext::Qer,
        10 | 12 | 14 | 17 => AttrContext::Urr,
        11 | 13 | 15 => AttrContext::Bar,
        19 => AttrContext::MultiReport,
        20 => AttrContext::UsageStatistic,
        _ => AttrContext::Common,
    }
}

/// Symbolic name of a command code, or `UNKNOWN_CMD_{code}`.
pub fn command_name(cmd: u8) -> Cow<'static, str> {
    match COMMANDS.iter().find(|(c, _)| *c == cmd) {
        Some((_, name)) => Cow::Borrowed(*name),
        None => Cow::Owned(format!("UNKNOWN_CMD_{}", cmd)),
    }
}
