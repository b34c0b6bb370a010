//! IP address classification
//!
//! Decides whether an address may be dialed. Only [`IpClassification::Public`]
//! is connectable; everything else blocks. IPv4-mapped IPv6 addresses are
//! classified as the IPv4 address they carry. Tunnel and translation forms
//! (IPv4-compatible, NAT64, 6to4) keep the embedded address's class when it
//! blocks and are otherwise reserved.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::warn;

/// Cloud instance-metadata endpoints (AWS/GCP/Azure, Alibaba)
const METADATA_IPV4: &[Ipv4Addr] = &[
    Ipv4Addr::new(169, 254, 169, 254),
    Ipv4Addr::new(100, 100, 100, 200),
];

/// AWS IPv6 metadata endpoint (fd00:ec2::254)
const METADATA_IPV6: Ipv6Addr = Ipv6Addr::new(0xfd00, 0x0ec2, 0, 0, 0, 0, 0, 0x0254);

/// Classification of an IP address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpClassification {
    /// Globally routable, safe to connect
    Public,
    /// RFC1918 and other private ranges
    Private,
    /// 127.0.0.0/8, ::1
    Loopback,
    /// 169.254.0.0/16, fe80::/10
    LinkLocal,
    /// IETF-reserved, documentation, unspecified, or unparsable
    Reserved,
    /// 224.0.0.0/4, ff00::/8
    Multicast,
    /// Cloud instance-metadata endpoint
    CloudMetadata,
}

impl IpClassification {
    /// True for every classification except [`IpClassification::Public`]
    pub fn is_blocking(self) -> bool {
        self != IpClassification::Public
    }
}

/// Classify an IP address
pub fn classify_ip(ip: IpAddr) -> IpClassification {
    match ip {
        IpAddr::V4(v4) => classify_ipv4(v4),
        IpAddr::V6(v6) => classify_ipv6(v6),
    }
}

/// Classify a textual IP address
///
/// Text that does not parse as an address is treated as blocking, never as
/// "not an IP".
pub fn classify_ip_str(ip: &str) -> IpClassification {
    match ip.parse::<IpAddr>() {
        Ok(addr) => classify_ip(addr),
        Err(_) => {
            warn!(ip, "Invalid IP address, treating as blocked");
            IpClassification::Reserved
        }
    }
}

/// Returns true if the textual address must not be connected to
pub fn is_blocked_ip(ip: &str) -> bool {
    classify_ip_str(ip).is_blocking()
}

fn classify_ipv4(ip: Ipv4Addr) -> IpClassification {
    let o = ip.octets();

    if METADATA_IPV4.contains(&ip) {
        return IpClassification::CloudMetadata;
    }

    if ip.is_loopback() {
        return IpClassification::Loopback;
    }

    // 10/8, 172.16/12, 192.168/16, plus shared address space 100.64/10
    if ip.is_private() || (o[0] == 100 && (o[1] & 0xc0) == 64) {
        return IpClassification::Private;
    }

    if ip.is_link_local() {
        return IpClassification::LinkLocal;
    }

    if ip.is_multicast() {
        return IpClassification::Multicast;
    }

    // 0/8, 192.0.0/24, TEST-NET-1/2/3, 198.18/15, 240/4 and broadcast
    if o[0] == 0
        || (o[0] == 192 && o[1] == 0 && o[2] == 0)
        || ip.is_documentation()
        || (o[0] == 198 && (o[1] & 0xfe) == 18)
        || o[0] >= 240
    {
        return IpClassification::Reserved;
    }

    IpClassification::Public
}

fn classify_ipv6(ip: Ipv6Addr) -> IpClassification {
    let s = ip.segments();

    if ip.is_loopback() {
        return IpClassification::Loopback;
    }

    if ip.is_unspecified() {
        return IpClassification::Reserved;
    }

    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_ipv4(v4);
    }

    if let Some(v4) = tunneled_ipv4(ip) {
        return match classify_ipv4(v4) {
            IpClassification::Public => IpClassification::Reserved,
            class => class,
        };
    }

    if ip == METADATA_IPV6 {
        return IpClassification::CloudMetadata;
    }

    // fc00::/7 unique local
    if (s[0] & 0xfe00) == 0xfc00 {
        return IpClassification::Private;
    }

    // fe80::/10
    if (s[0] & 0xffc0) == 0xfe80 {
        return IpClassification::LinkLocal;
    }

    if ip.is_multicast() {
        return IpClassification::Multicast;
    }

    // Only 2000::/3 is allocated as global unicast
    if (s[0] & 0xe000) != 0x2000 {
        return IpClassification::Reserved;
    }

    // 2001:db8::/32 documentation, 2001::/23 IETF protocol assignments
    if (s[0] == 0x2001 && s[1] == 0x0db8) || (s[0] == 0x2001 && s[1] < 0x0200) {
        return IpClassification::Reserved;
    }

    IpClassification::Public
}

/// IPv4 address carried by a tunnel or translation prefix, if any
///
/// Covers deprecated IPv4-compatible (`::a.b.c.d`), the NAT64 well-known
/// prefix (`64:ff9b::/96`) and 6to4 (`2002:aabb:ccdd::/48`).
fn tunneled_ipv4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    let s = ip.segments();
    let from_segments = |hi: u16, lo: u16| {
        Ipv4Addr::new((hi >> 8) as u8, hi as u8, (lo >> 8) as u8, lo as u8)
    };

    // :: and ::1 are handled by the caller
    if s[0..6] == [0, 0, 0, 0, 0, 0] || s[0..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        return Some(from_segments(s[6], s[7]));
    }

    if s[0] == 0x2002 {
        return Some(from_segments(s[1], s[2]));
    }

    None
}
