//! Private-range address predicates used by the SSRF policy
//!
//! The same blocklist is applied twice per request when private addresses
//! are forbidden: once against IP-literal hosts before DNS, and once
//! against every resolved address after DNS. The second pass is what stops
//! a public CNAME pointing at 169.254.169.254.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// True if `ip` falls in a range the SSRF policy blocks: loopback,
/// RFC 1918 private space, link-local (including the cloud metadata
/// endpoint) and their IPv6 equivalents.
#[must_use]
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => is_blocked_v6(v6),
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    match octets[0] {
        127 => true,                                    // 127.0.0.0/8
        10 => true,                                     // 10.0.0.0/8
        172 => (16..=31).contains(&octets[1]),          // 172.16.0.0/12
        192 => octets[1] == 168,                        // 192.168.0.0/16
        169 => octets[1] == 254,                        // 169.254.0.0/16
        _ => false,
    }
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    if ip == Ipv6Addr::LOCALHOST {
        return true;
    }
    // IPv4-mapped addresses inherit the IPv4 verdict.
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_v4(v4);
    }
    let segments = ip.segments();
    if segments[0] & 0xfe00 == 0xfc00 {
        return true; // fc00::/7 unique local
    }
    if segments[0] & 0xffc0 == 0xfe80 {
        return true; // fe80::/10 link-local
    }
    false
}

/// True if `host` names the loopback interface without being an IP
/// literal.
#[must_use]
pub fn is_localhost_name(host: &str) -> bool {
    let host = host.trim_end_matches('.');
    host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn blocks_private_and_loopback_ranges() {
        for addr in [
            "127.0.0.1",
            "127.255.255.254",
            "10.0.0.1",
            "10.255.0.1",
            "172.16.0.1",
            "172.31.255.1",
            "192.168.1.1",
            "169.254.169.254",
            "::1",
            "fc00::1",
            "fd12:3456::1",
            "fe80::1",
        ] {
            assert!(is_blocked_ip(ip(addr)), "{addr} should be blocked");
        }
    }

    #[test]
    fn allows_public_ranges() {
        for addr in [
            "1.1.1.1",
            "8.8.8.8",
            "93.184.216.34",
            "172.32.0.1",
            "172.15.0.1",
            "192.169.0.1",
            "2606:4700:4700::1111",
        ] {
            assert!(!is_blocked_ip(ip(addr)), "{addr} should be allowed");
        }
    }

    #[test]
    fn mapped_v4_inherits_verdict() {
        assert!(is_blocked_ip(ip("::ffff:192.168.0.1")));
        assert!(!is_blocked_ip(ip("::ffff:8.8.8.8")));
    }

    #[test]
    fn localhost_names() {
        assert!(is_localhost_name("localhost"));
        assert!(is_localhost_name("LOCALHOST"));
        assert!(is_localhost_name("app.localhost"));
        assert!(!is_localhost_name("localhost.example.com"));
    }
}
