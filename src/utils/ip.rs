//! 客户端 IP 提取
//!
//! 访问去重与投票去重都以客户端 IP 为键，这里统一处理反向代理与测试覆盖。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use tracing::debug;

use crate::config::get_config;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            // IPv6 私有地址：
            // - fc00::/7 (ULA, RFC 4193): fc00::/8 + fd00::/8
            // - fe80::/10 (Link-local)
            // - ::1 (Loopback)
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7 (包含 fc00 和 fd00)
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10 (link-local)
        }
    }
}

/// 检查 IP 是否在可信代理列表中
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    // 先尝试解析为 SocketAddr（支持 ip:port），如果失败再尝试纯 IpAddr
    let ip_addr = if let Ok(socket_addr) = ip.parse::<SocketAddr>() {
        socket_addr.ip()
    } else if let Ok(ip_addr) = ip.parse::<IpAddr>() {
        ip_addr
    } else {
        return false;
    };

    for proxy in trusted_proxies {
        if proxy.contains('/') {
            // CIDR 格式（如 "192.168.1.0/24"）
            if ip_in_cidr(&ip_addr, proxy) {
                return true;
            }
        } else {
            // 单 IP
            if let Ok(proxy_addr) = proxy.parse::<IpAddr>()
                && ip_addr == proxy_addr
            {
                return true;
            }
        }
    }
    false
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false, // IPv4 vs IPv6 不匹配
    }
}

/// 无法确定客户端地址时使用的占位值
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// 根据对端地址与代理配置决定真实客户端 IP
///
/// 策略（按优先级）：
/// 1. 显式配置 trusted_proxies 且匹配 → 使用 X-Forwarded-For
/// 2. 未配置 trusted_proxies 且连接来自私有 IP → 视为反向代理，使用 X-Forwarded-For
/// 3. 默认 → 使用连接 IP
pub fn resolve_client_ip<F>(
    peer_ip: Option<&str>,
    trusted_proxies: &[String],
    get_forwarded_ip: F,
) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    let peer_ip = peer_ip?;

    if !trusted_proxies.is_empty() {
        if is_trusted_proxy(peer_ip, trusted_proxies) {
            let real_ip = get_forwarded_ip().unwrap_or_else(|| peer_ip.to_string());
            debug!("Trusted proxy (explicit): {} -> {}", peer_ip, real_ip);
            return Some(real_ip);
        }
        return Some(peer_ip.to_string());
    }

    if let Ok(ip_addr) = peer_ip.parse::<IpAddr>()
        && is_private_or_local(&ip_addr)
        && let Some(real_ip) = get_forwarded_ip()
    {
        debug!(
            "Auto-detect proxy (private IP {}): using X-Forwarded-For: {}",
            peer_ip, real_ip
        );
        return Some(real_ip);
    }

    Some(peer_ip.to_string())
}

/// 从 `fake_ip` 查询参数取值（仅 `server.allow_fake_ip` 开启时生效）
fn fake_ip_param(req: &HttpRequest) -> Option<String> {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "fake_ip")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// 从 HttpRequest 提取真实客户端 IP，无法确定时返回 `unknown`
pub fn client_ip(req: &HttpRequest) -> String {
    let server = &get_config().server;

    if server.allow_fake_ip
        && let Some(fake) = fake_ip_param(req)
    {
        debug!("Using fake_ip override: {}", fake);
        return fake;
    }

    let conn_info = req.connection_info();
    let peer = conn_info
        .peer_addr()
        .map(|addr| strip_port(addr).to_string());

    resolve_client_ip(peer.as_deref(), &server.trusted_proxies, || {
        extract_forwarded_ip_from_headers(req.headers())
    })
    .unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_string())
}

/// `ip:port` → `ip`（IPv6 形如 `[::1]:8080`）
fn strip_port(addr: &str) -> &str {
    if let Ok(socket) = addr.parse::<SocketAddr>() {
        return match socket {
            SocketAddr::V4(_) => addr.rsplit_once(':').map(|(ip, _)| ip).unwrap_or(addr),
            SocketAddr::V6(_) => addr
                .trim_start_matches('[')
                .rsplit_once("]:")
                .map(|(ip, _)| ip)
                .unwrap_or(addr),
        };
    }
    addr
}

/// 从请求头提取转发的 IP（X-Forwarded-For 首个地址，其次 X-Real-IP）
pub fn extract_forwarded_ip_from_headers(
    headers: &actix_web::http::header::HeaderMap,
) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(String::from)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_private_or_local_ipv4() {
        // 私有地址
        assert!(is_private_or_local(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"172.16.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"192.168.1.1".parse().unwrap()));
        // localhost
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        // 公网地址
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_or_local(&"1.1.1.1".parse().unwrap()));
    }

    #[test]
    fn test_is_private_or_local_ipv6() {
        // localhost
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        // ULA (fc00::/7)
        assert!(is_private_or_local(&"fd00::1".parse().unwrap()));
        assert!(is_private_or_local(&"fc00::1".parse().unwrap()));
        // Link-local (fe80::/10)
        assert!(is_private_or_local(&"fe80::1".parse().unwrap()));
        // 公网地址
        assert!(!is_private_or_local(
            &"2001:4860:4860::8888".parse().unwrap()
        ));
    }

    #[test]
    fn test_ip_in_cidr_ipv4() {
        let ip: IpAddr = "192.168.1.100".parse().unwrap();
        assert!(ip_in_cidr(&ip, "192.168.1.0/24"));
        assert!(ip_in_cidr(&ip, "192.168.0.0/16"));
        assert!(!ip_in_cidr(&ip, "192.168.2.0/24"));
        assert!(!ip_in_cidr(&ip, "10.0.0.0/8"));
    }

    #[test]
    fn test_ip_in_cidr_ipv6() {
        let ip: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(ip_in_cidr(&ip, "2001:db8::/32"));
        assert!(!ip_in_cidr(&ip, "2001:db9::/32"));
    }

    #[test]
    fn test_resolve_uses_forwarded_for_behind_private_peer() {
        let ip = resolve_client_ip(Some("127.0.0.1"), &[], || Some("200.1.2.3".to_string()));
        assert_eq!(ip.as_deref(), Some("200.1.2.3"));
    }

    #[test]
    fn test_resolve_ignores_forwarded_for_from_public_peer() {
        let ip = resolve_client_ip(Some("200.9.9.9"), &[], || Some("1.2.3.4".to_string()));
        assert_eq!(ip.as_deref(), Some("200.9.9.9"));
    }

    #[test]
    fn test_resolve_respects_explicit_proxy_list() {
        let proxies = vec!["10.0.0.0/8".to_string()];
        let via_proxy = resolve_client_ip(Some("10.1.1.1"), &proxies, || Some("5.6.7.8".into()));
        assert_eq!(via_proxy.as_deref(), Some("5.6.7.8"));

        let private_not_listed =
            resolve_client_ip(Some("192.168.0.2"), &proxies, || Some("5.6.7.8".into()));
        assert_eq!(private_not_listed.as_deref(), Some("192.168.0.2"));
    }

    #[test]
    fn test_resolve_without_peer() {
        assert_eq!(resolve_client_ip(None, &[], || None), None);
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("1.2.3.4:5555"), "1.2.3.4");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("1.2.3.4"), "1.2.3.4");
    }

    #[test]
    fn test_is_trusted_proxy() {
        let proxies = vec![
            "127.0.0.1".to_string(),
            "192.168.1.0/24".to_string(),
            "10.0.0.1".to_string(),
        ];

        assert!(is_trusted_proxy("127.0.0.1", &proxies));
        assert!(is_trusted_proxy("127.0.0.1:8080", &proxies));
        assert!(is_trusted_proxy("192.168.1.50", &proxies));
        assert!(is_trusted_proxy("10.0.0.1", &proxies));
        assert!(!is_trusted_proxy("8.8.8.8", &proxies));
        assert!(!is_trusted_proxy("192.168.2.1", &proxies));
    }
}
