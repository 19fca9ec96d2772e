//! IP 地址处理工具
//!
//! - 查询地址推导（黑名单 + 兜底公网地址）
//! - CIDR 起始地址编码
//! - 客户端 IP 提取（可信代理 / 私有 IP 自动检测）

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::dev::ConnectionInfo;
use tracing::debug;

use crate::errors::{Result, WeblocationError};

/// 无法解析或本地地址时使用的公网地址
pub const FALLBACK_ADDRESS: Ipv4Addr = Ipv4Addr::new(134, 122, 49, 115);

/// 视为"没有真实地址"的字面量
const BLACKLIST: [&str; 3] = ["localhost", "127.0.0.1", "0.0.0.0"];

/// 推导查询地址
///
/// 非 IPv4 字面量或黑名单地址替换为 `FALLBACK_ADDRESS`。
pub fn query_address(raw: &str) -> Ipv4Addr {
    let raw = raw.trim();
    // 兼容带端口的 peer 地址
    let host = raw
        .parse::<SocketAddr>()
        .map(|s| s.ip().to_string())
        .unwrap_or_else(|_| raw.to_string());

    if BLACKLIST.contains(&host.as_str()) {
        debug!("Blacklisted address '{}', using fallback", raw);
        return FALLBACK_ADDRESS;
    }

    match host.parse::<Ipv4Addr>() {
        Ok(addr) => addr,
        Err(_) => {
            debug!("'{}' is not an IPv4 address, using fallback", raw);
            FALLBACK_ADDRESS
        }
    }
}

/// 大端编码为 u32
pub fn encode(addr: Ipv4Addr) -> u32 {
    u32::from(addr)
}

/// 解析 CIDR，返回网络首地址（前缀长度丢弃）
///
/// IPv6 与格式错误的字面量返回 `MalformedRow`。
pub fn cidr_start(cidr: &str) -> Result<u32> {
    let Some((network, prefix_len)) = cidr.trim().split_once('/') else {
        return Err(WeblocationError::malformed_row(format!(
            "'{}' is not a CIDR literal",
            cidr
        )));
    };

    let prefix_len: u8 = prefix_len.parse().map_err(|_| {
        WeblocationError::malformed_row(format!("Invalid prefix length in '{}'", cidr))
    })?;
    if prefix_len > 32 {
        return Err(WeblocationError::malformed_row(format!(
            "Prefix length out of range in '{}'",
            cidr
        )));
    }

    let network: Ipv4Addr = network.parse().map_err(|_| {
        WeblocationError::malformed_row(format!("'{}' is not an IPv4 network", cidr))
    })?;

    let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
    Ok(encode(network) & mask)
}

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

/// 检查 IP 是否在可信代理列表中
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    let ip_addr = if let Ok(socket_addr) = ip.parse::<SocketAddr>() {
        socket_addr.ip()
    } else if let Ok(ip_addr) = ip.parse::<IpAddr>() {
        ip_addr
    } else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == ip_addr)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): std::result::Result<u8, _> = prefix_len.parse() else {
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
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 从 ConnectionInfo 提取真实客户端 IP
///
/// 策略（按优先级）：
/// 1. 配置了 trusted_proxies 且匹配 → X-Forwarded-For
/// 2. 配置了但不匹配 → 连接 IP
/// 3. 未配置且连接来自私有 IP → X-Forwarded-For（若存在）
/// 4. 默认 → 连接 IP
pub fn extract_client_ip_from_conn_info<F>(
    conn_info: &ConnectionInfo,
    trusted_proxies: &[String],
    get_forwarded_ip: F,
) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    let peer_ip = conn_info.peer_addr()?;

    if !trusted_proxies.is_empty() {
        if is_trusted_proxy(peer_ip, trusted_proxies) {
            let real_ip = get_forwarded_ip().unwrap_or_else(|| peer_ip.to_string());
            debug!("Trusted proxy (explicit): {} -> {}", peer_ip, real_ip);
            return Some(real_ip);
        }
        debug!(
            "Connection from {}, not in trusted_proxies, using peer IP",
            peer_ip
        );
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

/// 从 HttpRequest 提取真实客户端 IP
pub fn extract_client_ip(req: &HttpRequest, trusted_proxies: &[String]) -> Option<String> {
    extract_client_ip_from_conn_info(&req.connection_info(), trusted_proxies, || {
        extract_forwarded_ip_from_headers(req.headers())
    })
}

/// 从 HeaderMap 提取转发的 IP（X-Forwarded-For 第一项，其次 X-Real-IP）
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
                .map(|s| s.trim().to_string())
        })
}
