//! Address checks for storage endpoint discovery interfaces

use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Parse an interface address in CIDR notation, e.g. `10.21.200.5/24`
///
/// The host part may be set; only the notation is checked.
pub fn parse_cidr(address: &str) -> Result<Ipv4Net, String> {
    if !address.contains('/') {
        return Err("missing prefix length".to_string());
    }
    address
        .trim()
        .parse::<Ipv4Net>()
        .map_err(|e| e.to_string())
}

/// Parse a gateway address
pub fn parse_gateway(gateway: &str) -> Result<Ipv4Addr, String> {
    gateway
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| e.to_string())
}
