//! Shape checks applied before any network call.
//!
//! These are textual checks only. `999.999.999.999` passes and is left for
//! the provider to reject; IPv6 input must spell out all eight groups, so
//! compressed forms such as `::1` are refused.

use regex::Regex;
use std::sync::LazyLock;

static RE_IPV4_SHAPE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}$").unwrap());

static RE_IPV6_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^([0-9a-fA-F]{0,4}:){7}[0-9a-fA-F]{0,4}$").unwrap()
});

#[must_use]
pub fn is_ipv4_shape(input: &str) -> bool {
  RE_IPV4_SHAPE.is_match(input)
}

#[must_use]
pub fn is_ipv6_shape(input: &str) -> bool {
  RE_IPV6_SHAPE.is_match(input)
}

/// True if `input` looks like an address worth sending to the endpoint.
#[must_use]
pub fn is_ip_shape(input: &str) -> bool {
  is_ipv4_shape(input) || is_ipv6_shape(input)
}
