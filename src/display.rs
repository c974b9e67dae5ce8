//! Display record built from an endpoint response.

use crate::client::LookupResponse;
use serde::Serialize;

/// Placeholder for text fields the endpoint left out.
pub const UNKNOWN: &str = "알 수 없음";

/// Fully populated lookup result, ready for rendering.
///
/// `mobile`, `proxy` and `hosting` are read when present, but the endpoint
/// does not currently send them, so in practice they are always `false`.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
  pub ip: String,
  pub city: String,
  /// Region code; empty when unknown.
  pub region: String,
  pub region_name: String,
  pub country: String,
  /// Empty when unknown.
  pub country_code: String,
  pub continent: String,
  /// Empty when unknown.
  pub continent_code: String,
  pub latitude: f64,
  pub longitude: f64,
  pub timezone: String,
  /// UTC offset in seconds.
  pub offset: i64,
  pub currency: String,
  pub isp: String,
  pub org: String,
  #[serde(rename = "as")]
  pub as_number: String,
  pub as_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reverse: Option<String>,
  pub mobile: bool,
  pub proxy: bool,
  pub hosting: bool,
  /// Empty when unknown.
  pub zip: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub district: Option<String>,
}

impl DisplayRecord {
  /// Google Maps link for the coordinates.
  #[must_use]
  pub fn map_url(&self) -> String {
    format!(
      "https://www.google.com/maps?q={},{}",
      self.latitude, self.longitude
    )
  }

  /// Offset as signed hours, e.g. `+9` or `-7`.
  #[must_use]
  pub fn offset_hours(&self) -> String {
    let hours = self.offset as f64 / 3600.0;
    if self.offset >= 0 {
      format!("+{hours}")
    } else {
      format!("{hours}")
    }
  }
}

/// An empty string counts as absent.
fn present(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

fn or_unknown(value: Option<String>) -> String {
  present(value).unwrap_or_else(|| UNKNOWN.to_string())
}

fn or_empty(value: Option<String>) -> String {
  present(value).unwrap_or_default()
}

/// Fills every absent field of `raw` with its default.
#[must_use]
pub fn normalize(raw: LookupResponse) -> DisplayRecord {
  let latitude = raw.lat.unwrap_or(0.0);
  let longitude = raw.lon.unwrap_or(0.0);

  DisplayRecord {
    ip: or_unknown(raw.query),
    city: or_unknown(raw.city),
    region: or_empty(raw.region),
    region_name: or_unknown(raw.region_name),
    country: or_unknown(raw.country),
    country_code: or_empty(raw.country_code),
    continent: or_unknown(raw.continent),
    continent_code: or_empty(raw.continent_code),
    latitude,
    longitude,
    timezone: or_unknown(raw.timezone),
    offset: raw.offset.unwrap_or(0),
    currency: or_unknown(raw.currency),
    isp: or_unknown(raw.isp),
    org: or_unknown(raw.org),
    as_number: or_unknown(raw.as_number),
    as_name: or_unknown(raw.asname),
    reverse: present(raw.reverse),
    mobile: raw.mobile.unwrap_or(false),
    proxy: raw.proxy.unwrap_or(false),
    hosting: raw.hosting.unwrap_or(false),
    zip: or_empty(raw.zip),
    district: present(raw.district),
  }
}
