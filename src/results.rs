use crate::display::DisplayRecord;
use anyhow::{Context, Result};
use console::{style, Style};

/// Helper: coloured keys so the panels are easy to scan.
fn key(s: &str) -> console::StyledObject<&str> {
  style(s).bold().cyan()
}

fn header_line(title: &str, emoji: &str) -> String {
  format!(
    "\n{} {}",
    style(emoji).bold(),
    Style::new().bold().underlined().apply_to(title)
  )
}

/// Helper: print a section header ("📍 Location") once.
fn header(title: &str, emoji: &str) {
  println!("{}", header_line(title, emoji));
}

/// `value (code)`, or just `value` when the code is unknown.
fn with_code(value: &str, code: &str) -> String {
  if code.is_empty() {
    value.to_string()
  } else {
    format!("{value} ({code})")
  }
}

fn print_location(r: &DisplayRecord) {
  header("Location", "📍");
  println!("  {} {}", key("IP:"), style(&r.ip).bold());
  println!(
    "  {} {}",
    key("Continent:"),
    with_code(&r.continent, &r.continent_code)
  );
  println!(
    "  {} {}",
    key("Country:"),
    with_code(&r.country, &r.country_code)
  );
  println!("  {} {}", key("Region:"), r.region_name);
  println!("  {} {}", key("City:"), r.city);
  if let Some(district) = &r.district {
    println!("  {} {}", key("District:"), district);
  }
  if !r.zip.is_empty() {
    println!("  {} {}", key("Postal Code:"), r.zip);
  }
}

fn print_network(r: &DisplayRecord) {
  header("Network", "📡");
  println!("  {} {}", key("ISP:"), r.isp);
  println!("  {} {}", key("Organization:"), r.org);
  println!("  {} {}", key("AS Number:"), r.as_number);
  println!("  {} {}", key("AS Name:"), r.as_name);
  if let Some(reverse) = &r.reverse {
    println!("  {} {}", key("Reverse DNS:"), reverse);
  }
  println!("  {} {}", key("Timezone:"), r.timezone);
  println!("  {} {}h", key("UTC Offset:"), r.offset_hours());
  println!("  {} {}", key("Currency:"), r.currency);
}

fn print_security(r: &DisplayRecord) {
  header("Security & Connection Type", "🛡️");
  println!(
    "  {} {}",
    key("Proxy:"),
    if r.proxy {
      style("Detected").red().bold()
    } else {
      style("No").green()
    }
  );
  println!(
    "  {} {}",
    key("Mobile:"),
    if r.mobile {
      style("Yes").yellow()
    } else {
      style("No").dim()
    }
  );
  println!(
    "  {} {}",
    key("Hosting:"),
    if r.hosting {
      style("Datacenter/Hosting").yellow()
    } else {
      style("Residential").dim()
    }
  );
}

fn print_coordinates(r: &DisplayRecord) {
  header("Coordinates", "🗺️");
  println!("  {} {:.6}°", key("Latitude:"), r.latitude);
  println!("  {} {:.6}°", key("Longitude:"), r.longitude);
  println!("  {} {}", key("Map:"), style(r.map_url()).underlined());
}

pub fn print_human_readable(record: &DisplayRecord) {
  println!(
    "{} {}",
    style("•").magenta(),
    Style::new()
      .bold()
      .magenta()
      .apply_to(format!("Lookup Results for: {}", &record.ip))
  );

  print_location(record);
  print_network(record);
  print_security(record);
  print_coordinates(record);
}

/// Writes the failure to stderr, header included, so stdout stays empty.
pub fn print_error(message: &str) {
  eprintln!("{}", header_line("Lookup Failed", "❌"));
  eprintln!("  {}", style(message).red().bold());
}

pub fn print_json(record: &DisplayRecord) -> Result<()> {
  serde_json::to_string_pretty(record)
    .map(|s| println!("{s}"))
    .context("Failed to serialize result to JSON")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_with_code() {
    assert_eq!(with_code("United States", "US"), "United States (US)");
    assert_eq!(with_code("NA", ""), "NA");
  }

  #[test]
  fn test_header_line() {
    let line = header_line("Lookup Failed", "❌");
    assert_eq!(console::strip_ansi_codes(&line), "\n❌ Lookup Failed");
  }
}
