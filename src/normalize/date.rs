//! `/Date(ms)/` conversion

use chrono::DateTime;
use regex::Regex;
use std::sync::LazyLock;

/// Output format of converted dates
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static ODATA_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/Date\((-?\d+)\)/$").expect("static regex"));

/// Convert an OData JSON date (`/Date(1583020800000)/`) to `YYYY-MM-DDTHH:MM:SSZ`
///
/// Returns `None` when the value does not match the pattern or the epoch
/// value is out of range.
pub fn convert_odata_date(value: &str) -> Option<String> {
    let millis: i64 = ODATA_DATE.captures(value)?.get(1)?.as_str().parse().ok()?;
    let timestamp = DateTime::from_timestamp_millis(millis)?;
    Some(timestamp.format(DATE_FORMAT).to_string())
}
