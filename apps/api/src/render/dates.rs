use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Literal rendered for an absent end date.
pub const PRESENT: &str = "Present";

/// Renders a `YYYY-MM-DD` value as `Jan 5, 2024`.
///
/// Absent, empty, or `"None"` input renders as `Present`. Anything that does
/// not parse is returned unchanged.
pub fn format_date(value: Option<&str>) -> String {
    let raw = match value.map(str::trim) {
        None | Some("") | Some("None") => return PRESENT.to_string(),
        Some(v) => v,
    };

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => render(date),
        Err(_) => raw.to_string(),
    }
}

/// Same as [`format_date`] for typed dates.
pub fn format_naive(date: Option<NaiveDate>) -> String {
    date.map(render).unwrap_or_else(|| PRESENT.to_string())
}

/// `{start} -- {end}`; an open end renders as `Present`.
pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    format!("{} -- {}", format_naive(start), format_naive(end))
}

fn render(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        MONTHS[date.month0() as usize],
        date.day(),
        date.year()
    )
}
