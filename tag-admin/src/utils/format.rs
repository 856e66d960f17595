//! Display helpers used by the templates. Missing values render as "—".

use chrono::{DateTime, Utc};

pub const PLACEHOLDER: &str = "—";

pub fn text(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

/// Rupee amount with two decimals and Indian digit grouping, e.g. `₹1,23,456.50`.
pub fn currency(value: Option<f64>) -> String {
    let Some(amount) = value.filter(|v| v.is_finite()) else {
        return PLACEHOLDER.to_string();
    };

    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    format!("{}₹{}.{}", sign, group_indian(whole), fraction)
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, last3) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{}", groups.join(","), last3)
}

pub fn percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.1}%", v),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.format("%d %b %Y").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn date_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.format("%d %b %Y, %H:%M UTC").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Capitalized status label, e.g. `activated` -> `Activated`.
pub fn label(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn currency_grouping() {
        assert_eq!(currency(Some(0.0)), "₹0.00");
        assert_eq!(currency(Some(999.5)), "₹999.50");
        assert_eq!(currency(Some(123456.5)), "₹1,23,456.50");
        assert_eq!(currency(Some(-1500.0)), "-₹1,500.00");
        assert_eq!(currency(None), PLACEHOLDER);
    }

    #[test]
    fn missing_values_use_placeholder() {
        assert_eq!(text(Some("  ")), PLACEHOLDER);
        assert_eq!(date(None), PLACEHOLDER);
        assert_eq!(percent(None), PLACEHOLDER);
    }

    #[test]
    fn dates_and_labels() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(date(Some(dt)), "01 Mar 2024");
        assert_eq!(label("pending"), "Pending");
    }
}
