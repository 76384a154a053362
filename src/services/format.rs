use chrono::{Datelike, NaiveDate};

/// Formats a runtime in minutes as `"Xh Ym"`
pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Year of a catalog release date, or 0 when it can't be read
pub fn year_from_date(date: &str) -> i32 {
    let date = date.trim();
    if date.is_empty() {
        return 0;
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return parsed.year();
    }

    // Partial dates such as "1994" or "1994-09"
    let (Some(year), Some(rest)) = (date.get(..4), date.get(4..)) else {
        return 0;
    };
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }

    let month_ok = match rest.strip_prefix('-') {
        _ if rest.is_empty() => true,
        Some(month) => {
            month.len() == 2
                && month.bytes().all(|b| b.is_ascii_digit())
                && matches!(month.parse::<u32>(), Ok(1..=12))
        }
        None => false,
    };

    if month_ok {
        year.parse().unwrap_or(0)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(142), "2h 22m");
        assert_eq!(format_runtime(45), "0h 45m");
        assert_eq!(format_runtime(120), "2h 0m");
        assert_eq!(format_runtime(0), "0h 0m");
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date("1994-09-10"), 1994);
        assert_eq!(year_from_date(""), 0);
        assert_eq!(year_from_date("   "), 0);
        assert_eq!(year_from_date("not a date"), 0);
    }

    #[test]
    fn test_year_from_partial_date() {
        assert_eq!(year_from_date("2024"), 2024);
        assert_eq!(year_from_date("2024-05"), 2024);
        assert_eq!(year_from_date("20245"), 0);
        assert_eq!(year_from_date("2024-13"), 0);
        assert_eq!(year_from_date("2024-5"), 0);
    }

    #[test]
    fn test_invalid_dates_have_no_year() {
        assert_eq!(year_from_date("1994-99-99"), 0);
        assert_eq!(year_from_date("2023-02-30"), 0);
        assert_eq!(year_from_date("-123"), 0);
        assert_eq!(year_from_date("+2024"), 0);
        assert_eq!(year_from_date("19ñ4"), 0);
        assert_eq!(year_from_date("1994-+1"), 0);
    }
}
