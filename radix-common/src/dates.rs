//! Approximate-date formatting
//!
//! Historical dates are rarely exact. Each year carries a precision tag and
//! the display strings follow the French conventions used across the site
//! ("env. 1850", "après 1830", "avant 1900").

use crate::models::{ApproxDate, DatePrecision, EventDate, EventPrecision};

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Format one year with its precision tag. Missing or zero year gives "".
pub fn format_year(year: Option<i32>, precision: Option<DatePrecision>) -> String {
    let year = match year.filter(|y| *y != 0) {
        Some(year) => year,
        None => return String::new(),
    };
    match precision {
        Some(DatePrecision::Circa) => format!("env. {}", year),
        Some(DatePrecision::After) => format!("après {}", year),
        Some(DatePrecision::Before) => format!("avant {}", year),
        Some(DatePrecision::ExactYear) | Some(DatePrecision::ExactMonthYear) | None => {
            year.to_string()
        }
    }
}

/// Format a start/end pair as a period
///
/// # Examples
/// ```
/// use radix_common::dates::format_period;
/// use radix_common::models::{ApproxDate, DatePrecision};
///
/// let start = ApproxDate::with_precision(1875, DatePrecision::Circa);
/// let end = ApproxDate::with_precision(1880, DatePrecision::After);
/// assert_eq!(format_period(&start, &end), "env. 1875 - après 1880");
///
/// // Identical bounds collapse to one value
/// let same = ApproxDate::year(1850);
/// assert_eq!(format_period(&same, &same), "1850");
/// ```
pub fn format_period(start: &ApproxDate, end: &ApproxDate) -> String {
    let start_str = format_year(start.year, start.precision);
    let end_str = format_year(end.year, end.precision);

    match (start_str.is_empty(), end_str.is_empty()) {
        (false, false) if start_str != end_str => format!("{} - {}", start_str, end_str),
        (false, _) => start_str,
        (true, false) => end_str,
        (true, true) => String::new(),
    }
}

/// Axis label for a biographical event on the person timeline
pub fn format_event_date(date: &EventDate) -> String {
    let year = match date.year.filter(|y| *y != 0) {
        Some(year) => year,
        None => return "Date inconnue".to_string(),
    };

    if date.precision == Some(EventPrecision::Circa) {
        return format!("env. {}", year);
    }

    let month_name = date
        .month
        .filter(|m| (1..=12).contains(m))
        .map(|m| MONTHS_FR[(m - 1) as usize]);

    match (date.day, date.month, month_name) {
        (Some(day), Some(_), Some(name)) => format!("{} {} {}", day, name, year),
        (_, Some(month), _) => format!("{}/{}", month, year),
        _ => year.to_string(),
    }
}

/// Title shown for an engagement in admin listings
///
/// Assembled from the person, function, period and glasswork, skipping what
/// is missing. Falls back to the record id, or "Nouvel Engagement" before the
/// first save.
pub fn engagement_admin_title(
    person: Option<&str>,
    function: Option<&str>,
    period: &str,
    glasswork: Option<&str>,
    id: Option<i64>,
) -> String {
    let mut title = person.unwrap_or("").to_string();
    if let Some(function) = function.filter(|f| !f.is_empty()) {
        if !title.is_empty() {
            title.push_str(", ");
        }
        title.push_str(function);
    }
    if !period.is_empty() {
        title.push_str(&format!(" ({})", period));
    }
    if let Some(glasswork) = glasswork.filter(|g| !g.is_empty()) {
        title.push_str(&format!(" - {}", glasswork));
    }

    let title = title.trim().to_string();
    if !title.is_empty() {
        return title;
    }
    match id {
        Some(id) => format!("Engagement ID: {}", id),
        None => "Nouvel Engagement".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_year_precision_tags() {
        assert_eq!(format_year(Some(1850), Some(DatePrecision::Circa)), "env. 1850");
        assert_eq!(format_year(Some(1850), Some(DatePrecision::After)), "après 1850");
        assert_eq!(format_year(Some(1850), Some(DatePrecision::Before)), "avant 1850");
        assert_eq!(format_year(Some(1850), Some(DatePrecision::ExactYear)), "1850");
        assert_eq!(format_year(Some(1850), Some(DatePrecision::ExactMonthYear)), "1850");
        assert_eq!(format_year(Some(1850), None), "1850");
    }

    #[test]
    fn test_format_year_missing() {
        assert_eq!(format_year(None, Some(DatePrecision::Circa)), "");
        assert_eq!(format_year(Some(0), None), "");
    }

    #[test]
    fn test_format_period_combinations() {
        let circa = ApproxDate::with_precision(1820, DatePrecision::Circa);
        let before = ApproxDate::with_precision(1860, DatePrecision::Before);
        let none = ApproxDate::default();

        assert_eq!(format_period(&circa, &before), "env. 1820 - avant 1860");
        assert_eq!(format_period(&circa, &none), "env. 1820");
        assert_eq!(format_period(&none, &before), "avant 1860");
        assert_eq!(format_period(&none, &none), "");
    }

    #[test]
    fn test_format_period_equal_bounds_show_once() {
        let start = ApproxDate::with_precision(1845, DatePrecision::Circa);
        let end = ApproxDate::with_precision(1845, DatePrecision::Circa);
        assert_eq!(format_period(&start, &end), "env. 1845");

        // Same year, different precision: both shown
        let after = ApproxDate::with_precision(1845, DatePrecision::After);
        assert_eq!(format_period(&start, &after), "env. 1845 - après 1845");
    }

    #[test]
    fn test_format_period_is_stable_across_calls() {
        let precisions = [
            None,
            Some(DatePrecision::ExactYear),
            Some(DatePrecision::Circa),
            Some(DatePrecision::After),
            Some(DatePrecision::Before),
            Some(DatePrecision::ExactMonthYear),
        ];
        for year in [1700, 1832, 1999] {
            for precision in precisions {
                let date = ApproxDate {
                    year: Some(year),
                    month: None,
                    precision,
                };
                let first = format_period(&date, &date);
                assert_eq!(first, format_period(&date, &date));
                assert_eq!(first, format_year(Some(year), precision));
            }
        }
    }

    #[test]
    fn test_format_event_date() {
        let unknown = EventDate::default();
        assert_eq!(format_event_date(&unknown), "Date inconnue");

        let full = EventDate {
            year: Some(1850),
            month: Some(3),
            day: Some(12),
            precision: Some(EventPrecision::ExactDayMonthYear),
        };
        assert_eq!(format_event_date(&full), "12 mars 1850");

        let month = EventDate {
            year: Some(1850),
            month: Some(8),
            day: None,
            precision: Some(EventPrecision::ExactMonthYear),
        };
        assert_eq!(format_event_date(&month), "8/1850");

        let circa = EventDate {
            year: Some(1790),
            month: Some(2),
            day: Some(1),
            precision: Some(EventPrecision::Circa),
        };
        assert_eq!(format_event_date(&circa), "env. 1790");

        let year_only = EventDate {
            year: Some(1801),
            ..Default::default()
        };
        assert_eq!(format_event_date(&year_only), "1801");
    }

    #[test]
    fn test_engagement_admin_title() {
        assert_eq!(
            engagement_admin_title(
                Some("Jean Guillaume"),
                Some("Souffleur"),
                "1830 - 1850",
                Some("Verrerie de Portieux"),
                Some(4)
            ),
            "Jean Guillaume, Souffleur (1830 - 1850) - Verrerie de Portieux"
        );
        assert_eq!(
            engagement_admin_title(Some("Jean Guillaume"), None, "", None, Some(4)),
            "Jean Guillaume"
        );
        assert_eq!(
            engagement_admin_title(None, None, "", None, Some(9)),
            "Engagement ID: 9"
        );
        assert_eq!(
            engagement_admin_title(None, None, "", None, None),
            "Nouvel Engagement"
        );
    }
}
