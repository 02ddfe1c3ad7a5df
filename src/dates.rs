//! Display formatting for event instants, shared by every surface that
//! renders a card or detail row.

use chrono::{DateTime, Duration, Utc};

/// "Today", "Tomorrow", or the long-form date ("Sunday, June 15, 2025").
/// `now` is passed in so lists render consistently within one frame.
pub fn format_event_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let day = date.date_naive();
    if day == now.date_naive() {
        return "Today".to_string();
    }
    if day == (now + Duration::days(1)).date_naive() {
        return "Tomorrow".to_string();
    }
    date.format("%A, %B %-d, %Y").to_string()
}

/// Clock time for the card's time row ("6:00 PM").
pub fn format_event_time(date: DateTime<Utc>) -> String {
    date.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn same_day_renders_today() {
        let now = instant(2025, 6, 15, 9, 0);
        assert_eq!(format_event_date(instant(2025, 6, 15, 23, 30), now), "Today");
    }

    #[test]
    fn next_day_renders_tomorrow() {
        let now = instant(2025, 6, 15, 9, 0);
        assert_eq!(format_event_date(instant(2025, 6, 16, 0, 30), now), "Tomorrow");
    }

    #[test]
    fn other_days_render_the_long_form() {
        let now = instant(2025, 6, 15, 9, 0);
        assert_eq!(
            format_event_date(instant(2025, 7, 4, 18, 0), now),
            "Friday, July 4, 2025"
        );
    }

    #[test]
    fn time_renders_without_leading_zero() {
        assert_eq!(format_event_time(instant(2025, 6, 15, 18, 0)), "6:00 PM");
        assert_eq!(format_event_time(instant(2025, 6, 15, 9, 5)), "9:05 AM");
    }
}
