use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Iso8601;
use time::{Date, Duration};

/// Days counted as "recent".
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Summary of a resource listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub total: usize,
    /// Distinct `category` values in first-seen order.
    pub categories: Vec<String>,
    /// Distinct `speaker` values in first-seen order.
    pub speakers: Vec<String>,
    /// Items dated within the last [`RECENT_WINDOW_DAYS`] days of `today`.
    pub recent: usize,
}

impl ResourceStats {
    pub fn from_items(items: &[Value], today: Date) -> Self {
        let cutoff = today - Duration::days(RECENT_WINDOW_DAYS);
        let mut stats = Self {
            total: items.len(),
            ..Self::default()
        };

        for item in items {
            push_distinct(&mut stats.categories, item.get("category"));
            push_distinct(&mut stats.speakers, item.get("speaker"));

            let dated_recently = item
                .get("date")
                .and_then(Value::as_str)
                .and_then(parse_date)
                .is_some_and(|date| date >= cutoff);
            if dated_recently {
                stats.recent += 1;
            }
        }

        stats
    }
}

fn push_distinct(values: &mut Vec<String>, value: Option<&Value>) {
    let Some(text) = value.and_then(Value::as_str) else {
        return;
    };
    if !values.iter().any(|existing| existing == text) {
        values.push(text.to_owned());
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(raw: &str) -> Option<Date> {
    let day = raw.get(..10)?;
    Date::parse(day, &Iso8601::DATE).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::Month;

    #[test]
    fn counts_distinct_values_and_recent_items() {
        let today = Date::from_calendar_date(2024, Month::June, 30).expect("valid date");
        let items = vec![
            json!({"category": "Faith", "speaker": "Rev. A", "date": "2024-06-20"}),
            json!({"category": "Prayer", "speaker": "Rev. A", "date": "2024-05-31T09:00:00Z"}),
            json!({"category": "Faith", "speaker": "Pastor B", "date": "2023-01-01"}),
            json!({"title": "no metadata"}),
        ];

        let stats = ResourceStats::from_items(&items, today);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.categories, vec!["Faith", "Prayer"]);
        assert_eq!(stats.speakers, vec!["Rev. A", "Pastor B"]);
        assert_eq!(stats.recent, 2);
    }

    #[test]
    fn empty_listing_has_zero_stats() {
        let today = Date::from_calendar_date(2024, Month::January, 1).expect("valid date");
        assert_eq!(ResourceStats::from_items(&[], today), ResourceStats::default());
    }
}
