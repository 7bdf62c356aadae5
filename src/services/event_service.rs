use crate::models::EventRecord;

/// Case-insensitive category match. `None` or `"All"` keeps every event.
pub fn filter_by_category(events: &[EventRecord], category: Option<&str>) -> Vec<EventRecord> {
    match category.map(str::trim) {
        None | Some("") => events.to_vec(),
        Some(c) if c.eq_ignore_ascii_case("all") => events.to_vec(),
        Some(c) => events
            .iter()
            .filter(|e| e.category.trim().eq_ignore_ascii_case(c))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn events() -> Vec<EventRecord> {
        ["Conflict", "Policy", "conflict"]
            .iter()
            .enumerate()
            .map(|(i, c)| EventRecord {
                date: NaiveDate::from_ymd_opt(2020, 1, 1 + i as u32).unwrap(),
                title: format!("event {}", i),
                category: c.to_string(),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_no_filter_returns_everything() {
        assert_eq!(filter_by_category(&events(), None).len(), 3);
        assert_eq!(filter_by_category(&events(), Some("All")).len(), 3);
        assert_eq!(filter_by_category(&events(), Some("")).len(), 3);
    }

    #[test]
    fn test_category_match_ignores_case() {
        let hits = filter_by_category(&events(), Some("CONFLICT"));
        assert_eq!(hits.len(), 2);
        assert!(filter_by_category(&events(), Some("Sanction")).is_empty());
    }
}
