use chrono::{DateTime, Duration, Utc};

/// Проверка, пора ли поливать растение.
///
/// Растение без интервала или без отметки о последнем поливе никогда
/// не считается "просроченным": расписание ещё не настроено.
/// Сравнение строгое: ровно `interval_days` дней с момента полива считается рано.
pub fn is_due(
    now: DateTime<Utc>,
    last_watered_at: Option<DateTime<Utc>>,
    interval_days: Option<i64>,
) -> bool {
    match (last_watered_at, interval_days) {
        (Some(last), Some(days)) if days > 0 => {
            now.signed_duration_since(last) > Duration::days(days)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn not_due_just_before_interval() {
        let now = last() + Duration::days(3) - Duration::seconds(1);
        assert!(!is_due(now, Some(last()), Some(3)));
    }

    #[test]
    fn not_due_at_exact_interval() {
        let now = last() + Duration::days(3);
        assert!(!is_due(now, Some(last()), Some(3)));
    }

    #[test]
    fn due_just_after_interval() {
        let now = last() + Duration::days(3) + Duration::seconds(1);
        assert!(is_due(now, Some(last()), Some(3)));
    }

    #[test]
    fn fractional_days_count() {
        // 1.5 суток при интервале в 1 день: уже пора
        let now = last() + Duration::hours(36);
        assert!(is_due(now, Some(last()), Some(1)));
    }

    #[test]
    fn unarmed_schedule_never_due() {
        let now = last() + Duration::days(365);
        assert!(!is_due(now, None, Some(3)));
        assert!(!is_due(now, Some(last()), None));
        assert!(!is_due(now, None, None));
    }

    #[test]
    fn non_positive_interval_never_due() {
        let now = last() + Duration::days(365);
        assert!(!is_due(now, Some(last()), Some(0)));
        assert!(!is_due(now, Some(last()), Some(-7)));
    }
}
