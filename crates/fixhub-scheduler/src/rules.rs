//! Schedule rules — compute the delay until a task's next fire time.
//!
//! A slot already past today rolls to the next period; after the first fire
//! the task re-arms on the rule's fixed period.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

/// When a recurring task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleRule {
    /// Every week on `weekday` at `hour:minute` UTC.
    Weekly {
        weekday: Weekday,
        hour: u32,
        minute: u32,
    },
    /// Every day at `hour:minute` UTC.
    Daily { hour: u32, minute: u32 },
    /// Fixed interval from now. Used for short-period operational tasks.
    Every { period: Duration },
}

impl ScheduleRule {
    /// The fixed re-arm period after the first fire.
    pub fn period(&self) -> Duration {
        match self {
            ScheduleRule::Weekly { .. } => Duration::days(7),
            ScheduleRule::Daily { .. } => Duration::days(1),
            ScheduleRule::Every { period } => *period,
        }
    }

    /// Next fire time strictly after `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            ScheduleRule::Weekly {
                weekday,
                hour,
                minute,
            } => {
                let days_ahead = (weekday.num_days_from_monday() + 7
                    - now.weekday().num_days_from_monday())
                    % 7;
                let candidate = at_time(now + Duration::days(days_ahead as i64), hour, minute);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
            ScheduleRule::Daily { hour, minute } => {
                let candidate = at_time(now, hour, minute);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(1)
                }
            }
            ScheduleRule::Every { period } => now + period,
        }
    }

    /// Delay from `now` until the next fire.
    pub fn delay_until_next(&self, now: DateTime<Utc>) -> Duration {
        self.next_fire(now) - now
    }
}

fn at_time(day: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    day.date_naive()
        .and_hms_opt(hour.min(23), minute.min(59), 0)
        .expect("hour/minute clamped into range")
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    // 2026-08-05 is a Wednesday.
    fn wednesday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_weekly_rolls_to_next_week_when_slot_passed() {
        let rule = ScheduleRule::Weekly {
            weekday: Weekday::Wed,
            hour: 9,
            minute: 0,
        };
        // Wednesday 12:00 — today's 09:00 slot has passed.
        let next = rule.next_fire(wednesday_noon());
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 8, 12, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_weekly_same_day_slot_ahead() {
        let rule = ScheduleRule::Weekly {
            weekday: Weekday::Wed,
            hour: 17,
            minute: 30,
        };
        let next = rule.next_fire(wednesday_noon());
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 8, 5, 17, 30, 0).unwrap());
    }

    #[test]
    fn test_weekly_next_monday() {
        let rule = ScheduleRule::Weekly {
            weekday: Weekday::Mon,
            hour: 9,
            minute: 0,
        };
        let next = rule.next_fire(wednesday_noon());
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 8, 10, 9, 0, 0).unwrap());
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_daily_rolls_past_slot_to_tomorrow() {
        let rule = ScheduleRule::Daily { hour: 2, minute: 0 };
        let next = rule.next_fire(wednesday_noon());
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 8, 6, 2, 0, 0).unwrap());

        let early = Utc.with_ymd_and_hms(2026, 8, 5, 1, 0, 0).unwrap();
        assert_eq!(
            rule.next_fire(early),
            Utc.with_ymd_and_hms(2026, 8, 5, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_exact_slot_time_rolls_forward() {
        let rule = ScheduleRule::Daily { hour: 12, minute: 0 };
        // next_fire is strictly after now.
        let next = rule.next_fire(wednesday_noon());
        assert_eq!(next.day(), 6);
        assert_eq!(next.hour(), 12);
    }

    #[test]
    fn test_periods() {
        assert_eq!(
            ScheduleRule::Weekly {
                weekday: Weekday::Mon,
                hour: 9,
                minute: 0
            }
            .period(),
            Duration::days(7)
        );
        assert_eq!(ScheduleRule::Daily { hour: 2, minute: 0 }.period(), Duration::days(1));
    }

    #[test]
    fn test_delay_until_next() {
        let rule = ScheduleRule::Daily { hour: 13, minute: 0 };
        assert_eq!(rule.delay_until_next(wednesday_noon()), Duration::hours(1));
    }
}
