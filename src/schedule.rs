//! Daily trigger for the ingest job.
//!
//! Runs once per day at local midnight with no catch-up: a missed day is
//! simply skipped, the next run is always the next midnight after "now".
//! A failed invocation is retried as a whole after a fixed delay; the fetcher
//! itself never retries.
//!
//! Waits are measured between zoned instants, so DST transitions do not shift
//! the run away from wall-clock midnight.

use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

use crate::app::pipeline::IngestOutcome;
use crate::error::AppError;

/// Whole-invocation retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(5 * 60),
        }
    }
}

/// First wall-clock midnight strictly after `now`.
pub fn next_midnight(now: NaiveDateTime) -> NaiveDateTime {
    let tomorrow = now
        .date()
        .checked_add_days(Days::new(1))
        .unwrap_or(now.date());
    tomorrow.and_time(NaiveTime::MIN)
}

/// The next run instant in `now`'s zone.
///
/// When midnight falls in a DST gap the run moves to 01:00 that day.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let midnight = next_midnight(now.naive_local());
    let tz = now.timezone();
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + TimeDelta::hours(1))).earliest())
        .unwrap_or_else(|| now.clone() + TimeDelta::days(1))
}

/// Run `attempt` until it succeeds or `policy.retries` retries are used up.
///
/// `sleep` is called with `policy.delay` between attempts.
pub fn run_with_retry<T, F, S>(policy: &RetryPolicy, mut attempt: F, mut sleep: S) -> Result<T, AppError>
where
    F: FnMut() -> Result<T, AppError>,
    S: FnMut(Duration),
{
    let mut failures = 0;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(err) if failures < policy.retries => {
                failures += 1;
                log::warn!(
                    "Attempt {failures} failed: {err}; retrying in {}s",
                    policy.delay.as_secs()
                );
                sleep(policy.delay);
            }
            Err(err) => return Err(err),
        }
    }
}

/// The daily loop.
#[derive(Debug, Clone, Default)]
pub struct DailySchedule {
    pub retry: RetryPolicy,
    /// Fire one invocation immediately instead of waiting for midnight.
    pub run_now: bool,
    /// Stop after the first invocation and return its result.
    pub once: bool,
}

impl DailySchedule {
    /// Run forever (or once) against the wall clock.
    pub fn run<F>(&self, job: F) -> Result<(), AppError>
    where
        F: FnMut() -> Result<IngestOutcome, AppError>,
    {
        self.run_with(job, Local::now, std::thread::sleep)
    }

    /// Same as [`DailySchedule::run`] with an injected clock and sleeper.
    pub fn run_with<F, Tz, N, S>(&self, mut job: F, now: N, mut sleep: S) -> Result<(), AppError>
    where
        F: FnMut() -> Result<IngestOutcome, AppError>,
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
        N: Fn() -> DateTime<Tz>,
        S: FnMut(Duration),
    {
        let mut fire_now = self.run_now;

        loop {
            if !fire_now {
                let current = now();
                let next = next_run_after(&current);
                log::info!("Next ingest scheduled for {next}");
                sleep((next - current).to_std().unwrap_or(Duration::ZERO));
            }
            fire_now = false;

            match run_with_retry(&self.retry, &mut job, &mut sleep) {
                Ok(IngestOutcome::Written { path, rows }) => {
                    log::info!("Scheduled ingest wrote {rows} rows to {}", path.display());
                }
                Ok(IngestOutcome::Empty) => {
                    log::warn!("Scheduled ingest found no data");
                }
                Err(err) if self.once => return Err(err),
                Err(err) => {
                    log::error!("Scheduled ingest failed after retries: {err}");
                }
            }

            if self.once {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use chrono::{NaiveDate, Utc};
    use chrono_tz::America::{Los_Angeles, Sao_Paulo};

    use super::*;
    use crate::error::ErrorKind;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn next_run_is_following_midnight() {
        assert_eq!(next_midnight(at(2024, 2, 28, 13, 45)), at(2024, 2, 29, 0, 0));
        assert_eq!(next_midnight(at(2024, 12, 31, 23, 59)), at(2025, 1, 1, 0, 0));
    }

    #[test]
    fn exactly_midnight_waits_a_full_day() {
        assert_eq!(next_midnight(at(2024, 3, 1, 0, 0)), at(2024, 3, 2, 0, 0));
    }

    #[test]
    fn spring_forward_day_is_an_hour_shorter() {
        // 2024-03-10 02:00 PST jumps to 03:00 PDT.
        let now = Los_Angeles.from_local_datetime(&at(2024, 3, 10, 1, 0)).unwrap();
        let next = next_run_after(&now);

        assert_eq!(next.naive_local(), at(2024, 3, 11, 0, 0));
        assert_eq!(next - now, TimeDelta::hours(22));
    }

    #[test]
    fn fall_back_day_is_an_hour_longer() {
        // 2024-11-03 02:00 PDT falls back to 01:00 PST.
        let now = Los_Angeles.from_local_datetime(&at(2024, 11, 2, 23, 0)).unwrap();
        let next = next_run_after(&now);
        assert_eq!(next.naive_local(), at(2024, 11, 3, 0, 0));

        let after = next_run_after(&(next.clone() + TimeDelta::minutes(1)));
        assert_eq!(after.naive_local(), at(2024, 11, 4, 0, 0));
        assert_eq!(after - next, TimeDelta::hours(25));
    }

    #[test]
    fn midnight_in_a_dst_gap_moves_to_one_am() {
        // Sao Paulo skipped 2018-11-04 00:00..01:00.
        let now = Sao_Paulo.from_local_datetime(&at(2018, 11, 3, 12, 0)).unwrap();
        let next = next_run_after(&now);

        assert_eq!(next.naive_local(), at(2018, 11, 4, 1, 0));
        assert_eq!(next - now, TimeDelta::hours(12));
    }

    #[test]
    fn retry_once_then_succeed() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let mut slept = Vec::new();

        let result = run_with_retry(
            &policy,
            || {
                calls += 1;
                if calls == 1 {
                    Err(AppError::transport("boom"))
                } else {
                    Ok(calls)
                }
            },
            |d| slept.push(d),
        );

        assert_eq!(result.unwrap(), 2);
        assert_eq!(slept, vec![Duration::from_secs(300)]);
    }

    #[test]
    fn second_failure_is_returned() {
        let policy = RetryPolicy::default();
        let mut calls = 0;

        let result: Result<(), AppError> = run_with_retry(
            &policy,
            || {
                calls += 1;
                Err(AppError::transport(format!("failure {calls}")))
            },
            |_| {},
        );

        let err = result.unwrap_err();
        assert_eq!(calls, 2);
        assert_eq!(err.to_string(), "failure 2");
    }

    #[test]
    fn once_waits_for_midnight_then_retries_and_reports_failure() {
        let schedule = DailySchedule {
            once: true,
            ..DailySchedule::default()
        };
        let slept = RefCell::new(Vec::new());
        let mut calls = 0;

        let err = schedule
            .run_with(
                || {
                    calls += 1;
                    Err(AppError::transport("down"))
                },
                || Utc.from_utc_datetime(&at(2024, 5, 10, 23, 0)),
                |d| slept.borrow_mut().push(d),
            )
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(calls, 2);
        assert_eq!(
            slept.into_inner(),
            vec![Duration::from_secs(3600), Duration::from_secs(300)]
        );
    }

    #[test]
    fn run_now_skips_the_initial_wait() {
        let schedule = DailySchedule {
            run_now: true,
            once: true,
            ..DailySchedule::default()
        };
        let mut slept = Vec::new();

        schedule
            .run_with(
                || {
                    Ok(IngestOutcome::Written {
                        path: PathBuf::from("demand_history.csv"),
                        rows: 24,
                    })
                },
                || Utc.from_utc_datetime(&at(2024, 5, 10, 9, 30)),
                |d| slept.push(d),
            )
            .unwrap();

        assert!(slept.is_empty());
    }
}
