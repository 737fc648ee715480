//! Daily job scheduler.
//!
//! Each job has a wall-clock time of day (`HH:MM`, local time) and runs at
//! most once per day. The loop wakes every [`POLL_INTERVAL`] and runs due
//! jobs one after another, so Collect and Summarize never overlap.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Collect,
    Summarize,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Collect => f.write_str("collect"),
            Job::Summarize => f.write_str("summarize"),
        }
    }
}

#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Runs one job to completion. Failures are logged by the runner.
    async fn run(&self, job: Job);
}

/// Parse `HH:MM` (24-hour).
pub fn parse_hhmm(hhmm: &str) -> Option<NaiveTime> {
    let (h, m) = hhmm.trim().split_once(':')?;
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

/// First instant at `time` strictly after `now`.
pub fn compute_next(time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let candidate = now.date().and_time(time);
    if candidate > now {
        candidate
    } else {
        candidate + chrono::Duration::days(1)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    job: Job,
    time: NaiveTime,
    next_run: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new(jobs: &[(Job, NaiveTime)], now: NaiveDateTime) -> Self {
        let entries = jobs
            .iter()
            .map(|&(job, time)| Entry { job, time, next_run: compute_next(time, now) })
            .collect();
        Self { entries }
    }

    /// Build from `HH:MM` strings; an unparseable time falls back to `fallback`.
    pub fn from_schedule(jobs: &[(Job, &str, &str)], now: NaiveDateTime) -> Self {
        let times: Vec<(Job, NaiveTime)> = jobs
            .iter()
            .filter_map(|&(job, hhmm, fallback)| {
                let time = parse_hhmm(hhmm).or_else(|| {
                    warn!(job = %job, value = hhmm, fallback, "Invalid schedule time; using default");
                    parse_hhmm(fallback)
                })?;
                Some((job, time))
            })
            .collect();
        Self::new(&times, now)
    }

    pub fn next_run(&self, job: Job) -> Option<NaiveDateTime> {
        self.entries.iter().find(|e| e.job == job).map(|e| e.next_run)
    }

    /// Jobs whose next run is at or before `now`, earliest first. Each
    /// returned job is rescheduled for its next daily slot.
    pub fn due_jobs(&mut self, now: NaiveDateTime) -> Vec<Job> {
        let mut due: Vec<(NaiveDateTime, Job)> = Vec::new();
        for entry in &mut self.entries {
            if entry.next_run <= now {
                due.push((entry.next_run, entry.job));
                entry.next_run = compute_next(entry.time, now);
            }
        }
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, job)| job).collect()
    }

    /// Poll until `shutdown` resolves. A job already running when shutdown
    /// is requested finishes first.
    pub async fn run_until<F>(&mut self, runner: &dyn JobRunner, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested; scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    for job in self.due_jobs(Local::now().naive_local()) {
                        info!(job = %job, "Running scheduled job");
                        runner.run(job).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("09:00"), Some(nine()));
        assert_eq!(parse_hhmm(" 23:59 "), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("nine"), None);
        assert_eq!(parse_hhmm("0900"), None);
    }

    #[test]
    fn test_compute_next_same_day_and_rollover() {
        assert_eq!(compute_next(nine(), at(1, 8, 30)), at(1, 9, 0));
        assert_eq!(compute_next(nine(), at(1, 9, 0)), at(2, 9, 0));
        assert_eq!(compute_next(nine(), at(1, 17, 0)), at(2, 9, 0));
        // Month boundary
        assert_eq!(compute_next(nine(), at(31, 10, 0)).date(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn test_job_due_once_per_day() {
        let mut s = Scheduler::new(&[(Job::Collect, nine())], at(1, 8, 59));
        assert!(s.due_jobs(at(1, 8, 59)).is_empty());
        assert_eq!(s.due_jobs(at(1, 9, 0)), vec![Job::Collect]);
        assert!(s.due_jobs(at(1, 9, 1)).is_empty());
        assert!(s.due_jobs(at(1, 23, 59)).is_empty());
        assert_eq!(s.next_run(Job::Collect), Some(at(2, 9, 0)));
        assert_eq!(s.due_jobs(at(2, 9, 0)), vec![Job::Collect]);
    }

    #[test]
    fn test_due_jobs_earliest_first() {
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let mut s = Scheduler::new(&[(Job::Summarize, ten), (Job::Collect, nine())], at(1, 8, 0));
        // Both overdue after a long pause; still one run each
        assert_eq!(s.due_jobs(at(1, 11, 0)), vec![Job::Collect, Job::Summarize]);
        assert!(s.due_jobs(at(1, 11, 1)).is_empty());
    }

    #[test]
    fn test_invalid_schedule_falls_back() {
        let s = Scheduler::from_schedule(&[(Job::Collect, "25:99", "09:00")], at(1, 8, 0));
        assert_eq!(s.next_run(Job::Collect), Some(at(1, 9, 0)));
    }

    struct Recorder(Mutex<Vec<Job>>);

    #[async_trait]
    impl JobRunner for Recorder {
        async fn run(&self, job: Job) {
            self.0.lock().unwrap().push(job);
        }
    }

    #[tokio::test]
    async fn test_run_until_runs_due_jobs_then_stops() {
        let yesterday = Local::now().naive_local() - chrono::Duration::days(1);
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let mut s = Scheduler::new(&[(Job::Collect, nine()), (Job::Summarize, ten)], yesterday);
        let recorder = Recorder(Mutex::new(Vec::new()));

        s.run_until(&recorder, tokio::time::sleep(Duration::from_millis(100))).await;

        let mut ran = recorder.0.into_inner().unwrap();
        ran.sort_by_key(|j| j.to_string());
        assert_eq!(ran, vec![Job::Collect, Job::Summarize]);
    }
}
