//! Burst forms of the manager entry points. Each applies the single-job rule
//! to every element in turn.

use alloc::vec::Vec;

use super::job::{Algorithm, Job};
use super::manager::JobManager;
use super::Rejected;

/// Result of a burst submission.
#[derive(Debug, Default)]
pub struct BurstOutcome {
    /// Jobs placed in a lane.
    pub accepted: usize,
    /// Completed jobs collected during the burst, any algorithm.
    pub completed: Vec<Job>,
    /// Refused jobs, each with its reason.
    pub rejected: Vec<Rejected>,
}

impl JobManager {
    /// Submits every job in order with validation. When a job's group has no
    /// free lane, the group's uncollected completions are moved into the
    /// outcome first. Completions still waiting at the end are collected as
    /// well.
    pub fn submit_burst<I: IntoIterator<Item = Job>>(&mut self, jobs: I) -> BurstOutcome {
        self.burst(jobs, true)
    }

    /// As [`submit_burst`](Self::submit_burst) without the length and
    /// direction checks.
    pub fn submit_burst_no_validate<I: IntoIterator<Item = Job>>(&mut self, jobs: I) -> BurstOutcome {
        self.burst(jobs, false)
    }

    fn burst<I: IntoIterator<Item = Job>>(&mut self, jobs: I, validate: bool) -> BurstOutcome {
        let mut outcome = BurstOutcome::default();
        for job in jobs {
            let algorithm = job.algorithm();
            if self.get_next_free(algorithm).is_none() {
                outcome.completed.extend(self.drain(algorithm, usize::MAX));
            }
            match self.submit_one(job, validate) {
                Ok(done) => {
                    outcome.accepted += 1;
                    outcome.completed.extend(done);
                }
                Err(rejected) => outcome.rejected.push(rejected),
            }
        }
        outcome.completed.extend(self.get_completed_burst(usize::MAX));
        outcome
    }

    fn submit_one(&mut self, job: Job, validate: bool) -> Result<Option<Job>, Rejected> {
        if validate {
            self.submit(job)
        } else {
            self.submit_no_validate(job)
        }
    }

    fn drain(&mut self, algorithm: Algorithm, max: usize) -> Vec<Job> {
        let mut jobs = Vec::new();
        while jobs.len() < max {
            match self.take_from(algorithm) {
                Some(job) => jobs.push(job),
                None => break,
            }
        }
        jobs
    }

    /// Runs the algorithm's partially filled group and returns every
    /// completed job of that algorithm.
    pub fn flush_burst(&mut self, algorithm: Algorithm) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.flush(algorithm).into_iter().collect();
        jobs.extend(self.drain(algorithm, usize::MAX));
        jobs
    }

    /// Up to `max` lanes the next submissions for `algorithm` will occupy,
    /// in order.
    pub fn get_next_free_burst(&self, algorithm: Algorithm, max: usize) -> Vec<usize> {
        self.free_lanes(algorithm).take(max).collect()
    }

    /// Up to `max` completed jobs, any algorithm.
    pub fn get_completed_burst(&mut self, max: usize) -> Vec<Job> {
        let mut jobs = Vec::new();
        while jobs.len() < max {
            match self.get_completed() {
                Some(job) => jobs.push(job),
                None => break,
            }
        }
        jobs
    }
}
