use crate::config::EngineConfig;
use crate::platform::Dispatch;

use super::job::{Algorithm, Job};
use super::lanes::{LaneGroup, Pick};
use super::{MgrError, Rejected};

/// Running totals since the manager was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MgrStats {
    /// Jobs accepted into a lane.
    pub submitted: u64,
    /// Jobs handed back after reaching a terminal status.
    pub returned: u64,
    /// Jobs refused at submission.
    pub rejected: u64,
    /// Kernel invocations.
    pub group_runs: u64,
    /// Group runs forced by a flush.
    pub flushes: u64,
    /// Lanes finished by the scalar tail processor.
    pub extracted_lanes: u64,
}

/// Schedules jobs onto lane groups and runs them through the dispatch
/// kernels. Single-threaded: every mutating call takes `&mut self`.
#[derive(Debug)]
pub struct JobManager {
    config: EngineConfig,
    dispatch: Dispatch,
    groups: [LaneGroup; 2],
    last_error: Option<MgrError>,
    stats: MgrStats,
    /// Stamp handed to the next group run; orders completions.
    next_run: u64,
}

impl JobManager {
    /// Builds the dispatch table from `config` and an empty manager around it.
    pub fn new(config: EngineConfig) -> Result<Self, MgrError> {
        let dispatch = config.dispatch()?;
        Ok(Self::with_dispatch(config, dispatch))
    }

    /// Uses `dispatch` as given; `config.lane_width` is ignored.
    pub fn with_dispatch(config: EngineConfig, dispatch: Dispatch) -> Self {
        log::info!(
            "Job manager ready: kernel {} with {} lanes",
            dispatch.name(),
            dispatch.lanes()
        );
        let groups = Algorithm::ALL.map(|alg| LaneGroup::new(alg, dispatch.lanes()));
        Self {
            config,
            dispatch,
            groups,
            last_error: None,
            stats: MgrStats::default(),
            next_run: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn stats(&self) -> MgrStats {
        self.stats
    }

    /// The error of the most recent failed call, cleared by the next
    /// accepted submission.
    pub fn last_error(&self) -> Option<MgrError> {
        self.last_error
    }

    /// Jobs of `algorithm` sitting in lanes, not yet run.
    pub fn in_flight(&self, algorithm: Algorithm) -> usize {
        self.groups[algorithm.index()].occupied()
    }

    /// Completed jobs waiting to be collected, all algorithms.
    pub fn pending_completions(&self) -> usize {
        self.groups.iter().map(LaneGroup::completed).sum()
    }

    /// Accepts `job`, running its group once every lane holds an in-flight
    /// job.
    ///
    /// With `report_eagerly` set, returns a job from the most recent group run
    /// of any algorithm that still has uncollected completions; lanes of one
    /// run come back lowest index first. Parameters are validated unless
    /// `validate_params` is off.
    pub fn submit(&mut self, job: Job) -> Result<Option<Job>, Rejected> {
        if self.config.validate_params {
            if let Err(error) = job.validate() {
                return Err(self.reject(error, job));
            }
        }
        self.accept(job)
    }

    /// As [`submit`](Self::submit) without the length and direction checks.
    /// Buffer sizes are still checked.
    pub fn submit_no_validate(&mut self, job: Job) -> Result<Option<Job>, Rejected> {
        self.accept(job)
    }

    fn accept(&mut self, job: Job) -> Result<Option<Job>, Rejected> {
        if let Err(error) = job.check_buffers() {
            return Err(self.reject(error, job));
        }
        let algorithm = job.algorithm();
        let Some(lane) = self.groups[algorithm.index()].next_free() else {
            return Err(self.reject(MgrError::NoFreeLane(algorithm), job));
        };

        self.groups[algorithm.index()].occupy(lane, job);
        self.stats.submitted += 1;
        self.last_error = None;

        if self.groups[algorithm.index()].is_full() {
            self.run_group(algorithm);
        }
        if self.config.report_eagerly {
            Ok(self.take_across(Pick::Newest))
        } else {
            Ok(None)
        }
    }

    /// Runs a partially filled group and returns one of its completed jobs.
    /// `None` when the group has nothing in flight and nothing completed.
    pub fn flush(&mut self, algorithm: Algorithm) -> Option<Job> {
        if self.in_flight(algorithm) > 0 {
            self.stats.flushes += 1;
            self.run_group(algorithm);
        }
        self.take_from(algorithm)
    }

    /// Lane the next `algorithm` submission will occupy.
    pub fn get_next_free(&self, algorithm: Algorithm) -> Option<usize> {
        self.groups[algorithm.index()].next_free()
    }

    /// One completed job of any algorithm, oldest group run first; its lane
    /// becomes free.
    pub fn get_completed(&mut self) -> Option<Job> {
        self.take_across(Pick::Oldest)
    }

    /// Oldest completed job of `algorithm`.
    pub(crate) fn take_from(&mut self, algorithm: Algorithm) -> Option<Job> {
        let job = self.groups[algorithm.index()].take_completed(Pick::Oldest)?;
        self.stats.returned += 1;
        Some(job)
    }

    fn take_across(&mut self, pick: Pick) -> Option<Job> {
        let stamps = self
            .groups
            .iter()
            .enumerate()
            .filter_map(|(i, group)| group.completion_stamp(pick).map(|stamp| (stamp, i)));
        let (_, index) = match pick {
            Pick::Oldest => stamps.min(),
            Pick::Newest => stamps.max(),
        }?;
        let job = self.groups[index].take_completed(pick)?;
        self.stats.returned += 1;
        Some(job)
    }

    pub(crate) fn free_lanes(&self, algorithm: Algorithm) -> impl Iterator<Item = usize> + '_ {
        self.groups[algorithm.index()].free_lanes()
    }

    pub(crate) fn run_group(&mut self, algorithm: Algorithm) {
        let group = &mut self.groups[algorithm.index()];
        let occupied = group.occupied();
        if occupied == 0 {
            return;
        }
        let stamp = self.next_run;
        self.next_run += 1;
        match group.run(&self.dispatch, stamp) {
            Ok(stats) => {
                log::debug!(
                    "{:?} group run: {} lanes, common length {}, {} extracted",
                    algorithm,
                    occupied,
                    stats.common,
                    stats.extracted
                );
                self.stats.group_runs += 1;
                self.stats.extracted_lanes += stats.extracted as u64;
            }
            Err(e) => {
                log::warn!("{:?} group run failed for {} lanes: {}", algorithm, occupied, e);
                self.last_error = Some(e.into());
            }
        }
    }

    pub(crate) fn reject(&mut self, error: MgrError, job: Job) -> Rejected {
        log::warn!(
            "Rejected {:?} job (user_data {}): {}",
            job.algorithm(),
            job.user_data(),
            error
        );
        self.last_error = Some(error);
        self.stats.rejected += 1;
        Rejected { error, job }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{eia3_1_buffer, reference, EEA3_MAX_BYTES};
    use crate::mgr::job::{Direction, JobStatus};
    use crate::platform::LaneWidth;

    fn manager(width: LaneWidth, report_eagerly: bool) -> JobManager {
        let config = EngineConfig {
            report_eagerly,
            ..EngineConfig::default()
        };
        JobManager::with_dispatch(config, Dispatch::portable(width))
    }

    fn cipher_job(len: usize, tag: u64) -> Job {
        let src = (0..len).map(|i| (i as u8) ^ (tag as u8)).collect();
        Job::eea3(Direction::Encrypt, [tag as u8; 16], [0x5C; 16], src).with_user_data(tag)
    }

    fn check_cipher(job: &Job) {
        let expected = reference::eea3(&[job.user_data() as u8; 16], job.iv(), job.input());
        assert_eq!(job.output(), &expected[..], "job {}", job.user_data());
    }

    #[test]
    fn test_new_default_config() {
        let mgr = JobManager::new(EngineConfig::default()).unwrap();
        assert!(mgr.dispatch().lanes() >= 4);
        assert_eq!(mgr.last_error(), None);
    }

    #[test]
    fn test_fill_group_runs_kernel() {
        let mut mgr = manager(LaneWidth::X4, true);
        for i in 0..3 {
            assert!(mgr.submit(cipher_job(100 + i, i as u64)).unwrap().is_none());
        }
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 3);
        assert_eq!(mgr.get_next_free(Algorithm::ZucEea3), Some(3));

        let first = mgr.submit(cipher_job(7, 3)).unwrap().unwrap();
        assert_eq!(first.status(), JobStatus::Completed);
        check_cipher(&first);
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 0);
        assert_eq!(mgr.stats().group_runs, 1);

        let mut rest = Vec::new();
        while let Some(job) = mgr.get_completed() {
            rest.push(job);
        }
        assert_eq!(rest.len(), 3);
        rest.iter().for_each(check_cipher);
    }

    #[test]
    fn test_flush_partial_group() {
        let mut mgr = manager(LaneWidth::X8, false);
        assert!(mgr.flush(Algorithm::ZucEea3).is_none());
        for (i, len) in [1usize, 63, 64, 65].into_iter().enumerate() {
            assert!(mgr.submit(cipher_job(len, i as u64)).unwrap().is_none());
        }

        let mut seen = Vec::new();
        while let Some(job) = mgr.flush(Algorithm::ZucEea3) {
            check_cipher(&job);
            seen.push(job.user_data());
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 0);
        assert_eq!(mgr.pending_completions(), 0);
        assert_eq!(mgr.stats().flushes, 1);
        assert_eq!(mgr.stats().extracted_lanes, 4);
    }

    #[test]
    fn test_mac_jobs() {
        let mut mgr = manager(LaneWidth::X4, true);
        let key = [0x0Au8; 16];
        let iv = [0x0Bu8; 16];
        let msg: Vec<u8> = (0..200).map(|i| i as u8).collect();
        let bits = [1usize, 511, 512, 1300];
        for (i, &b) in bits.iter().enumerate() {
            let job = Job::eia3(key, iv, msg.clone(), b).with_user_data(i as u64);
            if let Some(done) = mgr.submit(job).unwrap() {
                let b = bits[done.user_data() as usize];
                assert_eq!(done.tag().unwrap(), eia3_1_buffer(&key, &iv, &msg, b).unwrap());
            }
        }
        let mut count = 1;
        while let Some(done) = mgr.get_completed() {
            let b = bits[done.user_data() as usize];
            assert_eq!(done.tag().unwrap(), eia3_1_buffer(&key, &iv, &msg, b).unwrap());
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn test_eager_returns_most_recent_completion() {
        let mut mgr = manager(LaneWidth::X8, true);
        let mac = |id: u64| Job::eia3([1; 16], [2; 16], vec![0; 8], 64).with_user_data(id);
        for i in 0..7 {
            assert!(mgr.submit(cipher_job(20, i)).unwrap().is_none());
        }
        assert_eq!(mgr.flush(Algorithm::ZucEea3).unwrap().user_data(), 0);

        // Each MAC submission hands back a cipher job: the only completions.
        for id in 100..103 {
            let done = mgr.submit(mac(id)).unwrap().unwrap();
            assert_eq!(done.user_data(), id - 99);
        }
        assert_eq!(mgr.flush(Algorithm::ZucEia3).unwrap().user_data(), 100);

        // The MAC run is newer than the cipher run, so a cipher submission
        // that does not run its group gets a MAC job back.
        let done = mgr.submit(cipher_job(20, 7)).unwrap().unwrap();
        assert_eq!(done.algorithm(), Algorithm::ZucEia3);
        assert_eq!(done.user_data(), 101);

        let order: Vec<u64> = core::iter::from_fn(|| mgr.get_completed())
            .map(|job| job.user_data())
            .collect();
        assert_eq!(order, vec![4, 5, 6, 102]);
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 1);
    }

    #[test]
    fn test_get_completed_oldest_run_first() {
        let mut mgr = manager(LaneWidth::X4, false);
        for i in 0..4 {
            mgr.submit(cipher_job(20, i)).unwrap();
        }
        for id in [50, 51] {
            let mac = Job::eia3([1; 16], [2; 16], vec![0; 8], 64).with_user_data(id);
            mgr.submit(mac).unwrap();
        }
        assert_eq!(mgr.flush(Algorithm::ZucEia3).unwrap().user_data(), 50);
        mgr.submit(cipher_job(20, 9)).unwrap_err();

        let order: Vec<u64> = core::iter::from_fn(|| mgr.get_completed())
            .map(|job| job.user_data())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 51]);
    }

    #[test]
    fn test_groups_are_per_algorithm() {
        let mut mgr = manager(LaneWidth::X4, true);
        mgr.submit(cipher_job(10, 1)).unwrap();
        mgr.submit(Job::eia3([0; 16], [0; 16], vec![0; 4], 32)).unwrap();
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 1);
        assert_eq!(mgr.in_flight(Algorithm::ZucEia3), 1);
        let mac = mgr.flush(Algorithm::ZucEia3).unwrap();
        assert_eq!(mac.algorithm(), Algorithm::ZucEia3);
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 1);
    }

    #[test]
    fn test_no_free_lane_rejects_without_mutation() {
        let mut mgr = manager(LaneWidth::X4, false);
        for i in 0..4 {
            mgr.submit(cipher_job(16, i)).unwrap();
        }
        assert_eq!(mgr.pending_completions(), 4);
        assert_eq!(mgr.get_next_free(Algorithm::ZucEea3), None);

        let rejected = mgr.submit(cipher_job(16, 9)).unwrap_err();
        assert_eq!(rejected.error, MgrError::NoFreeLane(Algorithm::ZucEea3));
        assert_eq!(rejected.job.user_data(), 9);
        assert_eq!(rejected.job.status(), JobStatus::Created);
        assert_eq!(mgr.last_error(), Some(MgrError::NoFreeLane(Algorithm::ZucEea3)));
        assert_eq!(mgr.pending_completions(), 4);

        mgr.get_completed().unwrap();
        assert!(mgr.submit(rejected.into_job()).is_ok());
        assert_eq!(mgr.last_error(), None);
    }

    #[test]
    fn test_validation_rejections() {
        let mut mgr = manager(LaneWidth::X4, true);
        let cases = [
            (cipher_job(0, 1), MgrError::ZeroLength),
            (
                cipher_job(EEA3_MAX_BYTES + 1, 2),
                MgrError::LengthOutOfRange { len: EEA3_MAX_BYTES + 1, max: EEA3_MAX_BYTES },
            ),
            (
                Job::eea3(Direction::Mac, [0; 16], [0; 16], vec![1; 4]),
                MgrError::DirectionMismatch {
                    algorithm: Algorithm::ZucEea3,
                    direction: Direction::Mac,
                },
            ),
            (
                Job::eia3([0; 16], [0; 16], vec![0; 1], 9),
                MgrError::BufferTooSmall { needed: 2, got: 1 },
            ),
        ];
        for (job, expected) in cases {
            let rejected = mgr.submit(job).unwrap_err();
            assert_eq!(rejected.error, expected);
            assert_eq!(mgr.last_error(), Some(expected));
        }
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 0);
        assert_eq!(mgr.in_flight(Algorithm::ZucEia3), 0);
        assert_eq!(mgr.stats().rejected, 4);
    }

    #[test]
    fn test_oversized_length_rejected_before_any_lane() {
        let mut mgr = manager(LaneWidth::X4, true);
        let job = Job::new(Algorithm::ZucEea3, Direction::Encrypt, [0; 16], [0; 16], vec![1; 16], usize::MAX);
        let rejected = mgr.submit(job).unwrap_err();
        assert_eq!(
            rejected.error,
            MgrError::LengthOutOfRange { len: usize::MAX, max: EEA3_MAX_BYTES }
        );

        let rejected = mgr.submit_no_validate(rejected.into_job()).unwrap_err();
        assert_eq!(rejected.error, MgrError::BufferTooSmall { needed: usize::MAX, got: 16 });
        assert_eq!(mgr.in_flight(Algorithm::ZucEea3), 0);
    }

    #[test]
    fn test_no_validate_processes_as_given() {
        let mut mgr = manager(LaneWidth::X4, true);
        mgr.submit_no_validate(cipher_job(0, 1)).unwrap();
        let oversized = cipher_job(EEA3_MAX_BYTES + 10, 2);
        mgr.submit_no_validate(oversized).unwrap();
        let mut done = Vec::new();
        while let Some(job) = mgr.flush(Algorithm::ZucEea3) {
            done.push(job);
        }
        assert_eq!(done.len(), 2);
        for job in &done {
            assert_eq!(job.status(), JobStatus::Completed);
            check_cipher(job);
        }

        // Buffer sizes are still enforced.
        let short = Job::eia3([0; 16], [0; 16], vec![0; 1], 64);
        assert_eq!(
            mgr.submit_no_validate(short).unwrap_err().error,
            MgrError::BufferTooSmall { needed: 8, got: 1 }
        );
    }

    #[test]
    fn test_validate_params_off_skips_checks() {
        let config = EngineConfig {
            validate_params: false,
            ..EngineConfig::default()
        };
        let mut mgr = JobManager::with_dispatch(config, Dispatch::portable(LaneWidth::X4));
        assert!(mgr.submit(cipher_job(0, 1)).is_ok());
    }
}
