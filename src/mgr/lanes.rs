use alloc::vec::Vec;
use core::mem;

use crate::kernel::{CipherLane, GroupStats, KernelError, MacLane};
use crate::platform::dispatch::MAX_LANES;
use crate::platform::Dispatch;

use super::job::{Algorithm, Job, JobStatus};

/// One lane of a group: `Free -> Occupied -> Completed -> Free`.
///
/// A completed lane carries the stamp of the run that finished it.
#[derive(Debug, Default)]
pub(crate) enum LaneSlot {
    #[default]
    Free,
    Occupied(Job),
    Completed(Job, u64),
}

impl LaneSlot {
    /// Moves an occupied lane to completed with `status`.
    fn finish(&mut self, status: JobStatus, stamp: u64) {
        *self = match mem::take(self) {
            LaneSlot::Occupied(mut job) => {
                job.set_status(status);
                LaneSlot::Completed(job, stamp)
            }
            other => other,
        };
    }

    fn stamp(&self) -> Option<u64> {
        match self {
            LaneSlot::Completed(_, stamp) => Some(*stamp),
            _ => None,
        }
    }
}

/// Which completed lane to hand back first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pick {
    Oldest,
    Newest,
}

/// The lanes of one algorithm, one per kernel lane.
#[derive(Debug)]
pub(crate) struct LaneGroup {
    algorithm: Algorithm,
    slots: Vec<LaneSlot>,
}

impl LaneGroup {
    pub(crate) fn new(algorithm: Algorithm, width: usize) -> Self {
        Self {
            algorithm,
            slots: (0..width).map(|_| LaneSlot::Free).collect(),
        }
    }

    pub(crate) fn free_lanes(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, LaneSlot::Free))
            .map(|(i, _)| i)
    }

    pub(crate) fn next_free(&self) -> Option<usize> {
        self.free_lanes().next()
    }

    pub(crate) fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, LaneSlot::Occupied(_)))
            .count()
    }

    /// Every lane holds an in-flight job.
    pub(crate) fn is_full(&self) -> bool {
        self.occupied() == self.slots.len()
    }

    pub(crate) fn completed(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, LaneSlot::Completed(..)))
            .count()
    }

    /// Stamp of the oldest or newest completion in this group.
    pub(crate) fn completion_stamp(&self, pick: Pick) -> Option<u64> {
        let stamps = self.slots.iter().filter_map(LaneSlot::stamp);
        match pick {
            Pick::Oldest => stamps.min(),
            Pick::Newest => stamps.max(),
        }
    }

    /// Places `job` in lane `lane`, which must be free.
    pub(crate) fn occupy(&mut self, lane: usize, mut job: Job) {
        job.set_status(JobStatus::InFlight);
        self.slots[lane] = LaneSlot::Occupied(job);
    }

    /// Hands back one completed job and frees its lane. Among lanes finished
    /// by the same run the lowest index goes first.
    pub(crate) fn take_completed(&mut self, pick: Pick) -> Option<Job> {
        let stamp = self.completion_stamp(pick)?;
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.stamp() == Some(stamp))?;
        match mem::take(slot) {
            LaneSlot::Completed(job, _) => Some(job),
            _ => None,
        }
    }

    /// Runs every occupied lane through one kernel invocation and marks it
    /// completed with `stamp`, or failed if its lane view or the kernel
    /// errored.
    pub(crate) fn run(&mut self, dispatch: &Dispatch, stamp: u64) -> Result<GroupStats, KernelError> {
        let width = self.slots.len();
        let mut lane_errors: [Option<KernelError>; MAX_LANES] = [None; MAX_LANES];
        let result = match self.algorithm {
            Algorithm::ZucEea3 => {
                let mut views: [Option<CipherLane<'_>>; MAX_LANES] = Default::default();
                for (i, slot) in self.slots.iter_mut().enumerate() {
                    if let LaneSlot::Occupied(job) = slot {
                        match job.cipher_lane() {
                            Ok(lane) => views[i] = Some(lane),
                            Err(e) => lane_errors[i] = Some(e),
                        }
                    }
                }
                dispatch.eea3_group(&mut views[..width])
            }
            Algorithm::ZucEia3 => {
                let mut views: [Option<MacLane<'_>>; MAX_LANES] = Default::default();
                for (i, slot) in self.slots.iter_mut().enumerate() {
                    if let LaneSlot::Occupied(job) = slot {
                        match job.mac_lane() {
                            Ok(lane) => views[i] = Some(lane),
                            Err(e) => lane_errors[i] = Some(e),
                        }
                    }
                }
                dispatch.eia3_group(&mut views[..width])
            }
        };

        for (slot, lane_error) in self.slots.iter_mut().zip(lane_errors) {
            let status = match (lane_error, result) {
                (Some(e), _) | (None, Err(e)) => JobStatus::Failed(e),
                (None, Ok(_)) => JobStatus::Completed,
            };
            slot.finish(status, stamp);
        }
        result
    }
}
