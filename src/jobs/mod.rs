#![forbid(unsafe_code)]
//! The job table: one slot per launched command, tracked from fork to reaping.

use std::fmt;

use crate::common::Error;
use crate::system::interface::ProcessId;

/// Fixed capacity of the job table; exceeding it is a reportable error.
pub(crate) const MAX_JOBS: usize = 20;

/// Identifier of an occupied job slot. Positive, lowest-unused on allocation,
/// reused after release, stable for the job's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(usize);

impl JobId {
    pub(crate) fn new(id: usize) -> Option<Self> {
        (1..=MAX_JOBS).contains(&id).then_some(Self(id))
    }

    fn index(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobState {
    Running,
    Done,
    Stopped,
    Continued,
    Terminated,
}

impl JobState {
    /// The label shown in `jobs` listings and completion reports.
    pub(crate) fn label(self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Done => "done",
            JobState::Stopped => "suspended",
            JobState::Continued => "continued",
            JobState::Terminated => "terminated",
        }
    }

    /// Terminal states are final: the job is removed once reported.
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Terminated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecMode {
    Foreground,
    Background,
}

/// One tracked process.
#[derive(Debug, Clone)]
pub(crate) struct Job {
    /// Owned copy of the program name used to launch the job.
    pub(crate) command: String,
    /// Process id of the job's leader process.
    pub(crate) pid: ProcessId,
    /// The process group the job runs in; the unit of signal delivery.
    pub(crate) pgid: ProcessId,
    pub(crate) state: JobState,
    pub(crate) mode: ExecMode,
}

/// Fixed-capacity registry of active jobs.
///
/// Owned by the shell's single thread of control; child processes never touch
/// it, so no locking is needed.
pub(crate) struct JobTable {
    slots: [Option<Job>; MAX_JOBS],
}

impl JobTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Return the lowest currently-unused id, or fail when all slots are occupied.
    ///
    /// Allocation does not occupy the slot; pair it with [`JobTable::insert`].
    pub(crate) fn allocate(&self) -> Result<JobId, Error> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|index| JobId(index + 1))
            .ok_or(Error::JobTableFull)
    }

    /// Store a fully-populated record at the given id's slot.
    ///
    /// A `DuplicateJob` error here is an internal invariant violation: it
    /// cannot happen when the id came from [`JobTable::allocate`].
    pub(crate) fn insert(&mut self, id: JobId, job: Job) -> Result<(), Error> {
        let slot = &mut self.slots[id.index()];
        if slot.is_some() {
            return Err(Error::DuplicateJob(id));
        }
        *slot = Some(job);
        Ok(())
    }

    pub(crate) fn get(&self, id: JobId) -> Option<&Job> {
        self.slots[id.index()].as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.slots[id.index()].as_mut()
    }

    /// Look up a job by the process id the wait syscalls report.
    pub(crate) fn find_by_pid(&self, pid: ProcessId) -> Option<JobId> {
        self.iter()
            .find_map(|(id, job)| (job.pid == pid).then_some(id))
    }

    pub(crate) fn update_state(&mut self, id: JobId, state: JobState) {
        if let Some(job) = self.get_mut(id) {
            job.state = state;
        }
    }

    /// Remove the slot, freeing its id for reuse by [`JobTable::allocate`].
    pub(crate) fn release(&mut self, id: JobId) -> Option<Job> {
        self.slots[id.index()].take()
    }

    /// Iterate over occupied slots in id order. A fresh call re-reads current contents.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (JobId, &Job)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|job| (JobId(index + 1), job)))
    }

    /// Snapshot of the occupied ids, for loops that mutate the table while walking it.
    pub(crate) fn ids(&self) -> Vec<JobId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
