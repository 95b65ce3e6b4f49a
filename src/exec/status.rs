//! Reconciliation of wait-syscall outcomes into job-state transitions.

use crate::jobs::{JobState, JobTable};
use crate::log::dev_warn;
use crate::system::wait::{Wait, WaitError, WaitOptions, WaitStatus};

/// Convert a wait outcome into the job-state transition it implies, if any.
pub(crate) fn job_state(status: &WaitStatus) -> Option<JobState> {
    if status.did_exit() {
        Some(JobState::Done)
    } else if status.was_signaled() {
        Some(JobState::Terminated)
    } else if status.was_stopped() {
        Some(JobState::Stopped)
    } else if status.did_continue() {
        Some(JobState::Continued)
    } else {
        None
    }
}

/// Poll every tracked job without blocking and apply whatever transition the
/// OS reports; jobs with no pending report are left untouched.
///
/// A job observed in a terminal state is reported once and released.
pub(crate) fn sweep(table: &mut JobTable) {
    for id in table.ids() {
        let Some(job) = table.get(id) else { continue };
        let pid = job.pid;
        let state = job.state;

        match pid.wait(WaitOptions::new().no_hang().untraced().continued()) {
            Err(WaitError::NotReady) => {
                // no report pending: a job resumed by SIGCONT is executing again
                if state == JobState::Continued {
                    table.update_state(id, JobState::Running);
                }
            }
            Err(WaitError::Io(err)) => {
                dev_warn!("cannot wait for job {id} ({pid}): {err}");
            }
            Ok((reported_pid, status)) => {
                // the syscall reports a pid; resolve it back to a job record
                let Some(id) = table.find_by_pid(reported_pid) else {
                    continue;
                };

                match job_state(&status) {
                    Some(new_state) if new_state.is_terminal() => {
                        if let Some(job) = table.release(id) {
                            println_ignore_io_error!(
                                "[{id}] {} {} {}",
                                job.pid,
                                new_state.label(),
                                job.command
                            );
                        }
                    }
                    Some(JobState::Continued) => table.update_state(id, JobState::Running),
                    Some(new_state) => table.update_state(id, new_state),
                    None => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{ExecMode, Job, JobId, JobTable};
    use crate::system::{interface::ProcessId, kill, signal::consts::*};
    use std::time::Duration;

    fn track(table: &mut JobTable, command: &std::process::Child, name: &str) -> JobId {
        let pid = ProcessId::new(command.id() as i32);
        let id = table.allocate().unwrap();
        table
            .insert(
                id,
                Job {
                    command: name.to_string(),
                    pid,
                    pgid: pid,
                    state: JobState::Running,
                    mode: ExecMode::Background,
                },
            )
            .unwrap();
        id
    }

    fn sweep_until<F: Fn(&JobTable) -> bool>(table: &mut JobTable, cond: F) {
        for _ in 0..100 {
            sweep(table);
            if cond(table) {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("condition not reached while sweeping");
    }

    #[test]
    fn done_jobs_are_released_after_one_report() {
        let child = std::process::Command::new("sh")
            .args(["-c", "exit 0"])
            .spawn()
            .unwrap();

        let mut table = JobTable::new();
        track(&mut table, &child, "sh");

        sweep_until(&mut table, JobTable::is_empty);
    }

    #[test]
    fn stop_continue_kill_walks_the_state_machine() {
        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();

        let mut table = JobTable::new();
        let id = track(&mut table, &child, "sleep");
        let pid = table.get(id).unwrap().pid;

        kill(pid, SIGSTOP).unwrap();
        sweep_until(&mut table, |t| {
            t.get(id).map(|j| j.state) == Some(JobState::Stopped)
        });

        kill(pid, SIGCONT).unwrap();
        sweep_until(&mut table, |t| {
            t.get(id).map(|j| j.state) == Some(JobState::Running)
        });

        kill(pid, SIGKILL).unwrap();
        sweep_until(&mut table, JobTable::is_empty);
    }

    #[test]
    fn untouched_jobs_stay_running() {
        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();

        let mut table = JobTable::new();
        let id = track(&mut table, &child, "sleep");

        sweep(&mut table);
        assert_eq!(table.get(id).unwrap().state, JobState::Running);

        let pid = table.get(id).unwrap().pid;
        kill(pid, SIGKILL).unwrap();
        sweep_until(&mut table, JobTable::is_empty);
    }
}
