//! The foreground controller: the only place where the shell's loop blocks.

use std::io;

use super::status::job_state;
use crate::jobs::{ExecMode, JobId, JobState, JobTable};
use crate::log::dev_warn;
use crate::system::{
    getpgrp, killpg,
    signal::consts::{SIGCONT, SIGINT},
    term::Terminal,
    wait::{Wait, WaitError, WaitOptions},
};

/// Block on the given job until it exits, is terminated, or stops.
///
/// While the job runs, its process group owns the terminal, so the terminal
/// driver delivers `SIGINT`/`SIGTSTP` to the whole job and not to the shell.
/// With `resume` set, the job's group is sent `SIGCONT` only after the
/// terminal handoff, so a resumed job that reads the terminal is not stopped
/// right back by `SIGTTIN`. A stopped job stays in the table as a suspended,
/// background-eligible job; a finished one is released before control
/// returns to the REPL.
pub(crate) fn wait_foreground(
    table: &mut JobTable,
    id: JobId,
    interactive: bool,
    resume: bool,
) -> io::Result<()> {
    let Some(job) = table.get(id) else {
        return Ok(());
    };
    let (pid, pgid, command) = (job.pid, job.pgid, job.command.clone());

    let stdin = io::stdin();
    if interactive {
        if let Err(err) = stdin.tcsetpgrp(pgid) {
            dev_warn!("cannot give terminal to job {id} ({pgid}): {err}");
        }
    }

    if resume {
        // a dead group is reconciled by the wait below, so this is not fatal
        if let Err(err) = killpg(pgid, SIGCONT) {
            dev_warn!("cannot continue job {id} ({pgid}): {err}");
        }
    }

    let result = loop {
        match pid.wait(WaitOptions::new().untraced().continued()) {
            Err(WaitError::Io(err)) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(WaitError::Io(err)) => {
                // the child is gone in a way we cannot observe; drop the record
                table.release(id);
                break Err(err);
            }
            Err(WaitError::NotReady) => continue,
            Ok((_, status)) => match job_state(&status) {
                Some(state) if state.is_terminal() => {
                    table.release(id);
                    if interactive && status.term_signal() == Some(SIGINT) {
                        // the ^C echo leaves the cursor mid-line
                        println_ignore_io_error!();
                    }
                    break Ok(());
                }
                Some(JobState::Stopped) => {
                    if let Some(job) = table.get_mut(id) {
                        job.state = JobState::Stopped;
                        job.mode = ExecMode::Background;
                    }
                    println_ignore_io_error!("[{id}] {pid} suspended {command}");
                    break Ok(());
                }
                // a transient continue report does not end the wait
                Some(JobState::Continued) => table.update_state(id, JobState::Running),
                _ => {}
            },
        }
    };

    if interactive {
        if let Err(err) = stdin.tcsetpgrp(getpgrp()) {
            dev_warn!("cannot reclaim terminal: {err}");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{ExecMode, Job, JobTable};
    use crate::system::{interface::ProcessId, kill, signal::consts::*};

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
                    mode: ExecMode::Foreground,
                },
            )
            .unwrap();
        id
    }

    #[test]
    fn finished_jobs_leave_the_table() {
        let child = std::process::Command::new("sh")
            .args(["-c", "exit 3"])
            .spawn()
            .unwrap();

        let mut table = JobTable::new();
        let id = track(&mut table, &child, "sh");

        wait_foreground(&mut table, id, false, false).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn signaled_jobs_leave_the_table() {
        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();

        let mut table = JobTable::new();
        let id = track(&mut table, &child, "sleep");
        let pid = table.get(id).unwrap().pid;

        kill(pid, SIGTERM).unwrap();
        wait_foreground(&mut table, id, false, false).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn stopped_jobs_stay_suspended_in_the_table() {
        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();

        let mut table = JobTable::new();
        let id = track(&mut table, &child, "sleep");
        let pid = table.get(id).unwrap().pid;

        kill(pid, SIGSTOP).unwrap();
        wait_foreground(&mut table, id, false, false).unwrap();

        let job = table.get(id).expect("job should remain tracked");
        assert_eq!(job.state, JobState::Stopped);
        assert_eq!(job.mode, ExecMode::Background);

        // resuming lets a second foreground wait reap it
        kill(pid, SIGCONT).unwrap();
        kill(pid, SIGTERM).unwrap();
        wait_foreground(&mut table, id, false, false).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn resume_delivers_sigcont_to_the_jobs_group() {
        use std::os::unix::process::CommandExt;

        // the job runs in its own group, as launched jobs do
        let child = std::process::Command::new("sleep")
            .arg("5")
            .process_group(0)
            .spawn()
            .unwrap();

        let mut table = JobTable::new();
        let id = track(&mut table, &child, "sleep");
        let pid = table.get(id).unwrap().pid;

        kill(pid, SIGSTOP).unwrap();
        wait_foreground(&mut table, id, false, false).unwrap();
        assert_eq!(table.get(id).unwrap().state, JobState::Stopped);

        // the termination signal stays pending until the group is continued,
        // which the resuming wait itself must do
        kill(pid, SIGTERM).unwrap();
        wait_foreground(&mut table, id, false, true).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn waiting_for_a_released_job_is_a_no_op() {
        let mut table = JobTable::new();
        let id = table.allocate().unwrap();
        wait_foreground(&mut table, id, false, false).unwrap();
        assert!(table.is_empty());
    }
}
