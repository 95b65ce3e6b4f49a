mod foreground;
mod status;

pub(crate) use foreground::wait_foreground;
pub(crate) use status::sweep;

use std::{io::ErrorKind, os::unix::process::CommandExt, process::Command};

use crate::common::Error;
use crate::jobs::{ExecMode, Job, JobState, JobTable};
use crate::log::{dev_info, dev_warn, user_error};
use crate::system::{
    _exit, fork,
    interface::ProcessId,
    setpgid,
    signal::{consts::*, signal_name, SignalHandler, SignalHandlerBehavior, SignalNumber, SignalSet},
    ForkResult,
};

/// Exit status of a child whose `exec` failed; distinguishable from any
/// successful run of the target program.
const EXEC_FAILURE_STATUS: libc::c_int = 127;

/// Signals whose dispositions the child resets before `exec`, so the launched
/// program receives them instead of inheriting the shell's handlers.
const JOB_CONTROL_SIGNALS: [SignalNumber; 5] = [SIGINT, SIGQUIT, SIGTSTP, SIGTTIN, SIGTTOU];

/// Fork and execute an external command, registering it in the job table.
///
/// A trailing `&` token marks the job as background and is stripped before
/// exec. The child branch of the fork never returns from this function: it
/// either becomes the target program or `_exit`s with [`EXEC_FAILURE_STATUS`].
pub(crate) fn launch(
    table: &mut JobTable,
    mut argv: Vec<String>,
    interactive: bool,
) -> Result<(), Error> {
    let mode = if argv.last().map(String::as_str) == Some("&") {
        argv.pop();
        ExecMode::Background
    } else {
        ExecMode::Foreground
    };

    let Some(command_name) = argv.first().cloned() else {
        return Err(Error::Usage("<command> [argument ...] [&]"));
    };

    // Reserve the slot before forking so a full table never leaves an
    // untracked child behind.
    let id = table.allocate()?;

    // Built before the fork; the child only has to call `exec`.
    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);

    // Block all signals until the child has joined its own process group, so
    // no job-control signal can race ahead of group membership.
    let original_set = match SignalSet::full().and_then(|set| set.block()) {
        Ok(original_set) => Some(original_set),
        Err(err) => {
            dev_warn!("cannot block signals: {err}");
            None
        }
    };

    let child_pid = match fork() {
        Err(err) => {
            if let Some(set) = &original_set {
                set.set_mask().ok();
            }
            // reported, no partial job is ever visible
            user_error!("cannot fork: {err}");
            return Ok(());
        }
        Ok(ForkResult::Child) => {
            // Every job runs in its own process group: stop, continue and
            // interrupt must reach the whole job, not just the leader.
            let this = ProcessId::new(0);
            if let Err(err) = setpgid(this, this) {
                dev_warn!("cannot create process group: {err}");
            }

            for signal in JOB_CONTROL_SIGNALS {
                match SignalHandler::register(signal, SignalHandlerBehavior::Default) {
                    Ok(handler) => handler.forget(),
                    Err(err) => dev_warn!("cannot reset {}: {err}", signal_name(signal)),
                }
            }

            if let Some(set) = original_set {
                if let Err(err) = set.set_mask() {
                    dev_warn!("cannot restore signal mask: {err}");
                }
            }

            let err = command.exec();

            // `exec` only returns on failure
            if err.kind() == ErrorKind::NotFound {
                user_error!("{command_name}: command not found");
            } else {
                user_error!("{command_name}: {err}");
            }
            _exit(EXEC_FAILURE_STATUS);
        }
        Ok(ForkResult::Parent(pid)) => pid,
    };

    // Mirror the child's setpgid: whichever call runs first wins, and the
    // group exists before either side continues. A failure because the child
    // already exec'd is expected and harmless.
    if let Err(err) = setpgid(child_pid, child_pid) {
        dev_info!("cannot move {child_pid} into its own group: {err}");
    }

    if let Some(set) = original_set {
        if let Err(err) = set.set_mask() {
            dev_warn!("cannot restore signal mask: {err}");
        }
    }

    dev_info!("launched {command_name} with pid {child_pid}");

    table.insert(
        id,
        Job {
            command: command_name.clone(),
            pid: child_pid,
            pgid: child_pid,
            state: JobState::Running,
            mode,
        },
    )?;

    match mode {
        ExecMode::Background => {
            println_ignore_io_error!("{child_pid} {command_name}");
            Ok(())
        }
        ExecMode::Foreground => Ok(wait_foreground(table, id, interactive, false)?),
    }
}
