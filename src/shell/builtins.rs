//! The builtin commands, layered on the job table's public contract.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use super::Shell;
use crate::common::Error;
use crate::exec;
use crate::jobs::{ExecMode, JobId, JobState};
use crate::system::{killpg, signal::consts::SIGCONT};

pub(super) type Builtin = fn(&mut Shell, &[String]) -> Result<Flow, Error>;

/// Single mapping from command name to handler; extensible, no parallel arrays.
pub(super) type Registry = HashMap<&'static str, Builtin>;

/// What the REPL should do after a builtin returns.
pub(super) enum Flow {
    Continue,
    Exit,
}

pub(super) fn registry() -> Registry {
    HashMap::from([
        ("cd", cd as Builtin),
        ("exit", exit),
        ("jobs", jobs),
        ("fg", fg),
        ("bg", bg),
    ])
}

fn cd(_shell: &mut Shell, args: &[String]) -> Result<Flow, Error> {
    let [_, dir] = args else {
        return Err(Error::Usage("cd <directory>"));
    };

    env::set_current_dir(dir).map_err(|err| Error::ChDir(PathBuf::from(dir), err))?;

    Ok(Flow::Continue)
}

fn exit(_shell: &mut Shell, _args: &[String]) -> Result<Flow, Error> {
    Ok(Flow::Exit)
}

fn jobs(shell: &mut Shell, _args: &[String]) -> Result<Flow, Error> {
    exec::sweep(&mut shell.jobs);

    for (id, job) in shell.jobs.iter() {
        println_ignore_io_error!("[{id}] {} {} {}", job.pid, job.state.label(), job.command);
    }

    Ok(Flow::Continue)
}

/// Resume a suspended job in the foreground and block on it.
fn fg(shell: &mut Shell, args: &[String]) -> Result<Flow, Error> {
    let id = parse_job_spec(args, "fg %<job>")?;
    let Some(job) = shell.jobs.get_mut(id) else {
        return Err(Error::JobNotFound(id));
    };

    job.mode = ExecMode::Foreground;
    job.state = JobState::Continued;

    // the controller hands the terminal to the group before delivering
    // SIGCONT, so the resumed job is not stopped right back by SIGTTIN
    exec::wait_foreground(&mut shell.jobs, id, shell.interactive, true)?;

    Ok(Flow::Continue)
}

/// Resume a suspended job without retaking the foreground.
fn bg(shell: &mut Shell, args: &[String]) -> Result<Flow, Error> {
    let id = parse_job_spec(args, "bg %<job>")?;
    let Some(job) = shell.jobs.get_mut(id) else {
        return Err(Error::JobNotFound(id));
    };

    job.mode = ExecMode::Background;
    job.state = JobState::Continued;
    killpg(job.pgid, SIGCONT)?;

    println_ignore_io_error!("[{id}] {} {} &", job.pid, job.command);

    Ok(Flow::Continue)
}

/// Accepts `%N` (and bare `N`) job designators.
fn parse_job_spec(args: &[String], usage: &'static str) -> Result<JobId, Error> {
    let [_, spec] = args else {
        return Err(Error::Usage(usage));
    };

    let digits = spec.strip_prefix('%').unwrap_or(spec.as_str());
    digits
        .parse::<usize>()
        .ok()
        .and_then(JobId::new)
        .ok_or_else(|| Error::InvalidJobSpec(spec.clone()))
}
