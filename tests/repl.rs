//! End-to-end tests driving the shell binary over a stdin pipe.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

fn rush() -> std::process::Child {
    Command::new(env!("CARGO_BIN_EXE_rush"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn the shell")
}

fn run_script(script: &str) -> Output {
    let mut shell = rush();
    shell
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    shell.wait_with_output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn runs_external_commands() {
    let output = run_script("echo hello\nexit\n");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("hello"));
}

#[test]
fn end_of_input_terminates_the_repl() {
    let output = run_script("");
    assert!(output.status.success());
}

#[test]
fn exit_works_without_a_trailing_newline() {
    let output = run_script("exit");
    assert!(output.status.success());
}

#[test]
fn empty_lines_are_ignored() {
    let output = run_script("\n\n\nexit\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "");
    assert_eq!(stderr_of(&output), "");
}

#[test]
fn background_jobs_are_listed_without_blocking() {
    let output = run_script("sleep 2 &\njobs\nexit\n");
    assert!(output.status.success());

    // `jobs` ran while the sleep was still alive, so the launch did not
    // block on it. The orphaned sleep keeps the stdout pipe open, which is
    // why this asserts on content and not on elapsed time.
    let stdout = stdout_of(&output);
    assert!(stdout.contains("sleep"), "stdout: {stdout}");
    assert!(stdout.contains("running"), "stdout: {stdout}");
}

#[test]
fn background_completion_is_reported_once() {
    let mut shell = rush();
    let mut stdin = shell.stdin.take().unwrap();

    stdin.write_all(b"sleep 0.1 &\n").unwrap();
    stdin.flush().unwrap();
    thread::sleep(Duration::from_millis(600));
    stdin.write_all(b"jobs\nexit\n").unwrap();
    drop(stdin);

    let output = shell.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    assert_eq!(
        stdout.matches("done").count(),
        1,
        "stdout: {stdout}"
    );
}

#[test]
fn unknown_jobs_are_reported() {
    let output = run_script("fg %7\nexit\n");
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("no such job"));

    let output = run_script("bg %7\nexit\n");
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("no such job"));
}

#[test]
fn malformed_job_specs_are_reported() {
    let output = run_script("fg nope\nexit\n");
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("invalid job specification"));
}

#[test]
fn cd_without_argument_is_an_error() {
    let output = run_script("cd\nexit\n");
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("usage: cd"));
}

#[test]
fn cd_changes_the_working_directory() {
    let output = run_script("cd /\npwd\nexit\n");
    assert!(output.status.success());
    assert!(stdout_of(&output).lines().any(|line| line == "/"));
}

#[test]
fn cd_to_a_missing_directory_is_not_fatal() {
    let output = run_script("cd /definitely/not/a/directory\necho still-here\nexit\n");
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("cannot change directory"));
    assert!(stdout_of(&output).contains("still-here"));
}

#[test]
fn unknown_commands_are_reported_and_not_fatal() {
    let output = run_script("definitely-not-a-real-command-5481\necho still-here\nexit\n");
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("command not found"));
    assert!(stdout_of(&output).contains("still-here"));
}
