mod builtins;

use std::io::{self, Read};

use crate::common::Error;
use crate::cutils::safe_isatty;
use crate::exec;
use crate::jobs::JobTable;
use crate::log::{dev_info, user_error, RushLogger};
use crate::system::signal::{
    consts::*, signal_name, SignalHandler, SignalHandlerBehavior, SignalStream,
};

use builtins::Flow;

const PROMPT: &str = "rush> ";

pub fn main() {
    RushLogger::new("rush: ").into_global_logger();

    dev_info!("development logs are enabled");

    match Shell::new().and_then(|mut shell| shell.run()) {
        Ok(()) => std::process::exit(libc::EXIT_SUCCESS),
        Err(err) => {
            user_error!("{err}");
            std::process::exit(libc::EXIT_FAILURE);
        }
    }
}

struct Shell {
    jobs: JobTable,
    builtins: builtins::Registry,
    signal_stream: &'static SignalStream,
    interactive: bool,
    // keeps the installed dispositions alive for the shell's lifetime
    _signal_handlers: Vec<SignalHandler>,
}

impl Shell {
    /// Set up the shell's own signal dispositions and an empty job table.
    ///
    /// Failing to install these is fatal: without them the first `^Z` would
    /// stop the shell itself.
    fn new() -> io::Result<Self> {
        let signal_stream = SignalStream::init()?;

        let mut handlers = Vec::new();

        // ^C at the prompt only redraws it; while a foreground job runs the
        // terminal driver signals the job's group, not ours
        handlers.push(SignalHandler::register(
            SIGINT,
            SignalHandlerBehavior::Stream,
        )?);

        // stopping or quitting the terminal must never stop the shell;
        // SIGTTOU stays ignored so we can always reclaim the terminal
        for signal in [SIGQUIT, SIGTSTP, SIGTTIN, SIGTTOU] {
            handlers.push(SignalHandler::register(
                signal,
                SignalHandlerBehavior::Ignore,
            )?);
        }

        Ok(Self {
            jobs: JobTable::new(),
            builtins: builtins::registry(),
            signal_stream,
            interactive: safe_isatty(libc::STDIN_FILENO),
            _signal_handlers: handlers,
        })
    }

    fn run(&mut self) -> io::Result<()> {
        loop {
            // report background jobs that changed state since the last prompt
            exec::sweep(&mut self.jobs);

            if self.interactive {
                print_ignore_io_error!("{PROMPT}");
            }

            let Some(line) = self.read_line()? else {
                // end of input
                break;
            };

            let argv: Vec<String> = line.split_whitespace().map(str::to_owned).collect();

            match self.dispatch(argv) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(err) => user_error!("{err}"),
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, argv: Vec<String>) -> Result<Flow, Error> {
        let Some(name) = argv.first() else {
            return Ok(Flow::Continue);
        };

        if let Some(builtin) = self.builtins.get(name.as_str()).copied() {
            builtin(self, &argv)
        } else {
            exec::launch(&mut self.jobs, argv, self.interactive).map(|()| Flow::Continue)
        }
    }

    /// Read one line from standard input, `None` at end of input.
    ///
    /// A read interrupted by a streamed signal discards the partial line and
    /// redraws the prompt on a fresh line.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        let mut stdin = io::stdin().lock();
        let mut byte = [0u8; 1];

        loop {
            match stdin.read(&mut byte) {
                Ok(0) => {
                    return Ok(if line.is_empty() {
                        None
                    } else {
                        Some(String::from_utf8_lossy(&line).into_owned())
                    })
                }
                Ok(_) if byte[0] == b'\n' => {
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()))
                }
                Ok(_) => line.push(byte[0]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    self.drain_signals();
                    line.clear();
                    println_ignore_io_error!();
                    if self.interactive {
                        print_ignore_io_error!("{PROMPT}");
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn drain_signals(&self) {
        while let Ok(Some(info)) = self.signal_stream.try_recv() {
            dev_info!(
                "received {} from {}{}",
                signal_name(info.signal()),
                info.pid(),
                if info.is_user_signaled() { " (user)" } else { "" },
            );
        }
    }
}
