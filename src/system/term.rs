use std::{io, os::fd::AsRawFd};

use crate::cutils::cerr;

use super::interface::ProcessId;

mod sealed {
    use std::os::fd::AsRawFd;

    pub(crate) trait Sealed {}

    impl<F: AsRawFd> Sealed for F {}
}

pub(crate) trait Terminal: sealed::Sealed {
    fn tcsetpgrp(&self, pgrp: ProcessId) -> io::Result<()>;
}

impl<F: AsRawFd> Terminal for F {
    /// Set the foreground process group ID associated with this terminal to `pgrp`.
    ///
    /// The caller must ignore `SIGTTOU` for the duration, or this stops the
    /// calling process when it is not in the foreground process group itself.
    fn tcsetpgrp(&self, pgrp: ProcessId) -> io::Result<()> {
        cerr(unsafe { libc::tcsetpgrp(self.as_raw_fd(), pgrp.get()) }).map(|_| ())
    }
}
