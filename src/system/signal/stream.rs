use std::{
    io,
    mem::MaybeUninit,
    os::{fd::AsRawFd, unix::net::UnixStream},
    sync::OnceLock,
};

use crate::system::interface::ProcessId;
use crate::{cutils::cerr, log::dev_error};

use super::SignalNumber;

/// The payload delivered for one streamed signal.
#[repr(transparent)]
pub(crate) struct SignalInfo {
    info: libc::siginfo_t,
}

impl SignalInfo {
    const SIZE: usize = std::mem::size_of::<Self>();

    /// The signal number that arrived.
    pub(crate) fn signal(&self) -> SignalNumber {
        self.info.si_signo
    }

    /// The process that sent the signal.
    pub(crate) fn pid(&self) -> ProcessId {
        ProcessId::new(unsafe { self.info.si_pid() })
    }

    /// Whether the signal was raised by a process rather than by the kernel.
    pub(crate) fn is_user_signaled(&self) -> bool {
        self.info.si_code <= 0
    }
}

static STREAM: OnceLock<SignalStream> = OnceLock::new();

pub(super) unsafe extern "C" fn send_siginfo(
    _signal: SignalNumber,
    info: *const SignalInfo,
    _context: *const libc::c_void,
) {
    if let Some(tx) = STREAM.get().map(|stream| stream.tx.as_raw_fd()) {
        unsafe { libc::send(tx, info.cast(), SignalInfo::SIZE, libc::MSG_DONTWAIT) };
    }
}

/// A type able to receive signal information from any [`super::SignalHandler`] with the
/// [`super::SignalHandlerBehavior::Stream`] behavior.
///
/// This is a singleton type. Meaning that there will be only one value of this type during the
/// execution of a program.
pub(crate) struct SignalStream {
    rx: UnixStream,
    tx: UnixStream,
}

impl SignalStream {
    /// Create a new [`SignalStream`].
    ///
    /// # Panics
    ///
    /// If this function has been called before.
    #[track_caller]
    pub(crate) fn init() -> io::Result<&'static Self> {
        let (rx, tx) = UnixStream::pair().map_err(|err| {
            dev_error!("cannot create socket pair for `SignalStream`: {err}");
            err
        })?;

        if STREAM.set(Self { rx, tx }).is_err() {
            panic!("`SignalStream` has already been initialized");
        };

        Ok(STREAM.get().unwrap())
    }

    /// Receive the information related to a signal that already arrived, if any.
    ///
    /// Never blocks: returns `Ok(None)` when no streamed signal is pending.
    pub(crate) fn try_recv(&self) -> io::Result<Option<SignalInfo>> {
        let mut info = MaybeUninit::<SignalInfo>::uninit();
        let fd = self.rx.as_raw_fd();
        let bytes = match cerr(unsafe {
            libc::recv(fd, info.as_mut_ptr().cast(), SignalInfo::SIZE, libc::MSG_DONTWAIT)
        }) {
            Ok(bytes) => bytes,
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::Interrupted =>
            {
                return Ok(None)
            }
            Err(err) => return Err(err),
        };

        if bytes as usize != SignalInfo::SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Not enough bytes when receiving `siginfo_t`",
            ));
        }
        // SAFETY: we can assume `info` is initialized because `recv` wrote enough bytes to fill
        // the value and `siginfo_t` is POD.
        Ok(Some(unsafe { info.assume_init() }))
    }
}
