//! Utilities to handle signals.

mod handler;
mod set;
mod stream;

use std::borrow::Cow;

pub(crate) use handler::{SignalHandler, SignalHandlerBehavior};
pub(crate) use set::SignalSet;
pub(crate) use stream::{SignalInfo, SignalStream};

pub(crate) type SignalNumber = libc::c_int;

macro_rules! define_consts {
    ($($signal:ident,)*) => {
        pub(crate) mod consts {
            pub(crate) use libc::{$($signal,)*};
        }

        pub(crate) fn signal_name(signal: SignalNumber) -> Cow<'static, str> {
            match signal {
                $(consts::$signal => Cow::from(stringify!($signal)),)*
                _ => Cow::from(format!("unknown signal #{signal}")),
            }
        }
    };
}

define_consts! {
    SIGINT,
    SIGQUIT,
    SIGTSTP,
    SIGTTIN,
    SIGTTOU,
    SIGCHLD,
    SIGCONT,
    SIGTERM,
    SIGHUP,
    SIGKILL,
    SIGSTOP,
}
