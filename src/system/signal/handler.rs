use std::io;

use crate::log::dev_warn;

use super::{set::SignalAction, signal_name, SignalNumber};

/// How a registered signal is treated by the shell.
pub(crate) enum SignalHandlerBehavior {
    /// Execute the default action for the signal.
    Default,
    /// Ignore the arrival of the signal.
    Ignore,
    /// Stream the signal information into the [`super::SignalStream`] singleton.
    Stream,
}

/// Overrides the disposition of one signal for as long as the value lives.
///
/// Dropping the handler restores whatever disposition was in place before
/// [`SignalHandler::register`] was called.
pub(crate) struct SignalHandler {
    signal: SignalNumber,
    original_action: SignalAction,
}

impl SignalHandler {
    pub(crate) fn register(
        signal: SignalNumber,
        behavior: SignalHandlerBehavior,
    ) -> io::Result<Self> {
        let original_action = SignalAction::new(behavior)?.register(signal)?;

        Ok(Self {
            signal,
            original_action,
        })
    }

    /// Keep the new disposition in place permanently instead of restoring the
    /// old one, as the child side of a fork does right before `exec`.
    pub(crate) fn forget(self) {
        std::mem::forget(self)
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        let signal = self.signal;
        if let Err(err) = self.original_action.register(signal) {
            dev_warn!(
                "cannot restore disposition for {}: {err}",
                signal_name(signal),
            )
        }
    }
}
