//! Process-wide configuration.
//!
//! Settings recognized by the host process, per the external interfaces
//! section of the spec this crate implements: a default service-name tag,
//! the host's own IPv4 address (supplied by the host — this crate does not
//! probe network interfaces itself), and the default reporter sink.
use crate::reporter::Reporter;
use lazycell::AtomicLazyCell;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Process-wide settings shared by every trace that doesn't override them.
pub struct ProcessConfig {
    /// Tag identifying the hosting application, used as the default service
    /// name on locally produced endpoints.
    pub system_id: String,
    /// The host's local IPv4 address, if known. Left `None` if the host
    /// process didn't supply one; the encoder then simply omits it from
    /// endpoints rather than guessing.
    pub ipv4: Option<Ipv4Addr>,
    /// The default reporter sink, used by traces that don't supply their
    /// own `reporter` start option.
    pub reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("system_id", &self.system_id)
            .field("ipv4", &self.ipv4)
            .finish_non_exhaustive()
    }
}

static PROCESS_CONFIG: AtomicLazyCell<ProcessConfig> = AtomicLazyCell::NONE;

/// Installs the process-wide configuration.
///
/// This may only be called once in the lifetime of a program, mirroring
/// the one-shot nature of installing a global tracer. A trace started
/// before this is called (or in a program that never calls it) must supply
/// its own `reporter` start option, or `start`/`join` fails with
/// [`crate::StartError::NoReporter`].
///
/// Returns `Err` containing the config back if one was already installed.
pub fn set_process_config(config: ProcessConfig) -> Result<(), ProcessConfig> {
    PROCESS_CONFIG.fill(config)
}

/// Returns the process-wide configuration, if one has been installed.
pub fn process_config() -> Option<&'static ProcessConfig> {
    PROCESS_CONFIG.borrow()
}
