use std::process::{Command, Stdio};

use anyhow::bail;
use log::{debug, info, warn};

/// Probe for an external tool by launching it once. The tools we drive
/// print usage and exit when called without arguments, so any successful
/// launch counts as present.
pub fn check_tool(name: &str) -> anyhow::Result<()> {
    debug!("Checking for {}", name);
    let probe = Command::new(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output();
    if probe.is_ok() {
        info!("Found {}", name);
        Ok(())
    } else {
        bail!("'{}' is either not installed or not in PATH", name)
    }
}

/// Same probe, but only warns. Used for the report scripts, which are not
/// needed until the very last phase.
pub fn warn_if_tool_missing(name: &str) {
    if check_tool(name).is_err() {
        warn!("'{}' not found in PATH; the report phase will fail", name);
    }
}
