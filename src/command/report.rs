use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;
use clap::Args;
use log::info;

use crate::fileformat::{OutputKind, RunDir};
use crate::utils::{run_logged_to_file, warn_if_tool_missing};

pub const DEFAULT_BARCODEREP_SCRIPT: &str = "trust-barcoderep.pl";
pub const DEFAULT_SIMPLEREP_SCRIPT: &str = "trust-simplerep.pl";
pub const DEFAULT_AIRR_SCRIPT: &str = "trust-airr.pl";

/// Number of chains to report per barcode in the barcode-level report.
pub const CHAINS_IN_BARCODE: &str = "2";

/// Commandline option: generate the final reports from the merged outputs
#[derive(Args)]
pub struct ReportCmd {
    #[arg(short = 'd', long = "run-dir", value_parser)]
    pub run_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_BARCODEREP_SCRIPT)]
    pub barcoderep_script: String,

    #[arg(long, default_value = DEFAULT_SIMPLEREP_SCRIPT)]
    pub simplerep_script: String,

    #[arg(long, default_value = DEFAULT_AIRR_SCRIPT)]
    pub airr_script: String,
}

impl ReportCmd {
    pub fn try_execute(&mut self) -> Result<()> {
        let run = RunDir::new(&self.run_dir);
        let params = ReportParams {
            barcoderep_script: self.barcoderep_script.clone(),
            simplerep_script: self.simplerep_script.clone(),
            airr_script: self.airr_script.clone(),
        };
        params.warn_missing_scripts();
        generate_reports(&run, &params)
    }
}

#[derive(Clone, Debug)]
pub struct ReportParams {
    pub barcoderep_script: String,
    pub simplerep_script: String,
    pub airr_script: String,
}

impl Default for ReportParams {
    fn default() -> ReportParams {
        ReportParams {
            barcoderep_script: DEFAULT_BARCODEREP_SCRIPT.to_string(),
            simplerep_script: DEFAULT_SIMPLEREP_SCRIPT.to_string(),
            airr_script: DEFAULT_AIRR_SCRIPT.to_string(),
        }
    }
}

impl ReportParams {
    /// Preflight for the three scripts; they are only launched one after
    /// another, so a missing one is worth a warning up front.
    pub fn warn_missing_scripts(&self) {
        warn_if_tool_missing(&self.barcoderep_script);
        warn_if_tool_missing(&self.simplerep_script);
        warn_if_tool_missing(&self.airr_script);
    }
}

/// Run the three report tools strictly in sequence: the simple report
/// filters on the barcode report, and the AIRR conversion reads it too, so
/// there is nothing to parallelize. Each tool writes its report via stdout
/// redirection; any non-zero exit aborts the phase.
pub fn generate_reports(run: &RunDir, params: &ReportParams) -> Result<()> {
    info!("Running command: report");

    let mut barcoderep = Command::new(&params.barcoderep_script);
    barcoderep
        .arg(run.merged(OutputKind::Cdr3))
        .arg("-a")
        .arg(run.merged(OutputKind::Annot))
        .arg("--chainsInBarcode")
        .arg(CHAINS_IN_BARCODE);
    run_logged_to_file(&mut barcoderep, &run.barcode_report(), None)?;

    let mut simplerep = Command::new(&params.simplerep_script);
    simplerep
        .arg(run.merged(OutputKind::Cdr3))
        .arg("--barcodeCnt")
        .arg("--filterBarcoderep")
        .arg(run.barcode_report());
    run_logged_to_file(&mut simplerep, &run.simple_report(), None)?;

    let mut airr = Command::new(&params.airr_script);
    airr.arg(run.barcode_report())
        .arg(run.merged(OutputKind::Annot))
        .arg("--format")
        .arg("barcoderep");
    run_logged_to_file(&mut airr, &run.airr_report(), None)?;

    info!("Reports written under {}", run.assembly_dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn fake_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn setup_merged(run: &RunDir) {
        fs::create_dir_all(run.assembly_dir()).unwrap();
        fs::write(run.merged(OutputKind::Cdr3), "cdr3\n").unwrap();
        fs::write(run.merged(OutputKind::Annot), "annot\n").unwrap();
    }

    #[test]
    fn test_reports_run_in_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunDir::new(dir.path());
        setup_merged(&run);

        // each later script asserts the earlier report already exists
        let barcode_report = run.barcode_report();
        let params = ReportParams {
            barcoderep_script: fake_script(dir.path(), "barcoderep", "echo barcode_report"),
            simplerep_script: fake_script(
                dir.path(),
                "simplerep",
                &format!("test -s {} && echo simple_report", barcode_report.display()),
            ),
            airr_script: fake_script(
                dir.path(),
                "airr",
                &format!("test -s {} && echo airr_report", barcode_report.display()),
            ),
        };
        generate_reports(&run, &params).unwrap();

        assert_eq!(
            fs::read_to_string(run.barcode_report()).unwrap(),
            "barcode_report\n"
        );
        assert_eq!(
            fs::read_to_string(run.simple_report()).unwrap(),
            "simple_report\n"
        );
        assert_eq!(
            fs::read_to_string(run.airr_report()).unwrap(),
            "airr_report\n"
        );
    }

    #[test]
    fn test_report_subcommand_runs_preflight_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunDir::new(dir.path());
        setup_merged(&run);

        let mut cmd = ReportCmd {
            run_dir: dir.path().to_path_buf(),
            barcoderep_script: fake_script(dir.path(), "barcoderep", "echo b"),
            simplerep_script: fake_script(dir.path(), "simplerep", "echo s"),
            airr_script: fake_script(dir.path(), "airr", "echo a"),
        };
        cmd.try_execute().unwrap();

        assert!(run.barcode_report().exists());
        assert!(run.simple_report().exists());
        assert!(run.airr_report().exists());
    }

    #[test]
    fn test_missing_script_preflight_only_warns() {
        let params = ReportParams {
            barcoderep_script: "definitely-not-a-real-tool-xyz".to_string(),
            ..ReportParams::default()
        };
        // must not panic or abort; the failure surfaces when the script runs
        params.warn_missing_scripts();
    }

    #[test]
    fn test_failing_step_stops_the_phase() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunDir::new(dir.path());
        setup_merged(&run);

        let params = ReportParams {
            barcoderep_script: fake_script(dir.path(), "barcoderep", "exit 1"),
            simplerep_script: fake_script(dir.path(), "simplerep", "echo should_not_run"),
            airr_script: fake_script(dir.path(), "airr", "echo should_not_run"),
        };
        assert!(generate_reports(&run, &params).is_err());
        // later reports were never produced
        assert_eq!(fs::read_to_string(run.simple_report()).unwrap_or_default(), "");
        assert!(!run.airr_report().exists());
    }

    #[test]
    fn test_script_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunDir::new(dir.path());
        setup_merged(&run);

        let args_log = dir.path().join("args.log");
        let params = ReportParams {
            barcoderep_script: fake_script(
                dir.path(),
                "barcoderep",
                &format!("echo \"$@\" >> {}", args_log.display()),
            ),
            simplerep_script: fake_script(
                dir.path(),
                "simplerep",
                &format!("echo \"$@\" >> {}", args_log.display()),
            ),
            airr_script: fake_script(
                dir.path(),
                "airr",
                &format!("echo \"$@\" >> {}", args_log.display()),
            ),
        };
        generate_reports(&run, &params).unwrap();

        let calls = fs::read_to_string(&args_log).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("tcrbcr_cdr3.out"));
        assert!(lines[0].contains("--chainsInBarcode 2"));
        assert!(lines[1].contains("--barcodeCnt"));
        assert!(lines[1].contains("--filterBarcoderep"));
        assert!(lines[2].contains("--format barcoderep"));
        assert!(lines[2].contains("tcrbcr_barcode_report.tsv"));
    }
}
