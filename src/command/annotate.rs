use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use log::info;

use crate::command::assemble::{threads_per_shard, DEFAULT_THREADS_TOTAL};
use crate::command::split::DEFAULT_NUM_SHARDS;
use crate::fileformat::{OutputKind, RunDir};
use crate::threading::run_shard_pool;
use crate::utils::{check_tool, run_logged};

pub const DEFAULT_ANNOTATOR: &str = "annotator";

/// Commandline option: annotate every shard's assembly output in parallel
#[derive(Args)]
pub struct AnnotateCmd {
    #[arg(short = 'd', long = "run-dir", value_parser)]
    pub run_dir: PathBuf,

    #[arg(short = 'n', long = "splits", value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_NUM_SHARDS)]
    pub num_shards: usize,

    /// Total thread budget, divided over the shards
    #[arg(short = 't', long = "threads", value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_THREADS_TOTAL)]
    pub threads: usize,

    /// IMGT reference database handed to the annotator
    #[arg(short = 'f', long = "imgt", value_parser)]
    pub imgt: PathBuf,

    /// Annotator binary to invoke
    #[arg(long, default_value = DEFAULT_ANNOTATOR)]
    pub annotator: String,

    /// Kill a shard's annotator if it runs longer than this many seconds
    #[arg(long = "timeout-secs", value_parser = clap::value_parser!(u64))]
    pub timeout_secs: Option<u64>,
}

impl AnnotateCmd {
    pub fn try_execute(&mut self) -> Result<()> {
        let run = RunDir::new(&self.run_dir);
        let params = AnnotateParams {
            num_shards: self.num_shards,
            threads_total: self.threads,
            imgt: self.imgt.clone(),
            annotator: self.annotator.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        };
        run_annotation(&run, &params)
    }
}

#[derive(Clone, Debug)]
pub struct AnnotateParams {
    pub num_shards: usize,
    pub threads_total: usize,
    pub imgt: PathBuf,
    pub annotator: String,
    pub timeout: Option<Duration>,
}

/// Run one annotator invocation per shard, consuming the assembler's
/// per-shard output. Same pool and barrier semantics as the assembly phase.
pub fn run_annotation(run: &RunDir, params: &AnnotateParams) -> Result<()> {
    info!("Running command: annotate");
    if params.num_shards == 0 {
        bail!("number of splits must be at least 1");
    }
    check_tool(&params.annotator)?;

    let threads = threads_per_shard(params.threads_total, params.num_shards);
    let mut jobs = Vec::with_capacity(params.num_shards);
    for shard_index in 0..params.num_shards {
        let run = run.clone();
        let params = params.clone();
        jobs.push(move || {
            let mut cmd = annotation_command(
                &run,
                shard_index + 1,
                threads,
                &params.imgt,
                &params.annotator,
            );
            run_logged(&mut cmd, params.timeout)
        });
    }
    run_shard_pool(params.num_shards, jobs)
}

/// Annotator command line for one shard (1-indexed shard number).
fn annotation_command(
    run: &RunDir,
    shard: usize,
    threads: usize,
    imgt: &Path,
    annotator: &str,
) -> Command {
    let mut cmd = Command::new(annotator);
    cmd.arg("-f")
        .arg(imgt)
        .arg("-a")
        .arg(run.shard_output(shard, OutputKind::Final))
        .arg("-r")
        .arg(run.shard_output(shard, OutputKind::AssembledReads))
        .arg("-t")
        .arg(threads.to_string())
        .arg("-o")
        .arg(run.shard_prefix(shard))
        .arg("--barcode")
        .arg("--UMI")
        .arg("--readAssignment")
        .arg(run.shard_output(shard, OutputKind::Assign))
        .arg("--airrAlignment")
        .arg("--noImpute");
    cmd
}
