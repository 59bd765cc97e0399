use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use log::info;

use crate::command::split::DEFAULT_NUM_SHARDS;
use crate::fileformat::RunDir;
use crate::threading::run_shard_pool;
use crate::utils::{check_tool, run_logged};

pub const DEFAULT_ASSEMBLER: &str = "trust4";
pub const DEFAULT_THREADS_TOTAL: usize = 10;

/// Commandline option: run the external assembler on every shard in parallel
#[derive(Args)]
pub struct AssembleCmd {
    #[arg(short = 'd', long = "run-dir", value_parser)]
    pub run_dir: PathBuf,

    #[arg(short = 'n', long = "splits", value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_NUM_SHARDS)]
    pub num_shards: usize,

    /// Total thread budget, divided over the shards
    #[arg(short = 't', long = "threads", value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_THREADS_TOTAL)]
    pub threads: usize,

    /// Reference gene coordinate file handed to the assembler
    #[arg(short = 'f', long = "ref-coord", value_parser)]
    pub ref_coord: PathBuf,

    #[arg(long = "single-end")]
    pub single_end: bool,

    /// Assembler binary to invoke
    #[arg(long, default_value = DEFAULT_ASSEMBLER)]
    pub assembler: String,

    /// Kill a shard's assembler if it runs longer than this many seconds
    #[arg(long = "timeout-secs", value_parser = clap::value_parser!(u64))]
    pub timeout_secs: Option<u64>,
}

impl AssembleCmd {
    pub fn try_execute(&mut self) -> Result<()> {
        let run = RunDir::new(&self.run_dir);
        let params = AssembleParams {
            num_shards: self.num_shards,
            threads_total: self.threads,
            ref_coord: self.ref_coord.clone(),
            paired: !self.single_end,
            assembler: self.assembler.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        };
        run_assembly(&run, &params)
    }
}

#[derive(Clone, Debug)]
pub struct AssembleParams {
    pub num_shards: usize,
    pub threads_total: usize,
    pub ref_coord: PathBuf,
    pub paired: bool,
    pub assembler: String,
    pub timeout: Option<Duration>,
}

/// Run one assembler invocation per shard on a pool of exactly
/// `num_shards` workers and wait for all of them.
pub fn run_assembly(run: &RunDir, params: &AssembleParams) -> Result<()> {
    info!("Running command: assemble");
    if params.num_shards == 0 {
        bail!("number of splits must be at least 1");
    }
    check_tool(&params.assembler)?;

    let threads_per_shard = threads_per_shard(params.threads_total, params.num_shards);
    let mut jobs = Vec::with_capacity(params.num_shards);
    for shard_index in 0..params.num_shards {
        let run = run.clone();
        let params = params.clone();
        jobs.push(move || {
            let mut cmd = assembly_command(
                &run,
                shard_index + 1,
                threads_per_shard,
                &params.ref_coord,
                params.paired,
                &params.assembler,
            );
            run_logged(&mut cmd, params.timeout)
        });
    }
    run_shard_pool(params.num_shards, jobs)
}

pub fn threads_per_shard(threads_total: usize, num_shards: usize) -> usize {
    ((threads_total + num_shards - 1) / num_shards).max(1)
}

/// Assembler command line for one shard (1-indexed shard number).
fn assembly_command(
    run: &RunDir,
    shard: usize,
    threads: usize,
    ref_coord: &Path,
    paired: bool,
    assembler: &str,
) -> Command {
    let mut cmd = Command::new(assembler);
    cmd.arg("-t")
        .arg(threads.to_string())
        .arg("-f")
        .arg(ref_coord)
        .arg("-o")
        .arg(run.shard_prefix(shard))
        .arg("--barcode")
        .arg(run.shard_barcode(shard))
        .arg("--UMI")
        .arg(run.shard_umi(shard));
    if paired {
        cmd.arg("-1")
            .arg(run.shard_read1(shard))
            .arg("-2")
            .arg(run.shard_read2(shard));
    } else {
        cmd.arg("-u").arg(run.shard_read1(shard));
    }
    cmd
}
