use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use log::info;

use crate::command::annotate::{run_annotation, AnnotateParams, DEFAULT_ANNOTATOR};
use crate::command::assemble::{
    run_assembly, AssembleParams, DEFAULT_ASSEMBLER, DEFAULT_THREADS_TOTAL,
};
use crate::command::merge::merge_shard_outputs;
use crate::command::report::{
    generate_reports, ReportParams, DEFAULT_AIRR_SCRIPT, DEFAULT_BARCODEREP_SCRIPT,
    DEFAULT_SIMPLEREP_SCRIPT,
};
use crate::command::split::{split_barcodes, SplitParams, DEFAULT_NUM_SHARDS};
use crate::fileformat::RunDir;

/// Commandline option: run the whole pipeline, split through report
#[derive(Args)]
pub struct RunCmd {
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

    /// IMGT reference database handed to the annotator
    #[arg(long = "imgt", value_parser)]
    pub imgt: PathBuf,

    #[arg(long = "single-end")]
    pub single_end: bool,

    /// Seed the shuffle for reproducible shard assignment
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub seed: Option<u64>,

    /// Fail on input streams of unequal length instead of truncating
    #[arg(long)]
    pub strict: bool,

    #[arg(long, default_value = DEFAULT_ASSEMBLER)]
    pub assembler: String,

    #[arg(long, default_value = DEFAULT_ANNOTATOR)]
    pub annotator: String,

    #[arg(long, default_value = DEFAULT_BARCODEREP_SCRIPT)]
    pub barcoderep_script: String,

    #[arg(long, default_value = DEFAULT_SIMPLEREP_SCRIPT)]
    pub simplerep_script: String,

    #[arg(long, default_value = DEFAULT_AIRR_SCRIPT)]
    pub airr_script: String,

    /// Kill a shard's external tool if it runs longer than this many seconds
    #[arg(long = "timeout-secs", value_parser = clap::value_parser!(u64))]
    pub timeout_secs: Option<u64>,
}

impl RunCmd {
    /// The five phases, strictly in order. Every phase reads what the
    /// previous one left in the run directory; the first error aborts the
    /// remainder.
    pub fn try_execute(&mut self) -> Result<()> {
        let run = RunDir::new(&self.run_dir);
        let timeout = self.timeout_secs.map(Duration::from_secs);

        // the report scripts are not needed until the very last phase,
        // but a missing one is worth knowing about before assembly starts
        let report_params = ReportParams {
            barcoderep_script: self.barcoderep_script.clone(),
            simplerep_script: self.simplerep_script.clone(),
            airr_script: self.airr_script.clone(),
        };
        report_params.warn_missing_scripts();

        split_barcodes(
            &run,
            &SplitParams {
                num_shards: self.num_shards,
                paired: !self.single_end,
                seed: self.seed,
                strict: self.strict,
            },
        )?;

        run_assembly(
            &run,
            &AssembleParams {
                num_shards: self.num_shards,
                threads_total: self.threads,
                ref_coord: self.ref_coord.clone(),
                paired: !self.single_end,
                assembler: self.assembler.clone(),
                timeout,
            },
        )?;

        run_annotation(
            &run,
            &AnnotateParams {
                num_shards: self.num_shards,
                threads_total: self.threads,
                imgt: self.imgt.clone(),
                annotator: self.annotator.clone(),
                timeout,
            },
        )?;

        merge_shard_outputs(&run, self.num_shards)?;

        generate_reports(&run, &report_params)?;

        info!("Pipeline finished");
        Ok(())
    }
}
