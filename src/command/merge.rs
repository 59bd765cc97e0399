use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Args;
use log::{debug, info};

use crate::command::split::DEFAULT_NUM_SHARDS;
use crate::fileformat::{OutputKind, RunDir};

/// Commandline option: concatenate per-shard outputs into combined files
#[derive(Args)]
pub struct MergeCmd {
    #[arg(short = 'd', long = "run-dir", value_parser)]
    pub run_dir: PathBuf,

    #[arg(short = 'n', long = "splits", value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_NUM_SHARDS)]
    pub num_shards: usize,
}

impl MergeCmd {
    pub fn try_execute(&mut self) -> Result<()> {
        let run = RunDir::new(&self.run_dir);
        merge_shard_outputs(&run, self.num_shards)
    }
}

/// Concatenate every output category across shards 1..N, in ascending
/// shard order. Downstream tools depend on that order, so it is the one
/// semantic guarantee here; the copy itself is byte-exact.
pub fn merge_shard_outputs(run: &RunDir, num_shards: usize) -> Result<()> {
    info!("Running command: merge");
    if num_shards == 0 {
        bail!("number of splits must be at least 1");
    }
    for kind in OutputKind::ALL {
        merge_category(run, num_shards, kind)?;
    }
    Ok(())
}

pub fn merge_category(run: &RunDir, num_shards: usize, kind: OutputKind) -> Result<()> {
    let dest_path = run.merged(kind);
    let dest = File::create(&dest_path)
        .map_err(|e| anyhow!("failed to create {}: {}", dest_path.display(), e))?;
    let mut writer = BufWriter::new(dest);

    let mut total_bytes: u64 = 0;
    for shard in 1..=num_shards {
        let src_path = run.shard_output(shard, kind);
        let mut src = File::open(&src_path)
            .map_err(|e| anyhow!("missing shard output {}: {}", src_path.display(), e))?;
        total_bytes += std::io::copy(&mut src, &mut writer)
            .map_err(|e| anyhow!("failed to append {}: {}", src_path.display(), e))?;
    }
    writer.flush()?;

    debug!(
        "Merged {} shards into {} ({} bytes)",
        num_shards,
        dest_path.display(),
        total_bytes
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup_run(num_shards: usize) -> (tempfile::TempDir, RunDir) {
        let dir = tempfile::tempdir().unwrap();
        let run = RunDir::new(dir.path());
        fs::create_dir_all(run.temp_dir()).unwrap();
        for shard in 1..=num_shards {
            for kind in OutputKind::ALL {
                fs::write(
                    run.shard_output(shard, kind),
                    format!("shard{}:{}\n", shard, kind.suffix()),
                )
                .unwrap();
            }
        }
        (dir, run)
    }

    #[test]
    fn test_merge_preserves_shard_order() {
        let (_dir, run) = setup_run(2);
        fs::write(run.shard_output(1, OutputKind::Cdr3), "x\n").unwrap();
        fs::write(run.shard_output(2, OutputKind::Cdr3), "y\n").unwrap();

        merge_category(&run, 2, OutputKind::Cdr3).unwrap();

        let merged = fs::read_to_string(run.merged(OutputKind::Cdr3)).unwrap();
        assert_eq!(merged, "x\ny\n");
    }

    #[test]
    fn test_merged_length_is_sum_of_shards() {
        let (_dir, run) = setup_run(3);
        merge_shard_outputs(&run, 3).unwrap();

        for kind in OutputKind::ALL {
            let shard_total: u64 = (1..=3)
                .map(|s| fs::metadata(run.shard_output(s, kind)).unwrap().len())
                .sum();
            let merged_len = fs::metadata(run.merged(kind)).unwrap().len();
            assert_eq!(merged_len, shard_total);
        }
    }

    #[test]
    fn test_merge_does_not_reorder_or_dedup() {
        let (_dir, run) = setup_run(3);
        for shard in 1..=3 {
            fs::write(run.shard_output(shard, OutputKind::Assign), "same\n").unwrap();
        }
        merge_category(&run, 3, OutputKind::Assign).unwrap();
        assert_eq!(
            fs::read_to_string(run.merged(OutputKind::Assign)).unwrap(),
            "same\nsame\nsame\n"
        );
    }

    #[test]
    fn test_missing_shard_file_is_fatal() {
        let (_dir, run) = setup_run(2);
        fs::remove_file(run.shard_output(2, OutputKind::Raw)).unwrap();

        let err = merge_shard_outputs(&run, 2).unwrap_err();
        assert!(err.to_string().contains("temp_2_raw.out"));
    }
}
