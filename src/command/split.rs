use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::Args;
use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::fileformat::streams::{write_fasta_record, write_fastq_record};
use crate::fileformat::{read_cell_manifest, LockstepReader, LockstepRecord, RunDir};

pub const DEFAULT_NUM_SHARDS: usize = 10;

/// Commandline option: partition the barcoded reads into shards
#[derive(Args)]
pub struct SplitCmd {
    #[arg(short = 'd', long = "run-dir", value_parser)]
    pub run_dir: PathBuf,

    #[arg(short = 'n', long = "splits", value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_NUM_SHARDS)]
    pub num_shards: usize,

    /// Input reads are single-end (no R2 stream)
    #[arg(long = "single-end")]
    pub single_end: bool,

    /// Seed the shuffle for reproducible shard assignment
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub seed: Option<u64>,

    /// Fail on input streams of unequal length instead of truncating
    #[arg(long)]
    pub strict: bool,
}

impl SplitCmd {
    pub fn try_execute(&mut self) -> Result<()> {
        let run = RunDir::new(&self.run_dir);
        let params = SplitParams {
            num_shards: self.num_shards,
            paired: !self.single_end,
            seed: self.seed,
            strict: self.strict,
        };
        split_barcodes(&run, &params)
    }
}

#[derive(Clone, Debug)]
pub struct SplitParams {
    pub num_shards: usize,
    pub paired: bool,
    pub seed: Option<u64>,
    pub strict: bool,
}

/// Partition the input streams into shards by barcode membership.
///
/// The manifest barcodes are shuffled, split into contiguous near-equal
/// groups and materialized as one global barcode -> shard-index map, so
/// routing is a single lookup per record. Reads whose barcode is not in
/// the manifest are dropped.
pub fn split_barcodes(run: &RunDir, params: &SplitParams) -> Result<()> {
    info!("Running command: split");
    if params.num_shards == 0 {
        bail!("number of splits must be at least 1");
    }

    let mut barcodes = read_cell_manifest(&run.manifest())?;
    if barcodes.is_empty() {
        bail!("manifest {} lists no cells", run.manifest().display());
    }
    shuffle_barcodes(&mut barcodes, params.seed);
    let shard_of = build_shard_map(&barcodes, params.num_shards);
    debug!(
        "Shard sizes: {}",
        shard_sizes(barcodes.len(), params.num_shards)
            .iter()
            .join(",")
    );

    fs::create_dir_all(run.temp_dir())
        .map_err(|e| anyhow!("failed to create {}: {}", run.temp_dir().display(), e))?;
    let mut writers = ShardWriters::create(run, params.num_shards, params.paired)?;

    let mut streams = LockstepReader::open(run, params.paired)?;
    let mut n_routed: u64 = 0;
    let mut n_dropped: u64 = 0;
    while let Some(record) = streams.next_record()? {
        match shard_of.get(record.barcode_seq()) {
            Some(&shard_index) => {
                writers.route(shard_index, &record)?;
                n_routed += 1;
            }
            None => n_dropped += 1,
        }
    }
    writers.finish()?;

    if streams.uneven() {
        if params.strict {
            bail!(
                "input streams have unequal lengths; stopped after {} records",
                streams.records_read()
            );
        }
        warn!(
            "Input streams have unequal lengths; stopped after {} records",
            streams.records_read()
        );
    }
    if n_dropped > 0 {
        warn!(
            "{} reads carried barcodes absent from the manifest and were dropped",
            n_dropped
        );
    }
    info!(
        "Routed {} reads into {} shards ({} dropped)",
        n_routed, params.num_shards, n_dropped
    );
    Ok(())
}

fn shuffle_barcodes(barcodes: &mut [String], seed: Option<u64>) {
    match seed {
        Some(seed) => barcodes.shuffle(&mut SmallRng::seed_from_u64(seed)),
        None => barcodes.shuffle(&mut rand::thread_rng()),
    }
}

/// Sizes of `n` contiguous near-equal groups over `len` elements; the
/// first `len % n` groups take one extra element.
pub fn shard_sizes(len: usize, n: usize) -> Vec<usize> {
    let base = len / n;
    let extra = len % n;
    (0..n).map(|i| base + usize::from(i < extra)).collect()
}

/// Map every barcode to its shard index. Groups are contiguous runs of the
/// shuffled list, so shards are disjoint by construction and each barcode
/// maps to exactly one shard.
pub fn build_shard_map(barcodes: &[String], n: usize) -> FxHashMap<Vec<u8>, usize> {
    let mut map: FxHashMap<Vec<u8>, usize> = FxHashMap::default();
    let mut start = 0;
    for (shard_index, size) in shard_sizes(barcodes.len(), n).into_iter().enumerate() {
        for barcode in &barcodes[start..start + size] {
            map.insert(barcode.as_bytes().to_vec(), shard_index);
        }
        start += size;
    }
    map
}

/// Per-shard output files, indexed by 0-based shard index; file names on
/// disk use the 1-based shard number.
struct ShardWriters {
    r1: Vec<BufWriter<File>>,
    r2: Option<Vec<BufWriter<File>>>,
    barcode: Vec<BufWriter<File>>,
    umi: Vec<BufWriter<File>>,
}

impl ShardWriters {
    fn create(run: &RunDir, n: usize, paired: bool) -> Result<ShardWriters> {
        let mut r1 = Vec::with_capacity(n);
        let mut r2 = Vec::with_capacity(n);
        let mut barcode = Vec::with_capacity(n);
        let mut umi = Vec::with_capacity(n);
        for shard in 1..=n {
            r1.push(create_writer(&run.shard_read1(shard))?);
            if paired {
                r2.push(create_writer(&run.shard_read2(shard))?);
            }
            barcode.push(create_writer(&run.shard_barcode(shard))?);
            umi.push(create_writer(&run.shard_umi(shard))?);
        }
        Ok(ShardWriters {
            r1,
            r2: if paired { Some(r2) } else { None },
            barcode,
            umi,
        })
    }

    fn route(&mut self, shard_index: usize, record: &LockstepRecord) -> Result<()> {
        write_fastq_record(&mut self.r1[shard_index], &record.r1)?;
        if let (Some(writers), Some(r2)) = (self.r2.as_mut(), record.r2.as_ref()) {
            write_fastq_record(&mut writers[shard_index], r2)?;
        }
        write_fasta_record(&mut self.barcode[shard_index], &record.barcode)?;
        write_fasta_record(&mut self.umi[shard_index], &record.umi)?;
        Ok(())
    }

    fn finish(self) -> Result<()> {
        for mut writer in self
            .r1
            .into_iter()
            .chain(self.r2.into_iter().flatten())
            .chain(self.barcode)
            .chain(self.umi)
        {
            writer.flush()?;
        }
        Ok(())
    }
}

fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).map_err(|e| anyhow!("failed to create {}: {}", path.display(), e))?;
    Ok(BufWriter::new(file))
}
