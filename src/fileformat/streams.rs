use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Result};
use log::debug;
use seq_io::fasta;
use seq_io::fasta::Reader as FastaReader;
use seq_io::fasta::Record as FastaRecord;
use seq_io::fastq;
use seq_io::fastq::Reader as FastqReader;
use seq_io::fastq::Record as FastqRecord;

use super::run_dir::RunDir;

/// Open a FASTQ stream, transparently decompressing if needed.
pub fn open_fastq(path: &Path) -> Result<FastqReader<Box<dyn std::io::Read>>> {
    let file = File::open(path).map_err(|e| anyhow!("could not open {}: {}", path.display(), e))?;
    let (reader, compression) = niffler::get_reader(Box::new(file))
        .map_err(|e| anyhow!("could not read {}: {}", path.display(), e))?;
    debug!(
        "Opened file {} with compression {:?}",
        path.display(),
        compression
    );
    Ok(FastqReader::new(reader))
}

/// Open a FASTA stream, transparently decompressing if needed.
pub fn open_fasta(path: &Path) -> Result<FastaReader<Box<dyn std::io::Read>>> {
    let file = File::open(path).map_err(|e| anyhow!("could not open {}: {}", path.display(), e))?;
    let (reader, compression) = niffler::get_reader(Box::new(file))
        .map_err(|e| anyhow!("could not read {}: {}", path.display(), e))?;
    debug!(
        "Opened file {} with compression {:?}",
        path.display(),
        compression
    );
    Ok(FastaReader::new(reader))
}

pub fn write_fastq_record<W: Write>(writer: &mut W, record: &fastq::OwnedRecord) -> Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(&record.head)?;
    writer.write_all(b"\n")?;
    writer.write_all(&record.seq)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(&record.qual)?;
    writer.write_all(b"\n")?;
    Ok(())
}

pub fn write_fasta_record<W: Write>(writer: &mut W, record: &fasta::OwnedRecord) -> Result<()> {
    writer.write_all(b">")?;
    writer.write_all(&record.head)?;
    writer.write_all(b"\n")?;
    writer.write_all(&record.seq)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// One sequencing read unit: the i-th entry of every input stream.
pub struct LockstepRecord {
    pub r1: fastq::OwnedRecord,
    pub r2: Option<fastq::OwnedRecord>,
    pub barcode: fasta::OwnedRecord,
    pub umi: fasta::OwnedRecord,
}

impl LockstepRecord {
    pub fn barcode_seq(&self) -> &[u8] {
        &self.barcode.seq
    }
}

/// Pulls the 3-4 input streams one record at a time, in lockstep. The
/// streams are positionally aligned by contract; the only misalignment this
/// reader can detect is streams ending at different lengths, which it
/// records in `uneven` while stopping at the shortest stream.
pub struct LockstepReader {
    r1: FastqReader<Box<dyn std::io::Read>>,
    r2: Option<FastqReader<Box<dyn std::io::Read>>>,
    barcode: FastaReader<Box<dyn std::io::Read>>,
    umi: FastaReader<Box<dyn std::io::Read>>,
    records_read: u64,
    uneven: bool,
}

impl LockstepReader {
    pub fn open(run: &RunDir, paired: bool) -> Result<LockstepReader> {
        let r2 = if paired {
            Some(open_fastq(&run.read2())?)
        } else {
            None
        };
        Ok(LockstepReader {
            r1: open_fastq(&run.read1())?,
            r2,
            barcode: open_fasta(&run.barcode_fa())?,
            umi: open_fasta(&run.umi_fa())?,
            records_read: 0,
            uneven: false,
        })
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// True once any stream ended before the others.
    pub fn uneven(&self) -> bool {
        self.uneven
    }

    pub fn next_record(&mut self) -> Result<Option<LockstepRecord>> {
        let paired = self.r2.is_some();
        let r1 = next_fastq(&mut self.r1)?;
        let r2 = match self.r2.as_mut() {
            Some(reader) => next_fastq(reader)?,
            None => None,
        };
        let barcode = next_fasta(&mut self.barcode)?;
        let umi = next_fasta(&mut self.umi)?;

        let r2_present = r2.is_some();
        match (r1, barcode, umi) {
            (Some(r1), Some(barcode), Some(umi)) => {
                if paired && !r2_present {
                    self.uneven = true;
                    return Ok(None);
                }
                self.records_read += 1;
                Ok(Some(LockstepRecord {
                    r1,
                    r2,
                    barcode,
                    umi,
                }))
            }
            (None, None, None) => {
                if r2_present {
                    self.uneven = true;
                }
                Ok(None)
            }
            _ => {
                self.uneven = true;
                Ok(None)
            }
        }
    }
}

fn next_fastq(
    reader: &mut FastqReader<Box<dyn std::io::Read>>,
) -> Result<Option<fastq::OwnedRecord>> {
    match reader.next() {
        Some(record) => {
            let record = record.map_err(|e| anyhow!("error reading fastq stream: {}", e))?;
            Ok(Some(record.to_owned_record()))
        }
        None => Ok(None),
    }
}

fn next_fasta(
    reader: &mut FastaReader<Box<dyn std::io::Read>>,
) -> Result<Option<fasta::OwnedRecord>> {
    match reader.next() {
        Some(record) => {
            let record = record.map_err(|e| anyhow!("error reading fasta stream: {}", e))?;
            Ok(Some(fasta::OwnedRecord {
                head: record.head().to_vec(),
                seq: record.full_seq().into_owned(),
            }))
        }
        None => Ok(None),
    }
}
