use std::path::{Path, PathBuf};

/// Sample prefix baked into every file name under the run directory.
pub const SAMPLE_PREFIX: &str = "tcrbcr";

/// Name of the cell manifest. The misspelling is part of the on-disk
/// contract with the upstream tooling and must not be corrected.
pub const MANIFEST_FILE: &str = "cell.sequcencing.tsv";

pub const DATA_SUBDIR: &str = "01.data";
pub const ASSEMBLY_SUBDIR: &str = "02.assembly";
pub const TEMP_SUBDIR: &str = "temp";

/// The six per-shard output categories produced by the assembly and
/// annotation tools, identified by their file name suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Annot,
    AssembledReads,
    Assign,
    Cdr3,
    Final,
    Raw,
}

impl OutputKind {
    pub const ALL: [OutputKind; 6] = [
        OutputKind::Annot,
        OutputKind::AssembledReads,
        OutputKind::Assign,
        OutputKind::Cdr3,
        OutputKind::Final,
        OutputKind::Raw,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            OutputKind::Annot => "annot.fa",
            OutputKind::AssembledReads => "assembled_reads.fa",
            OutputKind::Assign => "assign.out",
            OutputKind::Cdr3 => "cdr3.out",
            OutputKind::Final => "final.out",
            OutputKind::Raw => "raw.out",
        }
    }
}

/// A pipeline run directory. All phases communicate through files under
/// this root, so every path and file name convention lives here and
/// nowhere else. Shard numbers are 1-indexed in file names.
#[derive(Clone, Debug)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    pub fn new(root: impl Into<PathBuf>) -> RunDir {
        RunDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_SUBDIR)
    }

    pub fn assembly_dir(&self) -> PathBuf {
        self.root.join(ASSEMBLY_SUBDIR)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.assembly_dir().join(TEMP_SUBDIR)
    }

    pub fn manifest(&self) -> PathBuf {
        self.data_dir().join(MANIFEST_FILE)
    }

    pub fn read1(&self) -> PathBuf {
        self.data_dir().join(format!("{}_cut_1.fq", SAMPLE_PREFIX))
    }

    pub fn read2(&self) -> PathBuf {
        self.data_dir().join(format!("{}_cut_2.fq", SAMPLE_PREFIX))
    }

    pub fn barcode_fa(&self) -> PathBuf {
        self.data_dir().join(format!("{}_newbc.fa", SAMPLE_PREFIX))
    }

    pub fn umi_fa(&self) -> PathBuf {
        self.data_dir().join(format!("{}_umi.fa", SAMPLE_PREFIX))
    }

    /// Output prefix handed to the external tools for one shard.
    pub fn shard_prefix(&self, shard: usize) -> PathBuf {
        self.temp_dir().join(format!("temp_{}", shard))
    }

    pub fn shard_read1(&self, shard: usize) -> PathBuf {
        self.temp_dir().join(format!("temp_{}_R1.fq", shard))
    }

    pub fn shard_read2(&self, shard: usize) -> PathBuf {
        self.temp_dir().join(format!("temp_{}_R2.fq", shard))
    }

    pub fn shard_barcode(&self, shard: usize) -> PathBuf {
        self.temp_dir().join(format!("temp_{}_bc.fa", shard))
    }

    pub fn shard_umi(&self, shard: usize) -> PathBuf {
        self.temp_dir().join(format!("temp_{}_umi.fa", shard))
    }

    pub fn shard_output(&self, shard: usize, kind: OutputKind) -> PathBuf {
        self.temp_dir().join(format!("temp_{}_{}", shard, kind.suffix()))
    }

    pub fn merged(&self, kind: OutputKind) -> PathBuf {
        self.assembly_dir()
            .join(format!("{}_{}", SAMPLE_PREFIX, kind.suffix()))
    }

    pub fn barcode_report(&self) -> PathBuf {
        self.assembly_dir()
            .join(format!("{}_barcode_report.tsv", SAMPLE_PREFIX))
    }

    pub fn simple_report(&self) -> PathBuf {
        self.assembly_dir().join(format!("{}_report.tsv", SAMPLE_PREFIX))
    }

    pub fn airr_report(&self) -> PathBuf {
        self.assembly_dir()
            .join(format!("{}_barcode_airr.tsv", SAMPLE_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_layout() {
        let run = RunDir::new("/run");

        assert_eq!(
            run.manifest(),
            PathBuf::from("/run/01.data/cell.sequcencing.tsv")
        );
        assert_eq!(run.read1(), PathBuf::from("/run/01.data/tcrbcr_cut_1.fq"));
        assert_eq!(run.read2(), PathBuf::from("/run/01.data/tcrbcr_cut_2.fq"));
        assert_eq!(
            run.barcode_fa(),
            PathBuf::from("/run/01.data/tcrbcr_newbc.fa")
        );
        assert_eq!(run.umi_fa(), PathBuf::from("/run/01.data/tcrbcr_umi.fa"));
    }

    #[test]
    fn test_shard_names_are_one_indexed() {
        let run = RunDir::new("/run");

        assert_eq!(
            run.shard_read1(1),
            PathBuf::from("/run/02.assembly/temp/temp_1_R1.fq")
        );
        assert_eq!(
            run.shard_umi(10),
            PathBuf::from("/run/02.assembly/temp/temp_10_umi.fa")
        );
        assert_eq!(
            run.shard_output(3, OutputKind::Cdr3),
            PathBuf::from("/run/02.assembly/temp/temp_3_cdr3.out")
        );
    }

    #[test]
    fn test_merged_and_report_names() {
        let run = RunDir::new("/run");

        assert_eq!(
            run.merged(OutputKind::Annot),
            PathBuf::from("/run/02.assembly/tcrbcr_annot.fa")
        );
        assert_eq!(
            run.barcode_report(),
            PathBuf::from("/run/02.assembly/tcrbcr_barcode_report.tsv")
        );
        assert_eq!(
            run.simple_report(),
            PathBuf::from("/run/02.assembly/tcrbcr_report.tsv")
        );
        assert_eq!(
            run.airr_report(),
            PathBuf::from("/run/02.assembly/tcrbcr_barcode_airr.tsv")
        );
    }

    #[test]
    fn test_output_kinds_have_distinct_suffixes() {
        let mut suffixes: Vec<&str> = OutputKind::ALL.iter().map(|k| k.suffix()).collect();
        suffixes.sort();
        suffixes.dedup();
        assert_eq!(suffixes.len(), 6);
    }
}
