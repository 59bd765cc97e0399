pub mod annotate;
pub mod assemble;
pub mod merge;
pub mod report;
pub mod run;
pub mod split;

pub use annotate::AnnotateCmd;
pub use annotate::AnnotateParams;

pub use assemble::AssembleCmd;
pub use assemble::AssembleParams;

pub use merge::MergeCmd;

pub use report::ReportCmd;
pub use report::ReportParams;

pub use run::RunCmd;

pub use split::SplitCmd;
pub use split::SplitParams;
