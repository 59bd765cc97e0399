pub mod manifest;
pub mod run_dir;
pub mod streams;

pub use manifest::read_cell_manifest;
pub use run_dir::OutputKind;
pub use run_dir::RunDir;
pub use streams::LockstepReader;
pub use streams::LockstepRecord;
