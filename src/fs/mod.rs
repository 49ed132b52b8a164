pub mod images;
pub mod labels;
pub mod partition;
pub mod state_store;
pub mod work_dir;

pub use labels::{load_labels, save_labels};
pub use partition::{merge, split, MergeOutcome, SplitOutcome, SplitPlan};
pub use state_store::StateStore;
pub use work_dir::WorkDir;
