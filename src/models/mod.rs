pub mod annotation;
pub mod classes;
pub mod constants;
pub mod session;
pub mod settings;
pub mod stage;
pub mod status;

pub use annotation::Annotation;
pub use classes::ClassList;
pub use session::WorkflowSession;
pub use settings::{PersistedState, Statistics};
pub use stage::{Slice, Stage, View};
pub use status::WorkflowStatus;
