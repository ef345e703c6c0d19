pub mod field;
pub mod job;
pub mod loaders;
pub mod profile;

pub use field::{FieldKind, FieldOption, FormField, StepReport};
pub use job::{ApplicationOutcome, ApplyStatus, JobReference, RunSummary};
pub use loaders::load_profile;
pub use profile::UserProfile;
