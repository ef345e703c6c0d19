pub mod apply_ctx;
pub mod wizard_driver;
pub mod wizard_state;

pub use apply_ctx::ApplyCtx;
pub use wizard_driver::WizardDriver;
pub use wizard_state::{transition, Transition, WizardEffect, WizardEvent, WizardState};
