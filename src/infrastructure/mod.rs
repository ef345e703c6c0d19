pub mod js_executor;
pub mod surface;

pub use js_executor::JsExecutor;
pub use surface::{is_present, wait_for_selector, ElementRef, PageSurface};
