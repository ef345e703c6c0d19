pub mod profile_loader;

pub use profile_loader::load_profile;
