mod as_string;
mod patch_applier;

pub(crate) use as_string::AsString;
pub use patch_applier::PatchApplier;
