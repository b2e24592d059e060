mod build;
mod serve;

pub use build::cmd_build;
pub use serve::{ServeOptions, cmd_serve};
