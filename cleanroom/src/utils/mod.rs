//! Small helpers shared across modules.

mod timestamps;

pub use timestamps::{format_local_timestamp, local_iso_timestamp, output_notebook_path};
