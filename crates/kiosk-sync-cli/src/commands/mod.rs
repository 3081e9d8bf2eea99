pub mod add;
pub mod common;
pub mod completions;
pub mod config;
pub mod flush;
pub mod list;
pub mod run;
pub mod status;
pub mod sync;
