//! Interactive create flow (feature `tui`)
//!
//! Wraps the generator with cliclack spinners, the stack picker and the
//! "next steps" summary.

#[cfg(feature = "tui")]
mod prompts;

#[cfg(feature = "tui")]
pub use prompts::{run, stack_display_name, CreateArgs};
