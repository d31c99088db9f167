//! Command handlers for CLI subcommands
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

mod completions;
mod config;
mod inspect;
mod transform;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use inspect::{handle_element_type, handle_operators};
pub use transform::{handle_convert, handle_immutable, handle_size};
pub use utils::build_engine;
