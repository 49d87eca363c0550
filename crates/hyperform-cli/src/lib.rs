//! hyperform CLI: inspect and operate HAL + HAL-FORMS APIs from a terminal.

pub mod config;
pub mod render;

pub use config::{build_client_config, parse_data, parse_header, parse_param, resolve_base_url, resolve_token};
