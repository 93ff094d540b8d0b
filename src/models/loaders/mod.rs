pub mod toml_loader;

pub use toml_loader::{load_quarter_file, parse_quarters};
