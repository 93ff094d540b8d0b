pub mod glob;
pub mod logging;

pub use glob::UrlGlob;
