//! Small pure-function helpers shared across stages: URL normalization and
//! text cleanup (spec §4.4, §4.9, §8).

mod clean;
mod url;

pub use clean::clean;
pub use url::format_url;
