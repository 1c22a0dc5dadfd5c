/// Default database URL for local development
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./tvshows.db?mode=rwc";

pub mod core;
pub mod tv_shows;
pub mod types;

pub use tv_shows::TvShow;
pub use types::Database;

#[cfg(test)]
pub mod test_helpers;
