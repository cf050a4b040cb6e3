pub mod constants;
pub(crate) mod defaults;
pub mod models;
pub mod utils;

pub use models::*;
pub use utils::*;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the binary was built from, injected by the release build.
pub const GIT_SHA: &str = match option_env!("GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Sent with every completion request.
pub fn user_agent() -> String {
    format!("{}/{} ({})", APP_NAME, VERSION, GIT_SHA)
}

pub fn version() -> String {
    format!("{} {} ({})", APP_NAME, VERSION, GIT_SHA)
}

/// Print start-up progress to stderr when `general.verbose` is set.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::config::Configuration::instance().general.verbose {
            eprintln!($($arg)*);
        }
    };
}

pub use verbose;
