/// Qzone Autopost - autonomous publication pipeline for a Qzone posting bot.
///
/// Core library providing the scheduled generate→gate→publish→retry loop,
/// failure classification, run statistics, and per-user usage quotas for the
/// on-demand surfing path. The QQ wire client and the LLM provider are
/// host-supplied collaborators behind the traits in `core::generator` and
/// `core::post`.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize `env_logger` for hosts that embed the crate standalone.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();
}
