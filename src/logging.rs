use log::LevelFilter;

/// Environment variable holding an env_logger filter, e.g. `TF_LOG=trace`
pub const LOG_ENV: &str = "TF_LOG";

/// Level filter for a run: `--verbose` wins, then `TF_LOG`, then info
fn filters(verbose: bool, env: Option<String>) -> String {
    if verbose {
        return LevelFilter::Debug.to_string();
    }

    env.filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| LevelFilter::Info.to_string())
}

/// Install the stderr logger; later calls are no-ops
pub fn init(verbose: bool) {
    let directives = filters(verbose, std::env::var(LOG_ENV).ok());

    let _ = env_logger::Builder::new()
        .parse_filters(&directives)
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .try_init();
}
