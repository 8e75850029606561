//! Logging setup.

use eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::args::LogArgs;

/// Build the event filter from command line arguments.
///
/// The filter is built with the following precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` env var if set, or the verbosity level
/// 3. Apply any custom directives from `--log.filter`
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(err) => eprintln!("ignoring invalid log directive {directive:?}: {err}"),
            }
        }
    }

    filter
}

/// Install the global subscriber.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let filter = build_filter(args);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if args.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| eyre!("failed to install tracing subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins() {
        let args = LogArgs {
            quiet: true,
            verbosity: 2,
            filter: Some("peerban=trace".to_string()),
            json: false,
        };
        assert_eq!(build_filter(&args).to_string(), "error");
    }

    #[test]
    fn test_custom_directives_added() {
        let args = LogArgs {
            filter: Some("peerban_scanner=trace, not a directive=,".to_string()),
            ..Default::default()
        };
        assert!(build_filter(&args).to_string().contains("peerban_scanner=trace"));
    }
}
