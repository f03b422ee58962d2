//! CLI argument definitions for the Parley terminal chat.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Parley: a chat bot that learns replies from the conversations it has.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Conversation session to talk in.
    #[arg(short = 's', long = "session")]
    pub session: Option<String>,

    /// Answer without learning anything.
    #[arg(long = "read-only")]
    pub read_only: bool,

    /// Print replies as JSON objects, one per line.
    #[arg(long = "json")]
    pub json: bool,

    /// Train from a dialog file (one utterance per line) before chatting.
    #[arg(short = 't', long = "train")]
    pub train: Option<PathBuf>,

    /// Write the resolved configuration to the config file and exit.
    #[arg(long = "init-config")]
    pub init_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLEY_CONFIG env var > ~/.parley/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARLEY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > config file value. `RUST_LOG` is
    /// applied on top of this by the subscriber.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("parley").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.config.is_none());
        assert!(args.session.is_none());
        assert!(!args.read_only);
        assert!(!args.json);
        assert!(args.train.is_none());
        assert!(!args.init_config);
    }

    #[test]
    fn test_all_flags() {
        let args = parse(&[
            "--config",
            "/tmp/p.toml",
            "--log-level",
            "debug",
            "--session",
            "s1",
            "--read-only",
            "--json",
            "--train",
            "dialog.txt",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/p.toml")));
        assert_eq!(args.session.as_deref(), Some("s1"));
        assert!(args.read_only);
        assert!(args.json);
        assert_eq!(args.train, Some(PathBuf::from("dialog.txt")));
    }

    #[test]
    fn test_init_config_flag() {
        let args = parse(&["--init-config", "-c", "/tmp/p.toml"]);
        assert!(args.init_config);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/p.toml"));
    }

    #[test]
    fn test_config_flag_wins() {
        let args = parse(&["-c", "/etc/parley.toml"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/parley.toml"));
    }

    #[test]
    fn test_default_config_path_shape() {
        let path = default_config_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_log_level_resolution() {
        assert_eq!(parse(&[]).resolve_log_level("warn"), "warn");
        assert_eq!(parse(&["-l", "trace"]).resolve_log_level("warn"), "trace");
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(CliArgs::try_parse_from(["parley", "--bogus"]).is_err());
    }
}
