use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "keyhook-daemon")]
#[command(about = "Watch global shortcuts and send a webhook when one is pressed")]
#[command(version)]
pub struct Cli {
    /// Settings file with the notification url and user id
    #[arg(long, value_name = "PATH", default_value = "settings.toml")]
    pub settings: PathBuf,

    /// JSON list of shortcuts, e.g. [["ctrl","shift","c"]]
    #[arg(long, value_name = "PATH", default_value = "keys.json")]
    pub keys: PathBuf,

    /// Status socket path (overrides the settings file)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Replay key events from a script instead of capturing the keyboard ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub replay: Option<PathBuf>,

    /// Do not start the status socket
    #[arg(long)]
    pub no_ipc: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["keyhook-daemon"]).unwrap();
        assert_eq!(cli.settings, PathBuf::from("settings.toml"));
        assert_eq!(cli.keys, PathBuf::from("keys.json"));
        assert!(cli.socket.is_none());
        assert!(cli.replay.is_none());
        assert!(!cli.no_ipc);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "keyhook-daemon",
            "--settings",
            "/etc/keyhook/settings.toml",
            "--replay",
            "-",
            "--no-ipc",
        ])
        .unwrap();
        assert_eq!(cli.settings, PathBuf::from("/etc/keyhook/settings.toml"));
        assert_eq!(cli.replay, Some(PathBuf::from("-")));
        assert!(cli.no_ipc);
    }
}
