// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `main.rs` - CLI surface and signal handling

#[cfg(test)]
mod tests {
    use crate::{shutdown_signal, Cli};
    use clap::{CommandFactory, Parser};
    use std::time::Duration as StdDuration;
    use tokio::time::timeout;

    #[test]
    fn test_cli_takes_no_arguments() {
        assert!(Cli::try_parse_from(["k8s-host-change"]).is_ok());
        assert!(Cli::try_parse_from(["k8s-host-change", "ecosystem"]).is_err());
    }

    #[test]
    fn test_cli_metadata() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "k8s-host-change");
        assert_eq!(
            cmd.get_about().map(ToString::to_string).as_deref(),
            Some("Sync hosts-specific changes")
        );
        cmd.debug_assert();
    }

    /// Test that SIGTERM signal handler can be created on Unix platforms
    #[tokio::test]
    #[cfg(unix)]
    async fn test_sigterm_signal_handler_creation() {
        use tokio::signal::unix::{signal, SignalKind};

        let result = signal(SignalKind::terminate());
        assert!(
            result.is_ok(),
            "Should be able to create SIGTERM signal handler"
        );
    }

    /// Without a signal the shutdown future stays pending
    #[tokio::test]
    async fn test_shutdown_signal_pending_without_signal() {
        let result = timeout(StdDuration::from_millis(100), shutdown_signal()).await;

        assert!(
            result.is_err(),
            "shutdown_signal() should time out when no signal is sent"
        );
    }
}
