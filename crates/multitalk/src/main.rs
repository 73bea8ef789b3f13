mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "multitalk", version, about = "AppleTalk bridge")]
struct Cli {
    /// Output format for printed packets.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "MULTITALK_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bridge_interfaces() {
        let cli = Cli::try_parse_from([
            "multitalk",
            "bridge",
            "-e",
            "eth0",
            "-s",
            "localhost:9000",
            "--server",
            "10.0.0.1:9000",
        ])
        .expect("bridge args should parse");

        let Command::Bridge(args) = cli.command else {
            panic!("expected bridge command");
        };
        assert_eq!(args.ethertalk, vec!["eth0"]);
        assert_eq!(args.server.len(), 2);
        assert!(args.localtalk.is_empty());
    }

    #[test]
    fn parses_monitor_node_list() {
        let cli = Cli::try_parse_from([
            "multitalk",
            "--format",
            "pretty",
            "monitor",
            "/dev/ttyUSB0",
            "--node",
            "1-3,200",
            "--count",
            "5",
        ])
        .expect("monitor args should parse");

        let Command::Monitor(args) = cli.command else {
            panic!("expected monitor command");
        };
        assert_eq!(args.count, Some(5));
        assert_eq!(
            args.serial.node_set().iter().collect::<Vec<_>>(),
            vec![1, 2, 3, 200]
        );
    }

    #[test]
    fn rejects_reserved_node_id() {
        let err = Cli::try_parse_from(["multitalk", "monitor", "/dev/ttyUSB0", "--node", "255"])
            .expect_err("reserved node should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
