use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use multitalk_bridge::DEFAULT_QUEUE_DEPTH;
use multitalk_tash::NodeSet;
use multitalk_transport::DEFAULT_BAUD_RATE;

use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::OutputFormat;

pub mod bridge;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Relay AppleTalk traffic between interfaces.
    Bridge(BridgeArgs),
    /// Print LLAP packets heard by a TashTalk adapter.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Bridge(args) => bridge::run(args),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// Ethernet interface to bridge via EtherTalk.
    #[arg(long = "ethertalk", short = 'e', value_name = "IFACE")]
    pub ethertalk: Vec<String>,
    /// Tunnel server to bridge via TCP.
    #[arg(long = "server", short = 's', value_name = "HOST:PORT")]
    pub server: Vec<String>,
    /// TashTalk serial device to bridge via LocalTalk.
    #[arg(long = "localtalk", short = 't', value_name = "DEVICE")]
    pub localtalk: Vec<PathBuf>,
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Packets buffered per interface before dropping.
    #[arg(long, default_value_t = DEFAULT_QUEUE_DEPTH)]
    pub queue_depth: usize,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// TashTalk serial device.
    pub device: PathBuf,
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Exit after printing N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

/// Settings shared by every command that opens a TashTalk adapter.
#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Node IDs the adapter answers for (e.g. 1-5,254).
    #[arg(
        long = "node",
        value_name = "IDS",
        env = "MULTITALK_NODES",
        value_delimiter = ',',
        value_parser = parse_node_range
    )]
    pub nodes: Vec<RangeInclusive<u8>>,
    /// Serial line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Disable RTS/CTS flow control.
    #[arg(long)]
    pub no_flow_control: bool,
}

impl SerialArgs {
    pub fn node_set(&self) -> NodeSet {
        self.nodes.iter().cloned().flatten().collect()
    }

    pub fn serial_config(&self) -> multitalk_transport::SerialConfig {
        multitalk_transport::SerialConfig {
            baud_rate: self.baud,
            flow_control: !self.no_flow_control,
        }
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `N` or `N-M`. 0 and 255 are reserved on LocalTalk.
fn parse_node_range(s: &str) -> Result<RangeInclusive<u8>, String> {
    let parse = |part: &str| -> Result<u8, String> {
        let id: u8 = part
            .trim()
            .parse()
            .map_err(|_| format!("invalid node ID '{part}'"))?;
        if id == 0 || id == 255 {
            return Err(format!("node ID {id} is reserved"));
        }
        Ok(id)
    };
    match s.split_once('-') {
        Some((lo, hi)) => {
            let (lo, hi) = (parse(lo)?, parse(hi)?);
            if lo > hi {
                return Err(format!("empty node range '{s}'"));
            }
            Ok(lo..=hi)
        }
        None => {
            let id = parse(s)?;
            Ok(id..=id)
        }
    }
}

/// Exit cleanly on Ctrl-C. Worker threads block in device reads, so the
/// process exits rather than unwinding them.
pub fn install_ctrlc_handler() -> CliResult<()> {
    ctrlc::set_handler(|| {
        tracing::info!("interrupted, exiting");
        std::process::exit(SUCCESS);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
