use multitalk_bridge::{BridgeConfig, Group};
use multitalk_transport::{SerialPort, Tunnel, TunnelConfig};
use tracing::info;

use crate::cmd::{install_ctrlc_handler, BridgeArgs};
use crate::exit::{bridge_error, transport_error, CliError, CliResult, SUCCESS};

pub fn run(args: BridgeArgs) -> CliResult<i32> {
    let ether_count = args.ethertalk.len() + args.server.len();
    let local_count = args.localtalk.len();
    if ether_count > 0 && local_count > 0 {
        return Err(CliError::usage(
            "LocalTalk interfaces cannot be bridged with EtherTalk or TCP interfaces",
        ));
    }
    match ether_count + local_count {
        0 => return Err(CliError::usage("no interfaces specified")),
        1 => return Err(CliError::usage("only one interface specified")),
        _ => {}
    }

    let config = BridgeConfig {
        queue_depth: args.queue_depth.max(1),
        ..BridgeConfig::default()
    };
    install_ctrlc_handler()?;

    if local_count > 0 {
        run_localtalk(&args, &config)
    } else {
        run_ethertalk(&args, &config)
    }
}

fn run_ethertalk(args: &BridgeArgs, config: &BridgeConfig) -> CliResult<i32> {
    let mut group = Group::new();

    for server in &args.server {
        let context = format!("server {server}");
        let writer = Tunnel::connect(server, TunnelConfig::default())
            .map_err(|err| transport_error(&context, err))?;
        let reader = writer
            .try_clone()
            .map_err(|err| transport_error(&context, err))?;
        let iface = multitalk_bridge::tcp(server, reader, writer, config)
            .map_err(|err| bridge_error(&context, err))?;
        group.add(iface).map_err(|err| bridge_error(&context, err))?;
    }

    for name in &args.ethertalk {
        add_ethertalk(&mut group, name, config)?;
    }

    info!(interfaces = group.len(), "bridging EtherTalk");
    group.run();
    Ok(SUCCESS)
}

#[cfg(target_os = "linux")]
fn add_ethertalk(
    group: &mut Group<multitalk_ethertalk::Packet>,
    name: &str,
    config: &BridgeConfig,
) -> CliResult<()> {
    use std::sync::Arc;

    let context = format!("interface {name}");
    let device = multitalk_transport::RawSocket::open(name)
        .map_err(|err| transport_error(&context, err))?;
    let iface = multitalk_bridge::ethertalk(Arc::new(device), config)
        .map_err(|err| bridge_error(&context, err))?;
    group.add(iface).map_err(|err| bridge_error(&context, err))
}

#[cfg(not(target_os = "linux"))]
fn add_ethertalk(
    _group: &mut Group<multitalk_ethertalk::Packet>,
    name: &str,
    _config: &BridgeConfig,
) -> CliResult<()> {
    Err(CliError::usage(format!(
        "interface {name}: EtherTalk interfaces are only supported on Linux"
    )))
}

fn run_localtalk(args: &BridgeArgs, config: &BridgeConfig) -> CliResult<i32> {
    let nodes = args.serial.node_set();
    let serial_config = args.serial.serial_config();
    let mut group = Group::new();

    for path in &args.localtalk {
        let context = format!("device {}", path.display());
        let writer =
            SerialPort::open(path, &serial_config).map_err(|err| transport_error(&context, err))?;
        let reader = writer
            .try_clone()
            .map_err(|err| transport_error(&context, err))?;
        let name = path.display().to_string();
        let iface = multitalk_bridge::localtalk(&name, reader, writer, &nodes, config)
            .map_err(|err| bridge_error(&context, err))?;
        group.add(iface).map_err(|err| bridge_error(&context, err))?;
    }

    info!(interfaces = group.len(), nodes = nodes.len(), "bridging LocalTalk");
    group.run();
    Ok(SUCCESS)
}
