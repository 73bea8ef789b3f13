use multitalk_tash::{Decoder, Encoder, TashError};
use multitalk_transport::SerialPort;
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, MonitorArgs};
use crate::exit::{tash_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let device = args.device.display().to_string();
    let port = SerialPort::open(&args.device, &args.serial.serial_config())
        .map_err(|err| transport_error("open failed", err))?;
    let writer = port
        .try_clone()
        .map_err(|err| transport_error("open failed", err))?;

    let nodes = args.serial.node_set();
    let mut encoder = Encoder::new(writer);
    encoder
        .set_node_ids(&nodes)
        .map_err(|err| tash_error("set node IDs failed", err))?;
    info!(device = %device, nodes = nodes.len(), "monitoring");

    install_ctrlc_handler()?;

    let mut decoder = Decoder::new(port);
    let mut printed = 0usize;
    loop {
        let packet = match decoder.decode() {
            Ok(packet) => packet,
            Err(TashError::ConnectionClosed) => break,
            Err(err) => return Err(tash_error("receive failed", err)),
        };

        print_packet(&packet, &device, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    let stats = decoder.stats();
    debug!(
        packets = stats.packets,
        discarded = stats.discarded(),
        "monitor finished"
    );
    Ok(SUCCESS)
}
