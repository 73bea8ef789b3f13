use std::io::{Read, Write};

use multitalk_llap::Packet;
use multitalk_tash::{Decoder, Encoder, NodeSet, TashError};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::interface::{spawn_worker, BridgeConfig, Interface};

/// Bridge a TashTalk board on a LocalTalk bus.
///
/// The node-ID filter is written before this returns, so the board starts
/// acknowledging traffic for `nodes` immediately. Packets the group queues
/// that fail validation are logged and skipped.
pub fn localtalk<R, W>(
    name: &str,
    reader: R,
    writer: W,
    nodes: &NodeSet,
    config: &BridgeConfig,
) -> Result<Interface<Packet>>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let mut encoder = Encoder::with_config(writer, &config.tash);
    encoder.set_node_ids(nodes)?;
    info!(device = name, nodes = nodes.len(), "node-ID filter set");

    let (iface, endpoint) = Interface::channel(name, config.queue_depth);

    let inbound = endpoint.inbound;
    let label = name.to_string();
    let mut decoder = Decoder::with_config(reader, &config.tash);
    spawn_worker(name, "llap-recv", move || {
        loop {
            match decoder.decode() {
                Ok(packet) => {
                    if inbound.send(packet).is_err() {
                        break;
                    }
                }
                Err(TashError::ConnectionClosed) => {
                    info!(device = %label, "serial stream ended");
                    break;
                }
                Err(err) => {
                    error!(device = %label, %err, "serial receive failed");
                    break;
                }
            }
        }
        let stats = decoder.stats();
        debug!(
            device = %label,
            packets = stats.packets,
            discarded = stats.discarded(),
            "receiver stopped"
        );
    })?;

    let outbound = endpoint.outbound;
    let label = name.to_string();
    spawn_worker(name, "llap-send", move || {
        for packet in outbound {
            match encoder.encode(&packet) {
                Ok(()) => {}
                Err(TashError::InvalidPacket(err)) => {
                    warn!(device = %label, %err, "dropping invalid packet");
                }
                Err(err) => {
                    error!(device = %label, %err, "serial send failed");
                    break;
                }
            }
        }
    })?;

    Ok(iface)
}
