use std::io::{Read, Write};

use multitalk_ethertalk::Packet;
use multitalk_transport::{TransportError, Tunnel};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::interface::{spawn_worker, BridgeConfig, Interface};

/// Bridge a TCP tunnel carrying EtherTalk frames.
///
/// `reader` and `writer` are two handles on the same connection, as returned
/// by [`Tunnel::try_clone`]. Frames that are not AppleTalk or AARP are
/// dropped on receive.
pub fn tcp<S>(
    name: &str,
    reader: Tunnel<S>,
    writer: Tunnel<S>,
    config: &BridgeConfig,
) -> Result<Interface<Packet>>
where
    S: Read + Write + Send + 'static,
{
    let (iface, endpoint) = Interface::channel(name, config.queue_depth);

    let inbound = endpoint.inbound;
    let label = name.to_string();
    let mut reader = reader;
    spawn_worker(name, "tcp-recv", move || {
        loop {
            let frame = match reader.read_frame() {
                Ok(frame) => frame,
                Err(TransportError::ConnectionClosed) => {
                    info!(server = %label, "tunnel closed by peer");
                    break;
                }
                Err(err) => {
                    error!(server = %label, %err, "tunnel receive failed");
                    break;
                }
            };
            let packet = match Packet::unmarshal(&frame) {
                Ok(packet) => packet,
                Err(err) => {
                    warn!(server = %label, %err, "ignoring malformed tunnel frame");
                    continue;
                }
            };
            if !packet.is_appletalk() {
                debug!(server = %label, proto = packet.snap.proto, "dropping non-AppleTalk frame");
                continue;
            }
            if inbound.send(packet).is_err() {
                break;
            }
        }
    })?;

    let outbound = endpoint.outbound;
    let label = name.to_string();
    let mut writer = writer;
    spawn_worker(name, "tcp-send", move || {
        for packet in outbound {
            let frame = match packet.marshal() {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(server = %label, %err, "dropping outbound packet");
                    continue;
                }
            };
            if let Err(err) = writer.write_frame(&frame) {
                error!(server = %label, %err, "tunnel send failed");
                break;
            }
        }
        debug!(server = %label, "tunnel writer stopped");
    })?;

    Ok(iface)
}
