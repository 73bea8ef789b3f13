use std::sync::Arc;

use multitalk_ethertalk::Packet;
use multitalk_transport::LinkDevice;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::guard::{LocalStations, LoopGuard};
use crate::interface::{spawn_worker, BridgeConfig, Interface};

const CAPTURE_SIZE: usize = 4096;

/// Bridge an Ethernet device carrying EtherTalk.
///
/// The capture worker forwards AppleTalk and AARP frames, except frames the
/// bridge itself transmitted and frames addressed to a station already seen
/// on this segment. The transmit worker sends whatever the group queues.
pub fn ethertalk<D>(device: Arc<D>, config: &BridgeConfig) -> Result<Interface<Packet>>
where
    D: LinkDevice + 'static,
{
    let name = device.name().to_string();
    let (iface, endpoint) = Interface::channel(&name, config.queue_depth);
    let guard = Arc::new(LoopGuard::new());

    let capture_device = Arc::clone(&device);
    let capture_guard = Arc::clone(&guard);
    let inbound = endpoint.inbound;
    spawn_worker(&name, "capture", move || {
        let name = capture_device.name();
        let mut stations = LocalStations::new();
        let mut buf = vec![0u8; CAPTURE_SIZE];
        loop {
            let len = match capture_device.recv(&mut buf) {
                Ok(len) => len,
                Err(err) => {
                    error!(interface = name, %err, "capture failed");
                    break;
                }
            };
            let packet = match Packet::unmarshal(&buf[..len]) {
                Ok(packet) => packet,
                Err(err) => {
                    debug!(interface = name, %err, "ignoring unparseable frame");
                    continue;
                }
            };
            if !packet.is_appletalk() {
                continue;
            }
            if capture_guard.suppress(&packet) {
                debug!(interface = name, "skipping own transmission");
                continue;
            }
            if !stations.admit(&packet) {
                debug!(interface = name, dst = %packet.dst, "skipping local packet");
                continue;
            }
            if inbound.send(packet).is_err() {
                break;
            }
        }
        info!(interface = name, "capture stopped");
    })?;

    let outbound = endpoint.outbound;
    spawn_worker(&name, "transmit", move || {
        let name = device.name();
        for packet in outbound {
            let frame = match packet.marshal() {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(interface = name, %err, "dropping outbound packet");
                    continue;
                }
            };
            guard.record(packet);
            if let Err(err) = device.send(&frame) {
                warn!(interface = name, %err, "transmit failed");
            }
        }
        debug!(interface = name, "transmit stopped");
    })?;

    Ok(iface)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;
    use std::time::Duration;

    use multitalk_ethertalk::{EthAddr, Snap};

    use super::*;

    struct FakeDevice {
        frames: Mutex<Receiver<Vec<u8>>>,
        sent: Mutex<Sender<Vec<u8>>>,
    }

    impl LinkDevice for FakeDevice {
        fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
            let frame = self
                .frames
                .lock()
                .unwrap()
                .recv()
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
            buf[..frame.len()].copy_from_slice(&frame);
            Ok(frame.len())
        }

        fn send(&self, frame: &[u8]) -> io::Result<()> {
            let _ = self.sent.lock().unwrap().send(frame.to_vec());
            Ok(())
        }

        fn name(&self) -> &str {
            "fake0"
        }
    }

    fn device() -> (Arc<FakeDevice>, Sender<Vec<u8>>, Receiver<Vec<u8>>) {
        let (wire_tx, frames) = mpsc::channel();
        let (sent, sent_rx) = mpsc::channel();
        let device = Arc::new(FakeDevice {
            frames: Mutex::new(frames),
            sent: Mutex::new(sent),
        });
        (device, wire_tx, sent_rx)
    }

    fn addr(n: u8) -> EthAddr {
        EthAddr([0x08, 0x00, 0x07, 0x00, 0x00, n])
    }

    fn packet(dst: u8, src: u8, body: &'static [u8]) -> Packet {
        Packet::new(addr(dst), addr(src), Snap::appletalk(), body)
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn forwards_appletalk_and_drops_others() {
        let (device, wire, _sent) = device();
        let iface = ethertalk(device, &BridgeConfig::default()).unwrap();

        let mut ip = packet(1, 2, b"ip");
        ip.snap.proto = 0x0800;
        wire.send(ip.marshal().unwrap().to_vec()).unwrap();
        wire.send(vec![0u8; 10]).unwrap();
        let aarp = Packet::new(addr(1), addr(2), Snap::aarp(), &b"probe"[..]);
        wire.send(aarp.marshal().unwrap().to_vec()).unwrap();

        assert_eq!(iface.receiver().recv_timeout(WAIT).unwrap(), aarp);
    }

    #[test]
    fn own_transmissions_are_not_captured() {
        let (device, wire, sent) = device();
        let iface = ethertalk(device, &BridgeConfig::default()).unwrap();

        let remote = packet(1, 50, b"from afar");
        iface.sender().send(remote.clone()).unwrap();
        let frame = sent.recv_timeout(WAIT).unwrap();
        assert_eq!(Packet::unmarshal(&frame).unwrap(), remote);

        // The capture sees the transmission, then a genuine local packet.
        wire.send(frame).unwrap();
        let local = packet(50, 1, b"reply");
        wire.send(local.marshal().unwrap().to_vec()).unwrap();
        assert_eq!(iface.receiver().recv_timeout(WAIT).unwrap(), local);
    }

    #[test]
    fn local_destinations_stay_local() {
        let (device, wire, _sent) = device();
        let iface = ethertalk(device, &BridgeConfig::default()).unwrap();

        let first = packet(9, 1, b"one");
        let local = packet(1, 2, b"two");
        let remote = packet(9, 2, b"three");
        for p in [&first, &local, &remote] {
            wire.send(p.marshal().unwrap().to_vec()).unwrap();
        }
        assert_eq!(iface.receiver().recv_timeout(WAIT).unwrap(), first);
        assert_eq!(iface.receiver().recv_timeout(WAIT).unwrap(), remote);
    }

    #[test]
    fn capture_error_closes_interface() {
        let (device, wire, _sent) = device();
        let iface = ethertalk(device, &BridgeConfig::default()).unwrap();
        drop(wire);
        assert!(iface.receiver().recv_timeout(WAIT).is_err());
    }
}
