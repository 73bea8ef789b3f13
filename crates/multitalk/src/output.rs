use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use multitalk_llap::Packet;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    device: &'a str,
    dst: u8,
    src: u8,
    kind: u8,
    kind_name: &'static str,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_packet(packet: &Packet, device: &str, format: OutputFormat) {
    let header = &packet.header;
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                device,
                dst: header.dst_node,
                src: header.src_node,
                kind: header.kind.0,
                kind_name: header.kind.name(),
                payload_size: packet.payload.len(),
                payload: hex(&packet.payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DST", "SRC", "TYPE", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    header.dst_node.to_string(),
                    header.src_node.to_string(),
                    header.kind.to_string(),
                    packet.payload.len().to_string(),
                    hex(&packet.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "dst={} src={} type={} size={} payload={}",
                header.dst_node,
                header.src_node,
                header.kind,
                packet.payload.len(),
                hex(&packet.payload)
            );
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            let _ = out.write_all(&[header.dst_node, header.src_node, header.kind.0]);
            let _ = out.write_all(&packet.payload);
            let _ = out.flush();
        }
    }
}

fn hex(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(s, "{byte:02x}");
    }
    s
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_unseparated() {
        assert_eq!(hex(&[]), "");
        assert_eq!(hex(&[0x00, 0x0a, 0xff]), "000aff");
    }
}
