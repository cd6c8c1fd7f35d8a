//! Simple decoder to inspect packjson files.
//!
//! Detects the encoding from the first bytes (JSON text, net frame, packed,
//! or DTMI) and prints a summary followed by the document itself.

use std::fs;

use packjson::codec::from_dtmi;
use packjson::limits::{NET_HEADER_LEN, TAG_BOOL, TAG_DOUBLE, TAG_NULL};
use packjson::{Value, ValueType};

#[derive(Debug, Clone, Copy)]
enum Format {
    Text,
    NetPacked,
    Packed,
    Dtmi,
}

fn detect(data: &[u8]) -> Format {
    let first = data.iter().copied().find(|b| !b.is_ascii_whitespace());
    if matches!(first, Some(b'{' | b'[' | b'"' | b'-' | b'0'..=b'9' | b't' | b'f' | b'n')) {
        return Format::Text;
    }
    if data.len() >= NET_HEADER_LEN {
        let declared = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if declared == data.len() - NET_HEADER_LEN {
            return Format::NetPacked;
        }
    }
    // Only the packed format has tags for these.
    if data.iter().any(|b| matches!(*b, TAG_DOUBLE | TAG_NULL | TAG_BOOL)) {
        Format::Packed
    } else {
        Format::Dtmi
    }
}

#[derive(Default)]
struct Stats {
    containers: usize,
    scalars: usize,
    deepest: usize,
}

fn walk(v: &Value, depth: usize, stats: &mut Stats) {
    stats.deepest = stats.deepest.max(depth);
    match v.value_type() {
        ValueType::Array | ValueType::Object => {
            stats.containers += 1;
            for entry in v {
                walk(entry.value, depth + 1, stats);
            }
        }
        _ => stats.scalars += 1,
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "../../data/header.json".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let format = detect(&data);
    let value = match format {
        Format::Text => Value::from_text_bytes(&data),
        Format::NetPacked => Value::from_net_packed(&data),
        Format::Packed => Value::from_packed(&data),
        Format::Dtmi => {
            let mut cursor = 0;
            let value = from_dtmi(&data, &mut cursor);
            if cursor < data.len() {
                println!("Stopped after {} of {} bytes", cursor, data.len());
            }
            value
        }
    };

    println!("\n=== Document Info ===");
    println!("Format: {:?}", format);
    println!("Root: {} with {} children", value.value_type(), value.size());

    let mut stats = Stats::default();
    walk(&value, 0, &mut stats);
    println!("Containers: {}", stats.containers);
    println!("Scalars: {}", stats.scalars);
    println!("Max depth: {}", stats.deepest);
    println!("Packed size: {} bytes", value.packed_size());

    if value.is_object() {
        println!("\n=== Members ===");
        for entry in value.cursor().take(20) {
            println!("  {} : {}", entry.key.unwrap_or_default(), entry.value.value_type());
        }
        if value.size() > 20 {
            println!("  ... and {} more members", value.size() - 20);
        }
    }

    println!("\n=== Document ===");
    println!("{}", value.pretty(0));
}
