//! Benchmark for packjson encodings using stream metadata.
//!
//! Builds a large media-server style header (many streams, each with a few
//! tracks and keyframe tables), or loads one from a JSON file, then times
//! every encoding in both directions. Text parsing is also timed against
//! serde_json for reference.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use packjson::{BinaryCodec, Dtmi, Packed, Value, decode_vector, encode_vector};

// =============================================================================
// SYNTHETIC DATA
// =============================================================================

const STREAMS: u32 = 2_000;
const KEYFRAMES: u32 = 200;

/// Deterministic pseudo-random sequence, so runs are comparable.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn build_track(rng: &mut Lcg, id: u32, video: bool) -> Value {
    let mut track = Value::new();
    track["trackid"] = id.into();
    if video {
        track["type"] = "video".into();
        track["codec"] = "H264".into();
        track["width"] = 1920.into();
        track["height"] = 1080.into();
        track["fpks"] = 29970.into();
    } else {
        track["type"] = "audio".into();
        track["codec"] = "AAC".into();
        track["rate"] = 48000.into();
        track["channels"] = 2.into();
    }
    track["bps"] = (rng.next() % 1_000_000).into();
    track["init"] = Value::from((0..64).map(|_| rng.next() as u8).collect::<Vec<u8>>());

    let mut time = 0u64;
    let mut durations = Vec::with_capacity(KEYFRAMES as usize);
    for _ in 0..KEYFRAMES {
        let duration = 1_800 + rng.next() % 400;
        track["keys"].push(time.into());
        durations.push(duration);
        time += duration;
    }
    track["durations"] = Value::from(encode_vector(durations));
    track
}

fn build_streams() -> Value {
    let mut rng = Lcg(0x5eed);
    let mut root = Value::new();
    for s in 0..STREAMS {
        let mut stream = Value::new();
        stream["name"] = format!("stream_{s:05}").into();
        stream["live"] = (s % 3 != 0).into();
        stream["buffer_window"] = 30_000.into();
        stream["viewers"] = (rng.next() % 10_000).into();
        stream["tracks"]["1"] = build_track(&mut rng, 1, true);
        stream["tracks"]["2"] = build_track(&mut rng, 2, false);
        root["streams"].push(stream);
    }
    root
}

// =============================================================================
// TIMING
// =============================================================================

const ITERS: u32 = 10;

fn average<T>(mut f: impl FnMut() -> T) -> (T, Duration) {
    // Warmup
    for _ in 0..2 {
        let _ = f();
    }
    let start = Instant::now();
    let mut out = f();
    for _ in 1..ITERS {
        out = f();
    }
    (out, start.elapsed() / ITERS)
}

fn report(label: &str, bytes: usize, time: Duration) {
    println!("{label}: {bytes} bytes in {time:?}");
    println!(
        "  Throughput: {:.2} MB/s",
        (bytes as f64 / 1_000_000.0) / time.as_secs_f64()
    );
}

fn main() {
    let (root, source) = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading header from: {path}");
            let text = fs::read(&path).expect("Failed to read input file");
            (Value::from_text_bytes(&text), path)
        }
        None => {
            let build_start = Instant::now();
            let root = build_streams();
            println!("Built {STREAMS} streams in {:?}", build_start.elapsed());
            (root, "streams.json".to_string())
        }
    };

    // Text
    let (text, render_time) = average(|| root.to_json_string());
    report("\nText render", text.len(), render_time);

    let (parsed, parse_time) = average(|| Value::from_text(&text));
    report("Text parse (packjson)", text.len(), parse_time);
    assert_eq!(parsed, root, "text should round-trip");

    let (reference, serde_time) =
        average(|| serde_json::from_str::<serde_json::Value>(&text).expect("Failed to parse JSON"));
    report("Text parse (serde_json)", text.len(), serde_time);
    println!(
        "  Relative to serde_json: {:.2}x",
        parse_time.as_secs_f64() / serde_time.as_secs_f64()
    );
    if let Some(streams) = reference.get("streams").and_then(|s| s.as_array()) {
        assert_eq!(streams.len(), root["streams"].size());
    }

    // Packed
    let (packed, packed_time) = average(|| Packed.encode(&root));
    report("\nPacked encode", packed.len(), packed_time);
    assert_eq!(packed.len(), root.packed_size());

    let (decoded, unpack_time) = average(|| Packed.decode(&packed));
    report("Packed decode", packed.len(), unpack_time);
    assert_eq!(decoded, root, "packed should round-trip");

    let (frame, frame_time) = average(|| root.net_prepare());
    report("Net frame", frame.len(), frame_time);

    // DTMI carries no doubles, booleans, or nulls, so compare shapes only.
    let (dtmi, dtmi_time) = average(|| Dtmi.encode(&root));
    report("\nDTMI encode", dtmi.len(), dtmi_time);

    let (from_dtmi, undtmi_time) = average(|| Dtmi.decode(&dtmi));
    report("DTMI decode", dtmi.len(), undtmi_time);
    assert_eq!(from_dtmi["streams"].size(), root["streams"].size());

    // Keyframe duration tables
    let tables: Vec<&[u8]> = root["streams"]
        .cursor()
        .flat_map(|stream| stream.value["tracks"].cursor())
        .map(|track| track.value["durations"].as_bytes())
        .collect();
    let table_bytes: usize = tables.iter().map(|t| t.len()).sum();
    let (entries, runs_time) = average(|| tables.iter().map(|t| decode_vector(t).len()).sum::<usize>());
    report("\nDuration tables decode", table_bytes, runs_time);
    println!("  {} tables, {entries} entries", tables.len());

    // Write output files
    let input_path = Path::new(&source);
    let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input_path.parent().unwrap_or(Path::new("."));

    let output_packed = parent.join(format!("{stem}.pack"));
    let output_dtmi = parent.join(format!("{stem}.dtmi"));
    fs::write(&output_packed, &packed).expect("Failed to write packed file");
    fs::write(&output_dtmi, &dtmi).expect("Failed to write DTMI file");

    println!("\n=== Output Files ===");
    println!("Packed: {}", output_packed.display());
    println!("DTMI:   {}", output_dtmi.display());

    // Summary
    println!("\n=== Summary ===");
    println!("Streams: {}", root["streams"].size());
    println!("JSON size: {} bytes ({:.1} MB)", text.len(), text.len() as f64 / 1_000_000.0);
    println!(
        "Packed size: {} bytes ({:.1}% of JSON)",
        packed.len(),
        100.0 * packed.len() as f64 / text.len() as f64
    );
    println!(
        "DTMI size: {} bytes ({:.1}% of JSON)",
        dtmi.len(),
        100.0 * dtmi.len() as f64 / text.len() as f64
    );
}
