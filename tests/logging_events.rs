use std::fs;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as tsfmt, registry};

use sortdir::{Config, Sorter, validate_and_normalize};

/// Appends everything written into a shared buffer.
#[derive(Clone)]
struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Worker threads do not inherit a scoped dispatcher, so this file installs a
// global one and therefore holds exactly one test.
#[test]
fn run_emits_structured_events() {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let make_writer = {
        let buf = buf.clone();
        move || BufferWriter(buf.clone())
    };
    let layer = tsfmt::layer().json().with_writer(make_writer);
    let subscriber = registry().with(EnvFilter::new("debug")).with(layer);
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let out = td.path().join("out");
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::create_dir_all(&out).unwrap();
    fs::write(src.join("sub/a.txt"), b"a").unwrap();
    fs::write(out.join(".txt"), b"stray").unwrap();

    let mut cfg = Config::new(&src, &out);
    validate_and_normalize(&mut cfg).unwrap();
    let report = Sorter::new(cfg).run().unwrap();
    assert!(report.is_success());

    let contents = String::from_utf8_lossy(&buf.lock().unwrap()).to_string();
    let events: Vec<serde_json::Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    let kinds: Vec<&str> = events
        .iter()
        .filter_map(|e| e["fields"]["event"].as_str())
        .collect();

    for expected in [
        "directory-entered",
        "file-discovered",
        "conflict-resolved",
        "file-moved",
    ] {
        assert!(kinds.contains(&expected), "missing {expected}; got {kinds:?}");
    }

    let conflict = events
        .iter()
        .find(|e| e["fields"]["event"] == "conflict-resolved")
        .unwrap();
    assert!(conflict["fields"]["new"].as_str().unwrap().ends_with(".txt"));
}
