//! End-to-end tests for opening, indexing and querying FASTA files.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use fasta_extract::{
    ChannelObserver, EngineConfig, EngineError, EngineEvent, EngineObserver, EngineState,
    ExtractOptions, FastaEngine, NoopObserver, Progress, SeqIndex,
};
use flate2::write::GzEncoder;
use flate2::Compression;

fn sequence(len: usize, seed: usize) -> String {
    let bases = ['A', 'C', 'G', 'T'];
    (0..len).map(|i| bases[(i * 5 + seed + i / 3) % 4]).collect()
}

fn revcomp(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            'G' => 'C',
            other => other,
        })
        .collect()
}

/// Write a FASTA with `n` records (`Chr0`, `Chr1`, ...) wrapped at 60 columns
fn write_fasta(dir: &Path, file_name: &str, n: usize) -> (PathBuf, Vec<String>) {
    let mut text = String::new();
    let mut sequences = Vec::new();
    for i in 0..n {
        let seq = sequence(150 + i * 7, i);
        let _ = writeln!(text, ">Chr{i} synthetic chromosome {i}");
        for chunk in seq.as_bytes().chunks(60) {
            let _ = writeln!(text, "{}", std::str::from_utf8(chunk).unwrap());
        }
        sequences.push(seq);
    }

    let path = dir.join(file_name);
    std::fs::write(&path, text).unwrap();
    (path, sequences)
}

fn config(threads: usize, block_size: usize) -> EngineConfig {
    EngineConfig {
        threads,
        block_size,
        rebuild: false,
    }
}

async fn ready_engine(path: &Path, config: EngineConfig) -> FastaEngine {
    let engine = FastaEngine::open(path, config, Arc::new(NoopObserver)).unwrap();
    if let Some(build) = engine.initialize().unwrap() {
        build.wait().await.unwrap();
    }
    engine
}

#[test]
fn test_missing_source_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.fa");

    let result = FastaEngine::open(&missing, EngineConfig::default(), Arc::new(NoopObserver));
    assert!(matches!(result, Err(EngineError::SourceNotFound(_))));
    assert!(!dir.path().join("absent.fa.idx").exists());
}

#[test]
fn test_query_before_initialize_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 2);
    let engine = FastaEngine::open(&path, EngineConfig::default(), Arc::new(NoopObserver)).unwrap();

    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(matches!(engine.find_one("Chr0"), Err(EngineError::NotReady)));
}

#[tokio::test]
async fn test_build_then_reload_without_rescan() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 40);

    let first = FastaEngine::open(&path, config(4, 256), Arc::new(NoopObserver)).unwrap();
    let build = first.initialize().unwrap().expect("first open builds");
    let summary = build.wait().await.unwrap();
    assert_eq!(summary.records, 40);
    assert_eq!(first.state(), EngineState::Ready);
    assert!(first.index_path().exists());

    let (observer, mut events) = ChannelObserver::channel();
    let second = FastaEngine::open(&path, config(4, 256), Arc::new(observer)).unwrap();
    assert!(second.initialize().unwrap().is_none(), "second open loads");
    assert_eq!(second.index(), first.index());

    // Loading reports readiness without any scan progress
    let mut saw_progress = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, EngineEvent::Progress { .. }) {
            saw_progress = true;
        }
    }
    assert!(!saw_progress);
}

#[tokio::test]
async fn test_thread_count_does_not_change_index() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 60);

    let single = ready_engine(&path, config(1, 128)).await.index().unwrap();
    let rebuilt = {
        let engine = FastaEngine::open(
            &path,
            EngineConfig {
                rebuild: true,
                ..config(6, 128)
            },
            Arc::new(NoopObserver),
        )
        .unwrap();
        engine.initialize().unwrap().unwrap().wait().await.unwrap();
        engine.index().unwrap()
    };

    assert_eq!(single.entries, rebuilt.entries);
}

#[tokio::test]
async fn test_index_entries_resolve_to_their_headers() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 25);
    let engine = ready_engine(&path, config(3, 100)).await;

    let bytes = std::fs::read(&path).unwrap();
    for entry in engine.index().unwrap().iter() {
        let start = usize::try_from(entry.offset).unwrap();
        let end = start + bytes[start..].iter().position(|&b| b == b'\n').unwrap();
        let header = std::str::from_utf8(&bytes[start..end]).unwrap();
        assert_eq!(header, format!(">{} {}", entry.name, entry.description));
    }
}

#[tokio::test]
async fn test_empty_file_builds_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.fa");
    std::fs::write(&path, b"").unwrap();

    let engine = ready_engine(&path, config(4, 16)).await;
    assert!(engine.index().unwrap().is_empty());

    let mut out = Vec::new();
    let summary = engine
        .run_script("*\nChr0 1 10", ExtractOptions::default(), &mut out)
        .unwrap();
    assert_eq!(summary.records_written, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_script_reverse_complement_and_forward_range() {
    let dir = tempfile::tempdir().unwrap();
    let (path, sequences) = write_fasta(dir.path(), "genome.fa", 3);
    let engine = ready_engine(&path, config(2, 64)).await;
    let chr0 = &sequences[0];

    let mut out = Vec::new();
    engine
        .run_script("Baby Chr0 120 30", ExtractOptions::default(), &mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "");
    assert_eq!(lines[1], ">Baby synthetic chromosome 0");
    assert_eq!(lines[2..].concat(), revcomp(&chr0[29..120]));

    let mut out = Vec::new();
    engine
        .run_script("Chr0 30 120", ExtractOptions::default(), &mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[1], ">Chr0 synthetic chromosome 0");
    assert_eq!(lines[2..].concat(), chr0[29..120]);
}

#[tokio::test]
async fn test_find_one_and_find_many() {
    let dir = tempfile::tempdir().unwrap();
    let (path, sequences) = write_fasta(dir.path(), "genome.fa", 12);
    let engine = ready_engine(&path, config(2, 64)).await;

    let chr11 = engine.find_one("Chr11").unwrap();
    assert_eq!(chr11.data, sequences[11].as_bytes());

    assert!(matches!(
        engine.find_one("chr11"),
        Err(EngineError::Locate(_))
    ));

    let ones: Vec<String> = engine
        .find_many("chr1*", false, true)
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(ones, vec!["Chr1", "Chr10", "Chr11"]);

    assert_eq!(engine.find_many("*", false, false).unwrap().len(), 12);
    assert!(engine.find_many("nothing*", false, false).unwrap().is_empty());
    assert_eq!(
        engine
            .find_many("*chromosome 3", true, false)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_gzip_source_is_extracted_once() {
    let dir = tempfile::tempdir().unwrap();
    let (plain, sequences) = write_fasta(dir.path(), "plain.fa", 5);
    let gz_path = dir.path().join("genome.fa.gz");
    let mut encoder = GzEncoder::new(
        std::fs::File::create(&gz_path).unwrap(),
        Compression::default(),
    );
    encoder.write_all(&std::fs::read(&plain).unwrap()).unwrap();
    encoder.finish().unwrap();

    let engine = FastaEngine::open(&gz_path, config(1, 1024), Arc::new(NoopObserver)).unwrap();
    let summary = engine.initialize().unwrap().unwrap().wait().await.unwrap();
    assert!(summary.extracted);
    assert_eq!(engine.working_path(), dir.path().join("genome.fa.gz.txt"));
    assert_eq!(
        std::fs::read(engine.working_path()).unwrap(),
        std::fs::read(&plain).unwrap()
    );
    assert_eq!(engine.find_one("Chr4").unwrap().data, sequences[4].as_bytes());

    let reopened = FastaEngine::open(&gz_path, config(1, 1024), Arc::new(NoopObserver)).unwrap();
    assert!(reopened.initialize().unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_gzip_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    let gz_path = dir.path().join("broken.fa.gz");
    std::fs::write(&gz_path, b"definitely not gzip").unwrap();

    let engine = FastaEngine::open(&gz_path, config(1, 1024), Arc::new(NoopObserver)).unwrap();
    let result = engine.initialize().unwrap().unwrap().wait().await;
    assert!(matches!(result, Err(EngineError::Decompress(_))));
    assert_eq!(engine.state(), EngineState::Error);
    assert!(!engine.working_path().exists());
    assert!(!engine.index_path().exists());
}

#[tokio::test]
async fn test_stale_index_is_trusted_until_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 3);
    ready_engine(&path, config(1, 1024)).await;

    // Replace the file; the persisted index still describes the old one
    std::fs::write(&path, b">Fresh new record\nACGT\n").unwrap();
    let stale = ready_engine(&path, config(1, 1024)).await;
    assert!(stale.find_one("Fresh").is_err());

    let task = stale.rebuild().unwrap();
    task.wait().await.unwrap();
    assert_eq!(stale.find_one("Fresh").unwrap().data, b"ACGT");

    let on_disk = SeqIndex::load_from_file(stale.index_path()).unwrap();
    assert_eq!(on_disk.len(), 1);
}

/// Blocks the first progress callback until the test releases it
struct GateObserver {
    gate: Mutex<mpsc::Receiver<()>>,
}

impl EngineObserver for GateObserver {
    fn on_progress(&self, _label: &str, _progress: Progress) {
        let _ = self.gate.lock().unwrap().recv();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_busy_engine_rejects_queries_and_rebuilds() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 10);

    let (release, gate) = mpsc::channel();
    let observer = GateObserver {
        gate: Mutex::new(gate),
    };
    let engine = FastaEngine::open(&path, config(1, 64), Arc::new(observer)).unwrap();
    let build = engine.initialize().unwrap().unwrap();

    assert_eq!(engine.state(), EngineState::Busy);
    assert!(matches!(engine.rebuild(), Err(EngineError::Busy)));
    assert!(matches!(engine.initialize(), Err(EngineError::Busy)));
    let mut out = Vec::new();
    assert!(matches!(
        engine.run_script("Chr0", ExtractOptions::default(), &mut out),
        Err(EngineError::Busy)
    ));
    assert!(engine.index().is_none());

    // Dropping the sender lets every later progress call through at once
    release.send(()).unwrap();
    drop(release);

    let summary = build.wait().await.unwrap();
    assert_eq!(summary.records, 10);
    assert_eq!(engine.state(), EngineState::Ready);
    assert!(engine.find_one("Chr9").is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_racing_rebuild_never_reports_ready_during_build() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 10);
    ready_engine(&path, config(1, 64)).await;

    for _ in 0..25 {
        let (release, gate) = mpsc::channel::<()>();
        let observer = GateObserver {
            gate: Mutex::new(gate),
        };
        let engine = FastaEngine::open(&path, config(1, 64), Arc::new(observer)).unwrap();

        let loader = {
            let engine = engine.clone();
            tokio::task::spawn_blocking(move || engine.initialize())
        };
        let builder = {
            let engine = engine.clone();
            tokio::task::spawn_blocking(move || engine.rebuild())
        };
        let loaded = loader.await.unwrap();
        let build = builder.await.unwrap().unwrap();

        // Whichever call won, the build is held at its first progress report
        assert!(matches!(loaded, Ok(None) | Err(EngineError::Busy)));
        assert_eq!(engine.state(), EngineState::Busy);
        assert!(matches!(engine.find_one("Chr0"), Err(EngineError::Busy)));

        drop(release);
        build.wait().await.unwrap();
        assert_eq!(engine.state(), EngineState::Ready);
    }
}

#[tokio::test]
async fn test_status_events_during_build() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 4);

    let (observer, mut events) = ChannelObserver::channel();
    let engine = FastaEngine::open(&path, config(1, 64), Arc::new(observer)).unwrap();
    engine.initialize().unwrap().unwrap().wait().await.unwrap();

    let mut states = Vec::new();
    let mut last_fraction = None;
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::Status { state, .. } => states.push(state),
            EngineEvent::Progress {
                progress: Progress::Fraction(f),
                ..
            } => {
                assert!((0.0..=1.0).contains(&f));
                last_fraction = Some(f);
            }
            EngineEvent::Progress { .. } => {}
        }
    }
    assert_eq!(states, vec![EngineState::Busy, EngineState::Ready]);
    assert_eq!(last_fraction, Some(1.0));
}

#[test]
fn test_build_outside_runtime_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = write_fasta(dir.path(), "genome.fa", 1);
    let engine = FastaEngine::open(&path, EngineConfig::default(), Arc::new(NoopObserver)).unwrap();

    assert!(matches!(engine.initialize(), Err(EngineError::Runtime(_))));
    assert_eq!(engine.state(), EngineState::Uninitialized);
}
