use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use sortdir::{Config, Sorter, validate_and_normalize};

fn contents_under(root: &Path) -> Vec<Vec<u8>> {
    let mut all: Vec<Vec<u8>> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| fs::read(e.path()).unwrap())
        .collect();
    all.sort();
    all
}

#[test]
fn many_workers_never_overwrite_same_named_files() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let out = td.path().join("out");

    for i in 0..48 {
        let dir = src.join(format!("d{i:02}"));
        fs::create_dir_all(&dir).unwrap();
        // Case variants fold to the same lock key.
        let name = match i % 3 {
            0 => "report.csv",
            1 => "Report.csv",
            _ => "REPORT.csv",
        };
        fs::write(dir.join(name), format!("payload {i}")).unwrap();
        fs::write(dir.join("notes"), format!("notes {i}")).unwrap();
    }
    let before = contents_under(&src);

    let mut cfg = Config::new(&src, &out);
    cfg.workers = Some(16);
    cfg.discovery_threads = Some(4);
    validate_and_normalize(&mut cfg).unwrap();
    let report = Sorter::new(cfg.clone()).run().unwrap();

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.moved.len(), 96);

    let destinations: HashSet<_> = report.moved.iter().map(|m| m.to.clone()).collect();
    assert_eq!(destinations.len(), 96, "every file needs its own destination");
    for m in &report.moved {
        let parent = m.to.parent().unwrap().file_name().unwrap();
        if m.from.extension().is_some() {
            assert_eq!(parent, ".csv");
        } else {
            assert_eq!(parent, "no_extension");
        }
    }

    assert_eq!(contents_under(&cfg.output), before);
    assert!(!src.exists());
}

#[test]
fn existing_destination_files_are_not_replaced() {
    let td = tempdir().unwrap();
    let src = td.path().join("src");
    let out = td.path().join("out");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(out.join(".log")).unwrap();
    fs::write(out.join(".log/app.log"), b"already here").unwrap();
    fs::write(src.join("app.log"), b"incoming").unwrap();

    let mut cfg = Config::new(&src, &out);
    validate_and_normalize(&mut cfg).unwrap();
    let report = Sorter::new(cfg.clone()).run().unwrap();

    assert!(report.is_success());
    assert_eq!(fs::read(cfg.output.join(".log/app.log")).unwrap(), b"already here");
    assert_eq!(
        fs::read(cfg.output.join(".log/app_renamed_001_.log")).unwrap(),
        b"incoming"
    );
}

#[test]
fn literal_numbered_name_racing_its_pattern_keeps_both_files() {
    for round in 0..200 {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let out = td.path().join("out");
        fs::create_dir_all(src.join("a")).unwrap();
        fs::create_dir_all(out.join(".txt")).unwrap();
        fs::write(out.join(".txt/x.txt"), b"pre").unwrap();
        fs::write(src.join("x.txt"), b"A").unwrap();
        fs::write(src.join("a/x_renamed_001_.txt"), b"B").unwrap();

        let mut cfg = Config::new(&src, &out);
        cfg.workers = Some(4);
        validate_and_normalize(&mut cfg).unwrap();
        let report = Sorter::new(cfg.clone()).run().unwrap();

        assert!(report.is_success(), "round {round}: {report:?}");
        let destinations: HashSet<_> = report.moved.iter().map(|m| m.to.clone()).collect();
        assert_eq!(destinations.len(), 2, "round {round}: {report:?}");
        assert_eq!(
            contents_under(&cfg.output),
            vec![b"A".to_vec(), b"B".to_vec(), b"pre".to_vec()],
            "round {round}"
        );
    }
}
