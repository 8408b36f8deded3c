use gin_count::{
    entry::parse_points,
    services::{FileBackend, Ledger, StoreError},
};
use std::fs;
use tempfile::TempDir;

fn file_ledger(dir: &TempDir) -> Ledger {
    Ledger::new(FileBackend::new(dir.path().join("data.json")))
}

#[test]
fn test_append_matches_submitted_player() {
    let dir = TempDir::new().unwrap();
    let ledger = file_ledger(&dir);
    let cases = [("Kaille", "5"), ("Francis", "12"), ("Kaille", "-3"), ("Francis", "x"), ("Kaille", "40pts")];
    for (player, raw) in cases {
        ledger.add_round(player, parse_points(raw)).unwrap();
        let last = ledger.load().unwrap().pop().unwrap();
        let expected = raw
            .trim_end_matches(|c: char| !c.is_ascii_digit())
            .parse::<i64>()
            .unwrap_or(0)
            .max(0) as u32;
        let (mine, other) = match player {
            "Kaille" => (last.kaille, last.francis),
            _ => (last.francis, last.kaille),
        };
        assert_eq!(mine, expected, "{player} {raw}");
        assert_eq!(other, 0);
    }
}

#[test]
fn test_legacy_file_is_normalized_and_kept() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    fs::write(
        &path,
        r#"[
  { "date": "14/09/2026", "kaille": 25, "francis": 0 },
  { "date": "15/09/2026", "kaille": 0, "francis": 31 }
]"#,
    )
    .unwrap();
    let ledger = Ledger::new(FileBackend::new(&path));

    let entries = ledger.load().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.id.is_none()));

    ledger.add_round("Kaille", 3).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains(r#""timestamp": "2026-09-14T00:00:00.000Z""#));
    assert!(!text.contains("\"date\""));
    assert_eq!(ledger.load().unwrap().len(), 3);
}

#[test]
fn test_legacy_negative_score_does_not_corrupt_ledger() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    fs::write(
        &path,
        r#"[
  { "date": "14/09/2026", "kaille": 25, "francis": 0 },
  { "date": "15/09/2026", "kaille": -3, "francis": 0 }
]"#,
    )
    .unwrap();
    let ledger = Ledger::new(FileBackend::new(&path));

    let entries = ledger.load().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kaille, 25);
    assert_eq!((entries[1].kaille, entries[1].francis), (0, 0));
}

#[test]
fn test_save_of_load_keeps_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    let ledger = Ledger::new(FileBackend::new(&path));
    ledger.add_round("Kaille", 5).unwrap();
    ledger.add_round("Francis", 9).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    ledger.save(&ledger.load().unwrap()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_malformed_file_is_distinguishable() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("data.json"), "{}").unwrap();
    let err = file_ledger(&dir).load().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }), "{err}");
}
