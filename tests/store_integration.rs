//! Case store file handling

mod common;

use std::fs;

use chabunhae::cases::{write_cases, CaseStore};
use chabunhae::errors::RagError;
use common::{case, sample_cases};
use tempfile::TempDir;

#[test]
fn test_written_file_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("accident_data_a.json");

    write_cases(&path, &sample_cases()[..1]).unwrap();
    let contents = fs::read_to_string(&path).unwrap();

    // non-ASCII stays unescaped, four-space indentation, fixed key order
    assert!(contents.contains("\"사고유형\": \"차1-1\""));
    assert!(contents.starts_with("[\n    {\n        \"사고유형\""));
    let order: Vec<usize> = ["사고유형", "자동차 A", "자동차 B", "사고 설명", "과실 비율", "사고 링크"]
        .iter()
        .map(|key| contents.find(&format!("\"{}\"", key)).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_load_keeps_records_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cases.json");
    let cases = sample_cases();

    CaseStore::from_cases(cases.clone()).save(&path).unwrap();
    let (store, report) = CaseStore::load_with_report(&path).unwrap();

    assert_eq!(store.cases(), cases.as_slice());
    assert_eq!(report.loaded(), 3);
    assert_eq!(store.get("차2-1").unwrap().fault_ratio, "70 : 30");
}

#[test]
fn test_load_filters_incomplete_and_duplicate_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cases.json");
    fs::write(
        &path,
        r#"[
            {"사고유형": "차1-1", "자동차 A": "직진", "자동차 B": "좌회전",
             "사고 설명": "첫 번째", "과실 비율": "20 : 80", "사고 링크": "http://example/1"},
            {"사고유형": "차1-2", "자동차 A": "직진", "자동차 B": "",
             "사고 설명": "B 누락", "과실 비율": "20 : 80", "사고 링크": "http://example/2"},
            {"사고유형": "차1-1", "자동차 A": "직진", "자동차 B": "좌회전",
             "사고 설명": "중복", "과실 비율": "50 : 50", "사고 링크": "http://example/3"},
            {"사고유형": "차1-3", "자동차 A": "직진", "자동차 B": "좌회전",
             "사고 설명": "링크 없음", "과실 비율": "50 : 50"}
        ]"#,
    )
    .unwrap();

    let (store, report) = CaseStore::load_with_report(&path).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.cases()[0].narrative, "첫 번째");
    assert_eq!(report.total_entries, 4);
    assert_eq!(report.incomplete, 2);
    assert_eq!(report.duplicates, 1);
}

#[test]
fn test_missing_file_is_store_error() {
    let dir = TempDir::new().unwrap();
    let err = CaseStore::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, RagError::Store(_)));
}

#[test]
fn test_malformed_file_is_store_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "[{").unwrap();

    let err = CaseStore::load(&path).unwrap_err();
    assert!(matches!(err, RagError::Store(_)));
}

#[test]
fn test_empty_array_loads_empty_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    write_cases(&path, &[]).unwrap();

    let store = CaseStore::load(&path).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_render_layout() {
    let rendered = case("차1-1", "설명", "50 : 50", "http://example/1").render();
    assert_eq!(
        rendered,
        "사고유형: 차1-1\n자동차 A: 직진\n자동차 B: 좌회전\n사고 설명: 설명\n과실 비율: 50 : 50\n사고 링크: http://example/1"
    );
}
