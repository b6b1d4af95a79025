//! Property checks for rendering and retrieval bounds

mod common;

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::sync::Arc;

use chabunhae::cases::AccidentCase;
use chabunhae::rag::SearchParams;
use common::{case, pipeline, Calls};

fn clean(s: &str) -> String {
    let s: String = s.chars().filter(|c| !c.is_control()).collect();
    if s.trim().is_empty() {
        "x".to_string()
    } else {
        s
    }
}

#[quickcheck]
fn prop_render_is_deterministic_and_ordered(
    code: String,
    a: String,
    b: String,
    narrative: String,
    ratio: String,
    link: String,
) -> bool {
    let record = AccidentCase::new(
        clean(&code),
        clean(&a),
        clean(&b),
        clean(&narrative),
        clean(&ratio),
        clean(&link),
    );
    let rendered = record.render();
    let lines: Vec<&str> = rendered.split('\n').collect();

    rendered == record.clone().render()
        && lines.len() == 6
        && lines[0] == format!("사고유형: {}", record.case_code)
        && lines[1] == format!("자동차 A: {}", record.vehicle_a)
        && lines[2] == format!("자동차 B: {}", record.vehicle_b)
        && lines[3] == format!("사고 설명: {}", record.narrative)
        && lines[4] == format!("과실 비율: {}", record.fault_ratio)
        && lines[5] == format!("사고 링크: {}", record.source_link)
}

#[quickcheck]
fn prop_k_bounds_result_count(n: u8, k: u8) -> TestResult {
    let n = (n % 12) as usize;
    let k = (k % 8) as usize;
    if k == 0 {
        return TestResult::discard();
    }

    let cases: Vec<_> = (1..=n)
        .map(|i| {
            case(
                &format!("차1-{}", i),
                &format!("사고 설명 {}", i),
                "50 : 50",
                &format!("http://example/{}", i),
            )
        })
        .collect();
    let pipeline = pipeline(cases, Arc::new(Calls::default()));

    let retrieval = tokio_test::block_on(
        pipeline.retrieve_with_params("교차로 사고", &SearchParams { top_k: k }),
    );

    match retrieval {
        Ok(r) => TestResult::from_bool(r.hits.len() == n.min(k)),
        Err(_) => TestResult::failed(),
    }
}
