//! Accident case record and its canonical text rendering

use serde::{Deserialize, Serialize};

/// Labels used in the persisted JSON and in the rendered context, in field order.
pub const LABEL_CASE_CODE: &str = "사고유형";
pub const LABEL_VEHICLE_A: &str = "자동차 A";
pub const LABEL_VEHICLE_B: &str = "자동차 B";
pub const LABEL_NARRATIVE: &str = "사고 설명";
pub const LABEL_FAULT_RATIO: &str = "과실 비율";
pub const LABEL_SOURCE_LINK: &str = "사고 링크";

/// One accident scenario with its fault ratio.
///
/// Field order matters: serde writes keys in declaration order, and the
/// stored corpus expects exactly this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentCase {
    /// Scenario identifier, `차<page>-<sub>`
    #[serde(rename = "사고유형")]
    pub case_code: String,
    /// Vehicle A's maneuver
    #[serde(rename = "자동차 A")]
    pub vehicle_a: String,
    /// Vehicle B's maneuver
    #[serde(rename = "자동차 B")]
    pub vehicle_b: String,
    /// Normalized scenario summary
    #[serde(rename = "사고 설명")]
    pub narrative: String,
    /// `"<A> : <B>"`
    #[serde(rename = "과실 비율")]
    pub fault_ratio: String,
    /// Page the record was scraped from
    #[serde(rename = "사고 링크")]
    pub source_link: String,
}

impl AccidentCase {
    pub fn new(
        case_code: impl Into<String>,
        vehicle_a: impl Into<String>,
        vehicle_b: impl Into<String>,
        narrative: impl Into<String>,
        fault_ratio: impl Into<String>,
        source_link: impl Into<String>,
    ) -> Self {
        Self {
            case_code: case_code.into(),
            vehicle_a: vehicle_a.into(),
            vehicle_b: vehicle_b.into(),
            narrative: narrative.into(),
            fault_ratio: fault_ratio.into(),
            source_link: source_link.into(),
        }
    }

    /// Fields paired with their labels, in canonical order
    pub fn labeled_fields(&self) -> [(&'static str, &str); 6] {
        [
            (LABEL_CASE_CODE, self.case_code.as_str()),
            (LABEL_VEHICLE_A, self.vehicle_a.as_str()),
            (LABEL_VEHICLE_B, self.vehicle_b.as_str()),
            (LABEL_NARRATIVE, self.narrative.as_str()),
            (LABEL_FAULT_RATIO, self.fault_ratio.as_str()),
            (LABEL_SOURCE_LINK, self.source_link.as_str()),
        ]
    }

    /// Label of the first blank field, if any
    pub fn first_missing_field(&self) -> Option<&'static str> {
        self.labeled_fields()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| label)
    }

    /// True when every field carries text
    pub fn is_complete(&self) -> bool {
        self.first_missing_field().is_none()
    }

    /// Canonical text form: one `label: value` line per field, no trailing newline.
    ///
    /// This is both the embedding input and the retrieval context, so it must
    /// stay byte-stable.
    pub fn render(&self) -> String {
        self.labeled_fields()
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lenient shape used while loading: any field may be absent or non-string.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCase {
    #[serde(rename = "사고유형", default)]
    case_code: Option<String>,
    #[serde(rename = "자동차 A", default)]
    vehicle_a: Option<String>,
    #[serde(rename = "자동차 B", default)]
    vehicle_b: Option<String>,
    #[serde(rename = "사고 설명", default)]
    narrative: Option<String>,
    #[serde(rename = "과실 비율", default)]
    fault_ratio: Option<String>,
    #[serde(rename = "사고 링크", default)]
    source_link: Option<String>,
}

impl RawCase {
    /// Promote to a full record when every field is present and non-blank
    pub(crate) fn into_case(self) -> Option<AccidentCase> {
        let case = AccidentCase {
            case_code: self.case_code?,
            vehicle_a: self.vehicle_a?,
            vehicle_b: self.vehicle_b?,
            narrative: self.narrative?,
            fault_ratio: self.fault_ratio?,
            source_link: self.source_link?,
        };
        case.is_complete().then_some(case)
    }
}

/// Collapse line breaks and drop bullet markers from scraped narrative text
pub fn normalize_narrative(raw: &str) -> String {
    raw.trim()
        .replace("\r\n", " ")
        .replace('\n', " ")
        .replace("⊙ ", "")
}
