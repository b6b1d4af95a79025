//! HTML extraction for accident chart pages
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

use crate::cases::{normalize_narrative, AccidentCase};

/// Body text served in place of a missing chart page
pub const NOT_FOUND_MARKER: &str = "요청하신 페이지를 찾을 수 없습니다";

/// Outcome of fetching one chart page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    /// Page exists; carries the HTML body
    Found(String),
    /// Past the last sub-page of a chart
    NotFound,
}

impl PageFetch {
    /// Classify a response body
    pub fn from_body(body: String) -> Self {
        if body.contains(NOT_FOUND_MARKER) {
            PageFetch::NotFound
        } else {
            PageFetch::Found(body)
        }
    }
}

/// Chart code for a page and sub-page, e.g. `차3-2`
pub fn case_code(page: u32, sub_page: u32) -> String {
    format!("차{}-{}", page, sub_page)
}

/// Page URL for a chart code
pub fn case_url(base_url: &str, chart_type: u32, code: &str) -> String {
    format!(
        "{}?chartNo={}&chartType={}",
        base_url,
        urlencoding::encode(code),
        chart_type
    )
}

/// Compiled selectors for the fields of a chart page
#[derive(Debug, Clone)]
pub struct CaseSelectors {
    vehicle_a: Selector,
    vehicle_b: Selector,
    narrative: Selector,
    fault_a: Selector,
    fault_b: Selector,
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{}': {:?}", css, e))
}

impl CaseSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            vehicle_a: compile(".cont_l .con")?,
            vehicle_b: compile(".cont_r .con")?,
            narrative: compile("#smrizeexplna")?,
            fault_a: compile("td .red")?,
            fault_b: compile("td .orange")?,
        })
    }

    /// Extract a case from page HTML.
    ///
    /// Returns `None` when any field is absent or blank.
    pub fn parse_case(&self, code: &str, url: &str, html: &str) -> Option<AccidentCase> {
        let document = Html::parse_document(html);

        let vehicle_a = first_text(&document, &self.vehicle_a)?;
        let vehicle_b = first_text(&document, &self.vehicle_b)?;
        let narrative = normalize_narrative(&first_text(&document, &self.narrative)?);
        let fault_a = first_text(&document, &self.fault_a)?;
        let fault_b = first_text(&document, &self.fault_b)?;

        let case = AccidentCase::new(
            code,
            vehicle_a,
            vehicle_b,
            narrative,
            format!("{} : {}", fault_a, fault_b),
            url,
        );
        case.is_complete().then_some(case)
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    let text = document
        .select(selector)
        .next()
        .map(element_text)?;
    (!text.is_empty()).then_some(text)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
          <div class="cont_l"><p class="con"> 직진 </p></div>
          <div class="cont_r"><p class="con">좌회전</p></div>
          <div id="smrizeexplna">
            ⊙ 신호기에 의해 교통정리가 이루어지는 교차로에서
            녹색 신호에 직진하는 A차량과 좌회전하는 B차량이 충돌한 사고이다.
          </div>
          <table><tr>
            <td><span class="red">20</span></td>
            <td><span class="orange">80</span></td>
          </tr></table>
        </body></html>
    "#;

    #[test]
    fn test_case_code_and_url() {
        let code = case_code(3, 12);
        assert_eq!(code, "차3-12");
        assert_eq!(
            case_url("https://accident.knia.or.kr/myaccident-content", 1, &code),
            "https://accident.knia.or.kr/myaccident-content?chartNo=%EC%B0%A83-12&chartType=1"
        );
    }

    #[test]
    fn test_sentinel_maps_to_not_found() {
        let body = format!("<html><body><p>{}.</p></body></html>", NOT_FOUND_MARKER);
        assert_eq!(PageFetch::from_body(body), PageFetch::NotFound);
        assert_eq!(
            PageFetch::from_body("<p>ok</p>".to_string()),
            PageFetch::Found("<p>ok</p>".to_string())
        );
    }

    #[test]
    fn test_parse_fixture_page() {
        let selectors = CaseSelectors::new().unwrap();
        let case = selectors
            .parse_case("차1-1", "http://example/1", FIXTURE)
            .unwrap();

        assert_eq!(case.case_code, "차1-1");
        assert_eq!(case.vehicle_a, "직진");
        assert_eq!(case.vehicle_b, "좌회전");
        assert_eq!(case.fault_ratio, "20 : 80");
        assert_eq!(case.source_link, "http://example/1");
        assert!(case.narrative.starts_with("신호기에 의해"));
        assert!(!case.narrative.contains('\n'));
        assert!(!case.narrative.contains('⊙'));
    }

    #[test]
    fn test_page_missing_field_is_skipped() {
        let selectors = CaseSelectors::new().unwrap();
        let html = FIXTURE.replace("class=\"orange\"", "class=\"blue\"");
        assert!(selectors.parse_case("차1-1", "http://example/1", &html).is_none());
    }

    #[test]
    fn test_blank_field_is_skipped() {
        let selectors = CaseSelectors::new().unwrap();
        let html = FIXTURE.replace(" 직진 ", "   ");
        assert!(selectors.parse_case("차1-1", "http://example/1", &html).is_none());
    }
}
