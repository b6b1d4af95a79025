//! Terminal output for answers, retrieved cases and index state

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::cases::AccidentCase;
use crate::rag::{IndexStatus, SearchHit};

pub const SEARCH_MESSAGE: &str = "잠시만 기다려 주세요... 판례를 찾아보는 중입니다.";
pub const RESULT_HEADER: &str = "📌 AI 분석 결과:";

const SPINNER_TICK: Duration = Duration::from_millis(100);
const RULE_WIDTH: usize = 64;

pub struct DisplayManager {
    spinner: Option<ProgressBar>,
    progress: bool,
}

impl DisplayManager {
    pub fn new() -> Self {
        DisplayManager {
            spinner: None,
            progress: true,
        }
    }

    /// Output without spinners, for `--quiet` and tests
    pub fn without_progress() -> Self {
        DisplayManager {
            spinner: None,
            progress: false,
        }
    }

    pub fn show_banner(&self, version: &str, cases: usize) {
        let rule = "=".repeat(RULE_WIDTH);
        println!("\n{}", rule.cyan());
        println!("{}", format!("  🚗 차분해 (車分解) {}", version).bold().cyan());
        println!("  사고 원인과 과실 비율을 차분히 해석해드립니다.");
        println!("{}", format!("  판례 {}건 로드됨", cases).dimmed());
        println!("{}\n", rule.cyan());
        println!(
            "사고 상황을 입력하세요 ({} 도움말, {} 종료)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Replace any running spinner with a new one
    ///
    /// Returns `None` when progress output is off.
    pub fn start_spinner(&mut self, message: &str) -> Option<ProgressBar> {
        self.finish_current();
        if !self.progress {
            return None;
        }

        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner = ProgressBar::new_spinner().with_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(SPINNER_TICK);

        self.spinner = Some(spinner.clone());
        Some(spinner)
    }

    /// Spinner shown while a question is answered
    pub fn start_search(&mut self) -> Option<ProgressBar> {
        self.start_spinner(SEARCH_MESSAGE)
    }

    pub fn finish_current(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    pub fn finish_with_success(&mut self, message: &str, duration_ms: u64) {
        self.finish_current();
        println!("{} {} {}", "✓".green(), message, format!("({}ms)", duration_ms).dimmed());
    }

    pub fn finish_with_error(&mut self, message: &str) {
        self.finish_current();
        println!("{} {}", "✗".red(), message.red());
    }

    /// Model reply under the result header, printed as received
    pub fn show_answer(&self, text: &str) {
        println!("\n{}\n\n{}\n", RESULT_HEADER.bold().green(), text);
    }

    /// Retrieved cases, most similar first, with their scores
    pub fn show_matches(&self, hits: &[SearchHit]) {
        if hits.is_empty() {
            self.show_info("No similar cases retrieved");
            return;
        }

        self.show_section(&format!("Retrieved cases ({})", hits.len()));
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "  {}. {} {}",
                (rank + 1).to_string().cyan(),
                hit.case.case_code.bold(),
                format!("(score {:.3})", hit.score).dimmed()
            );
            // the first rendered line repeats the case code
            for line in hit.rendered.lines().skip(1) {
                println!("     {}", line.dimmed());
            }
        }
        println!();
    }

    pub fn show_case(&self, case: &AccidentCase) {
        self.show_section(&case.case_code);
        for (label, value) in case.labeled_fields() {
            println!("  {:<10} {}", format!("{}:", label).cyan(), value);
        }
        println!();
    }

    pub fn show_status(&self, status: &IndexStatus, top_k: usize, show_context: bool) {
        let index = if status.built {
            format!("built (dimension {})", status.dimension).green()
        } else {
            "not built".yellow()
        };
        let context = if show_context { "on" } else { "off" };

        self.show_section("Status:");
        for (label, value) in [
            ("Cases:", status.cases.to_string()),
            ("Index:", index.to_string()),
            ("Top-k:", top_k.to_string()),
            ("Show context:", context.to_string()),
        ] {
            println!("  {:<16} {}", label, value);
        }
        println!();
    }

    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    pub fn clear_screen(&self) -> io::Result<()> {
        print!("\x1B[2J\x1B[1;1H");
        io::stdout().flush()
    }

    pub fn show_section(&self, title: &str) {
        println!("\n{}\n{}", title.bold().cyan(), "-".repeat(RULE_WIDTH).cyan());
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
