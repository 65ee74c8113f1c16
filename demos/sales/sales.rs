//! Sums sale amounts into a plain-text report.

use std::fmt::Write;

use serde_json::Value;

use crate::report_engine::ReportEngine;

#[derive(Default)]
pub struct SalesReportEngine;

impl ReportEngine for SalesReportEngine {
    fn run_report(&self, config: &Value) -> Result<Vec<u8>, String> {
        let title = config["title"].as_str().unwrap_or_default();
        let currency = config["currency"].as_str().unwrap_or("$");
        let values: Vec<f64> = config["values"]
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();

        let mut report = String::new();
        writeln!(report, "Report Title: {title}").map_err(|e| e.to_string())?;
        for value in &values {
            writeln!(report, "Sale: {currency}{value:.2}").map_err(|e| e.to_string())?;
        }
        if config["include_summary"].as_bool().unwrap_or(true) {
            let total: f64 = values.iter().sum();
            writeln!(report, "Total: {total:.2}").map_err(|e| e.to_string())?;
        }
        Ok(report.into_bytes())
    }
}
