//! Output formatting helpers for CLI commands

use crate::api::HealthResponse;
use crate::config::CategoryConfig;
use crate::metrics::StatsResponse;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// View model for category display
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub name: String,
    pub models: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryView {
    pub fn from_config(name: &str, category: &CategoryConfig) -> Self {
        Self {
            name: name.to_string(),
            models: category.models.iter().map(|m| m.id()).collect(),
            keywords: category.keywords.clone(),
            description: category.description.clone(),
        }
    }
}

/// Keywords shown per row before truncating.
const KEYWORDS_SHOWN: usize = 6;

/// Format categories as a table
pub fn format_categories_table(categories: &[CategoryView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Category", "Models (in order)", "Keywords"]);

    for c in categories {
        let mut keywords = c
            .keywords
            .iter()
            .take(KEYWORDS_SHOWN)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if c.keywords.len() > KEYWORDS_SHOWN {
            keywords.push_str(&format!(" (+{} more)", c.keywords.len() - KEYWORDS_SHOWN));
        }

        table.add_row(vec![
            Cell::new(c.name.bold().to_string()),
            Cell::new(c.models.join("\n")),
            Cell::new(keywords),
        ]);
    }

    table.to_string()
}

/// Format categories as JSON
pub fn format_categories_json(categories: &[CategoryView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "categories": categories }))
}

/// Format router health and statistics for humans
pub fn format_status(health: &HealthResponse, stats: &StatsResponse) -> String {
    let mut out = String::new();
    let status = if health.status == "healthy" {
        health.status.green().to_string()
    } else {
        health.status.red().to_string()
    };
    out.push_str(&format!(
        "{} {} - {} (up {})\n\n",
        health.service.bold(),
        health.version,
        status,
        format_uptime(health.uptime_seconds)
    ));

    out.push_str(&format!(
        "Requests: {} total, {} ok, {} failed, avg {:.2}ms\n\n",
        stats.requests.total,
        stats.requests.success.to_string().green(),
        stats.requests.failed.to_string().red(),
        stats.avg_latency_ms
    ));

    if !stats.model_distribution.is_empty() {
        out.push_str(&distribution_table("Model", &stats.model_distribution));
        out.push('\n');
    }
    if !stats.category_distribution.is_empty() {
        out.push_str(&distribution_table("Category", &stats.category_distribution));
        out.push('\n');
    }

    if !stats.recent_requests.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Time", "Category", "Source", "Model", "Latency", "Result"]);
        for r in &stats.recent_requests {
            let result = if r.success {
                "ok".green().to_string()
            } else {
                r.error.as_deref().unwrap_or("failed").red().to_string()
            };
            table.add_row(vec![
                Cell::new(r.timestamp.format("%H:%M:%S")),
                Cell::new(&r.category),
                Cell::new(r.source),
                Cell::new(&r.model),
                Cell::new(format!("{:.0}ms", r.latency_ms)),
                Cell::new(result),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out
}

fn distribution_table(label: &str, counts: &BTreeMap<String, u64>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![label, "Requests"]);
    for (name, count) in counts {
        table.add_row(vec![Cell::new(name), Cell::new(count)]);
    }
    table.to_string()
}

/// Render seconds as e.g. `1h 2m 3s`.
pub fn format_uptime(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{HistoryEntry, RequestStats};
    use crate::routing::{ModelCandidate, Provider, RoutingSource};

    fn code_view() -> CategoryView {
        let config = CategoryConfig {
            models: vec![
                ModelCandidate::new(Provider::OpenRouter, "z-ai/glm-5"),
                ModelCandidate::new(Provider::Ollama, "llama3:8b"),
            ],
            keywords: (0..8).map(|i| format!("kw{}", i)).collect(),
            description: Some("Programming".to_string()),
        };
        CategoryView::from_config("code", &config)
    }

    #[test]
    fn test_category_view_uses_model_ids() {
        let view = code_view();
        assert_eq!(view.models, vec!["openrouter:z-ai/glm-5", "ollama:llama3:8b"]);
    }

    #[test]
    fn test_categories_table_truncates_keywords() {
        let output = format_categories_table(&[code_view()]);
        assert!(output.contains("openrouter:z-ai/glm-5"));
        assert!(output.contains("(+2 more)"));
        assert!(!output.contains("kw7"));
    }

    #[test]
    fn test_categories_json() {
        let output = format_categories_json(&[code_view()]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["categories"][0]["name"], "code");
        assert_eq!(parsed["categories"][0]["keywords"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_format_status() {
        let health = HealthResponse {
            status: "healthy".to_string(),
            service: "llm-router".to_string(),
            version: "0.3.0".to_string(),
            uptime_seconds: 3725,
        };
        let stats = StatsResponse {
            uptime_seconds: 3725,
            requests: RequestStats {
                total: 2,
                success: 1,
                failed: 1,
            },
            avg_latency_ms: 150.0,
            model_distribution: [("openrouter:z-ai/glm-5".to_string(), 2)].into(),
            category_distribution: [("code".to_string(), 2)].into(),
            recent_requests: vec![HistoryEntry {
                timestamp: chrono::Utc::now(),
                category: "code".to_string(),
                source: RoutingSource::Keyword,
                model: "openrouter:z-ai/glm-5".to_string(),
                latency_ms: 150.0,
                success: false,
                error: Some("Backend error 500".to_string()),
            }],
        };

        let output = format_status(&health, &stats);
        assert!(output.contains("1h 2m 5s"));
        assert!(output.contains("2 total"));
        assert!(output.contains("openrouter:z-ai/glm-5"));
        assert!(output.contains("Backend error 500"));
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m 5s");
    }
}
