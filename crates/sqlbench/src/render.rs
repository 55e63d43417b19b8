// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of results and history for the terminal.

use serde_json::Value;
use sqlbench_core::{HistoryEntry, ResultModel};

/// Cells longer than this are cut and suffixed with `...`.
const MAX_CELL_WIDTH: usize = 48;

/// Text shown for a single cell. `null` is written as `NULL`.
pub fn format_value(value: &Value) -> String {
    let text = match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate(&text.replace(['\n', '\r', '\t'], " "), MAX_CELL_WIDTH)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Renders a result as an aligned table followed by a summary line.
pub fn render_table(result: &ResultModel) -> String {
    let headers: Vec<String> = result.column_names().map(str::to_string).collect();
    let cells: Vec<Vec<String>> = result
        .rows()
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|name| row.get(name).map(format_value).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    if !headers.is_empty() {
        out.push_str(&join_row(&headers, &widths));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');
        for row in &cells {
            out.push_str(&join_row(row, &widths));
            out.push('\n');
        }
    }

    let noun = if result.row_count() == 1 { "row" } else { "rows" };
    out.push_str(&format!(
        "({} {noun}, {} ms)",
        result.row_count(),
        result.execution_time_ms()
    ));
    out
}

fn join_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// One line per entry, newest first as the service returns them.
pub fn render_history(entries: &[HistoryEntry], use_color: bool) -> String {
    if entries.is_empty() {
        return "no history yet".to_string();
    }
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let marker = status_marker(entry.success, use_color);
        let when = entry.executed_at.format("%Y-%m-%d %H:%M:%S");
        let sql = truncate(&entry.sql_text.replace('\n', " "), 72);
        let detail = match (&entry.error_message, entry.row_count) {
            (Some(err), _) if !entry.success => format!("  ({err})"),
            (_, Some(rows)) => format!("  ({rows} rows)"),
            _ => String::new(),
        };
        lines.push(format!("{marker} {when}  [{}]  {sql}{detail}", entry.source));
    }
    lines.join("\n")
}

fn status_marker(success: bool, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        if success {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        }
    } else if success {
        "[OK]".to_string()
    } else {
        "[FAIL]".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlbench_core::{QueryColumn, QueryResponse};

    fn entry(sql: &str, success: bool) -> HistoryEntry {
        serde_json::from_value(json!({
            "id": 1,
            "sqlText": sql,
            "executedAt": "2026-01-02T03:04:05Z",
            "rowCount": if success { Some(3) } else { None },
            "success": success,
            "errorMessage": if success { None } else { Some("syntax error") },
            "querySource": "manual"
        }))
        .unwrap()
    }

    fn result() -> ResultModel {
        ResultModel::from_response(
            QueryResponse {
                columns: vec![QueryColumn::new("id", "int"), QueryColumn::new("name", "text")],
                rows: vec![
                    json!({"id": 1, "name": "ada"}).as_object().cloned().unwrap(),
                    json!({"id": 22}).as_object().cloned().unwrap(),
                ],
                row_count: Some(2),
                execution_time_ms: Some(7),
                sql: None,
            },
            "SELECT id, name FROM users",
        )
    }

    #[test]
    fn table_is_aligned() {
        let table = render_table(&result());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "id | name");
        assert_eq!(lines[1], "---+-----");
        assert_eq!(lines[2], "1  | ada");
        assert_eq!(lines[3], "22 | NULL");
        assert_eq!(lines[4], "(2 rows, 7 ms)");
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(100);
        let text = format_value(&json!(long));
        assert_eq!(text.chars().count(), MAX_CELL_WIDTH);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn history_uses_plain_markers_without_color() {
        let text = render_history(&[entry("SELECT 1", true), entry("SELEC 1", false)], false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "[OK] 2026-01-02 03:04:05  [manual]  SELECT 1  (3 rows)"
        );
        assert!(lines[1].starts_with("[FAIL]"));
        assert!(lines[1].ends_with("(syntax error)"));
    }

    #[test]
    fn empty_history_has_a_message() {
        assert_eq!(render_history(&[], false), "no history yet");
    }
}
