//! HTML report generation
//!
//! Generates self-contained, printable HTML pages with embedded CSS.
//! All user-provided text is escaped.

use crate::layout::{ColumnKind, TableSchema, LEGEND_TITLE, REPORT_SUBTITLE, REPORT_TITLE};
use crate::record::{EvaluationRecord, HazardRow, RecordSummary};
use crate::risk::RiskLevel;

/// Render one evaluation as a printable HTML page
pub fn render_record(record: &EvaluationRecord) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{id}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {header}
        {table}
        {legend}
        {footer}
    </div>
</body>
</html>"#,
        id = html_escape(&record.id),
        css = inline_css(),
        header = render_header(record),
        table = render_rows_table(record),
        legend = render_legend(),
        footer = render_footer(),
    )
}

/// Render a listing of stored evaluations
pub fn render_summaries(title: &str, summaries: &[RecordSummary]) -> String {
    let body = if summaries.is_empty() {
        r#"<p class="empty">No hay evaluaciones registradas.</p>"#.to_string()
    } else {
        let rows: String = summaries
            .iter()
            .map(|s| {
                format!(
                    r#"
            <tr>
                <td class="monospace">{id}</td>
                <td>{company}</td>
                <td>{area}</td>
                <td>{process}</td>
                <td>{updated}</td>
            </tr>"#,
                    id = html_escape(&s.id),
                    company = html_escape(&s.company),
                    area = html_escape(&s.area),
                    process = html_escape(&s.process),
                    updated = s.updated_at.format("%Y-%m-%d %H:%M UTC"),
                )
            })
            .collect();
        format!(
            r#"<table class="listing">
        <thead>
            <tr>
                <th>ID</th>
                <th>Razón Social</th>
                <th>Área</th>
                <th>Proceso</th>
                <th>Actualizado</th>
            </tr>
        </thead>
        <tbody>{rows}
        </tbody>
    </table>"#,
            rows = rows,
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <header>
            <h1>{title}</h1>
            <div class="meta">{count} evaluaciones</div>
        </header>
        {body}
        {footer}
    </div>
</body>
</html>"#,
        title = html_escape(title),
        css = inline_css(),
        count = summaries.len(),
        body = body,
        footer = render_footer(),
    )
}

fn inline_css() -> &'static str {
    r#"
* {
    box-sizing: border-box;
    margin: 0;
    padding: 0;
}

body {
    font-family: Helvetica, Arial, sans-serif;
    color: #000000;
    background: #ffffff;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    padding: 1.5rem;
}

header {
    text-align: center;
    margin-bottom: 1rem;
}

header h1 {
    font-size: 1.25rem;
    font-weight: 700;
}

header .subtitle {
    font-size: 0.8rem;
}

header .meta {
    font-size: 0.75rem;
    margin-top: 0.5rem;
}

table {
    width: 100%;
    border-collapse: collapse;
    font-size: 0.65rem;
}

th, td {
    border: 1px solid #000000;
    padding: 3px 2px;
    vertical-align: top;
    overflow-wrap: anywhere;
}

th {
    background: #e0e0e0;
    font-weight: 700;
    text-align: center;
    vertical-align: middle;
}

td.center {
    text-align: center;
}

td.mr {
    font-weight: 700;
    text-align: center;
    vertical-align: middle;
    white-space: nowrap;
}

.monospace {
    font-family: 'SF Mono', Monaco, 'Cascadia Code', monospace;
}

.legend {
    margin-top: 1.5rem;
    text-align: center;
}

.legend h2 {
    font-size: 0.75rem;
    margin-bottom: 0.5rem;
}

.legend-items {
    display: flex;
    justify-content: center;
}

.legend-item {
    width: 150px;
    display: flex;
    align-items: flex-start;
    font-size: 0.6rem;
    text-align: left;
}

.swatch {
    width: 15px;
    height: 15px;
    margin-right: 4px;
    border: 1px solid #000000;
}

.empty {
    text-align: center;
    color: #6b7280;
}

footer {
    margin-top: 2rem;
    text-align: center;
    font-size: 0.7rem;
    color: #6b7280;
}

@media print {
    @page {
        size: A4 landscape;
        margin: 40px 30px;
    }

    .container {
        max-width: none;
        padding: 0;
    }

    footer {
        display: none;
    }
}
"#
}

fn render_header(record: &EvaluationRecord) -> String {
    format!(
        r#"<header>
    <h1>{title}</h1>
    <div class="subtitle">{subtitle}</div>
    <div class="meta">
        <span>Razón Social: <strong>{company}</strong></span> |
        <span>Área: <strong>{area}</strong></span> |
        <span>Proceso: <strong>{process}</strong></span>
    </div>
</header>"#,
        title = REPORT_TITLE,
        subtitle = REPORT_SUBTITLE,
        company = html_escape(&record.company),
        area = html_escape(&record.area),
        process = html_escape(&record.process),
    )
}

fn render_rows_table(record: &EvaluationRecord) -> String {
    let schema = TableSchema::iperc();
    let headers: String = schema
        .columns
        .iter()
        .map(|column| {
            format!(
                r#"
                <th style="width: {width}px">{title}</th>"#,
                width = column.width,
                title = html_escape(column.title),
            )
        })
        .collect();

    let body: String = record
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cells: String = schema
                .columns
                .iter()
                .map(|column| render_cell(column.kind, row, i + 1))
                .collect();
            format!(
                r#"
            <tr>{cells}
            </tr>"#,
                cells = cells,
            )
        })
        .collect();

    format!(
        r#"<table class="iperc">
        <thead>
            <tr>{headers}
            </tr>
        </thead>
        <tbody>{body}
        </tbody>
    </table>"#,
        headers = headers,
        body = body,
    )
}

fn render_cell(kind: ColumnKind, row: &HazardRow, number: usize) -> String {
    let text = html_escape(&kind.cell_text(row, number));
    match kind {
        ColumnKind::Magnitude => format!(
            r#"
                <td class="mr" style="background: {bg}; color: {fg}">{text}</td>"#,
            bg = html_escape(row.risk_color()),
            fg = risk_text_color(row.risk_level()),
            text = text,
        ),
        ColumnKind::Number | ColumnKind::Probability | ColumnKind::Severity => format!(
            r#"
                <td class="center">{text}</td>"#,
            text = text,
        ),
        _ => format!(
            r#"
                <td>{text}</td>"#,
            text = text,
        ),
    }
}

/// Black reads better on the yellow and orange bands
fn risk_text_color(level: RiskLevel) -> &'static str {
    if level.prefers_dark_text() {
        "#000000"
    } else {
        "#ffffff"
    }
}

fn render_legend() -> String {
    let items: String = RiskLevel::defined()
        .iter()
        .map(|level| {
            format!(
                r#"
        <div class="legend-item">
            <div class="swatch" style="background: {color}"></div>
            <div>{label}<br>{range}</div>
        </div>"#,
                color = level.color_hex(),
                label = level.legend_label(),
                range = html_escape(level.range_label()),
            )
        })
        .collect();

    format!(
        r#"<section class="legend">
    <h2>{title}</h2>
    <div class="legend-items">{items}
    </div>
</section>"#,
        title = LEGEND_TITLE,
        items = items,
    )
}

fn render_footer() -> String {
    r#"<footer>
    <p>Generado por iperc</p>
</footer>"#
        .to_string()
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordDraft, RowInput};
    use chrono::{TimeZone, Utc};

    fn record() -> EvaluationRecord {
        let draft = RecordDraft {
            company: "Minera <Sur> & Cía".to_string(),
            area: "Planta".to_string(),
            process: "Chancado".to_string(),
            rows: vec![
                RowInput::new("Inspección", "Ruido", "Hipoacusia", 3, 10),
                RowInput::new("Mantenimiento", "Atrapamiento", "Amputación", 5, 50)
                    .with_responsible("J. Pérez"),
            ],
        };
        EvaluationRecord::create(&draft, Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">O'Neil & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;O&#39;Neil &amp; co&lt;/a&gt;"
        );
    }

    #[test]
    fn test_record_page_escapes_user_text() {
        let html = render_record(&record());
        assert!(html.contains("Minera &lt;Sur&gt; &amp; Cía"));
        assert!(!html.contains("<Sur>"));
    }

    #[test]
    fn test_magnitude_cell_text_color() {
        let html = render_record(&record());
        // 3 x 10 is ALTO (orange), 5 x 50 is CRÍTICO (red)
        assert!(html.contains(r#"style="background: #ffa500; color: #000000">30</td>"#));
        assert!(html.contains(r#"style="background: #ff6b6b; color: #ffffff">250</td>"#));
    }

    #[test]
    fn test_legend_lists_defined_levels() {
        let html = render_record(&record());
        let bajo = html.find("RIESGO BAJO").unwrap();
        let critico = html.find("RIESGO CRÍTICO").unwrap();
        assert!(bajo < critico);
        assert!(html.contains("X &lt;= 3"));
        assert!(!html.contains("NO DEFINIDO"));
    }

    #[test]
    fn test_summaries_page() {
        let summary = record().summary();
        let html = render_summaries("Evaluaciones <IPERC>", &[summary.clone()]);
        assert!(html.contains("Evaluaciones &lt;IPERC&gt;"));
        assert!(html.contains(&summary.id));
        assert!(html.contains("1 evaluaciones"));

        let empty = render_summaries("Vacío", &[]);
        assert!(empty.contains("No hay evaluaciones registradas."));
    }
}
