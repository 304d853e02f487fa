use crate::dates::earliest_date;
use crate::models::{BasisReport, DashboardResponse, ExpenseRow, Session};
use chrono::NaiveDate;
use std::fmt::Write;

pub struct DashboardView<'a> {
    pub session: &'a Session,
    pub today: NaiveDate,
    pub report: &'a DashboardResponse,
}

pub fn render_login(message: Option<&str>) -> String {
    let message = match message {
        Some(text) => format!(r#"<div class="status" data-type="error">{}</div>"#, escape_html(text)),
        None => String::new(),
    };
    LOGIN_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{MESSAGE}}", &message)
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let report = view.report;
    DASHBOARD_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{USERNAME}}", &escape_html(&view.session.username))
        .replace("{{COMPANIES}}", &view.session.companies.len().to_string())
        .replace("{{MIN_DATE}}", &earliest_date().to_string())
        .replace("{{MAX_DATE}}", &view.today.to_string())
        .replace("{{FROM}}", &report.from.to_string())
        .replace("{{TO}}", &report.to.to_string())
        .replace("{{ACCRUAL}}", &render_basis(&report.accrual))
        .replace("{{CASH}}", &render_basis(&report.cash))
}

/// `AED 1,234.56` style, matching the tiles.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents != 0 { "-" } else { "" };
    format!("AED {sign}{}.{:02}", group_thousands(cents / 100), cents % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn render_basis(report: &BasisReport) -> String {
    let label = report.basis.label();
    let mut html = String::new();

    let _ = write!(html, r#"<section class="basis"><h2>{label} Basis</h2>"#);
    for warning in &report.warnings {
        let _ = write!(html, r#"<div class="status" data-type="error">{}</div>"#, escape_html(warning));
    }

    if !report.has_data {
        let _ = write!(
            html,
            r#"<div class="status" data-type="error">No {} data available.</div></section>"#,
            label.to_lowercase()
        );
        return html;
    }

    html.push_str(r#"<div class="panel">"#);
    for (name, amount) in report.metrics.tiles() {
        let _ = write!(
            html,
            r#"<div class="stat"><span class="label">{name}</span><span class="value">{}</span></div>"#,
            format_amount(amount)
        );
    }
    html.push_str("</div>");

    if !report.expenses.is_empty() {
        let _ = write!(html, r#"<h3>Operating Expenses ({label})</h3>"#);
        html.push_str(&render_expense_table(&report.expenses));
        let _ = write!(
            html,
            r#"<div class="chart-card"><h4>Expenses by Category ({label})</h4>{}</div>"#,
            render_bar_chart(&report.expenses)
        );
    }

    html.push_str("</section>");
    html
}

fn render_expense_table(rows: &[ExpenseRow]) -> String {
    let mut html = String::from(r#"<table class="expenses"><thead><tr><th>Name</th><th>Amount</th></tr></thead><tbody>"#);
    for row in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&row.name),
            format_amount(row.amount)
        );
    }
    html.push_str("</tbody></table>");
    html
}

/// Inline SVG bar chart, one bar per expense, coloured by amount.
pub fn render_bar_chart(rows: &[ExpenseRow]) -> String {
    const WIDTH: f64 = 640.0;
    const HEIGHT: f64 = 300.0;
    const PAD_LEFT: f64 = 72.0;
    const PAD_RIGHT: f64 = 16.0;
    const PAD_TOP: f64 = 20.0;
    const PAD_BOTTOM: f64 = 64.0;

    if rows.is_empty() {
        return String::new();
    }

    let low = rows.iter().map(|row| row.amount).fold(0.0_f64, f64::min);
    let mut high = rows.iter().map(|row| row.amount).fold(0.0_f64, f64::max);
    if high == low {
        high = low + 1.0;
    }

    let plot_width = WIDTH - PAD_LEFT - PAD_RIGHT;
    let plot_height = HEIGHT - PAD_TOP - PAD_BOTTOM;
    let slot = plot_width / rows.len() as f64;
    let bar_width = slot * 0.7;
    let y = |value: f64| PAD_TOP + (high - value) / (high - low) * plot_height;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="Expenses by category">"#
    );

    for tick in 0..=4 {
        let value = low + (high - low) * f64::from(tick) / 4.0;
        let y_pos = y(value);
        let _ = write!(
            svg,
            r#"<line class="chart-grid" x1="{PAD_LEFT}" y1="{y_pos:.2}" x2="{}" y2="{y_pos:.2}" /><text class="chart-label" x="{}" y="{:.2}" text-anchor="end">{}</text>"#,
            WIDTH - PAD_RIGHT,
            PAD_LEFT - 8.0,
            y_pos + 4.0,
            axis_label(value)
        );
    }

    for (index, row) in rows.iter().enumerate() {
        let x = PAD_LEFT + slot * index as f64 + (slot - bar_width) / 2.0;
        let top = y(row.amount.max(0.0));
        let bottom = y(row.amount.min(0.0));
        let shade = (row.amount - low) / (high - low);
        let _ = write!(
            svg,
            r#"<rect class="chart-bar" x="{x:.2}" y="{top:.2}" width="{bar_width:.2}" height="{:.2}" fill="{}"><title>{}: {}</title></rect>"#,
            (bottom - top).max(0.0),
            viridis(shade),
            escape_html(&row.name),
            format_amount(row.amount)
        );
        let _ = write!(
            svg,
            r#"<text class="chart-label" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            x + bar_width / 2.0,
            HEIGHT - PAD_BOTTOM + 18.0,
            escape_html(&truncate(&row.name, 14))
        );
    }

    let _ = write!(
        svg,
        r#"<line class="chart-axis" x1="{PAD_LEFT}" y1="{0:.2}" x2="{1}" y2="{0:.2}" /></svg>"#,
        y(0.0),
        WIDTH - PAD_RIGHT
    );
    svg
}

fn axis_label(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(rounded.abs() as u64))
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut short: String = name.chars().take(max_chars - 1).collect();
    short.push('…');
    short
}

/// Three-stop approximation of the viridis scale for `t` in `0..=1`.
fn viridis(t: f64) -> String {
    const STOPS: [(f64, f64, f64); 3] = [(68.0, 1.0, 84.0), (33.0, 145.0, 140.0), (253.0, 231.0, 37.0)];
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let (from, to, local) = if t < 0.5 {
        (STOPS[0], STOPS[1], t * 2.0)
    } else {
        (STOPS[1], STOPS[2], (t - 0.5) * 2.0)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * local).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

const STYLE: &str = r#"
    :root {
      --bg-1: #0d1b2a;
      --bg-2: #415a77;
      --ink: #1b263b;
      --accent: #f5c518;
      --accent-2: #1b263b;
      --card: rgba(255, 255, 255, 0.94);
      --shadow: 0 10px 30px rgba(0, 0, 0, 0.25);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #1b263b, var(--bg-2), #778da9);
      color: var(--ink);
      font-family: "Segoe UI", Tahoma, Geneva, Verdana, sans-serif;
      padding: 32px 18px 48px;
    }

    .card {
      width: min(1180px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 18px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    .card.narrow {
      width: min(440px, 100%);
      margin-top: 8vh;
      text-align: center;
    }

    h1, h2, h3, h4 {
      margin: 0;
    }

    .separator {
      height: 6px;
      background: linear-gradient(to right, #f5c518, #f7d774, #f5c518);
      border-radius: 3px;
    }

    .subtitle {
      margin: 0;
      font-size: 1rem;
      font-weight: 600;
    }

    form.stack {
      display: grid;
      gap: 12px;
      text-align: left;
    }

    form.inline {
      display: flex;
      flex-wrap: wrap;
      align-items: end;
      gap: 12px;
    }

    label {
      display: grid;
      gap: 6px;
      font-size: 0.9rem;
    }

    input {
      padding: 12px;
      border-radius: 10px;
      border: 1px solid #ccc;
      font-size: 14px;
    }

    button {
      padding: 13px 20px;
      background: linear-gradient(135deg, #1b263b, #415a77);
      border: none;
      border-radius: 10px;
      color: white;
      font-size: 16px;
      font-weight: 600;
      cursor: pointer;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(6, minmax(140px, 1fr));
      gap: 12px;
    }

    .basis {
      display: grid;
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 14px;
      padding: 16px;
      border: 1px solid rgba(27, 38, 59, 0.1);
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: #778da9;
    }

    .stat .value {
      font-size: 1.2rem;
      font-weight: 600;
    }

    table.expenses {
      border-collapse: collapse;
      width: 100%;
    }

    table.expenses th, table.expenses td {
      text-align: left;
      padding: 8px 12px;
      border-bottom: 1px solid rgba(27, 38, 59, 0.1);
    }

    .chart-card {
      background: white;
      border-radius: 14px;
      padding: 16px;
      border: 1px solid rgba(27, 38, 59, 0.1);
    }

    .chart {
      width: 100%;
      display: block;
    }

    .chart-grid {
      stroke: rgba(27, 38, 59, 0.12);
    }

    .chart-axis {
      stroke: rgba(27, 38, 59, 0.4);
      stroke-dasharray: 4 6;
    }

    .chart-label {
      fill: #5f6b7a;
      font-size: 11px;
    }

    .status {
      font-size: 0.95rem;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    hr {
      border: none;
      border-top: 1px solid rgba(27, 38, 59, 0.15);
    }

    @media (max-width: 900px) {
      .panel {
        grid-template-columns: repeat(2, 1fr);
      }
    }
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Blue Horizon Login</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="card narrow">
    <h1>Blue Horizon Login</h1>
    <div class="separator"></div>
    <p class="subtitle">Welcome to Blue Horizon International Analytics Dashboard</p>
    <p class="subtitle">Please enter your credentials to continue</p>
    {{MESSAGE}}
    <form class="stack" method="post" action="/login">
      <label>Email
        <input type="text" name="email" placeholder="Enter your email" autocomplete="username" />
      </label>
      <label>Password
        <input type="password" name="password" placeholder="Enter your password" autocomplete="current-password" />
      </label>
      <button type="submit">Login</button>
    </form>
  </main>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Profit &amp; Loss Dashboard</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="card">
    <header>
      <h1>Profit &amp; Loss Dashboard</h1>
      <p class="subtitle">Signed in as {{USERNAME}} ({{COMPANIES}} companies)</p>
    </header>

    <form class="inline" method="get" action="/dashboard">
      <label>From
        <input type="date" name="from" value="{{FROM}}" min="{{MIN_DATE}}" max="{{MAX_DATE}}" />
      </label>
      <label>To
        <input type="date" name="to" value="{{TO}}" min="{{MIN_DATE}}" max="{{MAX_DATE}}" />
      </label>
      <button type="submit">Apply</button>
    </form>
    <form method="post" action="/logout">
      <button type="submit">Log out</button>
    </form>

    {{ACCRUAL}}
    <hr />
    {{CASH}}
  </main>
</body>
</html>
"#;
