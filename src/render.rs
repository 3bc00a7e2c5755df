use std::fmt::Write;

use crate::backend::QueryResult;
use crate::error::ReportError;
use crate::format_csv::{self, CSV_FILE_NAME};
use crate::model::{OdbcDriver, QueryParams};
use crate::session::ConnectionInputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    fn css_class(self) -> &'static str {
        match self {
            NoticeKind::Success => "notice success",
            NoticeKind::Info => "notice info",
            NoticeKind::Warning => "notice warning",
            NoticeKind::Error => "notice error",
        }
    }
}

/// A single message shown above the forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Everything needed to draw the page for one response.
#[derive(Debug)]
pub struct PageView<'a> {
    pub connection: &'a ConnectionInputs,
    pub connected: bool,
    pub query: &'a QueryParams,
    pub connection_notices: Vec<Notice>,
    pub query_notices: Vec<Notice>,
    pub report: Option<&'a QueryResult>,
}

/// Render the full dashboard page.
///
/// The query form and the report only appear while connected. The password
/// field is always rendered empty.
pub fn render_page(view: &PageView<'_>) -> Result<String, ReportError> {
    let mut html = String::with_capacity(4096);
    html.push_str(PAGE_HEAD);

    html.push_str("<h1>SQL Server Connection</h1>\n");
    render_connection_form(&mut html, view.connection);
    render_notices(&mut html, &view.connection_notices);

    if view.connected {
        html.push_str("<h1>Product Report Dashboard</h1>\n<h2>Query Product Data</h2>\n");
        render_query_form(&mut html, view.query);
        render_notices(&mut html, &view.query_notices);
        if let Some(report) = view.report {
            render_report(&mut html, report)?;
        }
        html.push_str(
            "<form method=\"post\" action=\"/disconnect\"><button type=\"submit\">Disconnect</button></form>\n",
        );
    } else {
        render_notices(&mut html, &view.query_notices);
    }

    html.push_str("</main>\n</body>\n</html>\n");
    Ok(html)
}

fn render_notices(html: &mut String, notices: &[Notice]) {
    for notice in notices {
        let _ = writeln!(
            html,
            "<div class=\"{}\" role=\"status\">{}</div>",
            notice.kind.css_class(),
            escape_html(&notice.text)
        );
    }
}

fn render_connection_form(html: &mut String, inputs: &ConnectionInputs) {
    html.push_str("<form method=\"post\" action=\"/connect\">\n");
    text_input(html, "host", "SQL Server Hostname or IP", &inputs.host);
    text_input(html, "port", "Port", &inputs.port);
    text_input(html, "database", "Database Name", &inputs.database);
    text_input(html, "username", "Username", &inputs.username);
    html.push_str(
        "<label>Password <input type=\"password\" name=\"password\" autocomplete=\"current-password\"></label>\n",
    );

    html.push_str("<label>ODBC Driver <select name=\"driver\">");
    for driver in OdbcDriver::ALL {
        let selected = if driver == inputs.driver { " selected" } else { "" };
        let _ = write!(
            html,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape_html(driver.name()),
            selected
        );
    }
    html.push_str("</select></label>\n");

    let checked = if inputs.trust_server_certificate { " checked" } else { "" };
    let _ = writeln!(
        html,
        "<label><input type=\"checkbox\" name=\"trust_server_certificate\" value=\"yes\"{}> \
         Trust server certificate (insecure: skips certificate verification)</label>",
        checked
    );
    html.push_str("<button type=\"submit\">Connect</button>\n</form>\n");
}

fn render_query_form(html: &mut String, query: &QueryParams) {
    html.push_str("<form method=\"post\" action=\"/query\">\n");
    text_input(html, "location", "Location", &query.location);
    text_input(html, "gf_number", "GF Number", &query.gf_number);
    text_input(html, "order_id", "Order ID", &query.order_id);
    html.push_str("<button type=\"submit\">Run Query</button>\n</form>\n");
}

fn render_report(html: &mut String, report: &QueryResult) -> Result<(), ReportError> {
    html.push_str("<table>\n<thead><tr>");
    for name in report.column_names() {
        let _ = write!(html, "<th>{}</th>", escape_html(name));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &report.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell.as_str()));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");

    let uri = format_csv::to_data_uri(report)?;
    let _ = writeln!(
        html,
        "<a class=\"download\" href=\"{}\" download=\"{}\">Download CSV</a>",
        uri, CSV_FILE_NAME
    );
    Ok(())
}

fn text_input(html: &mut String, name: &str, label: &str, value: &str) {
    let _ = writeln!(
        html,
        "<label>{} <input type=\"text\" name=\"{}\" value=\"{}\"></label>",
        escape_html(label),
        name,
        escape_html(value)
    );
}

/// Escape text for use in HTML element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_HEAD: &str = "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<title>Dynamic SQL Dashboard</title>
<style>
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
label { display: block; margin: 0.5rem 0; }
.notice { padding: 0.5rem; margin: 0.5rem 0; border-radius: 4px; }
.success { background: #e6f4ea; }
.info { background: #e8f0fe; }
.warning { background: #fef7e0; }
.error { background: #fce8e6; }
table { border-collapse: collapse; margin: 1rem 0; }
th, td { border: 1px solid #ccc; padding: 0.25rem 0.5rem; }
</style>
</head>
<body>
<main>
";
