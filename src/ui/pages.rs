use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::data::model::PlotRecord;

// ---------------------------------------------------------------------------
// Shared page chrome
// ---------------------------------------------------------------------------

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <meta charset='utf-8'>\n\
         <title>{title}</title>\n\
         <link rel='stylesheet' type='text/css' href='/static/style.css'>\n\
         <script src='/static/viewer.js'></script>\n\
         </head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// URL of a plot under the `/files` mount.
pub fn file_url(record: &PlotRecord) -> String {
    format!(
        "/files/{}/{}",
        urlencoding::encode(&record.use_case),
        urlencoding::encode(&record.file_name)
    )
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Use-case index with a client-side search box.
pub fn index_page(use_cases: &BTreeSet<String>) -> String {
    let mut rows = String::new();
    for name in use_cases {
        let encoded = urlencoding::encode(name);
        let _ = writeln!(
            rows,
            "<tr><td>{label}</td>\
             <td><a href='/?use_case={encoded}'>all</a></td>\
             <td><a href='/use_case/{encoded}'>paged</a></td></tr>",
            label = escape_html(name),
        );
    }

    let body = format!(
        "<h1>Use cases</h1>\n\
         <input type='text' id='search' placeholder='Search' oninput='search_use_case(this.value)'/>\n\
         <table class='use_cases'>\n{rows}</table>"
    );
    page("Use cases", &body)
}

/// Every plot of a use case on one page; the checkboxes hide plots
/// client-side using the data attributes.
pub fn simple_viewer_page(use_case: &str, records: &[PlotRecord]) -> String {
    let mut images = String::new();
    for record in records {
        let _ = writeln!(
            images,
            "<img src='{src}' title='{title}' data-outlier='{outlier}' data-zero-std='{zero}'/>",
            src = escape_html(&file_url(record)),
            title = escape_html(&record.file_name),
            outlier = u8::from(record.has_outlier),
            zero = u8::from(record.is_zero_std()),
        );
    }

    let body = format!(
        "<div class='toolbar'>\n\
         <a href='/'>Go back</a>\n\
         <h1>{title}</h1>\n\
         <input type='checkbox' id='hide_no_out' onchange='update_plots()'/>\n\
         <label for='hide_no_out'>Hide if no outlier</label>\n\
         <input type='checkbox' id='hide_zero_std' onchange='update_plots()'/>\n\
         <label for='hide_zero_std'>Hide if std is null</label>\n\
         </div>\n<div class='plots'>\n{images}</div>",
        title = escape_html(use_case),
    );
    page(use_case, &body)
}

/// Shell of the paginated viewer; `viewer.js` fills `.plots` from `/page`.
pub fn paged_viewer_page(use_case: &str, page_size: i64, page_number: i64) -> String {
    let body = format!(
        "<div class='toolbar'>\n\
         <a href='/'>Go back</a>\n\
         <h1 id='use_case' value='{use_case}'>{use_case}</h1>\n\
         <input type='checkbox' id='hide_no_out' onchange='refresh_page()'/>\n\
         <label for='hide_no_out'>Hide if no outlier</label>\n\
         <input type='checkbox' id='hide_null_std' onchange='refresh_page()'/>\n\
         <label for='hide_null_std'>Hide if std is null</label>\n\
         <input type='text' id='search' placeholder='Search' onchange='refresh_page()'/>\n\
         <button onclick='step_page(-1)'>&lt;</button>\n\
         <input type='number' id='page_number' value='{page_number}' onchange='refresh_page()'/>\n\
         / <span id='n_pages'>1</span>\n\
         <button onclick='step_page(1)'>&gt;</button>\n\
         <input type='number' id='page_size' value='{page_size}' min='1' onchange='refresh_page()'/>\n\
         </div>\n<div class='plots'></div>",
        use_case = escape_html(use_case),
    );
    page(use_case, &body)
}

pub fn not_found_page(message: &str) -> String {
    page(
        "Not found",
        &format!(
            "<p>{}</p>\n<a href='/'>Go back</a>",
            escape_html(message)
        ),
    )
}
