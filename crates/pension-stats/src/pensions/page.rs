use super::report::views::LandingContext;

/// Renders the landing page shell. Chart data ships as an inline JSON
/// document that the page script reads by id.
pub fn render_landing_page(context: &LandingContext) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(&context.data_by_year)?;
    let payload = escape_script(&payload);
    let default_year = context.data_years.last().copied().unwrap_or_default();

    let mut year_options = String::new();
    for year in &context.data_years {
        let selected = if *year == default_year { " selected" } else { "" };
        year_options.push_str(&format!(
            r#"<option value="{year}"{selected}>{year}</option>"#
        ));
    }

    let mut fund_items = String::new();
    for fund in &context.pension_funds {
        fund_items.push_str(&format!(
            r##"<li><a class="dropdown-item" href="#" data-fund="{name}">{name}</a> <small>{label}</small></li>"##,
            name = escape_html(&fund.name),
            label = escape_html(fund.fund_type_label),
        ));
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Illinois Public Pensions Database</title>
</head>
<body>
<main>
<h1>Illinois Public Pensions Database</h1>
<select id="year-select">{year_options}</select>
<ul id="fund-list">{fund_items}</ul>
<div id="state-container"></div>
<div id="county-container"></div>
<div id="chicago-container"></div>
<div id="downstate-container"></div>
<div id="fund-container"></div>
<div id="amortization-cost"></div>
<p>Funding level: <span id="funding-level"></span></p>
<table id="benefits-table" data-source="/benefits.json" data-max-length="500"></table>
</main>
<script id="data-by-year" type="application/json">{payload}</script>
</body>
</html>
"#
    ))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Keeps embedded JSON from closing the surrounding script element. `<`
/// only occurs inside JSON strings, where the unicode escape is equivalent.
fn escape_script(json: &str) -> String {
    json.replace('<', "\\u003c")
}
