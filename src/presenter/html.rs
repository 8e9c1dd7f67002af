// Renders a DashboardView as a standalone HTML page.
use crate::model::{AnalysisResult, Notice};
use crate::pipeline::{DashboardView, THRESHOLD_MAX, THRESHOLD_MIN, VOLUME_STEP};
use crate::utils::{escape_html, group_thousands};

pub const NO_DATA_MESSAGE: &str = "No data to display.";

const STYLE: &str = "body{font-family:sans-serif;margin:0;display:flex}\
aside{width:16rem;padding:1rem;background:#f0f2f6;min-height:100vh}\
main{flex:1;padding:1rem 2rem}\
table{border-collapse:collapse}th,td{border:1px solid #ddd;padding:.3rem .6rem;text-align:right}\
th{background:#fafafa}td.text{text-align:left}\
.notice{padding:.6rem 1rem;margin:.5rem 0;border-radius:.3rem}\
.error{background:#fde8e8;color:#8a1c1c}.warning{background:#fff6db;color:#7a5b00}\
.status{background:#e8f1fd;color:#1c4a8a}";

/// Renders the full page: sidebar form, notices, then the table or the no-data notice.
pub fn render_dashboard(view: &DashboardView, title: &str, vs_currency: &str) -> String {
    let mut page = String::with_capacity(4096);
    page.push_str(&format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>",
        title = escape_html(title),
    ));

    page.push_str(&render_sidebar(view));

    page.push_str("<main>");
    page.push_str(&format!("<h1>{}</h1>", escape_html(title)));
    for notice in &view.notices {
        page.push_str(&render_notice(notice));
    }

    if view.results.is_empty() {
        page.push_str(&render_notice(&Notice::Warning(NO_DATA_MESSAGE.to_string())));
    } else {
        page.push_str(&render_table(&view.results, vs_currency));
    }

    page.push_str(&format!(
        "<p><small>{} fetched, {} shown, {} skipped. Generated {}.</small></p>",
        view.fetched,
        view.results.len(),
        view.skipped.len(),
        view.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ));
    page.push_str("</main></body></html>");
    page
}

fn render_sidebar(view: &DashboardView) -> String {
    let mut out = format!(
        "<aside><h2>Settings</h2><form method=\"get\" action=\"/\">\
         <label for=\"threshold\">Minimum growth (%): <output id=\"threshold-value\">{threshold}</output></label><br>\
         <input type=\"range\" id=\"threshold\" name=\"threshold\" min=\"{min}\" max=\"{max}\" step=\"1\" value=\"{threshold}\" \
         oninput=\"document.getElementById('threshold-value').value=this.value\"><br>\
         <label for=\"min_volume\">Minimum trading volume:</label><br>\
         <input type=\"number\" id=\"min_volume\" name=\"min_volume\" min=\"0\" step=\"{step}\" value=\"{volume}\"><br><br>\
         <button type=\"submit\">Apply</button></form>",
        threshold = view.inputs.threshold,
        min = THRESHOLD_MIN,
        max = THRESHOLD_MAX,
        step = VOLUME_STEP,
        volume = view.inputs.min_volume,
    );
    if !view.inputs_applied {
        out.push_str(
            "<p><small>Filtering uses the server's configured thresholds; \
             these inputs are recorded only.</small></p>",
        );
    }
    out.push_str("</aside>");
    out
}

fn render_notice(notice: &Notice) -> String {
    let (class, message) = match notice {
        Notice::Error(m) => ("error", m),
        Notice::Warning(m) => ("warning", m),
        Notice::Status(m) => ("status", m),
    };
    format!("<div class=\"notice {}\">{}</div>", class, escape_html(message))
}

fn render_table(results: &[AnalysisResult], vs_currency: &str) -> String {
    let mut out = String::from("<table><thead><tr>");
    let price_header = format!("Price ({})", vs_currency.to_uppercase());
    for header in [
        "Name",
        "Symbol",
        price_header.as_str(),
        "24h Change (%)",
        "Volume",
        "SMA",
        "RSI",
        "MACD",
        "Bollinger Avg",
    ] {
        out.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    out.push_str("</tr></thead><tbody>");

    for r in results {
        // MACD stays blank until the series covers the slow window.
        let macd = r.macd.map(|v| format!("{:.2}", v)).unwrap_or_default();
        out.push_str(&format!(
            "<tr><td class=\"text\">{}</td><td class=\"text\">{}</td><td>{}</td><td>{:.2}</td>\
             <td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{}</td><td>{:.2}</td></tr>",
            escape_html(&r.name),
            escape_html(&r.symbol),
            r.price,
            r.change_24h,
            group_thousands(r.volume, 0),
            r.sma,
            r.rsi,
            macd,
            r.bollinger_mavg,
        ));
    }
    out.push_str("</tbody></table>");
    out
}
