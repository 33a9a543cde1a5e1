use super::escape_html;

pub const ROOT_ID: &str = "__postview";
pub const PROPS_ID: &str = "__POSTVIEW_PROPS__";

/// Wraps a rendered component and its serialized props into a full page.
pub fn render(title: &str, body: &str, props_json: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<div id=\"{ROOT_ID}\">{body}</div>\n<script id=\"{PROPS_ID}\" type=\"application/json\">{}</script>\n</body>\n</html>\n",
        escape_html(title),
        escape_script_json(props_json),
    )
}

/// JSON can only contain these characters inside strings, where the unicode
/// escape means the same thing.
fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// The props JSON embedded by [`render`].
pub fn extract_props(html: &str) -> Option<&str> {
    let open = format!("<script id=\"{PROPS_ID}\" type=\"application/json\">");
    let start = html.find(&open)? + open.len();
    let len = html[start..].find("</script>")?;

    Some(&html[start..start + len])
}
