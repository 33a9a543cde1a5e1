use super::escape_html;
use crate::blog::Post;
use crate::query::{ClientError, QueryResult};

const FALLBACK_STATUS: u16 = 500;

pub fn render(result: &QueryResult<Post>) -> String {
    match result {
        QueryResult::Error(err) => render_error(err),
        QueryResult::Loading => "Loading...".to_owned(),
        QueryResult::Success(post) => render_post(post),
    }
}

/// Title used for the document around [`render`].
pub fn title(result: &QueryResult<Post>) -> String {
    match result {
        QueryResult::Success(post) => post.title.clone(),
        QueryResult::Error(err) => err.to_string(),
        QueryResult::Loading => "Loading...".to_owned(),
    }
}

fn render_error(err: &ClientError) -> String {
    let status = err.http_status().unwrap_or(FALLBACK_STATUS);

    format!(
        r#"<div class="error"><h1>{status}</h1><h2>{}</h2></div>"#,
        escape_html(&err.to_string())
    )
}

fn render_post(post: &Post) -> String {
    format!(
        "<h1>{}</h1>\n<em>Created {}</em>\n\n<p>{}</p>\n\n<h2>Raw data:</h2>\n<pre>{}</pre>",
        escape_html(&post.title),
        post.created_at.format("%-m/%-d/%Y"),
        escape_html(&post.text),
        escape_html(&raw_json(post)),
    )
}

fn raw_json(post: &Post) -> String {
    use serde::Serialize;

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);

    match post.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(err) => {
            tracing::error!(post_id = %post.id, "Error serializing post for display: {err}");
            String::new()
        }
    }
}
