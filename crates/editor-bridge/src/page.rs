//! The HTML page a webview loads to host an editing surface.

use serialize_to_javascript::{DefaultTemplate, Template, default_template};

use crate::config::PageOptions;
use crate::error::BridgeError;

#[derive(Template)]
#[default_template("scripts/surface.js")]
struct SurfaceScript<'a> {
    initial_html: &'a str,
    placeholder: &'a str,
    show_toolbar: bool,
}

const TOOLBAR: [(&str, &str); 10] = [
    ("bold", "B"),
    ("italic", "I"),
    ("underline", "U"),
    ("strikeThrough", "S"),
    ("h1", "H1"),
    ("h2", "H2"),
    ("p", "¶"),
    ("insertUnorderedList", "•"),
    ("insertOrderedList", "1."),
    ("image", "Image"),
];

pub fn surface_script(initial_html: &str, options: &PageOptions) -> Result<String, BridgeError> {
    let script = SurfaceScript {
        initial_html,
        placeholder: &options.placeholder,
        show_toolbar: options.show_toolbar,
    }
    .render_default(&Default::default())
    .map_err(|err| BridgeError::Page(err.to_string()))?
    .into_string();

    // Stored markup must not be able to close the surrounding script element.
    Ok(script.replace("</", "<\\/"))
}

/// Renders the complete surface page seeded with `initial_html`.
pub fn render_surface_page(
    initial_html: &str,
    options: &PageOptions,
) -> Result<String, BridgeError> {
    let script = surface_script(initial_html, options)?;

    let mut buttons = String::new();
    for (command, label) in TOOLBAR {
        buttons.push_str(&format!(
            r#"<button type="button" data-command="{command}">{}</button>"#,
            escape_html(label)
        ));
    }

    Ok(format!(
        r#"<!doctype html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ margin: 0; font-family: system-ui, "Noto Sans Tamil", sans-serif; }}
#vayal-toolbar {{ display: flex; gap: 4px; padding: 6px; border-bottom: 1px solid #ddd; }}
#vayal-editor {{ min-height: 240px; padding: 12px; outline: none; }}
#vayal-editor img {{ max-width: 100%; }}
</style>
</head>
<body>
<div id="vayal-toolbar" role="toolbar">{buttons}</div>
<div id="vayal-editor" contenteditable="true"></div>
<script>{script}</script>
</body>
</html>
"#,
        lang = escape_html(&options.lang),
        title = escape_html(&options.title),
    ))
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
