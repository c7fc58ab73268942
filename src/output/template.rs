//! Standalone HTML document wrapped around extracted content

const STYLESHEET: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; line-height: 1.6; }
img { max-width: 100%; height: auto; }
pre { background: #f5f5f5; padding: 10px; border-radius: 5px; }
code { background: #f5f5f5; padding: 2px 4px; border-radius: 3px; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
@page { margin: 1in; }";

/// Wraps a content fragment in a complete, styled HTML document
///
/// The same document feeds the PDF writers and the HTML fallback.
pub fn wrap_document(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_text(title),
        STYLESHEET,
        content
    )
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
