//! Final document assembly.
//!
//! Styles go into one `<style>` block, inserted after the fragment's first
//! `<head>` when it has one, otherwise prepended. Per-instance scripts go
//! into one `<script>` block immediately before the first `</body>`,
//! otherwise appended.

pub(crate) fn assemble(fragment: &str, css: &[String], scripts: &[String]) -> String {
    let mut html = fragment.to_string();

    if !css.is_empty() {
        let style_block = format!("<style>\n{}\n</style>\n", css.join("\n"));
        if let Some(pos) = html.find("<head>") {
            html.insert_str(pos + "<head>".len(), &format!("\n{style_block}"));
        } else {
            html = format!("{style_block}{html}");
        }
    }

    if !scripts.is_empty() {
        let script_block = format!("<script>\n{}\n</script>\n", scripts.join("\n"));
        if let Some(pos) = html.find("</body>") {
            html.insert_str(pos, &script_block);
        } else {
            html.push_str(&script_block);
        }
    }

    html
}
