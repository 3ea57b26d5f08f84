// Shared by every bench target; each one uses only some of these.
#[allow(dead_code)]
pub fn generate_markup(size: usize) -> String {
    let base = "<h2>Section</h2>Loose text with <b>bold</b> words.\n\nA second paragraph<br>with a break.\
<ul><li>one</li><li>two<ul><li>nested</li></ul></li></ul>\
<ul><li>[x] done</li><li>[ ] open</li></ul><pre>fn main() {}\n\n}</pre>";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_word_paste(paragraphs: usize) -> String {
    let mut content = String::from("<!DOCTYPE html><html><body>");
    for i in 0..paragraphs {
        content.push_str(&format!(
            "<p class=MsoNormal style='margin:0'>Paragraph {i} &amp; more<o:p></o:p>\n"
        ));
    }
    content.push_str("</body></html>");
    content
}
