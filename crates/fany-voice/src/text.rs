use std::sync::LazyLock;

use regex::Regex;

static MARKDOWN_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*#`_]").expect("Invalid markdown regex"));

/// Remove basic markdown punctuation so the speech engine does not read it.
pub fn strip_markdown(text: &str) -> String {
    MARKDOWN_PUNCTUATION.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_emphasis_headings_and_code() {
        assert_eq!(
            strip_markdown("## Título\n**Una API** es un `contrato` _simple_"),
            " Título\nUna API es un contrato simple"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "¿Qué tal? Todo bien, ¡wepa!";
        assert_eq!(strip_markdown(text), text);
    }

    #[test]
    fn test_only_markup_becomes_empty() {
        assert_eq!(strip_markdown("***###```"), "");
    }
}
