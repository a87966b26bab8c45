//! Body sanitization.

/// Strips unsafe markup from `body`, keeping formatting suitable for user
/// generated content. `<script>` and `<style>` elements are removed along with
/// their contents.
///
/// Sanitizing an already sanitized body returns it unchanged.
pub fn sanitize(body: &str) -> String {
    ammonia::clean(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_script_with_contents() {
        assert_eq!(sanitize("<script>bad</script>hi"), "hi");
    }

    #[test]
    fn strips_event_handlers_and_keeps_formatting() {
        let clean = sanitize(r#"<p onclick="steal()">Hello <b>world</b></p>"#);
        assert_eq!(clean, "<p>Hello <b>world</b></p>");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize("Just text."), "Just text.");
    }

    #[test]
    fn idempotent() {
        for body in [
            "<script>bad</script>hi",
            "a < b && c > d",
            r#"<a href="javascript:alert(1)">x</a><img src=x onerror=alert(1)>"#,
            "<div><p>nested <i>markup</i></p></div>",
        ] {
            let once = sanitize(body);
            assert_eq!(sanitize(&once), once, "input: {body}");
        }
    }
}
