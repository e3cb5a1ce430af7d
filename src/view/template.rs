//! Placeholder substitution and HTML escaping.

/// Replace every `{{name}}` in `template` with its value from `vars`.
///
/// Single pass: substituted values are copied as-is and never scanned for
/// further placeholders. Unknown names are left in place.
pub fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            // unterminated placeholder
            out.push_str(&rest[start..]);
            return out;
        };

        let name = after_open[..end].trim();
        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_known_and_unknown() {
        let out = substitute("<a href=\"/article/{{id}}\">{{ title }}</a>{{missing}}", &[
            ("id", "3"),
            ("title", "Hello"),
        ]);
        assert_eq!(out, "<a href=\"/article/3\">Hello</a>{{missing}}");
    }

    #[test]
    fn test_substitute_does_not_reexpand_values() {
        let out = substitute("{{content}}|{{title}}", &[
            ("content", "{{title}}"),
            ("title", "T"),
        ]);
        assert_eq!(out, "{{title}}|T");
    }

    #[test]
    fn test_substitute_unterminated() {
        assert_eq!(substitute("a {{b", &[("b", "x")]), "a {{b");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#39;y&#39;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
