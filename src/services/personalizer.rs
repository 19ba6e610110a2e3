use crate::domain::recipient::RecipientRecord;

/// A rendered body plus the placeholders that could not be filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub body: String,
    pub missing: Vec<String>,
}

/// Substitutes `{field}` placeholders from `record`.
///
/// Placeholders the record does not carry are left in place verbatim and
/// listed in `missing`. `{{` and `}}` produce literal braces, and an
/// unterminated `{` is copied through. Substituted values are not re-scanned.
#[must_use]
pub fn personalize(template: &str, record: &RecipientRecord) -> Rendered {
    let mut body = String::with_capacity(template.len());
    let mut missing = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        body.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            body.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            body.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            body.push('}');
            rest = &tail[1..];
        } else if let Some(end) = tail[1..].find(['{', '}']).filter(|&i| tail.as_bytes()[i + 1] == b'}') {
            let name = &tail[1..=end];
            let placeholder = &tail[..end + 2];
            match record.get(name) {
                Some(value) => body.push_str(value),
                None => {
                    body.push_str(placeholder);
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                }
            }
            rest = &tail[end + 2..];
        } else {
            body.push('{');
            rest = &tail[1..];
        }
    }
    body.push_str(rest);

    Rendered { body, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn record(pairs: &[(&str, &str)]) -> RecipientRecord {
        let fields: IndexMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        RecipientRecord::from_fields(fields, "phone")
    }

    #[test]
    fn test_substitutes_present_fields() {
        let rendered = personalize("Hi {name}, your code is {code}.", &record(&[("name", "Ada"), ("code", "42")]));
        assert_eq!(rendered.body, "Hi Ada, your code is 42.");
        assert!(rendered.missing.is_empty());
    }

    #[test]
    fn test_missing_field_is_left_verbatim() {
        let rendered = personalize("Hi {name}", &record(&[("phone", "111")]));
        assert_eq!(rendered.body, "Hi {name}");
        assert_eq!(rendered.missing, vec!["name".to_string()]);
    }

    #[test]
    fn test_partial_substitution() {
        let rendered = personalize("{greeting} {name}! {greeting}", &record(&[("name", "Ada")]));
        assert_eq!(rendered.body, "{greeting} Ada! {greeting}");
        assert_eq!(rendered.missing, vec!["greeting".to_string()]);
    }

    #[test]
    fn test_escaped_braces() {
        let rendered = personalize("{{name}} is {name}", &record(&[("name", "Ada")]));
        assert_eq!(rendered.body, "{name} is Ada");
    }

    #[test]
    fn test_unterminated_brace_is_literal() {
        let rendered = personalize("Hi {name", &record(&[("name", "Ada")]));
        assert_eq!(rendered.body, "Hi {name");
        assert!(rendered.missing.is_empty());
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let rendered = personalize("{a}", &record(&[("a", "{b}"), ("b", "nope")]));
        assert_eq!(rendered.body, "{b}");
    }

    #[test]
    fn test_destination_placeholder() {
        let rendered = personalize("to {phone} / {destination}", &record(&[("phone", "+1 555")]));
        assert_eq!(rendered.body, "to +1 555 / +1 555");
    }

    #[test]
    fn test_unicode_is_preserved() {
        let rendered = personalize("¡Hola {name}! 👋", &record(&[("name", "José")]));
        assert_eq!(rendered.body, "¡Hola José! 👋");
    }
}
