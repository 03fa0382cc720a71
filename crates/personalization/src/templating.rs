//! Recipient placeholder substitution.

use campaign_core::types::Contact;

/// Replace every `{{firstName}}`, `{{lastName}}` and `{{email}}` in
/// `template` with the recipient's value, or the empty string when the
/// contact has none. Unknown placeholders are left as written.
pub fn render(template: &str, contact: &Contact) -> String {
    let fields = [
        ("{{firstName}}", contact.first_name.as_deref()),
        ("{{lastName}}", contact.last_name.as_deref()),
        ("{{email}}", contact.email.as_deref()),
    ];

    let mut result = template.to_string();
    for (placeholder, value) in fields {
        if result.contains(placeholder) {
            result = result.replace(placeholder, value.unwrap_or(""));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ada() -> Contact {
        Contact {
            id: Uuid::new_v4(),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
        }
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let out = render("Hi {{firstName}}! {{firstName}} {{lastName}} <{{email}}>", &ada());
        assert_eq!(out, "Hi Ada! Ada Lovelace <ada@example.com>");
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let contact = Contact {
            id: Uuid::new_v4(),
            email: Some("x@example.com".into()),
            ..Default::default()
        };
        assert_eq!(render("Dear {{firstName}}{{lastName}},", &contact), "Dear ,");
    }

    #[test]
    fn test_unknown_placeholders_untouched() {
        assert_eq!(render("{{company}} {{ firstName }}", &ada()), "{{company}} {{ firstName }}");
    }
}
