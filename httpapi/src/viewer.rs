use std::collections::BTreeMap;

/// Replace every `{{key}}` placeholder with its value from `context`.
///
/// Placeholders without a matching key are left as they are.
pub fn substitute(template: &str, context: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in context {
        let placeholder = format!("{{{{{key}}}}}");
        rendered = rendered.replace(&placeholder, value);
    }
    rendered
}
