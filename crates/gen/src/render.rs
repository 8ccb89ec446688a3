//! Minimal variable substitution for artifact templates.
//!
//! Templates only interpolate named variables; there are no filters, blocks or
//! expressions. The delimiters are configurable so generated files can carry
//! Ansible's own `{{ ... }}` expressions through untouched.

use indexmap::IndexMap;

use crate::GeneratorError;

/// Variables available to a template, in insertion order.
pub type TemplateContext = IndexMap<String, String>;

/// Delimiter and escaping settings, passed explicitly to every render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSyntax {
    pub variable_start: String,
    pub variable_end: String,
    /// HTML-escape substituted values.
    pub autoescape: bool,
}

impl Default for TemplateSyntax {
    /// `"[% name %]"`: the quotes belong to the delimiters, so a placeholder
    /// is still a valid YAML string before rendering.
    fn default() -> Self {
        Self {
            variable_start: "\"[%".to_string(),
            variable_end: "%]\"".to_string(),
            autoescape: false,
        }
    }
}

/// Substitute every placeholder in `template` from `context`.
///
/// Unknown variables and unterminated placeholders are errors; nothing is
/// rendered as empty.
pub fn render_template(template: &str, context: &TemplateContext, syntax: &TemplateSyntax) -> Result<String, GeneratorError> {
    let mut rendered = String::with_capacity(template.len());
    let mut remainder = template;
    let mut consumed = 0usize;

    while let Some(start) = remainder.find(&syntax.variable_start) {
        rendered.push_str(&remainder[..start]);
        let name_start = start + syntax.variable_start.len();
        let after_start = &remainder[name_start..];
        let end = after_start.find(&syntax.variable_end).ok_or(GeneratorError::UnterminatedPlaceholder {
            offset: consumed + start,
        })?;

        let name = after_start[..end].trim();
        let value = context
            .get(name)
            .ok_or_else(|| GeneratorError::UnknownVariable { name: name.to_string() })?;
        if syntax.autoescape {
            rendered.push_str(&escape_html(value));
        } else {
            rendered.push_str(value);
        }

        let next = name_start + end + syntax.variable_end.len();
        consumed += next;
        remainder = &remainder[next..];
    }

    rendered.push_str(remainder);
    Ok(rendered)
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
