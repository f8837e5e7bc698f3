//! User-editable report templates.
//!
//! `{{key}}` inserts an escaped value and `{{#section}}...{{/section}}`
//! repeats its body once per row of the named section. Inside a section the
//! row's keys shadow the top-level keys.

use super::context::ReportContext;
use crate::error::{template_error, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sections a template may repeat
pub const SECTIONS: [&str; 5] = [
    "companies",
    "tiers",
    "other_payments",
    "bonuses",
    "deductions",
];

/// Name of the template shipped with the application
pub const DEFAULT_TEMPLATE_NAME: &str = "default";

const DEFAULT_TEMPLATE_BODY: &str = include_str!("../../../assets/report_template.html");

/// A stored report template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub name: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Value(String),
    Section(String, Vec<Segment>),
}

impl ReportTemplate {
    /// Create a template
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            updated_at: Utc::now(),
        }
    }

    /// The built-in template
    pub fn builtin() -> Self {
        Self::new(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE_BODY)
    }

    /// Check the template syntax and section names
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(template_error("Template name cannot be empty"));
        }
        let segments = parse(&self.body)?;
        check_sections(&segments)
    }

    /// Render the template with the given context
    pub fn render(&self, context: &ReportContext) -> AppResult<String> {
        let segments = parse(&self.body)?;
        check_sections(&segments)?;

        let mut output = String::with_capacity(self.body.len() * 2);
        render_segments(&segments, context, None, &mut output);
        Ok(output)
    }
}

fn parse(body: &str) -> AppResult<Vec<Segment>> {
    // Open sections with the segments collected so far
    let mut stack: Vec<(String, Vec<Segment>)> = vec![(String::new(), Vec::new())];
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            push_segment(&mut stack, Segment::Text(rest[..start].to_string()));
        }

        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| template_error("Unclosed '{{' in template"))?;
        let tag = after_open[..end].trim();
        rest = &after_open[end + 2..];

        if let Some(name) = tag.strip_prefix('#') {
            let name = name.trim();
            if name.is_empty() {
                return Err(template_error("Section name cannot be empty"));
            }
            stack.push((name.to_string(), Vec::new()));
        } else if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            if stack.len() < 2 {
                return Err(template_error(&format!(
                    "Closing '{{{{/{}}}}}' without an open section",
                    name
                )));
            }
            let (open_name, children) = stack.pop().unwrap_or_default();
            if open_name != name {
                return Err(template_error(&format!(
                    "Section '{}' closed by '{}'",
                    open_name, name
                )));
            }
            push_segment(&mut stack, Segment::Section(open_name, children));
        } else {
            if tag.is_empty() {
                return Err(template_error("Empty placeholder '{{}}' in template"));
            }
            push_segment(&mut stack, Segment::Value(tag.to_string()));
        }
    }

    if !rest.is_empty() {
        push_segment(&mut stack, Segment::Text(rest.to_string()));
    }

    if stack.len() > 1 {
        let open: Vec<String> = stack.iter().skip(1).map(|(n, _)| n.clone()).collect();
        return Err(template_error(&format!(
            "Unclosed sections: {}",
            open.join(", ")
        )));
    }

    Ok(stack.pop().map(|(_, segments)| segments).unwrap_or_default())
}

fn push_segment(stack: &mut [(String, Vec<Segment>)], segment: Segment) {
    if let Some((_, segments)) = stack.last_mut() {
        segments.push(segment);
    }
}

fn check_sections(segments: &[Segment]) -> AppResult<()> {
    for segment in segments {
        if let Segment::Section(name, children) = segment {
            if !SECTIONS.contains(&name.as_str()) {
                return Err(template_error(&format!(
                    "Unknown section '{}', expected one of: {}",
                    name,
                    SECTIONS.join(", ")
                )));
            }
            check_sections(children)?;
        }
    }
    Ok(())
}

fn render_segments(
    segments: &[Segment],
    context: &ReportContext,
    row: Option<&BTreeMap<String, String>>,
    output: &mut String,
) {
    for segment in segments {
        match segment {
            Segment::Text(text) => output.push_str(text),
            Segment::Value(key) => {
                let value = row
                    .and_then(|r| r.get(key))
                    .or_else(|| context.values.get(key));
                if let Some(value) = value {
                    output.push_str(&escape_html(value));
                }
            }
            Segment::Section(name, children) => {
                for section_row in context.rows(name) {
                    render_segments(children, context, Some(section_row), output);
                }
            }
        }
    }
}

/// Escape a value for inclusion in HTML
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ReportContext {
        let mut context = ReportContext::default();
        context.insert("worker_name", "Aino <Virtanen>");
        context.insert("total", "100.00 EUR");
        context.push_row(
            "companies",
            [("company_name", "Acme"), ("amount", "60.00 EUR")],
        );
        context.push_row(
            "companies",
            [("company_name", "Beta & Co"), ("amount", "40.00 EUR")],
        );
        context
    }

    #[test]
    fn test_render_values_and_sections() {
        let template = ReportTemplate::new(
            "test",
            "<h1>{{ worker_name }}</h1>{{#companies}}<p>{{company_name}}: {{amount}} of {{total}}</p>{{/companies}}",
        );
        let html = template.render(&context()).unwrap();
        assert_eq!(
            html,
            "<h1>Aino &lt;Virtanen&gt;</h1><p>Acme: 60.00 EUR of 100.00 EUR</p><p>Beta &amp; Co: 40.00 EUR of 100.00 EUR</p>"
        );
    }

    #[test]
    fn test_missing_values_render_empty() {
        let template = ReportTemplate::new("test", "[{{unknown}}]{{#tiers}}x{{/tiers}}");
        assert_eq!(template.render(&context()).unwrap(), "[]");
    }

    #[test]
    fn test_syntax_errors() {
        let cases = [
            "{{#companies}}never closed",
            "{{/companies}}",
            "{{#companies}}{{/tiers}}",
            "{{unclosed",
            "{{}}",
            "{{#}}{{/}}",
            "{{#workers}}{{/workers}}",
        ];
        for body in cases {
            let template = ReportTemplate::new("broken", body);
            assert!(template.validate().is_err(), "expected error for {:?}", body);
        }
    }

    #[test]
    fn test_builtin_template_is_valid() {
        let template = ReportTemplate::builtin();
        assert_eq!(template.name, DEFAULT_TEMPLATE_NAME);
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(ReportTemplate::new(" ", "body").validate().is_err());
    }
}
