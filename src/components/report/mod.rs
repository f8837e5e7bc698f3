pub mod context;
pub mod pdf;
pub mod template;

pub use context::{ReportContext, ReportOptions};
pub use pdf::{html_to_lines, render_pdf, PdfLine};
pub use template::{ReportTemplate, DEFAULT_TEMPLATE_NAME, SECTIONS};

use crate::error::AppResult;
use tracing::info;

/// Render the template and lay the result out as a PDF
pub fn export_pdf(template: &ReportTemplate, context: &ReportContext) -> AppResult<Vec<u8>> {
    let html = template.render(context)?;
    let lines = html_to_lines(&html);
    let bytes = render_pdf(&lines)?;
    info!(
        "Exported report with template '{}' ({} lines)",
        template.name,
        lines.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_builtin_template() {
        let mut context = ReportContext::default();
        context.insert("worker_name", "Aino Virtanen");
        context.insert("total", "100.00 EUR");
        context.push_row("companies", [("company_name", "Acme"), ("amount", "100.00 EUR")]);

        let bytes = export_pdf(&ReportTemplate::builtin(), &context).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_rejects_broken_template() {
        let template = ReportTemplate::new("broken", "{{#companies}}");
        assert!(export_pdf(&template, &ReportContext::default()).is_err());
    }
}
