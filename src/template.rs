//! HTML mail body for a [`GeoRecord`].
//!
//! Placeholders are `{{name}}` where `name` is the provider's JSON field name. Values are
//! inserted verbatim: no HTML escaping, and substituted text is never scanned again.

use crate::geolocation::GeoRecord;
use thiserror::Error;

pub const EMAIL_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <title>IP Information</title>
</head>
<body>
    <h1>IP Information</h1>
    <p><strong>Query:</strong> {{query}}</p>
    <p><strong>Status:</strong> {{status}}</p>
    <p><strong>ISP:</strong> {{isp}}</p>
    <p><strong>Organization:</strong> {{org}}</p>
    <p><strong>Country:</strong> {{country}} ({{countryCode}})</p>
    <p><strong>Region:</strong> {{regionName}} ({{region}})</p>
    <p><strong>City:</strong> {{city}}, {{zip}}</p>
    <p><strong>Latitude:</strong> {{lat}}</p>
    <p><strong>Longitude:</strong> {{lon}}</p>
    <p><strong>Timezone:</strong> {{timezone}}</p>
    <p><strong>AS:</strong> {{as}}</p>
</body>
</html>
"#;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),

    #[error("unknown placeholder `{0}`")]
    UnknownPlaceholder(String),
}

pub fn render_email_body(record: &GeoRecord) -> Result<String, TemplateError> {
    render(EMAIL_TEMPLATE, record)
}

pub fn render(template: &str, record: &GeoRecord) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or(TemplateError::Unclosed(offset + start))?;
        let name = after_open[..end].trim();
        let value = record
            .field(name)
            .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
        out.push_str(&value);

        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}
