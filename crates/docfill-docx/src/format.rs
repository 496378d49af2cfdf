//! Value rendering: field formats and alias transforms

use docfill_band::ParameterValue;

use crate::error::{FillError, Result};

/// Render a parameter value as text, applying the field format first
/// and the alias transform second.
pub fn format_value(
    value: &ParameterValue,
    transform: Option<&str>,
    format: Option<&str>,
) -> Result<String> {
    let text = render(value, format);
    match transform {
        Some(t) => apply_transform(&text, t),
        None => Ok(text),
    }
}

fn render(value: &ParameterValue, format: Option<&str>) -> String {
    match value {
        ParameterValue::Null => String::new(),
        ParameterValue::Text(s) | ParameterValue::Date(s) => s.clone(),
        ParameterValue::Integer(n) => n.to_string(),
        ParameterValue::Decimal(n) => match format.and_then(fraction_digits) {
            Some(digits) => format!("{n:.digits$}"),
            None => n.to_string(),
        },
        ParameterValue::Boolean(b) => b.to_string(),
        // rich content renders empty unless an inliner claims it
        ParameterValue::Content(_) => String::new(),
    }
}

/// Count the fraction digits of a numeric format like "#,##0.00"
fn fraction_digits(format: &str) -> Option<usize> {
    let (_, fraction) = format.split_once('.')?;
    let digits = fraction.chars().take_while(|c| *c == '0' || *c == '#').count();
    Some(digits)
}

fn apply_transform(text: &str, transform: &str) -> Result<String> {
    if transform == "upper" {
        return Ok(text.to_uppercase());
    }
    if transform == "lower" {
        return Ok(text.to_lowercase());
    }
    if let Some(arg) = transform
        .strip_prefix("cut(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let count: usize = arg
            .trim()
            .parse()
            .map_err(|_| FillError::AliasSyntax(format!("?{transform}")))?;
        return Ok(text.chars().take(count).collect());
    }
    Err(FillError::AliasSyntax(format!("?{transform}")))
}
