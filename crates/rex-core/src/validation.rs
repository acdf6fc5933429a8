//! Input checks applied before anything reaches the store.

use rex_domain::NewRecurringExpense;

use crate::CoreError;

/// Normalizes an ISO-4217 style currency code, rejecting anything that is not
/// three ASCII letters.
pub fn normalize_currency(raw: &str) -> Result<String, CoreError> {
    let code = raw.trim();
    if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(CoreError::Validation(format!(
            "currency `{raw}` must be a three-letter code"
        )));
    }
    Ok(code.to_ascii_uppercase())
}

pub fn normalize_category(raw: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("category name cannot be empty".into()));
    }
    Ok(name.to_string())
}

pub fn check_value(value: f64) -> Result<f64, CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "value {value} must be a finite, non-negative amount"
        )));
    }
    Ok(value)
}

/// Validates a creation draft and returns its normalized form.
pub fn validate_draft(mut draft: NewRecurringExpense) -> Result<NewRecurringExpense, CoreError> {
    draft.category_name = normalize_category(&draft.category_name)?;
    draft.currency = normalize_currency(&draft.currency)?;
    draft.value = check_value(draft.value)?;
    if let Some(end) = draft.end {
        if end < draft.start {
            return Err(CoreError::Validation(format!(
                "end month {end} is before start month {}",
                draft.start
            )));
        }
    }
    if draft.split_expense && !draft.owner.is_organization() {
        return Err(CoreError::Validation(
            "only organization expenses can be split among employees".into(),
        ));
    }
    Ok(draft)
}
