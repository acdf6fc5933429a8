use rex_domain::RecurringExpense;

/// Detects overlapping siblings and inverted windows within a set of records.
pub fn chain_warnings(records: &[RecurringExpense]) -> Vec<String> {
    let mut warnings = Vec::new();

    for record in records {
        if let Some(end) = record.end_date {
            if end < record.start_date {
                warnings.push(format!(
                    "recurring expense {} ends {} before it starts {}",
                    record.id, end, record.start_date
                ));
            }
        }
    }

    for (idx, left) in records.iter().enumerate() {
        for right in &records[idx + 1..] {
            if left.chain_id != right.chain_id {
                continue;
            }
            let (first, second) = if left.start_date <= right.start_date {
                (left, right)
            } else {
                (right, left)
            };
            if first.end_date.map_or(true, |end| end >= second.start_date) {
                warnings.push(format!(
                    "chain {} has overlapping records {} and {}",
                    left.chain_id, first.id, second.id
                ));
            }
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "recurring expense chain anomalies detected");
    }
    warnings
}
