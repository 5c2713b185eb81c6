/// Adapt a cron expression to the scheduler's seconds-first syntax.
///
/// The conventional five-field form (`m h dom mon dow`) gains a leading `0`
/// seconds field. Anything else is passed through for the scheduler to accept
/// or reject.
pub(crate) fn normalize_cron(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}
