// src/codes.rs
//
// Business code generators. Sequence numbers come from a live collection
// count at creation time (count + 1): monotonic but not gap-free, and not
// safe under concurrent creation.

use chrono::Utc;

pub fn project_code(existing_count: u64) -> String {
    sequenced_code("PRJ", existing_count)
}

pub fn proposal_code(existing_count: u64) -> String {
    sequenced_code("PRP", existing_count)
}

pub fn contract_code(existing_count: u64) -> String {
    sequenced_code("CTR", existing_count)
}

pub fn approval_code() -> String {
    format!("APV{}", Utc::now().timestamp_millis())
}

fn sequenced_code(prefix: &str, existing_count: u64) -> String {
    let year_month = Utc::now().format("%Y%m");
    format!("{}-{}-{:03}", prefix, year_month, existing_count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_code_format() {
        let code = project_code(0);
        let expected_prefix = format!("PRJ-{}-", Utc::now().format("%Y%m"));
        assert!(code.starts_with(&expected_prefix), "got {}", code);
        assert!(code.ends_with("001"));
    }

    #[test]
    fn sequence_is_count_plus_one() {
        assert!(proposal_code(41).ends_with("042"));
        assert!(contract_code(7).ends_with("008"));
    }

    #[test]
    fn sequence_widens_past_three_digits() {
        assert!(project_code(999).ends_with("1000"));
    }

    #[test]
    fn approval_code_is_epoch_millis() {
        let code = approval_code();
        assert!(code.starts_with("APV"));
        assert!(code[3..].parse::<i64>().is_ok());
    }
}
