/// Lowest number handed out by `next_mrn`, minus one
const MRN_FLOOR: u32 = 1000;

/// Whether `mrn` has the `P` + four digits shape
pub fn validate_mrn_format(mrn: &str) -> bool {
    match mrn.strip_prefix('P') {
        Some(digits) => digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Normalize user input into an MRN
///
/// Keeps the digits, pads them to four places and prefixes `P`.
/// Input without digits yields an empty string.
pub fn format_mrn(input: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    format!("P{:0>4}", digits)
}

/// Highest number an MRN can carry
const MRN_CEILING: u32 = 9999;

/// Number following the highest well-formed MRN in `existing`, never below 1001
///
/// MRNs outside the `P` + four digits shape are ignored. Returns `None` once
/// `P9999` is taken.
pub fn next_mrn_number<'a, I>(existing: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = existing
        .into_iter()
        .filter(|mrn| validate_mrn_format(mrn))
        .filter_map(|mrn| mrn[1..].parse::<u32>().ok())
        .fold(MRN_FLOOR, u32::max);

    highest.checked_add(1).filter(|next| *next <= MRN_CEILING)
}

/// Next MRN after the highest well-formed one in `existing`, never below `P1001`
pub fn next_mrn<'a, I>(existing: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    next_mrn_number(existing).map(|number| format!("P{:04}", number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_mrn_format() {
        assert!(validate_mrn_format("P0001"));
        assert!(validate_mrn_format("P1234"));
        assert!(!validate_mrn_format("P123"));
        assert!(!validate_mrn_format("p1234"));
        assert!(!validate_mrn_format("P12345"));
    }

    #[test]
    fn test_format_mrn() {
        assert_eq!(format_mrn("12"), "P0012");
        assert_eq!(format_mrn("P-34"), "P0034");
        assert_eq!(format_mrn("abc"), "");
        assert_eq!(format_mrn(""), "");
    }

    #[test]
    fn test_next_mrn() {
        assert_eq!(next_mrn(Vec::<&str>::new()).as_deref(), Some("P1001"));
        assert_eq!(next_mrn(vec!["P0001", "P0002"]).as_deref(), Some("P1001"));
        assert_eq!(next_mrn(vec!["P1001", "P1042", "X9999"]).as_deref(), Some("P1043"));
    }

    #[test]
    fn test_next_mrn_ignores_malformed_numbers() {
        let existing = vec!["P1005", "P99999", "P4294967295", "P12a4"];
        assert_eq!(next_mrn(existing).as_deref(), Some("P1006"));
    }

    #[test]
    fn test_next_mrn_stops_at_ceiling() {
        assert_eq!(next_mrn(vec!["P9998"]).as_deref(), Some("P9999"));
        assert_eq!(next_mrn(vec!["P1001", "P9999"]), None);
        assert_eq!(next_mrn_number(vec!["P9999"]), None);
    }
}
