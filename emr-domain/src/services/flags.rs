/// Kind of measurement an observation code stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measurement {
    Systolic,
    Diastolic,
    FastingGlucose,
    HeartRate,
    /// `85354-9`, value written as `sys/dia`
    BloodPressurePanel,
}

fn measurement_for(code: &str) -> Option<Measurement> {
    match code.trim() {
        "BP-SYS" | "8480-6" => Some(Measurement::Systolic),
        "BP-DIA" | "8462-4" => Some(Measurement::Diastolic),
        "GLU-FBS" | "1558-6" => Some(Measurement::FastingGlucose),
        "HR" | "8867-4" => Some(Measurement::HeartRate),
        "85354-9" => Some(Measurement::BloodPressurePanel),
        _ => None,
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn flags_for_value(measurement: Measurement, value: f64, flags: &mut Vec<String>) {
    let mut push = |flag: &str| flags.push(flag.to_string());

    match measurement {
        Measurement::Systolic => {
            if value >= 140.0 {
                push("HIGH_BP_SYSTOLIC");
            }
            if value >= 180.0 {
                push("CRITICAL_BP_SYSTOLIC");
            }
            if value < 90.0 {
                push("LOW_BP_SYSTOLIC");
            }
        },
        Measurement::Diastolic => {
            if value >= 90.0 {
                push("HIGH_BP_DIASTOLIC");
            }
            if value >= 120.0 {
                push("CRITICAL_BP_DIASTOLIC");
            }
        },
        Measurement::FastingGlucose => {
            if value >= 200.0 {
                push("HIGH_GLUCOSE");
            }
            if value >= 400.0 {
                push("CRITICAL_GLUCOSE");
            }
            if value < 70.0 {
                push("LOW_GLUCOSE");
            }
        },
        Measurement::HeartRate => {
            if value >= 120.0 {
                push("HIGH_HEART_RATE");
            }
            if value < 50.0 {
                push("LOW_HEART_RATE");
            }
        },
        Measurement::BloodPressurePanel => {},
    }
}

/// Compute alert flags for an observation value
///
/// Unknown codes and values that are not numbers produce no flags.
pub fn calc_flags_for_observation(code: &str, value: &str) -> Vec<String> {
    let mut flags = Vec::new();

    match measurement_for(code) {
        Some(Measurement::BloodPressurePanel) => {
            if let Some((sys, dia)) = value.split_once('/') {
                if let (Some(sys), Some(dia)) = (parse_number(sys), parse_number(dia)) {
                    flags_for_value(Measurement::Systolic, sys, &mut flags);
                    flags_for_value(Measurement::Diastolic, dia, &mut flags);
                }
            }
        },
        Some(measurement) => {
            if let Some(number) = parse_number(value) {
                flags_for_value(measurement, number, &mut flags);
            }
        },
        None => {},
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_flags() {
        assert_eq!(calc_flags_for_observation("BP-SYS", "140"), vec!["HIGH_BP_SYSTOLIC"]);
        assert!(calc_flags_for_observation("BP-SYS", "139").is_empty());
        assert_eq!(calc_flags_for_observation("BP-DIA", "90"), vec!["HIGH_BP_DIASTOLIC"]);
        assert_eq!(calc_flags_for_observation("GLU-FBS", "200"), vec!["HIGH_GLUCOSE"]);
        assert_eq!(calc_flags_for_observation("HR", "120"), vec!["HIGH_HEART_RATE"]);
    }

    #[test]
    fn test_loinc_aliases() {
        assert_eq!(calc_flags_for_observation("8480-6", "150"), vec!["HIGH_BP_SYSTOLIC"]);
        assert_eq!(calc_flags_for_observation("8462-4", "95"), vec!["HIGH_BP_DIASTOLIC"]);
        assert_eq!(calc_flags_for_observation("1558-6", "210"), vec!["HIGH_GLUCOSE"]);
        assert_eq!(calc_flags_for_observation("8867-4", "130"), vec!["HIGH_HEART_RATE"]);
    }

    #[test]
    fn test_combined_blood_pressure() {
        assert_eq!(
            calc_flags_for_observation("85354-9", "150/95"),
            vec!["HIGH_BP_SYSTOLIC", "HIGH_BP_DIASTOLIC"]
        );
        assert!(calc_flags_for_observation("85354-9", "120/80").is_empty());
        assert!(calc_flags_for_observation("85354-9", "120").is_empty());
    }

    #[test]
    fn test_extended_ranges() {
        assert_eq!(
            calc_flags_for_observation("BP-SYS", "185"),
            vec!["HIGH_BP_SYSTOLIC", "CRITICAL_BP_SYSTOLIC"]
        );
        assert_eq!(calc_flags_for_observation("BP-SYS", "85"), vec!["LOW_BP_SYSTOLIC"]);
        assert_eq!(calc_flags_for_observation("GLU-FBS", "65"), vec!["LOW_GLUCOSE"]);
        assert_eq!(
            calc_flags_for_observation("GLU-FBS", "420"),
            vec!["HIGH_GLUCOSE", "CRITICAL_GLUCOSE"]
        );
        assert_eq!(calc_flags_for_observation("HR", "45"), vec!["LOW_HEART_RATE"]);
    }

    #[test]
    fn test_unknown_or_non_numeric() {
        assert!(calc_flags_for_observation("BP-SYS", "high").is_empty());
        assert!(calc_flags_for_observation("XYZ", "999").is_empty());
        assert!(calc_flags_for_observation("HR", "").is_empty());
    }
}
