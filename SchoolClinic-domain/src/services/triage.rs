use crate::entities::bp_form::{BloodPressure, Classification, OverallStatus, Tier};

/// Remark stored for a reading with no usable BP value
pub const NO_BP_RECORDED: &str = "No BP recorded";

/// Classify a reading. The first matching row wins, so higher severities take precedence.
pub fn classify(systolic: u16, diastolic: u16) -> Tier {
    if systolic >= 180 || diastolic >= 120 {
        Tier::Critical
    } else if systolic >= 140 || diastolic >= 90 {
        Tier::Stage2Hypertension
    } else if systolic >= 130 || diastolic >= 80 {
        Tier::Stage1Hypertension
    } else if systolic < 90 || diastolic < 60 {
        Tier::Low
    } else {
        Tier::Normal
    }
}

/// Classify a raw "systolic/diastolic" string.
/// Input that does not parse yields the unclassified result instead of an error,
/// since a reading may be saved before it is complete.
pub fn classify_reading(raw: &str) -> Classification {
    match raw.parse::<BloodPressure>() {
        Ok(bp) => {
            let tier = classify(bp.systolic, bp.diastolic);
            Classification {
                tier: Some(tier),
                advisory: tier.advisory().to_string(),
                remark: tier.remark().to_string(),
                severity: Some(tier.severity()),
            }
        }
        Err(_) => Classification {
            tier: None,
            advisory: String::new(),
            remark: NO_BP_RECORDED.to_string(),
            severity: None,
        },
    }
}

/// Roll the stored remarks of a form up into one status.
/// Matches on remark text, so readings keep the status they were recorded with.
pub fn rollup<'a, I>(remarks: I) -> OverallStatus
where
    I: IntoIterator<Item = &'a str>,
{
    let mut critical = 0usize;
    let mut high = 0usize;
    let mut low = 0usize;

    for remark in remarks {
        if remark.contains("Critical") {
            critical += 1;
        }
        if remark.contains("High BP") {
            high += 1;
        }
        if remark.contains("Low BP") {
            low += 1;
        }
    }

    if critical > 0 {
        OverallStatus::CriticalCondition
    } else if high >= 3 {
        OverallStatus::HighRisk
    } else if high > 0 {
        OverallStatus::ElevatedBp
    } else if low > 0 {
        OverallStatus::LowBpWarning
    } else {
        // All normal, mixed with unrecorded, or empty
        OverallStatus::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_ne!(classify(179, 119), Tier::Critical);
        assert_eq!(classify(179, 119), Tier::Stage2Hypertension);
        assert_eq!(classify(180, 70), Tier::Critical);
        assert_eq!(classify(120, 120), Tier::Critical);
        assert_eq!(classify(120, 80), Tier::Stage1Hypertension);
        assert_eq!(classify(89, 75), Tier::Low);
        assert_eq!(classify(120, 75), Tier::Normal);
    }

    #[test]
    fn test_higher_rows_win_over_low() {
        // Diastolic low but systolic high
        assert_eq!(classify(150, 55), Tier::Stage2Hypertension);
        assert_eq!(classify(135, 50), Tier::Stage1Hypertension);
        assert_eq!(classify(100, 59), Tier::Low);
        assert_eq!(classify(90, 60), Tier::Normal);
    }

    #[test]
    fn test_classify_reading_end_to_end() {
        let result = classify_reading("120/80");
        assert_eq!(result.tier, Some(Tier::Stage1Hypertension));
        assert_eq!(result.advisory, "Stage 1 Hypertension: Lifestyle changes recommended.");
        assert_eq!(result.remark, "Elevated BP - Diet and exercise advised");
        assert_eq!(result.severity, Some(2));
    }

    #[test]
    fn test_classify_reading_degrades_on_bad_input() {
        for raw in ["", "abc", "120", "120/8", "500/80", "120/ 80"] {
            let result = classify_reading(raw);
            assert_eq!(result.tier, None, "{:?}", raw);
            assert_eq!(result.advisory, "");
            assert_eq!(result.remark, NO_BP_RECORDED);
            assert_eq!(result.severity, None);
        }
    }

    #[test]
    fn test_rollup_critical_wins() {
        let remarks = [
            Tier::Normal.remark(),
            Tier::Stage2Hypertension.remark(),
            Tier::Stage2Hypertension.remark(),
            Tier::Stage2Hypertension.remark(),
            Tier::Low.remark(),
            Tier::Critical.remark(),
        ];
        assert_eq!(rollup(remarks), OverallStatus::CriticalCondition);
    }

    #[test]
    fn test_rollup_high_threshold() {
        let high = Tier::Stage2Hypertension.remark();
        assert_eq!(rollup([high, high, high]), OverallStatus::HighRisk);
        assert_eq!(rollup([high, high, Tier::Normal.remark()]), OverallStatus::ElevatedBp);
    }

    #[test]
    fn test_rollup_low_and_stable() {
        assert_eq!(rollup([Tier::Normal.remark(), Tier::Low.remark()]), OverallStatus::LowBpWarning);
        assert_eq!(rollup([Tier::Normal.remark(), Tier::Normal.remark()]), OverallStatus::Stable);
        assert_eq!(rollup(std::iter::empty()), OverallStatus::Stable);
        assert_eq!(rollup([NO_BP_RECORDED]), OverallStatus::Stable);
    }

    #[test]
    fn test_rollup_keys_on_remark_text() {
        // Stage 1 remarks say "Elevated BP" and do not count as high
        let stage1 = Tier::Stage1Hypertension.remark();
        assert_eq!(rollup([stage1, stage1, stage1]), OverallStatus::Stable);
        assert_eq!(rollup(["Critical - entered by hand"]), OverallStatus::CriticalCondition);
    }
}
