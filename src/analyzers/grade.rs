use serde::Serialize;

/// Pass/fail verdict for a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Grades a score against the passing threshold.
///
/// | Score              | Verdict |
/// |--------------------|---------|
/// | >= threshold       | Pass    |
/// | < threshold        | Fail    |
pub fn grade(score: f64, threshold: f64) -> Verdict {
    if score < threshold {
        Verdict::Fail
    } else {
        Verdict::Pass
    }
}

pub fn fails(score: f64, threshold: f64) -> bool {
    grade(score, threshold) == Verdict::Fail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade(100.0, 60.0), Verdict::Pass);
        assert_eq!(grade(60.0, 60.0), Verdict::Pass);
        assert_eq!(grade(59.999, 60.0), Verdict::Fail);
        assert_eq!(grade(0.0, 60.0), Verdict::Fail);
        assert_eq!(grade(-5.0, 60.0), Verdict::Fail);
    }

    #[test]
    fn test_threshold_is_configurable() {
        assert!(fails(65.0, 70.0));
        assert!(!fails(70.0, 70.0));
    }
}
