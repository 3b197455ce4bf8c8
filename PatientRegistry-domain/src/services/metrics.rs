use crate::entities::patient::Verdict;

/// Round to a fixed number of decimals.
///
/// Goes through the shortest correctly rounded decimal form, so the result
/// matches rounding of the exact binary value rather than of `value * 10^n`.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Body-mass index from height in meters and weight in kilograms, rounded to 2 decimals
pub fn calculate_bmi(height: f64, weight: f64) -> f64 {
    round_to(weight / (height * height), 2)
}

/// Categorize a body-mass index.
///
/// Everything from 18.5 up to (not including) 30 is `Normal`; there is no
/// separate overweight band.
#[allow(clippy::if_same_then_else)]
pub fn categorize_bmi(bmi: f64) -> Verdict {
    if bmi < 18.5 {
        Verdict::Underweight
    } else if bmi < 25.0 {
        Verdict::Normal
    } else if bmi < 30.0 {
        Verdict::Normal
    } else {
        Verdict::Obese
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_bmi() {
        assert_eq!(calculate_bmi(1.8, 90.0), 27.78);
        assert_eq!(calculate_bmi(1.75, 70.0), 22.86);
        assert_eq!(calculate_bmi(1.6, 45.0), 17.58);
        assert_eq!(calculate_bmi(1.7, 95.0), 32.87);
        assert_eq!(calculate_bmi(2.0, 100.0), 25.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(27.777777, 2), 27.78);
        assert_eq!(round_to(22.857142, 2), 22.86);
        assert_eq!(round_to(19.0, 2), 19.0);
        assert_eq!(round_to(1.23456, 0), 1.0);
    }

    #[test]
    fn test_bmi_category_underweight() {
        assert_eq!(categorize_bmi(17.58), Verdict::Underweight);
        assert_eq!(categorize_bmi(18.49), Verdict::Underweight);
    }

    #[test]
    fn test_bmi_category_normal() {
        assert_eq!(categorize_bmi(18.5), Verdict::Normal);
        assert_eq!(categorize_bmi(22.86), Verdict::Normal);
        // 25 to 30 is still reported as normal
        assert_eq!(categorize_bmi(25.0), Verdict::Normal);
        assert_eq!(categorize_bmi(27.78), Verdict::Normal);
        assert_eq!(categorize_bmi(29.99), Verdict::Normal);
    }

    #[test]
    fn test_bmi_category_obese() {
        assert_eq!(categorize_bmi(30.0), Verdict::Obese);
        assert_eq!(categorize_bmi(32.87), Verdict::Obese);
    }
}
