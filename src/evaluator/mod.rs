//! Arithmetic evaluation and result formatting.
//!
//! Wraps meval and renders results the way the display expects:
//! 14 significant digits, trailing zeros stripped, exponential notation
//! outside `1e-3 <= |x| < 1e5`.

/// Significant digits kept in a formatted result.
pub const PRECISION: usize = 14;
/// Smallest decimal exponent rendered in fixed notation.
const LOWER_EXP: i32 = -3;
/// Decimal exponents at or above this switch to exponential notation.
const UPPER_EXP: i32 = 5;

/// Evaluates a normalized expression (`*` and `/` operators) to display text.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str) -> Result<String, String>;
}

/// Evaluator backed by meval.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathEvaluator;

impl Evaluator for MathEvaluator {
    fn evaluate(&self, expression: &str) -> Result<String, String> {
        let value = meval::eval_str(expression)
            .map_err(|e| format!("Invalid expression '{}': {}", expression, e))?;
        Ok(format_number(value))
    }
}

/// Format a value to [`PRECISION`] significant digits.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // Rounds to PRECISION significant digits, e.g. "-1.2345600000000e5".
    let scientific = format!("{:.*e}", PRECISION - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if value < 0.0 { "-" } else { "" };

    let all_digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = all_digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    if !(LOWER_EXP..UPPER_EXP).contains(&exponent) {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{}{}e{}{}", sign, head, exp_sign, exponent.abs())
        } else {
            format!("{}{}.{}e{}{}", sign, head, tail, exp_sign, exponent.abs())
        }
    } else if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        format!("{}0.{}{}", sign, zeros, digits)
    } else {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            format!("{}{}{}", sign, digits, "0".repeat(int_len - digits.len()))
        } else {
            format!("{}{}.{}", sign, &digits[..int_len], &digits[int_len..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_evaluation() {
        assert_eq!(MathEvaluator.evaluate("2+2").unwrap(), "4");
        assert_eq!(MathEvaluator.evaluate("10*5").unwrap(), "50");
        assert_eq!(MathEvaluator.evaluate("(2+3)*4").unwrap(), "20");
    }

    #[test]
    fn test_float_noise_is_rounded_away() {
        assert_eq!(MathEvaluator.evaluate("0.1+0.2").unwrap(), "0.3");
    }

    #[test]
    fn test_repeating_decimal_keeps_fourteen_digits() {
        assert_eq!(MathEvaluator.evaluate("1/3").unwrap(), "0.33333333333333");
        assert_eq!(MathEvaluator.evaluate("2/3").unwrap(), "0.66666666666667");
    }

    #[test]
    fn test_modulo() {
        assert_eq!(MathEvaluator.evaluate("10%3").unwrap(), "1");
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(MathEvaluator.evaluate("5(").is_err());
        assert!(MathEvaluator.evaluate("2+").is_err());
        assert!(MathEvaluator.evaluate("(1+2").is_err());
    }

    #[test]
    fn test_division_by_zero_is_infinity() {
        assert_eq!(MathEvaluator.evaluate("1/0").unwrap(), "Infinity");
        assert_eq!(MathEvaluator.evaluate("-1/0").unwrap(), "-Infinity");
    }

    #[test]
    fn test_format_fixed_range() {
        assert_eq!(format_number(12345.6), "12345.6");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(0.001), "0.001");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn test_format_exponential_range() {
        assert_eq!(format_number(1_000_000.0), "1e+6");
        assert_eq!(format_number(123456.0), "1.23456e+5");
        assert_eq!(format_number(0.0001), "1e-4");
        assert_eq!(format_number(-1.5e-7), "-1.5e-7");
    }

    #[test]
    fn test_format_rounding_carries_into_exponent() {
        assert_eq!(format_number(99999.999999999999), "1e+5");
    }

    #[test]
    fn test_format_nan() {
        assert_eq!(format_number(f64::NAN), "NaN");
    }
}
