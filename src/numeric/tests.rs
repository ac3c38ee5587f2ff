use super::Precision;
use crate::assert_err;
use crate::errors::{NumericOperator, RannError};
use approx::assert_abs_diff_eq;

#[test]
fn test_round_keeps_significant_digits() {
    let p = Precision::new(4).unwrap();
    assert_eq!(p.round(3.14159), 3.142);
    assert_eq!(p.round(-123456.0), -123500.0);
    assert_eq!(p.round(0.000123456), 0.0001235);
    assert_eq!(p.round(0.0), 0.0);
}

#[test]
fn test_round_is_idempotent() {
    let p = Precision::default();
    let once = p.round(1.0 / 3.0);
    assert_eq!(p.round(once), once);
}

#[test]
fn test_arithmetic_rounds_results() {
    let p = Precision::new(3).unwrap();
    assert_eq!(p.mul(1.11, 1.11), 1.23);
    assert_eq!(p.add(100.0, 0.4), 100.0);
    assert_eq!(p.powi(2.0, 10), 1020.0);
    assert_abs_diff_eq!(p.div(1.0, 3.0).unwrap(), 0.333, epsilon = 1e-12);
}

#[test]
fn test_div_by_zero_is_fatal() {
    let p = Precision::default();
    assert_err!(
        p.div(1.0, 0.0),
        RannError::Numeric { operator: NumericOperator::Div, .. }
    );
    let message = p.div(1.0, 0.0).unwrap_err().to_string();
    assert!(message.starts_with("相除失败"), "{message}");
}

#[test]
fn test_product_reduces_left_to_right() {
    let p = Precision::default();
    assert_eq!(p.product([3.0, 5.0]), Some(15.0));
    assert_eq!(p.product(std::iter::empty()), None);
}

#[test]
fn test_invalid_digits_rejected() {
    assert_err!(Precision::new(0), RannError::InvalidConfig(_));
    assert_err!(Precision::new(16), RannError::InvalidConfig(_));
}

#[test]
fn test_tolerance_and_approx_eq() {
    let p = Precision::new(12).unwrap();
    assert_abs_diff_eq!(p.tolerance(), 1e-6, epsilon = 1e-18);
    assert!(p.approx_eq(1.0, 1.0 + 1e-9));
    assert!(!p.approx_eq(1.0, 1.001));
}

#[test]
fn test_precision_serde_as_digits() {
    let p = Precision::new(9).unwrap();
    assert_eq!(serde_json::to_string(&p).unwrap(), "9");
    let back: Precision = serde_json::from_str("9").unwrap();
    assert_eq!(back, p);
    assert!(serde_json::from_str::<Precision>("99").is_err());
}
