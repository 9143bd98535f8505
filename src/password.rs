//! Password complexity policy.

/// Symbols that satisfy the special-character requirement.
const SYMBOLS: &str = "!@#$%^&*()";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Complex,
    Simple,
}

/// Classify a password against the fixed policy: at least 8 characters
/// with one lowercase, one uppercase, one digit, and one symbol.
pub fn classify(password: &str) -> Strength {
    let long_enough = password.chars().count() >= 8;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| SYMBOLS.contains(c));

    if long_enough && has_lower && has_upper && has_digit && has_symbol {
        Strength::Complex
    } else {
        Strength::Simple
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_policy_is_complex() {
        assert_eq!(classify("Abcdef1!"), Strength::Complex);
    }

    #[test]
    fn lowercase_only_is_simple() {
        assert_eq!(classify("abcdefgh"), Strength::Simple);
    }

    #[test]
    fn seven_chars_is_simple() {
        assert_eq!(classify("Short1!"), Strength::Simple);
    }

    #[test]
    fn missing_symbol_is_simple() {
        assert_eq!(classify("Abcdefg1"), Strength::Simple);
    }

    #[test]
    fn missing_digit_is_simple() {
        assert_eq!(classify("Abcdefg!"), Strength::Simple);
    }

    #[test]
    fn missing_uppercase_is_simple() {
        assert_eq!(classify("abcdef1!"), Strength::Simple);
    }

    #[test]
    fn symbol_outside_fixed_set_does_not_count() {
        assert_eq!(classify("Abcdef1_"), Strength::Simple);
    }

    #[test]
    fn long_mixed_password_is_complex() {
        assert_eq!(classify("Tr0ub4dor(x)y"), Strength::Complex);
    }
}
