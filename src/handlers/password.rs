use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Characters that satisfy the "special character" rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_USERNAME_LENGTH: usize = 3;

// Any Unicode decimal digit counts, not only ASCII.
static DIGIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

/// Argon2 work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        PasswordCost {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

/// Salted Argon2id hashing. Digests are PHC strings, so each one carries its
/// own salt and parameters and stays verifiable after the cost is changed.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(cost: PasswordCost) -> Result<Self, argon2::Error> {
        let params = Params::new(cost.memory_kib, cost.iterations, Params::DEFAULT_P_COST, None)?;
        Ok(PasswordService {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash_password(&self, plain: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self.argon2.hash_password(plain.as_bytes(), &salt)?.to_string())
    }

    /// Returns false for a wrong password and for a digest that does not parse.
    pub fn verify_password(&self, plain: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must be at least 3 characters long")]
    UsernameTooShort,
    #[error("Full name cannot be empty")]
    EmptyFullName,
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must contain at least one digit")]
    MissingDigit,
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("Password must contain at least one special character (!@#$%^&*(),.?)")]
    MissingSpecial,
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.trim().is_empty() {
        return Err(ValidationError::EmptyFullName);
    }
    Ok(())
}

pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort);
    }
    if !DIGIT_REGEX.is_match(password) {
        return Err(ValidationError::MissingDigit);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::MissingLowercase);
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(ValidationError::MissingSpecial);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_password_service() -> PasswordService {
    PasswordService::new(PasswordCost {
        memory_kib: 256,
        iterations: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let service = test_password_service();
        let digest = service.hash_password("Sup3r$ecret").unwrap();

        assert_ne!(digest, "Sup3r$ecret");
        assert!(digest.starts_with("$argon2id$"));
        assert!(service.verify_password("Sup3r$ecret", &digest));
    }

    #[test]
    fn hashing_is_salted() {
        let service = test_password_service();
        let first = service.hash_password("Sup3r$ecret").unwrap();
        let second = service.hash_password("Sup3r$ecret").unwrap();

        assert_ne!(first, second);
        assert!(service.verify_password("Sup3r$ecret", &first));
        assert!(service.verify_password("Sup3r$ecret", &second));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let service = test_password_service();
        let a = service.hash_password("Passw0rd!A").unwrap();
        let b = service.hash_password("Passw0rd!B").unwrap();

        assert_ne!(a, b);
        assert!(!service.verify_password("Passw0rd!A", &b));
        assert!(!service.verify_password("Passw0rd!B", &a));
    }

    #[test]
    fn malformed_digest_is_false_not_error() {
        let service = test_password_service();
        assert!(!service.verify_password("anything", ""));
        assert!(!service.verify_password("anything", "not-a-phc-string"));
        assert!(!service.verify_password("anything", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn digest_from_other_cost_still_verifies() {
        let cheap = test_password_service();
        let digest = cheap.hash_password("Sup3r$ecret").unwrap();
        let pricier = PasswordService::new(PasswordCost {
            memory_kib: 512,
            iterations: 2,
        })
        .unwrap();
        assert!(pricier.verify_password("Sup3r$ecret", &digest));
    }

    #[test]
    fn invalid_cost_is_rejected() {
        assert!(PasswordService::new(PasswordCost {
            memory_kib: 1,
            iterations: 0,
        })
        .is_err());
    }

    #[test]
    fn strength_rules() {
        assert_eq!(validate_password_strength("Sup3r$ecret"), Ok(()));
        assert_eq!(
            validate_password_strength("S3$a"),
            Err(ValidationError::TooShort)
        );
        assert_eq!(
            validate_password_strength("Super$ecret"),
            Err(ValidationError::MissingDigit)
        );
        assert_eq!(
            validate_password_strength("sup3r$ecret"),
            Err(ValidationError::MissingUppercase)
        );
        assert_eq!(
            validate_password_strength("SUP3R$ECRET"),
            Err(ValidationError::MissingLowercase)
        );
        assert_eq!(
            validate_password_strength("Sup3rSecret"),
            Err(ValidationError::MissingSpecial)
        );
    }

    #[test]
    fn any_decimal_digit_counts() {
        // ARABIC-INDIC DIGIT THREE
        assert_eq!(validate_password_strength("Super$ecret\u{0663}"), Ok(()));
        // Vulgar fractions are numeric but not decimal digits.
        assert_eq!(
            validate_password_strength("Super$ecret\u{00BD}"),
            Err(ValidationError::MissingDigit)
        );
    }

    #[test]
    fn username_length() {
        assert_eq!(
            validate_username("ab"),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(validate_username("abc"), Ok(()));
        assert_eq!(
            validate_full_name("   "),
            Err(ValidationError::EmptyFullName)
        );
    }
}
