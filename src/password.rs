//! Password strength checks and bcrypt hashing.

use std::fmt::Display;

use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// A password that is hard enough to guess, but not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// `user_inputs` are strings the user also typed in, such as their name and email. A
    /// password built from them counts as easier to guess.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with suggestions for a stronger password if the password
    /// scores below three out of four.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let entropy = zxcvbn(raw_password, user_inputs);

        if matches!(entropy.score(), Score::Three | Score::Four) {
            return Ok(Self(raw_password.to_owned()));
        }

        let feedback = entropy
            .feedback()
            .map(ToString::to_string)
            .unwrap_or_default();

        Err(Error::TooWeak(feedback))
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A bcrypt hash of a user's password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used for user passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with a random salt.
    ///
    /// Tests pass a small `cost` to keep hashing fast.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check whether `raw_password` is the password that was hashed.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        bcrypt::verify(raw_password, &self.0).map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            Error::HashingError(error.to_string())
        })
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod password_tests {
    use crate::Error;

    use super::{PasswordHash, ValidatedPassword};

    #[test]
    fn short_or_common_passwords_are_too_weak() {
        for password in ["", "netflix", "password1234"] {
            assert!(
                matches!(ValidatedPassword::new(password, &[]), Err(Error::TooWeak(_))),
                "{password:?} should be too weak"
            );
        }
    }

    #[test]
    fn password_matching_user_details_is_too_weak() {
        let result = ValidatedPassword::new(
            "averysafeandsecurepassword",
            &["Test User", "averysafeandsecurepassword"],
        );

        assert!(matches!(result, Err(Error::TooWeak(_))));
    }

    #[test]
    fn long_passphrase_is_accepted() {
        assert!(ValidatedPassword::new("averysafeandsecurepassword", &[]).is_ok());
    }

    #[test]
    fn display_masks_password() {
        let password = ValidatedPassword::new("averysafeandsecurepassword", &[]).unwrap();

        assert_eq!(password.to_string(), "********");
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let password = ValidatedPassword::new("averysafeandsecurepassword", &[]).unwrap();
        let hash = PasswordHash::new(password, 4).unwrap();

        assert_eq!(hash.verify("averysafeandsecurepassword"), Ok(true));
        assert_eq!(hash.verify("averystrongandsecurepassword"), Ok(false));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let password = ValidatedPassword::new("averysafeandsecurepassword", &[]).unwrap();

        let first = PasswordHash::new(password.clone(), 4).unwrap();
        let second = PasswordHash::new(password, 4).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hash = PasswordHash::new_unchecked("definitelyapasswordhash");

        assert!(matches!(
            hash.verify("averysafeandsecurepassword"),
            Err(Error::HashingError(_))
        ));
    }
}
