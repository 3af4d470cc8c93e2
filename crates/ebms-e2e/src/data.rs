//! Synthetic test data.
//!
//! Records are built from fixed candidate pools. Emails carry a random
//! numeric suffix so repeated runs rarely collide, but uniqueness is not
//! guaranteed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// First-name pool
pub const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "Ram", "Sita", "Hari", "Gita", "Anil", "Sunita",
];

/// Last-name pool
pub const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Sharma",
    "Thapa", "Shrestha", "Gurung", "Rai", "Karki",
];

/// Email domain pool
pub const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "test.example.com"];

/// Permission group pool
pub const PERMISSION_GROUPS: &[&str] = &["Admin", "Manager", "Operator", "Viewer"];

/// Account status pool
pub const STATUSES: &[&str] = &["Active", "Inactive"];

/// International dialling prefixes
pub const COUNTRY_CODES: &[&str] = &["+1", "+44", "+61", "+91", "+977"];

/// Status given to generated users unless overridden
pub const DEFAULT_STATUS: &str = "Active";

/// Leading digit of regional mobile numbers
pub const MOBILE_PREFIX: char = '9';

/// Digits in a phone number (without country code)
pub const PHONE_DIGITS: usize = 10;

/// One user as entered through the create-user form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Contact number
    pub contact_number: String,
    /// Permission group
    pub permission_group: String,
    /// Account status
    pub status: String,
}

impl UserRecord {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields that replace generated values when present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOverrides {
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Contact number
    pub contact_number: Option<String>,
    /// Permission group
    pub permission_group: Option<String>,
    /// Account status
    pub status: Option<String>,
}

impl UserOverrides {
    /// No overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the first name
    #[must_use]
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    /// Fix the last name
    #[must_use]
    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    /// Fix the email
    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    /// Fix the contact number
    #[must_use]
    pub fn contact_number(mut self, value: impl Into<String>) -> Self {
        self.contact_number = Some(value.into());
        self
    }

    /// Fix the permission group
    #[must_use]
    pub fn permission_group(mut self, value: impl Into<String>) -> Self {
        self.permission_group = Some(value.into());
        self
    }

    /// Fix the status
    #[must_use]
    pub fn status(mut self, value: impl Into<String>) -> Self {
        self.status = Some(value.into());
        self
    }
}

/// Random record generator.
///
/// Use [`TestDataGenerator::seeded`] to reproduce a failing run.
#[derive(Debug, Clone)]
pub struct TestDataGenerator<R = StdRng> {
    rng: R,
}

impl Default for TestDataGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDataGenerator<StdRng> {
    /// Generator seeded from OS entropy
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> TestDataGenerator<R> {
    /// Generator over a caller-supplied RNG
    pub const fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    fn pick(&mut self, pool: &[&str]) -> String {
        pool.choose(&mut self.rng)
            .map_or_else(String::new, |s| (*s).to_string())
    }

    fn digits(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect()
    }

    /// Random first name
    pub fn first_name(&mut self) -> String {
        self.pick(FIRST_NAMES)
    }

    /// Random last name
    pub fn last_name(&mut self) -> String {
        self.pick(LAST_NAMES)
    }

    /// Random permission group
    pub fn permission_group(&mut self) -> String {
        self.pick(PERMISSION_GROUPS)
    }

    /// Random status
    pub fn status(&mut self) -> String {
        self.pick(STATUSES)
    }

    /// `first.lastNNNN@domain`, lower-cased, 4-digit zero-padded suffix
    pub fn email(&mut self, first: &str, last: &str) -> String {
        let suffix: u16 = self.rng.gen_range(0..10_000);
        let domain = self.pick(EMAIL_DOMAINS);
        format!(
            "{}.{}{suffix:04}@{domain}",
            first.to_lowercase(),
            last.to_lowercase()
        )
    }

    /// Regional mobile number: 10 digits starting with `9`
    pub fn phone_number(&mut self) -> String {
        let mut number = String::with_capacity(PHONE_DIGITS);
        number.push(MOBILE_PREFIX);
        number.push_str(&self.digits(PHONE_DIGITS - 1));
        number
    }

    /// `+CC` followed by a space and 10 digits
    pub fn international_phone_number(&mut self) -> String {
        let code = self.pick(COUNTRY_CODES);
        let lead = self.rng.gen_range(1..10u8);
        format!("{code} {lead}{}", self.digits(PHONE_DIGITS - 1))
    }

    /// Password of `len` characters mixing lower, upper, digit and symbol.
    /// Every class is present once `len >= 4`.
    pub fn password(&mut self, len: usize) -> String {
        const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
        const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
        const DIGIT: &[u8] = b"23456789";
        const SYMBOL: &[u8] = b"!@#$%^&*";
        const CLASSES: [&[u8]; 4] = [LOWER, UPPER, DIGIT, SYMBOL];

        let mut chars: Vec<u8> = (0..len)
            .map(|i| {
                let class = if i < CLASSES.len() {
                    CLASSES[i]
                } else {
                    CLASSES[self.rng.gen_range(0..CLASSES.len())]
                };
                class[self.rng.gen_range(0..class.len())]
            })
            .collect();
        chars.shuffle(&mut self.rng);
        chars.into_iter().map(char::from).collect()
    }

    /// Complete record; present override fields win
    pub fn user(&mut self, overrides: &UserOverrides) -> UserRecord {
        let first_name = overrides
            .first_name
            .clone()
            .unwrap_or_else(|| self.first_name());
        let last_name = overrides
            .last_name
            .clone()
            .unwrap_or_else(|| self.last_name());
        let email = overrides
            .email
            .clone()
            .unwrap_or_else(|| self.email(&first_name, &last_name));
        let contact_number = overrides
            .contact_number
            .clone()
            .unwrap_or_else(|| self.phone_number());
        let permission_group = overrides
            .permission_group
            .clone()
            .unwrap_or_else(|| self.permission_group());
        let status = overrides
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS.to_string());

        UserRecord {
            first_name,
            last_name,
            email,
            contact_number,
            permission_group,
            status,
        }
    }

    /// `count` independent records (no deduplication)
    pub fn users(&mut self, count: usize, overrides: &UserOverrides) -> Vec<UserRecord> {
        (0..count).map(|_| self.user(overrides)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use regex::Regex;

    fn email_shape() -> Regex {
        Regex::new(r"^[a-z]+\.[a-z]+\d{4}@[a-z]+(\.[a-z]+)+$").unwrap()
    }

    mod generator_tests {
        use super::*;

        #[test]
        fn test_seeded_is_reproducible() {
            let a = TestDataGenerator::seeded(7).users(5, &UserOverrides::new());
            let b = TestDataGenerator::seeded(7).users(5, &UserOverrides::new());
            assert_eq!(a, b);
        }

        #[test]
        fn test_email_format() {
            let mut generator = TestDataGenerator::seeded(1);
            let email = generator.email("Test", "User");
            assert!(email.starts_with("test.user"));
            assert!(email_shape().is_match(&email), "{email}");
        }

        #[test]
        fn test_international_number() {
            let mut generator = TestDataGenerator::seeded(3);
            let number = generator.international_phone_number();
            let (code, rest) = number.split_once(' ').unwrap();
            assert!(COUNTRY_CODES.contains(&code));
            assert_eq!(rest.len(), PHONE_DIGITS);
            assert!(rest.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn test_password_classes() {
            let mut generator = TestDataGenerator::seeded(11);
            let password = generator.password(12);
            assert_eq!(password.len(), 12);
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
            assert!(password.chars().any(|c| !c.is_ascii_alphanumeric()));
            assert!(generator.password(0).is_empty());
        }

        #[test]
        fn test_override_precedence() {
            let mut generator = TestDataGenerator::seeded(5);
            let user = generator.user(&UserOverrides::new().email("x@y.com"));
            assert_eq!(user.email, "x@y.com");
            assert!(!user.first_name.is_empty());
            assert!(!user.last_name.is_empty());
            assert!(!user.contact_number.is_empty());
            assert!(!user.permission_group.is_empty());
            assert_eq!(user.status, DEFAULT_STATUS);
        }

        #[test]
        fn test_status_override() {
            let mut generator = TestDataGenerator::seeded(5);
            let user = generator.user(&UserOverrides::new().status("Inactive"));
            assert_eq!(user.status, "Inactive");
        }

        #[test]
        fn test_batch_size_and_full_name() {
            let mut generator = TestDataGenerator::seeded(9);
            let users = generator.users(4, &UserOverrides::new().last_name("Rai"));
            assert_eq!(users.len(), 4);
            assert!(users.iter().all(|u| u.full_name().ends_with(" Rai")));
            assert!(generator.users(0, &UserOverrides::new()).is_empty());
        }

        #[test]
        fn test_serde_uses_camel_case() {
            let mut generator = TestDataGenerator::seeded(2);
            let json = serde_json::to_string(&generator.user(&UserOverrides::new())).unwrap();
            assert!(json.contains("\"firstName\""));
            assert!(json.contains("\"contactNumber\""));
        }
    }

    mod property_tests {
        use super::*;

        proptest! {
            #[test]
            fn prop_generated_users_are_well_formed(seed in any::<u64>()) {
                let mut generator = TestDataGenerator::seeded(seed);
                let user = generator.user(&UserOverrides::new());

                prop_assert!(FIRST_NAMES.contains(&user.first_name.as_str()));
                prop_assert!(LAST_NAMES.contains(&user.last_name.as_str()));
                prop_assert!(email_shape().is_match(&user.email));
                prop_assert_eq!(user.contact_number.len(), PHONE_DIGITS);
                prop_assert!(user.contact_number.starts_with(MOBILE_PREFIX));
                prop_assert!(user.contact_number.chars().all(|c| c.is_ascii_digit()));
                prop_assert!(PERMISSION_GROUPS.contains(&user.permission_group.as_str()));
            }

            #[test]
            fn prop_password_length(seed in any::<u64>(), len in 0usize..64) {
                let mut generator = TestDataGenerator::seeded(seed);
                prop_assert_eq!(generator.password(len).chars().count(), len);
            }
        }
    }
}
