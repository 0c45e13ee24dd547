//! Randomized test data: users, addresses, cards, phone numbers.
//!
//! A generator is either seeded (reproducible field choices) or drawn from
//! OS entropy. Emails and test ids additionally embed a process-wide
//! millisecond stamp that strictly increases between calls, so two values
//! generated in the same millisecond still differ.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default character set for [`DataGenerator::string`]
pub const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Password used for every generated account
pub const TEST_PASSWORD: &str = "TestPassword123!";

const FIRST_NAMES: [&str; 8] = ["John", "Jane", "Mike", "Sarah", "David", "Emma", "Chris", "Lisa"];
const LAST_NAMES: [&str; 8] = ["Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis"];
const STREETS: [&str; 8] = [
    "Main St", "Oak Ave", "Pine Rd", "Elm St", "Cedar Ln", "Park Ave", "First St", "Second St",
];
const CITIES: [&str; 8] = [
    "Springfield", "Riverside", "Franklin", "Greenville", "Bristol", "Fairview", "Salem", "Georgetown",
];
const STATES: [&str; 8] = ["CA", "NY", "TX", "FL", "IL", "PA", "OH", "GA"];
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Current time in milliseconds, strictly greater than any earlier result
#[must_use]
pub fn unique_millis() -> u64 {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Day, month, year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthDate {
    /// 1..=28
    pub day: u32,
    /// 1..=12
    pub month: u32,
    /// 1970..=2019
    pub year: i32,
}

/// Signup-form user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `Mr` or `Ms`
    pub title: String,
    pub date_of_birth: BirthDate,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub zipcode: String,
    pub mobile_number: String,
}

/// Postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address1: String,
    /// Empty about half the time
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
}

/// Card network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    /// Prefix `4`, 16 digits
    Visa,
    /// Prefix `5`, 16 digits
    MasterCard,
    /// Prefix `37`, 15 digits
    #[serde(rename = "American Express")]
    AmericanExpress,
}

impl CardType {
    const ALL: [Self; 3] = [Self::Visa, Self::MasterCard, Self::AmericanExpress];

    /// Leading digits
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Visa => "4",
            Self::MasterCard => "5",
            Self::AmericanExpress => "37",
        }
    }

    /// Total digits
    #[must_use]
    pub const fn length(self) -> usize {
        match self {
            Self::Visa | Self::MasterCard => 16,
            Self::AmericanExpress => 15,
        }
    }
}

/// Test card; numbers have the right prefix and length but no Luhn digit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub card_number: String,
    /// Zero-padded, `01`..`12`
    pub expiry_month: String,
    /// One to five years ahead
    pub expiry_year: String,
    pub cvv: String,
    pub card_type: CardType,
    pub card_holder_name: String,
}

/// Phone number shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhoneFormat {
    /// `+1` then 3 + 3 + 4 digits
    #[default]
    Us,
    /// `+44` then 10 digits
    Uk,
    /// `+1` then 10 digits
    Other,
}

impl FromStr for PhoneFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "US" => Self::Us,
            "UK" => Self::Uk,
            _ => Self::Other,
        })
    }
}

/// Record kind for [`DataGenerator::bulk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// [`User`]
    #[default]
    User,
    /// Email string
    Email,
    /// [`Address`]
    Address,
    /// [`CreditCard`]
    CreditCard,
}

impl FromStr for RecordKind {
    type Err = std::convert::Infallible;

    /// Unknown kinds produce users
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "address" => Self::Address,
            "creditcard" | "credit_card" | "card" => Self::CreditCard,
            _ => Self::User,
        })
    }
}

/// One generated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    User(Box<User>),
    Email(String),
    Address(Address),
    CreditCard(CreditCard),
}

/// Record returned by the `generateTestData` task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub company: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub mobile: String,
}

/// Random data source
#[derive(Debug, Clone)]
pub struct DataGenerator {
    rng: StdRng,
}

impl Default for DataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DataGenerator {
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

    /// Seeded when `seed` is given, entropy otherwise
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// Uniform integer in `min..=max`; bounds are swapped when reversed
    pub fn number(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(lo..=hi)
    }

    /// `testuser_<stamp>_<0..1000>@<domain>`
    pub fn email(&mut self, domain: &str) -> String {
        let stamp = unique_millis();
        let n = self.rng.gen_range(0..1000);
        format!("testuser_{stamp}_{n}@{domain}")
    }

    /// `length` characters drawn from `charset`; an empty charset yields ""
    pub fn string(&mut self, length: usize, charset: &str) -> String {
        let chars: Vec<char> = charset.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        (0..length)
            .map(|_| chars[self.rng.gen_range(0..chars.len())])
            .collect()
    }

    pub fn phone(&mut self, format: PhoneFormat) -> String {
        match format {
            PhoneFormat::Us => format!(
                "+1{}{}{}",
                self.number(100, 999),
                self.number(100, 999),
                self.number(1000, 9999)
            ),
            PhoneFormat::Uk => format!("+44{}", self.number(1_000_000_000, 9_999_999_999)),
            PhoneFormat::Other => format!("+1{}", self.number(1_000_000_000, 9_999_999_999)),
        }
    }

    /// Uniform instant in `[start, end]`
    pub fn date(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> DateTime<Utc> {
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let span = (hi - lo).num_milliseconds();
        let offset = self.rng.gen_range(0..=span);
        lo + chrono::Duration::milliseconds(offset)
    }

    /// Uniform instant between the Unix epoch and now
    pub fn date_until_now(&mut self) -> DateTime<Utc> {
        let epoch = Utc.timestamp_opt(0, 0).single().unwrap_or_default();
        self.date(epoch, Utc::now())
    }

    pub fn user(&mut self) -> User {
        let first_name = self.pick(&FIRST_NAMES).to_string();
        let last_name = self.pick(&LAST_NAMES).to_string();
        let title = if self.rng.gen_bool(0.5) { "Mr" } else { "Ms" };
        User {
            name: format!("{first_name} {last_name}"),
            email: self.email("example.com"),
            password: TEST_PASSWORD.to_string(),
            title: title.to_string(),
            date_of_birth: BirthDate {
                day: self.rng.gen_range(1..=28),
                month: self.rng.gen_range(1..=12),
                year: self.rng.gen_range(1970..=2019),
            },
            company: format!("{first_name} Corp"),
            address1: format!("{} Test Street", self.number(1, 9999)),
            address2: format!("Apt {}", self.number(1, 100)),
            country: "United States".to_string(),
            state: "California".to_string(),
            city: "Test City".to_string(),
            zipcode: self.number(10_000, 99_999).to_string(),
            mobile_number: format!("+1{}", self.number(1_000_000_000, 9_999_999_999)),
            first_name,
            last_name,
        }
    }

    pub fn address(&mut self) -> Address {
        let street = self.pick(&STREETS);
        let address2 = if self.rng.gen_bool(0.5) {
            format!("Apt {}", self.number(1, 999))
        } else {
            String::new()
        };
        Address {
            address1: format!("{} {street}", self.number(1, 9999)),
            address2,
            city: self.pick(&CITIES).to_string(),
            state: self.pick(&STATES).to_string(),
            zipcode: self.number(10_000, 99_999).to_string(),
            country: "United States".to_string(),
        }
    }

    pub fn credit_card(&mut self) -> CreditCard {
        let card_type = *CardType::ALL.choose(&mut self.rng).unwrap_or(&CardType::Visa);
        let mut number = card_type.prefix().to_string();
        while number.len() < card_type.length() {
            number.push(char::from(b'0' + self.rng.gen_range(0..10u8)));
        }
        let year = Utc::now().year() + self.rng.gen_range(1..=5);
        let holder = format!(
            "{} {}",
            self.string(5, ALPHANUMERIC).to_uppercase(),
            self.string(7, ALPHANUMERIC).to_uppercase()
        );
        CreditCard {
            card_number: number,
            expiry_month: format!("{:02}", self.number(1, 12)),
            expiry_year: year.to_string(),
            cvv: self.number(100, 999).to_string(),
            card_type,
            card_holder_name: holder,
        }
    }

    /// `count` records of one kind
    pub fn bulk(&mut self, count: usize, kind: RecordKind) -> Vec<Record> {
        (0..count)
            .map(|_| match kind {
                RecordKind::User => Record::User(Box::new(self.user())),
                RecordKind::Email => Record::Email(self.email("example.com")),
                RecordKind::Address => Record::Address(self.address()),
                RecordKind::CreditCard => Record::CreditCard(self.credit_card()),
            })
            .collect()
    }

    /// `<prefix>_<stamp>_<9 base36 chars>`
    pub fn test_id(&mut self, prefix: &str) -> String {
        let stamp = unique_millis();
        let suffix: String = (0..9)
            .map(|_| char::from(BASE36[self.rng.gen_range(0..BASE36.len())]))
            .collect();
        format!("{prefix}_{stamp}_{suffix}")
    }

    /// Single value by kind name: email, name, phone, password, anything else
    pub fn quick_value(&mut self, kind: &str) -> String {
        let stamp = unique_millis();
        match kind.to_ascii_lowercase().as_str() {
            "email" => format!("testuser_{stamp}@example.com"),
            "name" => format!("TestUser_{stamp}"),
            "phone" => format!("+1{}", self.number(1_000_000_000, 9_999_999_999)),
            "password" => format!("TestPass{stamp}!"),
            _ => format!("TestData_{stamp}"),
        }
    }

    /// Fixed-shape signup record with a unique email
    #[must_use]
    pub fn signup_record() -> SignupRecord {
        let stamp = unique_millis();
        SignupRecord {
            email: format!("testuser_{stamp}@example.com"),
            first_name: format!("TestUser{stamp}"),
            last_name: "TestSuite".to_string(),
            password: TEST_PASSWORD.to_string(),
            company: "Test Company".to_string(),
            address: "123 Test Street".to_string(),
            city: "Test City".to_string(),
            state: "Test State".to_string(),
            zipcode: "12345".to_string(),
            mobile: "1234567890".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::helpers::is_valid_email;
    use proptest::prelude::*;
    use std::collections::HashSet;

    mod identity_tests {
        use super::*;

        #[test]
        fn test_stamps_strictly_increase() {
            let stamps: Vec<u64> = (0..1000).map(|_| unique_millis()).collect();
            assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn test_emails_unique_and_valid() {
            let mut gen = DataGenerator::new();
            let emails: HashSet<String> = (0..500).map(|_| gen.email("example.com")).collect();
            assert_eq!(emails.len(), 500);
            assert!(emails.iter().all(|e| is_valid_email(e)));
        }

        #[test]
        fn test_test_id_shape() {
            let id = DataGenerator::seeded(1).test_id("order");
            let parts: Vec<&str> = id.split('_').collect();
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[0], "order");
            assert!(parts[1].parse::<u64>().is_ok());
            assert_eq!(parts[2].len(), 9);
            assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
        }

        #[test]
        fn test_seed_reproduces_field_choices() {
            let a = DataGenerator::seeded(42).address();
            let b = DataGenerator::seeded(42).address();
            assert_eq!(a, b);
            let (ua, ub) = (DataGenerator::seeded(7).user(), DataGenerator::seeded(7).user());
            assert_eq!(ua.name, ub.name);
            assert_eq!(ua.date_of_birth, ub.date_of_birth);
            assert_ne!(ua.email, ub.email);
        }
    }

    mod shape_tests {
        use super::*;

        #[test]
        fn test_credit_card_prefix_and_length() {
            let mut gen = DataGenerator::seeded(3);
            for _ in 0..50 {
                let card = gen.credit_card();
                assert!(card.card_number.starts_with(card.card_type.prefix()));
                assert_eq!(card.card_number.len(), card.card_type.length());
                assert!(card.card_number.bytes().all(|b| b.is_ascii_digit()));
                assert_eq!(card.expiry_month.len(), 2);
            }
        }

        #[test]
        fn test_phone_formats() {
            let mut gen = DataGenerator::seeded(5);
            let us = gen.phone(PhoneFormat::Us);
            assert!(us.starts_with("+1") && us.len() == 12);
            let uk = gen.phone("uk".parse().unwrap());
            assert!(uk.starts_with("+44") && uk.len() == 13);
            assert_eq!("fr".parse::<PhoneFormat>().unwrap(), PhoneFormat::Other);
        }

        #[test]
        fn test_bulk_kinds() {
            let mut gen = DataGenerator::seeded(9);
            let cards = gen.bulk(3, "creditcard".parse().unwrap());
            assert!(cards.iter().all(|r| matches!(r, Record::CreditCard(_))));
            let fallback = gen.bulk(2, "robot".parse().unwrap());
            assert!(fallback.iter().all(|r| matches!(r, Record::User(_))));
            let json = serde_json::to_value(&gen.bulk(1, RecordKind::User)).unwrap();
            assert!(json[0]["dateOfBirth"]["year"].is_number());
        }

        #[test]
        fn test_quick_values() {
            let mut gen = DataGenerator::new();
            assert!(is_valid_email(&gen.quick_value("EMAIL")));
            assert!(gen.quick_value("name").starts_with("TestUser_"));
            assert!(gen.quick_value("password").ends_with('!'));
            assert!(gen.quick_value("zzz").starts_with("TestData_"));
        }

        #[test]
        fn test_signup_record_serializes_camel_case() {
            let json = serde_json::to_value(DataGenerator::signup_record()).unwrap();
            assert_eq!(json["lastName"], "TestSuite");
            assert_eq!(json["mobile"], "1234567890");
        }
    }

    proptest! {
        #[test]
        fn prop_number_in_range(seed: u64, a in -1000i64..1000, b in -1000i64..1000) {
            let n = DataGenerator::seeded(seed).number(a, b);
            prop_assert!(n >= a.min(b) && n <= a.max(b));
        }

        #[test]
        fn prop_string_uses_charset(seed: u64, len in 0usize..64) {
            let s = DataGenerator::seeded(seed).string(len, "xyz");
            prop_assert_eq!(s.chars().count(), len);
            prop_assert!(s.chars().all(|c| "xyz".contains(c)));
        }

        #[test]
        fn prop_date_in_range(seed: u64, start in 0i64..2_000_000_000, len in 0i64..100_000_000) {
            let lo = Utc.timestamp_opt(start, 0).single().unwrap();
            let hi = Utc.timestamp_opt(start + len, 0).single().unwrap();
            let d = DataGenerator::seeded(seed).date(lo, hi);
            prop_assert!(d >= lo && d <= hi);
        }
    }
}
