use fake::Fake;
use fake::faker::address::en::{CityName, CountryCode};
use fake::faker::internet::en::{DomainSuffix, FreeEmailProvider};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rand::{Rng, RngCore};

use super::Faker;

const PHONE_DIGITS: usize = 10;

/// [`Faker`] backed by the `fake` crate's English locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeRsFaker;

impl FakeRsFaker {
    pub fn new() -> Self {
        Self
    }
}

impl Faker for FakeRsFaker {
    fn first_name(&self, rng: &mut dyn RngCore) -> String {
        FirstName().fake_with_rng(rng)
    }

    fn last_name(&self, rng: &mut dyn RngCore) -> String {
        LastName().fake_with_rng(rng)
    }

    /// `first.last<n>@provider`, wide enough for pools of tens of thousands.
    fn email(&self, rng: &mut dyn RngCore) -> String {
        let first: String = FirstName().fake_with_rng(rng);
        let last: String = LastName().fake_with_rng(rng);
        let tag = rng.random_range(1..10_000_u32);
        let provider: String = FreeEmailProvider().fake_with_rng(rng);
        format!(
            "{}.{}{tag}@{}",
            local_part(&first),
            local_part(&last),
            provider.to_lowercase()
        )
    }

    fn phone_digits(&self, rng: &mut dyn RngCore) -> String {
        let raw: String = PhoneNumber().fake_with_rng(rng);
        let digits: Vec<char> = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
        let mut national: String = digits
            .iter()
            .skip(digits.len().saturating_sub(PHONE_DIGITS))
            .collect();
        while national.len() < PHONE_DIGITS {
            let digit = rng.random_range(0..10_u32);
            national.insert(0, char::from(b'0' + digit as u8));
        }
        national
    }

    fn url(&self, rng: &mut dyn RngCore) -> String {
        let host: String = Word().fake_with_rng(rng);
        let suffix: String = DomainSuffix().fake_with_rng(rng);
        let section: String = Word().fake_with_rng(rng);
        let page: String = Word().fake_with_rng(rng);
        format!("https://www.{host}.{suffix}/{section}/{page}/")
    }

    fn city(&self, rng: &mut dyn RngCore) -> String {
        CityName().fake_with_rng(rng)
    }

    fn country_code(&self, rng: &mut dyn RngCore) -> String {
        CountryCode().fake_with_rng(rng)
    }
}

fn local_part(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}
