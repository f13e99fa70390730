//! Fake-data capability used by the record generators.
//!
//! Generators never call a fake-data library directly: they go through
//! [`Faker`], passing the dataset's stream so every value stays a function of
//! the seed. [`FakeRsFaker`] is backed by the `fake` crate; [`ScriptedFaker`]
//! returns fixed sequences for tests.

mod adapter;
mod scripted;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{Rng, RngCore};

pub use adapter::FakeRsFaker;
pub use scripted::ScriptedFaker;

pub trait Faker {
    fn first_name(&self, rng: &mut dyn RngCore) -> String;

    fn last_name(&self, rng: &mut dyn RngCore) -> String;

    fn email(&self, rng: &mut dyn RngCore) -> String;

    /// Exactly ten national digits.
    fn phone_digits(&self, rng: &mut dyn RngCore) -> String;

    fn url(&self, rng: &mut dyn RngCore) -> String;

    fn city(&self, rng: &mut dyn RngCore) -> String;

    fn country_code(&self, rng: &mut dyn RngCore) -> String;

    /// Version 4 UUID built from stream bytes.
    fn uuid(&self, rng: &mut dyn RngCore) -> String {
        let mut bytes = [0_u8; 16];
        rng.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    /// Uniform date in `[start, end]`.
    fn date_between(&self, start: NaiveDate, end: NaiveDate, rng: &mut dyn RngCore) -> NaiveDate {
        let span = (end - start).num_days().max(0);
        start + Duration::days(rng.random_range(0..=span))
    }

    /// Uniform datetime in `[start, end]` at second resolution.
    fn datetime_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        rng: &mut dyn RngCore,
    ) -> NaiveDateTime {
        let span = (end - start).num_seconds().max(0);
        start + Duration::seconds(rng.random_range(0..=span))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn default_uuid_is_version_four() {
        let faker = ScriptedFaker::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let value = faker.uuid(&mut rng);
        let parsed = uuid::Uuid::parse_str(&value).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn date_windows_are_inclusive_and_bounded() {
        let faker = ScriptedFaker::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).expect("date");
        for _ in 0..200 {
            let date = faker.date_between(start, end, &mut rng);
            assert!(date >= start && date <= end);
        }
        assert_eq!(faker.date_between(end, end, &mut rng), end);

        let from = start.and_hms_opt(0, 0, 0).expect("time");
        let to = start.and_hms_opt(0, 0, 59).expect("time");
        for _ in 0..200 {
            let value = faker.datetime_between(from, to, &mut rng);
            assert!(value >= from && value <= to);
        }
    }
}
