use std::cell::Cell;

use rand::RngCore;

use super::Faker;

const FIRST_NAMES: &[&str] = &["Ada", "Grace", "Linus", "Barbara", "Ken"];
const LAST_NAMES: &[&str] = &["Lovelace", "Hopper", "Torvalds", "Liskov", "Thompson"];
const CITIES: &[&str] = &["Springfield", "Riverton", "Fairview"];
const COUNTRIES: &[&str] = &["US", "CA", "MX"];

/// Deterministic [`Faker`] that ignores the stream for text values and
/// cycles through fixed sequences instead. Every call bumps one shared
/// counter, so values are unique per call where uniqueness matters
/// (emails, urls, phones).
///
/// Uuids and dates keep the default stream-driven implementations.
#[derive(Debug, Default)]
pub struct ScriptedFaker {
    counter: Cell<u64>,
}

impl ScriptedFaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of text values handed out so far.
    pub fn calls(&self) -> u64 {
        self.counter.get()
    }

    fn next(&self) -> u64 {
        let value = self.counter.get();
        self.counter.set(value + 1);
        value
    }

    fn cycle(&self, values: &[&str]) -> String {
        let idx = self.next() as usize % values.len();
        values[idx].to_string()
    }
}

impl Faker for ScriptedFaker {
    fn first_name(&self, _rng: &mut dyn RngCore) -> String {
        self.cycle(FIRST_NAMES)
    }

    fn last_name(&self, _rng: &mut dyn RngCore) -> String {
        self.cycle(LAST_NAMES)
    }

    fn email(&self, _rng: &mut dyn RngCore) -> String {
        format!("user{:06}@example.test", self.next())
    }

    fn phone_digits(&self, _rng: &mut dyn RngCore) -> String {
        format!("555{:07}", self.next() % 10_000_000)
    }

    fn url(&self, _rng: &mut dyn RngCore) -> String {
        format!("https://example.test/page/{}", self.next())
    }

    fn city(&self, _rng: &mut dyn RngCore) -> String {
        self.cycle(CITIES)
    }

    fn country_code(&self, _rng: &mut dyn RngCore) -> String {
        self.cycle(COUNTRIES)
    }
}
