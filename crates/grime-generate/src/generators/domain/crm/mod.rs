//! CRM users.
//!
//! Per-record draw order:
//! state code → full-name policy → email policy [+ bucket pick]
//! → `user_id` → `first_name` → `last_name` → phone digits → phone format
//! → `city` → `signup_date` → `plan_tier`.
//!
//! The state code is drawn on every record, including those whose state is
//! then written as a full name.

use std::collections::BTreeMap;

use tracing::debug;

use grime_core::{CrmUser, DatasetKind, PhoneFormat, PlanTier, US_STATES};

use crate::errors::GenerationError;
use crate::generators::{GeneratedBatch, GenerationContext, RecordGenerator, ensure_rows};
use crate::policy::CorruptionPolicy;
use crate::pool::{Pool, PoolSpec};
use crate::rates::UserRates;

pub const EMAIL_POOL: &str = "emails";

pub const FULL_STATE_NAME: &str = "full_state_name";
pub const EMAIL_REUSE: &str = "email_reuse";

#[derive(Debug, Clone)]
pub struct CrmUserGenerator {
    rates: UserRates,
    full_state_name: CorruptionPolicy,
    email_reuse: CorruptionPolicy,
}

impl CrmUserGenerator {
    pub fn new(rates: UserRates) -> Result<Self, GenerationError> {
        rates.validate()?;
        Ok(Self {
            full_state_name: CorruptionPolicy::new(FULL_STATE_NAME, rates.full_state_name)?,
            email_reuse: CorruptionPolicy::new(EMAIL_REUSE, rates.email_reuse)?,
            rates,
        })
    }

    pub fn rates(&self) -> &UserRates {
        &self.rates
    }
}

impl RecordGenerator for CrmUserGenerator {
    type Record = CrmUser;

    fn dataset(&self) -> DatasetKind {
        DatasetKind::Users
    }

    fn generate(
        &self,
        ctx: &mut GenerationContext<'_>,
        rows: usize,
    ) -> Result<GeneratedBatch<CrmUser>, GenerationError> {
        ensure_rows(self.dataset(), rows)?;
        let email_spec = PoolSpec::new(
            EMAIL_POOL,
            rows,
            self.rates.email_dup_ratio,
            self.rates.email_bucket,
        );
        email_spec.size()?;

        let emails = Pool::build(email_spec, ctx, |ctx| ctx.faker.email(&mut ctx.stream))?;
        let mut email_cursor = emails.cursor();

        let signup_end = ctx.as_of;
        let signup_start = ctx.days_before(self.rates.signup_lookback_days);

        let mut records = Vec::with_capacity(rows);
        for row in 0..rows {
            let state = *ctx.stream.pick(&US_STATES);
            let state = self.full_state_name.apply(
                ctx,
                |_| state.code.to_string(),
                |_| state.name.to_string(),
            );
            let email = self.email_reuse.apply_or_clean(
                ctx,
                email_cursor.must_take(rows - row),
                |_| email_cursor.next_value().to_string(),
                |ctx| emails.choose_reused(&mut ctx.stream).to_string(),
            );
            let user_id = ctx.uuid();
            let first_name = ctx.faker.first_name(&mut ctx.stream);
            let last_name = ctx.faker.last_name(&mut ctx.stream);
            let digits = ctx.faker.phone_digits(&mut ctx.stream);
            let format = *ctx.stream.pick(&PhoneFormat::ALL);
            let phone = format.render(&digits).ok_or_else(|| GenerationError::Malformed {
                dataset: DatasetKind::Users,
                message: format!("faker returned phone digits '{digits}'"),
            })?;
            let city = ctx.faker.city(&mut ctx.stream);
            let signup_date = ctx
                .faker
                .date_between(signup_start, signup_end, &mut ctx.stream);
            let plan_tier = *ctx.stream.pick(&PlanTier::ALL);

            records.push(CrmUser {
                user_id,
                first_name,
                last_name,
                email,
                phone,
                state,
                city,
                signup_date,
                plan_tier,
            });
        }

        debug!(
            dataset = %self.dataset(),
            rows,
            emails_assigned = email_cursor.taken(),
            "users generated"
        );

        Ok(GeneratedBatch {
            records,
            pools: BTreeMap::from([(EMAIL_POOL, emails.len())]),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use chrono::NaiveDate;
    use grime_core::state_code;

    use super::*;
    use crate::faker_rs::ScriptedFaker;

    fn generate(rows: usize, rates: UserRates) -> GeneratedBatch<CrmUser> {
        let faker = ScriptedFaker::new();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let mut ctx = GenerationContext::new(DatasetKind::Users, 11, &faker, as_of);
        CrmUserGenerator::new(rates)
            .expect("generator")
            .generate(&mut ctx, rows)
            .expect("users")
    }

    #[test]
    fn every_state_resolves_to_a_canonical_code() {
        let batch = generate(2_000, UserRates::default());
        let mut full_names = 0;
        for user in &batch.records {
            assert!(state_code(&user.state).is_some(), "{}", user.state);
            if user.state.len() > 2 {
                full_names += 1;
            }
        }
        assert!(full_names > 0 && full_names < 2_000);
    }

    #[test]
    fn clean_emails_use_every_pool_value() {
        let rates = UserRates {
            email_reuse: 0.0,
            ..UserRates::default()
        };
        let batch = generate(1_000, rates);
        let distinct: HashSet<&str> = batch.records.iter().map(|user| user.email.as_str()).collect();
        assert_eq!(distinct.len(), 980);
        assert_eq!(batch.pools.get(EMAIL_POOL), Some(&980));
    }

    #[test]
    fn reused_emails_come_from_the_bucket_until_the_pool_must_drain() {
        let rates = UserRates {
            email_reuse: 1.0,
            email_bucket: 5,
            ..UserRates::default()
        };
        let batch = generate(500, rates);
        // Pool values are handed out by the scripted faker in order.
        let index = |email: &str| -> u64 {
            email["user".len()..email.find('@').expect("at")]
                .parse()
                .expect("numeric local part")
        };
        let (reused, drained) = batch.records.split_at(10);
        for user in reused {
            assert!(index(&user.email) < 5, "{}", user.email);
        }
        for (position, user) in drained.iter().enumerate() {
            assert_eq!(index(&user.email), position as u64);
        }
        let distinct: HashSet<&str> = batch.records.iter().map(|user| user.email.as_str()).collect();
        assert_eq!(distinct.len(), 490);
    }

    #[test]
    fn all_four_phone_formats_appear() {
        let batch = generate(400, UserRates::default());
        let mut formats: HashMap<PhoneFormat, usize> = HashMap::new();
        for user in &batch.records {
            let format = PhoneFormat::detect(&user.phone).expect("known phone format");
            *formats.entry(format).or_insert(0) += 1;
        }
        assert_eq!(formats.len(), 4);
    }

    #[test]
    fn signup_dates_stay_in_window() {
        let batch = generate(300, UserRates::default());
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let start = as_of - chrono::Duration::days(5 * 365);
        assert!(
            batch
                .records
                .iter()
                .all(|user| user.signup_date >= start && user.signup_date <= as_of)
        );
    }
}
