//! Web analytics events.
//!
//! Per-record draw order:
//! `user_id` policy [+ user pool pick] → `session_id` policy [+ bucket pick]
//! → timestamp → `event_type` → `page_url` → referrer policy [+ url]
//! → `device_type` → timestamp-format policy → `country`.
//!
//! The user pool (fixed size) and the session pool are built, in that order,
//! before the first record.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use tracing::debug;

use grime_core::{DatasetKind, DeviceType, EventTimestamp, EventType, WebEvent};

use crate::errors::GenerationError;
use crate::generators::{GeneratedBatch, GenerationContext, RecordGenerator, ensure_rows};
use crate::policy::CorruptionPolicy;
use crate::pool::{Pool, PoolSpec};
use crate::rates::EventRates;

pub const USER_POOL: &str = "event_user_ids";
pub const SESSION_POOL: &str = "session_ids";

pub const NULL_USER_ID: &str = "null_user_id";
pub const SESSION_REUSE: &str = "session_reuse";
pub const MISSING_REFERRER: &str = "missing_referrer";
pub const EPOCH_TIMESTAMP: &str = "epoch_timestamp";

#[derive(Debug, Clone)]
pub struct WebEventGenerator {
    rates: EventRates,
    null_user_id: CorruptionPolicy,
    session_reuse: CorruptionPolicy,
    missing_referrer: CorruptionPolicy,
    epoch_timestamp: CorruptionPolicy,
}

impl WebEventGenerator {
    pub fn new(rates: EventRates) -> Result<Self, GenerationError> {
        rates.validate()?;
        Ok(Self {
            null_user_id: CorruptionPolicy::new(NULL_USER_ID, rates.null_user_id)?,
            session_reuse: CorruptionPolicy::new(SESSION_REUSE, rates.session_reuse)?,
            missing_referrer: CorruptionPolicy::new(MISSING_REFERRER, rates.missing_referrer)?,
            epoch_timestamp: CorruptionPolicy::new(EPOCH_TIMESTAMP, rates.epoch_timestamp)?,
            rates,
        })
    }

    pub fn rates(&self) -> &EventRates {
        &self.rates
    }
}

impl RecordGenerator for WebEventGenerator {
    type Record = WebEvent;

    fn dataset(&self) -> DatasetKind {
        DatasetKind::Events
    }

    fn generate(
        &self,
        ctx: &mut GenerationContext<'_>,
        rows: usize,
    ) -> Result<GeneratedBatch<WebEvent>, GenerationError> {
        ensure_rows(self.dataset(), rows)?;
        let user_spec = PoolSpec::fixed(USER_POOL, self.rates.user_pool_size, 1);
        let session_spec = PoolSpec::new(
            SESSION_POOL,
            rows,
            self.rates.session_dup_ratio,
            self.rates.session_bucket,
        );
        user_spec.size()?;
        session_spec.size()?;

        let users = Pool::build(user_spec, ctx, |ctx| ctx.uuid())?;
        let sessions = Pool::build(session_spec, ctx, |ctx| ctx.uuid())?;
        let mut session_cursor = sessions.cursor();

        let end = ctx.now();
        let start = ctx.days_before(self.rates.lookback_days).and_time(NaiveTime::MIN);

        let mut records = Vec::with_capacity(rows);
        for row in 0..rows {
            let user_id = self.null_user_id.apply(
                ctx,
                |ctx| Some(users.choose(&mut ctx.stream).to_string()),
                |_| None,
            );
            let session_id = self.session_reuse.apply_or_clean(
                ctx,
                session_cursor.must_take(rows - row),
                |_| session_cursor.next_value().to_string(),
                |ctx| sessions.choose_reused(&mut ctx.stream).to_string(),
            );
            let moment = ctx.faker.datetime_between(start, end, &mut ctx.stream);
            let event_type = *ctx.stream.pick(&EventType::ALL);
            let page_url = ctx.faker.url(&mut ctx.stream);
            let referrer = self.missing_referrer.apply(
                ctx,
                |ctx| Some(ctx.faker.url(&mut ctx.stream)),
                |_| None,
            );
            let device_type = *ctx.stream.pick(&DeviceType::ALL);
            let timestamp = self.epoch_timestamp.apply(
                ctx,
                |_| EventTimestamp::iso(moment),
                |_| EventTimestamp::epoch(moment),
            );
            let country = ctx.faker.country_code(&mut ctx.stream);

            records.push(WebEvent {
                user_id,
                session_id,
                event_type,
                page_url,
                referrer,
                device_type,
                timestamp,
                country,
            });
        }

        debug!(
            dataset = %self.dataset(),
            rows,
            sessions_assigned = session_cursor.taken(),
            "events generated"
        );

        Ok(GeneratedBatch {
            records,
            pools: BTreeMap::from([(USER_POOL, users.len()), (SESSION_POOL, sessions.len())]),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::faker_rs::ScriptedFaker;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")
    }

    fn generate(rows: usize, rates: EventRates) -> GeneratedBatch<WebEvent> {
        let faker = ScriptedFaker::new();
        let mut ctx = GenerationContext::new(DatasetKind::Events, 7, &faker, as_of());
        WebEventGenerator::new(rates)
            .expect("generator")
            .generate(&mut ctx, rows)
            .expect("events")
    }

    #[test]
    fn rejects_zero_rows_and_bad_rates() {
        let faker = ScriptedFaker::new();
        let mut ctx = GenerationContext::new(DatasetKind::Events, 7, &faker, as_of());
        let generator = WebEventGenerator::new(EventRates::default()).expect("generator");
        assert!(matches!(
            generator.generate(&mut ctx, 0),
            Err(GenerationError::Configuration(_))
        ));

        let rates = EventRates {
            session_dup_ratio: 1.0,
            ..EventRates::default()
        };
        assert!(WebEventGenerator::new(rates).is_err());
    }

    #[test]
    fn null_users_and_missing_referrers_follow_policies() {
        let never = EventRates {
            null_user_id: 0.0,
            missing_referrer: 0.0,
            epoch_timestamp: 0.0,
            user_pool_size: 50,
            ..EventRates::default()
        };
        let batch = generate(300, never);
        assert!(batch.records.iter().all(|event| event.user_id.is_some()));
        assert!(batch.records.iter().all(|event| event.referrer.is_some()));
        assert!(batch.records.iter().all(|event| !event.timestamp.is_epoch()));

        let always = EventRates {
            null_user_id: 1.0,
            missing_referrer: 1.0,
            epoch_timestamp: 1.0,
            user_pool_size: 50,
            ..EventRates::default()
        };
        let batch = generate(300, always);
        assert!(batch.records.iter().all(|event| event.user_id.is_none()));
        assert!(batch.records.iter().all(|event| event.referrer.is_none()));
        assert!(batch.records.iter().all(|event| event.timestamp.is_epoch()));
    }

    #[test]
    fn clean_sessions_cover_the_pool_before_repeating() {
        let rates = EventRates {
            session_reuse: 0.0,
            user_pool_size: 50,
            ..EventRates::default()
        };
        let batch = generate(1_000, rates);
        let distinct: HashSet<&str> = batch
            .records
            .iter()
            .map(|event| event.session_id.as_str())
            .collect();
        assert_eq!(distinct.len(), 970);
        assert_eq!(batch.pools.get(SESSION_POOL), Some(&970));
        assert_eq!(batch.pools.get(USER_POOL), Some(&50));
    }

    #[test]
    fn timestamps_stay_inside_the_lookback_window() {
        let rates = EventRates {
            user_pool_size: 50,
            ..EventRates::default()
        };
        let batch = generate(500, rates);
        let end = as_of().and_hms_opt(0, 0, 0).expect("midnight");
        let start = end - Duration::days(3 * 365);
        for event in &batch.records {
            let moment = event.timestamp.to_datetime().expect("parseable timestamp");
            assert!(moment >= start && moment <= end, "{moment}");
        }
    }
}
