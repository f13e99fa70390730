//! Sales transactions.
//!
//! Per-record draw order:
//! product → quantity → price jitter → refund policy → future-date policy
//! → date → `transaction_id` policy [+ bucket pick] → `user_id` → region.
//!
//! The refund and future-date policies are independent: a record may be both.
//! Future dates fall in `[as_of + 1, as_of + future_window_days]`, strictly
//! after `as_of`.

use std::collections::BTreeMap;

use tracing::debug;

use grime_core::{DatasetKind, PRODUCTS, Region, SalesTransaction};

use crate::errors::GenerationError;
use crate::generators::{
    GeneratedBatch, GenerationContext, RecordGenerator, ensure_rows, round4,
};
use crate::policy::CorruptionPolicy;
use crate::pool::{Pool, PoolSpec};
use crate::rates::TransactionRates;

pub const TRANSACTION_POOL: &str = "transaction_ids";

pub const NEGATIVE_TOTAL: &str = "negative_total";
pub const FUTURE_DATE: &str = "future_date";
pub const TRANSACTION_ID_REUSE: &str = "transaction_id_reuse";

#[derive(Debug, Clone)]
pub struct SalesTransactionGenerator {
    rates: TransactionRates,
    negative_total: CorruptionPolicy,
    future_date: CorruptionPolicy,
    id_reuse: CorruptionPolicy,
}

impl SalesTransactionGenerator {
    pub fn new(rates: TransactionRates) -> Result<Self, GenerationError> {
        rates.validate()?;
        Ok(Self {
            negative_total: CorruptionPolicy::new(NEGATIVE_TOTAL, rates.negative_total)?,
            future_date: CorruptionPolicy::new(FUTURE_DATE, rates.future_date)?,
            id_reuse: CorruptionPolicy::new(TRANSACTION_ID_REUSE, rates.id_reuse)?,
            rates,
        })
    }

    pub fn rates(&self) -> &TransactionRates {
        &self.rates
    }
}

impl RecordGenerator for SalesTransactionGenerator {
    type Record = SalesTransaction;

    fn dataset(&self) -> DatasetKind {
        DatasetKind::Transactions
    }

    fn generate(
        &self,
        ctx: &mut GenerationContext<'_>,
        rows: usize,
    ) -> Result<GeneratedBatch<SalesTransaction>, GenerationError> {
        ensure_rows(self.dataset(), rows)?;
        let id_spec = PoolSpec::new(
            TRANSACTION_POOL,
            rows,
            self.rates.id_dup_ratio,
            self.rates.id_bucket,
        );
        id_spec.size()?;

        let ids = Pool::build(id_spec, ctx, |ctx| ctx.uuid())?;
        let mut id_cursor = ids.cursor();

        let past = (ctx.days_before(self.rates.lookback_days), ctx.as_of);
        let future = (ctx.days_after(1), ctx.days_after(self.rates.future_window_days));
        let jitter = self.rates.price_jitter;

        let mut records = Vec::with_capacity(rows);
        for row in 0..rows {
            let product = *ctx.stream.pick(&PRODUCTS);
            let quantity = ctx.stream.int_inclusive(1, self.rates.max_quantity);
            let unit_price = round4(product.price * ctx.stream.uniform(1.0 - jitter, 1.0 + jitter));
            let total = round4(quantity as f64 * unit_price);
            let total_amount = self
                .negative_total
                .apply(ctx, |_| total, |_| -total.abs());
            let (start, end) = self.future_date.apply(ctx, |_| past, |_| future);
            let transaction_date = ctx.faker.date_between(start, end, &mut ctx.stream);
            let transaction_id = self.id_reuse.apply_or_clean(
                ctx,
                id_cursor.must_take(rows - row),
                |_| id_cursor.next_value().to_string(),
                |ctx| ids.choose_reused(&mut ctx.stream).to_string(),
            );
            let user_id = ctx.uuid();
            let region = *ctx.stream.pick(&Region::ALL);

            records.push(SalesTransaction {
                transaction_id,
                user_id,
                product_id: product.id.to_string(),
                product_name: product.name.to_string(),
                category: product.category.to_string(),
                quantity,
                unit_price,
                total_amount,
                region,
                transaction_date,
            });
        }

        debug!(
            dataset = %self.dataset(),
            rows,
            ids_assigned = id_cursor.taken(),
            "transactions generated"
        );

        Ok(GeneratedBatch {
            records,
            pools: BTreeMap::from([(TRANSACTION_POOL, ids.len())]),
        })
    }
}
