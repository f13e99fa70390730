//! Entity Pool Builder.
//!
//! A pool is deliberately smaller than the record count it serves: with
//! `floor(total * (1 - dup_ratio))` unique values handed out positionally,
//! the share of repeated keys is fixed by construction rather than by
//! per-record chance. The pool prefix of `bucket` values is the reuse bucket
//! that dirty branches sample, so injected duplicates cluster on a bounded,
//! inspectable key set.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::GenerationError;
use crate::generators::GenerationContext;
use crate::stream::RandomStream;

/// Consecutive collisions tolerated before a pool build gives up.
const MAX_CONSECUTIVE_COLLISIONS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSpec {
    pub name: &'static str,
    pub total: usize,
    pub dup_ratio: f64,
    pub bucket: usize,
}

impl PoolSpec {
    pub fn new(name: &'static str, total: usize, dup_ratio: f64, bucket: usize) -> Self {
        Self {
            name,
            total,
            dup_ratio,
            bucket,
        }
    }

    /// A pool of exactly `size` values with no duplication target.
    pub fn fixed(name: &'static str, size: usize, bucket: usize) -> Self {
        Self::new(name, size, 0.0, bucket)
    }

    /// Number of unique values: `floor(total * (1 - dup_ratio))`, at least 1.
    pub fn size(&self) -> Result<usize, GenerationError> {
        if self.total == 0 {
            return Err(GenerationError::config(format!(
                "pool '{}' needs a positive total count",
                self.name
            )));
        }
        if !(0.0..1.0).contains(&self.dup_ratio) {
            return Err(GenerationError::config(format!(
                "pool '{}' dup_ratio must be in [0, 1), got {}",
                self.name, self.dup_ratio
            )));
        }
        if self.bucket == 0 {
            return Err(GenerationError::config(format!(
                "pool '{}' reuse bucket must be positive",
                self.name
            )));
        }
        let exact = self.total as f64 * (1.0 - self.dup_ratio);
        Ok(((exact + 1e-9).floor() as usize).clamp(1, self.total))
    }
}

/// Ordered sequence of unique key values.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    name: &'static str,
    values: Vec<String>,
    bucket: usize,
}

impl Pool {
    /// Draw unique values from `value` until the pool is full. Collisions are
    /// discarded and redrawn.
    pub fn build<'a>(
        spec: PoolSpec,
        ctx: &mut GenerationContext<'a>,
        mut value: impl FnMut(&mut GenerationContext<'a>) -> String,
    ) -> Result<Pool, GenerationError> {
        let size = spec.size()?;
        let mut seen = HashSet::with_capacity(size);
        let mut values = Vec::with_capacity(size);
        let mut attempts = 0_usize;
        let mut misses = 0_usize;

        while values.len() < size {
            attempts += 1;
            let candidate = value(ctx);
            if seen.insert(candidate.clone()) {
                values.push(candidate);
                misses = 0;
                continue;
            }
            misses += 1;
            if misses >= MAX_CONSECUTIVE_COLLISIONS {
                return Err(GenerationError::PoolExhausted {
                    pool: spec.name,
                    requested: size,
                    produced: values.len(),
                    attempts,
                });
            }
        }

        debug!(
            pool = spec.name,
            size,
            collisions = attempts - size,
            bucket = spec.bucket.min(size),
            "pool built"
        );

        Ok(Pool {
            name: spec.name,
            values,
            bucket: spec.bucket,
        })
    }

    /// Wrap pre-built values. Values must already be unique.
    pub fn from_values(
        name: &'static str,
        values: Vec<String>,
        bucket: usize,
    ) -> Result<Pool, GenerationError> {
        if values.is_empty() || bucket == 0 {
            return Err(GenerationError::config(format!(
                "pool '{name}' needs at least one value and a positive bucket"
            )));
        }
        let unique: HashSet<&String> = values.iter().collect();
        if unique.len() != values.len() {
            return Err(GenerationError::config(format!(
                "pool '{name}' contains repeated values"
            )));
        }
        Ok(Pool {
            name,
            values,
            bucket,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The deterministic prefix dirty branches draw from.
    pub fn reuse_bucket(&self) -> &[String] {
        &self.values[..self.bucket.min(self.values.len())]
    }

    /// Uniform choice over the whole pool.
    pub fn choose(&self, stream: &mut RandomStream) -> &str {
        stream.pick(&self.values).as_str()
    }

    /// Uniform choice over the reuse bucket.
    pub fn choose_reused(&self, stream: &mut RandomStream) -> &str {
        stream.pick(self.reuse_bucket()).as_str()
    }

    pub fn cursor(&self) -> PoolCursor<'_> {
        PoolCursor {
            pool: self,
            position: 0,
        }
    }
}

/// Positional assignment over a pool, wrapping at the end. The cursor only
/// moves when a value is taken, so every pool value is handed out once
/// before any position repeats.
#[derive(Debug, Clone)]
pub struct PoolCursor<'p> {
    pool: &'p Pool,
    position: usize,
}

impl<'p> PoolCursor<'p> {
    pub fn next_value(&mut self) -> &'p str {
        let value = &self.pool.values[self.position % self.pool.values.len()];
        self.position += 1;
        value
    }

    /// Values taken so far.
    pub fn taken(&self) -> usize {
        self.position
    }

    /// Pool values not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pool.values.len().saturating_sub(self.position)
    }

    /// True when `rows_left` rows are only just enough to hand out every
    /// remaining value, so the next row must take from the cursor.
    pub fn must_take(&self, rows_left: usize) -> bool {
        rows_left <= self.remaining()
    }
}
