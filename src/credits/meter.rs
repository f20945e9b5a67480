// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::credits::{BillableOperation, PriceTable};
use crate::model::JobId;

/// Additive per-job credit counters.
///
/// Counters only ever grow; the map lock is held just long enough to find or
/// insert a job's counter, after which charging is a single atomic add.
#[derive(Debug, Default)]
pub struct CreditMeter {
    prices: PriceTable,
    totals: Mutex<HashMap<JobId, Arc<AtomicU64>>>,
}

impl CreditMeter {
    pub fn new(prices: PriceTable) -> Self {
        Self {
            prices,
            totals: Mutex::new(HashMap::new()),
        }
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    fn counter(&self, job_id: JobId) -> Arc<AtomicU64> {
        let mut totals: MutexGuard<'_, _> =
            self.totals.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(totals.entry(job_id).or_default())
    }

    /// Charge a successful invocation. Returns the job's new total.
    pub fn charge(&self, job_id: JobId, operation: &BillableOperation) -> u64 {
        let cost = self.prices.price(operation);
        let total = self.counter(job_id).fetch_add(cost, Ordering::SeqCst) + cost;
        debug!(job_id = %job_id, operation = %operation, cost, total, "Charged credits");
        total
    }

    /// Record an invocation that ended in a fallback. Fallbacks are free.
    pub fn charge_fallback(&self, job_id: JobId, operation: &BillableOperation) -> u64 {
        debug!(job_id = %job_id, operation = %operation, "Fallback used, no charge");
        self.total(job_id)
    }

    /// Current total for a job; zero for unknown jobs.
    pub fn total(&self, job_id: JobId) -> u64 {
        self.totals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Forget a finished job's counter, returning its final total.
    pub fn release(&self, job_id: JobId) -> u64 {
        self.totals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&job_id)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}
