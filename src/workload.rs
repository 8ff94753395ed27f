//! Workload shape: how many tables, and which items each worker owns.
//!
//! Worker `i` owns items `[item_amount * i, item_amount * (i + 1))`. The
//! ranges are disjoint and together cover `[0, item_amount * worker_count)`,
//! so a correct store ends with exactly `item_amount * worker_count` items in
//! every table.

use std::ops::Range;

use crate::config::WorkloadConfig;
use crate::core_types::{ItemId, TableId, WorkerIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workload {
    pub table_amount: u32,
    pub item_amount: u32,
    pub worker_count: u32,
}

impl Workload {
    pub fn new(table_amount: u32, item_amount: u32, worker_count: u32) -> Self {
        Self {
            table_amount,
            item_amount,
            worker_count,
        }
    }

    /// Items written by `worker`, in write order.
    pub fn item_range(&self, worker: WorkerIndex) -> Range<ItemId> {
        let start = self.item_amount * worker;
        start..start + self.item_amount
    }

    pub fn tables(&self) -> Range<TableId> {
        0..self.table_amount
    }

    pub fn workers(&self) -> Range<WorkerIndex> {
        0..self.worker_count
    }

    /// Item count every table must report after all writers finish.
    pub fn expected_per_table(&self) -> usize {
        self.item_amount as usize * self.worker_count as usize
    }

    /// Write exchanges one worker performs.
    pub fn writes_per_worker(&self) -> u64 {
        self.table_amount as u64 * self.item_amount as u64
    }

    pub fn total_writes(&self) -> u64 {
        self.writes_per_worker() * self.worker_count as u64
    }
}

impl From<&WorkloadConfig> for Workload {
    fn from(config: &WorkloadConfig) -> Self {
        Self::new(
            config.table_amount,
            config.item_amount,
            config.worker_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ranges_partition_the_id_space() {
        for workers in 1..=12u32 {
            for items in 1..=9u32 {
                let w = Workload::new(1, items, workers);
                let mut seen = vec![0u32; (items * workers) as usize];
                for worker in w.workers() {
                    for item in w.item_range(worker) {
                        seen[item as usize] += 1;
                    }
                }
                assert!(
                    seen.iter().all(|&c| c == 1),
                    "workers={} items={}",
                    workers,
                    items
                );
            }
        }
    }

    #[test]
    fn test_ranges_are_contiguous_and_ordered() {
        let w = Workload::new(100, 20, 10);
        assert_eq!(w.item_range(0), 0..20);
        assert_eq!(w.item_range(1), 20..40);
        assert_eq!(w.item_range(9), 180..200);
        for worker in 1..w.worker_count {
            assert_eq!(w.item_range(worker - 1).end, w.item_range(worker).start);
        }
    }

    #[test]
    fn test_default_scenario_counts() {
        let w = Workload::from(&WorkloadConfig::default());
        assert_eq!(w.expected_per_table(), 200);
        assert_eq!(w.writes_per_worker(), 2_000);
        assert_eq!(w.total_writes(), 20_000);
        assert_eq!(w.tables(), 0..100);
    }
}
