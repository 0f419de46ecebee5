use std::time::Duration;

/// Per-append samples, one entry each per successful `add_block`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ChainMetrics {
    pub block_times: Vec<Duration>,
    pub tx_counts: Vec<usize>,
}

impl ChainMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, elapsed: Duration, tx_count: usize) {
        self.block_times.push(elapsed);
        self.tx_counts.push(tx_count);
    }

    pub fn blocks_recorded(&self) -> usize {
        self.block_times.len()
    }

    pub fn average_block_time(&self) -> Option<Duration> {
        if self.block_times.is_empty() {
            return None;
        }
        let total: Duration = self.block_times.iter().sum();
        Some(total / self.block_times.len() as u32)
    }

    pub fn total_transactions(&self) -> usize {
        self.tx_counts.iter().sum()
    }

    /// Transactions per second over all recorded append time.
    pub fn throughput(&self) -> Option<f64> {
        let total: Duration = self.block_times.iter().sum();
        if total.is_zero() {
            return None;
        }
        Some(self.total_transactions() as f64 / total.as_secs_f64())
    }
}
