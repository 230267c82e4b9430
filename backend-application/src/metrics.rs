use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    purchases: AtomicU64,
    purchase_failures: AtomicU64,
    reward_grants: AtomicU64,
    reward_grant_failures: AtomicU64,
    level_ups: AtomicU64,
    registrations: AtomicU64,
}

impl Metrics {
    pub fn record_purchase(&self, leveled_up: bool) {
        self.purchases.fetch_add(1, Ordering::Relaxed);
        if leveled_up {
            self.level_ups.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_level_up(&self) {
        self.level_ups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_purchase_failure(&self) {
        self.purchase_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reward_grant(&self) {
        self.reward_grants.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reward_grant_failure(&self) {
        self.reward_grant_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let purchases = self.purchases.load(Ordering::Relaxed);
        let purchase_failures = self.purchase_failures.load(Ordering::Relaxed);
        let grants = self.reward_grants.load(Ordering::Relaxed);
        let grant_failures = self.reward_grant_failures.load(Ordering::Relaxed);
        let level_ups = self.level_ups.load(Ordering::Relaxed);
        let registrations = self.registrations.load(Ordering::Relaxed);

        format!(
            "# TYPE hoard_purchases_total counter\n\
hoard_purchases_total {}\n\
# TYPE hoard_purchase_failures_total counter\n\
hoard_purchase_failures_total {}\n\
# TYPE hoard_reward_grants_total counter\n\
hoard_reward_grants_total {}\n\
# TYPE hoard_reward_grant_failures_total counter\n\
hoard_reward_grant_failures_total {}\n\
# TYPE hoard_level_ups_total counter\n\
hoard_level_ups_total {}\n\
# TYPE hoard_registrations_total counter\n\
hoard_registrations_total {}\n",
            purchases, purchase_failures, grants, grant_failures, level_ups, registrations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters() {
        let metrics = Metrics::default();
        metrics.record_purchase(true);
        metrics.record_purchase(false);
        metrics.record_reward_grant_failure();
        let text = metrics.render_prometheus();
        assert!(text.contains("hoard_purchases_total 2\n"));
        assert!(text.contains("hoard_level_ups_total 1\n"));
        assert!(text.contains("hoard_reward_grant_failures_total 1\n"));
        assert!(text.contains("hoard_registrations_total 0\n"));
    }
}
