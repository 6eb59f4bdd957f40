/// Level-payment amortization schedule with a fixed periodic rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amortization {
    principal: f64,
    periodic_rate: f64,
    periods: u32,
}

impl Amortization {
    pub fn new(principal: f64, periodic_rate: f64, periods: u32) -> Self {
        Self {
            principal,
            periodic_rate,
            periods: periods.max(1),
        }
    }

    /// Scheduled payment per period.
    pub fn payment(&self) -> f64 {
        let n = self.periods as f64;
        if self.periodic_rate.abs() < f64::EPSILON {
            return self.principal / n;
        }

        let growth = (1.0 + self.periodic_rate).powf(n);
        self.principal * self.periodic_rate * growth / (growth - 1.0)
    }

    /// Outstanding balance after `months` scheduled payments.
    pub fn balance_after(&self, months: u32) -> f64 {
        let k = months.min(self.periods);
        if k == self.periods {
            return 0.0;
        }

        let payment = self.payment();
        let balance = if self.periodic_rate.abs() < f64::EPSILON {
            self.principal - payment * k as f64
        } else {
            let growth = (1.0 + self.periodic_rate).powf(k as f64);
            self.principal * growth - payment * (growth - 1.0) / self.periodic_rate
        };
        balance.max(0.0)
    }

    /// Interest paid when the loan is held `months` and any remainder is paid off.
    pub fn interest_through(&self, months: u32) -> f64 {
        let k = months.min(self.periods);
        let paid = self.payment() * k as f64 + self.balance_after(k);
        (paid - self.principal).max(0.0)
    }

    pub fn total_paid(&self) -> f64 {
        self.payment() * self.periods as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_repays_evenly() {
        let schedule = Amortization::new(12_000.0, 0.0, 12);
        assert_eq!(schedule.payment(), 1_000.0);
        assert!((schedule.balance_after(3) - 9_000.0).abs() < 1e-9);
        assert_eq!(schedule.interest_through(12), 0.0);
    }

    #[test]
    fn full_term_interest_matches_total_paid() {
        let schedule = Amortization::new(100_000.0, 0.004, 60);
        let interest = schedule.interest_through(60);
        assert!((interest + 100_000.0 - schedule.total_paid()).abs() < 1e-6);
    }

    #[test]
    fn early_exit_pays_less_interest() {
        let schedule = Amortization::new(100_000.0, 0.004, 60);
        assert!(schedule.interest_through(24) < schedule.interest_through(60));
        assert!(schedule.balance_after(24) > 0.0);
        assert_eq!(schedule.balance_after(60), 0.0);
    }
}
