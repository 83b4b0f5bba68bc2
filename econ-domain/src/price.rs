use crate::{Credits, SimTime};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Price state of one commodity on one planet.
///
/// Holds the static sinusoid computed at startup and the running statistics of the prices the
/// player has actually seen there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommodityPrice {
    pub price: f64,
    pub planet_variation: f64,
    pub sys_variation: f64,
    pub planet_period: f64,
    pub sys_period: f64,
    pub sum: f64,
    pub sum2: f64,
    pub cnt: u32,
    pub update_time: SimTime,
}

impl CommodityPrice {
    pub fn new(base_price: f64) -> Self {
        Self {
            price: base_price,
            planet_variation: 0.0,
            sys_variation: 0.0,
            planet_period: 0.0,
            sys_period: 0.0,
            sum: 0.0,
            sum2: 0.0,
            cnt: 0,
            update_time: SimTime::ZERO,
        }
    }

    /// Instantaneous price at `t` standard time periods.
    ///
    /// A component with a non-positive period is treated as flat.
    pub fn price_at(&self, t: f64) -> f64 {
        self.price + oscillation(self.planet_variation, self.planet_period, t) + oscillation(self.sys_variation, self.sys_period, t)
    }

    pub fn has_observations(&self) -> bool {
        self.cnt > 0
    }

    /// Appends one observation unless this record was already stamped at or after `now`.
    pub fn record_observation(&mut self, price: Credits, now: SimTime) -> bool {
        if self.update_time >= now {
            return false;
        }
        let price = price.as_f64();
        self.update_time = now;
        self.cnt += 1;
        self.sum += price;
        self.sum2 += price * price;
        true
    }

    pub fn mean(&self) -> Option<f64> {
        self.has_observations().then(|| self.sum / self.cnt as f64)
    }

    /// Population standard deviation of the observed prices.
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self.sum2 / self.cnt as f64 - mean * mean;
        Some(variance.max(0.0).sqrt())
    }

    pub fn clear_observations(&mut self) {
        self.sum = 0.0;
        self.sum2 = 0.0;
        self.cnt = 0;
        self.update_time = SimTime::ZERO;
    }
}

fn oscillation(amplitude: f64, period: f64, t: f64) -> f64 {
    if period <= 0.0 {
        return 0.0;
    }
    amplitude * (2.0 * PI * t / period).sin()
}
