use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Credits(pub i64);

impl Credits {
    pub fn new(amount: i64) -> Self {
        Credits(amount)
    }

    /// Rounds a computed price to the nearest whole credit.
    pub fn from_price(price: f64) -> Self {
        Credits(price.round() as i64)
    }

    pub fn amount(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Credits {
    type Output = Credits;

    fn add(self, other: Credits) -> Credits {
        Credits(self.0 + other.0)
    }
}

impl AddAssign for Credits {
    fn add_assign(&mut self, other: Credits) {
        self.0 += other.0;
    }
}

impl Sub for Credits {
    type Output = Credits;

    fn sub(self, other: Credits) -> Credits {
        Credits(self.0 - other.0)
    }
}

impl SubAssign for Credits {
    fn sub_assign(&mut self, other: Credits) {
        self.0 -= other.0;
    }
}

impl From<i64> for Credits {
    fn from(amount: i64) -> Self {
        Credits(amount)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cr", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_price_rounds_to_nearest() {
        assert_eq!(Credits::from_price(99.49), Credits(99));
        assert_eq!(Credits::from_price(99.5), Credits(100));
        assert_eq!(Credits::from_price(100.2), Credits(100));
    }

    #[test]
    fn arithmetic() {
        let mut c = Credits::new(10);
        c += Credits::new(5);
        c -= Credits::new(3);
        assert_eq!(c, Credits(12));
        assert!(c.is_positive());
        assert!((c - Credits(12)).is_zero());
    }
}
