use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct CommoditySymbol(pub String);

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct SystemSymbol(pub String);

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct PlanetSymbol(pub String);

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct FactionSymbol(pub String);

/// Path of a render asset. The economy never loads these, it only hands them to the renderer.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetHandle(pub String);

macro_rules! impl_symbol_display {
    ($($t:ty),*) => {
        $(
            impl fmt::Display for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_symbol_display!(CommoditySymbol, SystemSymbol, PlanetSymbol, FactionSymbol, AssetHandle);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct CommodityId(pub usize);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct SystemId(pub usize);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct PlanetId(pub usize);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct FactionId(pub usize);

/// Divisors of the simulation clock.
///
/// The raw clock counts "ntime" units. `stu_div` of them make one standard time unit (STU),
/// `stp_stu` STU make one standard time period (STP). Price oscillations are expressed in STP.
/// Taking off and landing costs roughly one STP, a single jump roughly three.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pub stu_div: u64,
    pub stp_stu: u64,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self { stu_div: 1_000, stp_stu: 10_000 }
    }
}

/// A point on the simulation clock, in ntime units.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn to_stu(&self, scale: &TimeScale) -> f64 {
        self.0 as f64 / scale.stu_div as f64
    }

    pub fn to_stp(&self, scale: &TimeScale) -> f64 {
        self.to_stu(scale) / scale.stp_stu as f64
    }

    pub fn from_stp(stp: f64, scale: &TimeScale) -> SimTime {
        SimTime((stp * scale.stp_stu as f64 * scale.stu_div as f64).round() as u64)
    }
}

impl Add for SimTime {
    type Output = SimTime;

    fn add(self, other: SimTime) -> SimTime {
        SimTime(self.0 + other.0)
    }
}

impl AddAssign for SimTime {
    fn add_assign(&mut self, other: SimTime) {
        self.0 += other.0;
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}nt", self.0)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Vector2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn scaled(&self, factor: f64) -> Vector2 {
        Vector2::new(self.x * factor, self.y * factor)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Vector2) {
        self.x += other.x;
        self.y += other.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_stp_is_ten_million_ntime() {
        let scale = TimeScale::default();
        assert_eq!(SimTime(10_000_000).to_stp(&scale), 1.0);
        assert_eq!(SimTime::from_stp(3.0, &scale), SimTime(30_000_000));
    }

    #[test]
    fn sim_time_subtraction_saturates() {
        assert_eq!(SimTime(5) - SimTime(10), SimTime::ZERO);
    }

    #[test]
    fn vector_distance() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(a + b.scaled(2.0), Vector2::new(6.0, 8.0));
    }
}
