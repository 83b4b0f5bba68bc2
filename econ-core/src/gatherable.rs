use crate::config::EconomyConfig;
use econ_domain::{CommodityCatalog, CommodityId, Vector2};
use mockall::automock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// The part of a ship the gathering code needs to see.
#[automock]
pub trait CargoHold {
    fn position(&self) -> Vector2;

    /// Adds up to `quantity` units and returns how many actually fit.
    fn add_cargo(&mut self, commodity: CommodityId, quantity: u32) -> u32;

    fn free_space(&self) -> u32;

    fn is_player(&self) -> bool;
}

/// Cargo floating in space.
#[derive(Debug, Clone, PartialEq)]
pub struct Gatherable {
    pub commodity: CommodityId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub age: f64,
    pub lifespan: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatherEvent {
    Gathered { commodity: CommodityId, quantity: u32 },
    HoldFull,
    CannotGather,
}

#[derive(Debug, Clone)]
pub struct GatherableField {
    items: Vec<Gatherable>,
    no_scoop_timer: f64,
    gather_distance: f64,
    notice_interval: f64,
    rng: StdRng,
}

impl GatherableField {
    pub fn new(cfg: &EconomyConfig, seed: u64) -> Self {
        Self {
            items: Vec::new(),
            no_scoop_timer: 0.0,
            gather_distance: cfg.gather_distance,
            notice_interval: cfg.gather_notice_interval,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Gatherable] {
        &self.items
    }

    pub fn spawn(&mut self, commodity: CommodityId, position: Vector2, velocity: Vector2) -> usize {
        let lifespan = self.rng.gen::<f64>() * 100.0 + 50.0;
        self.items.push(Gatherable {
            commodity,
            position,
            velocity,
            age: 0.0,
            lifespan,
        });
        self.items.len() - 1
    }

    /// Moves and ages every pickup, dropping those that outlived their lifespan.
    pub fn update(&mut self, dt: f64) {
        self.no_scoop_timer += dt;
        for item in self.items.iter_mut() {
            let displacement = item.velocity.scaled(dt);
            item.age += dt;
            item.position += displacement;
        }
        self.items.retain(|item| item.age <= item.lifespan);
    }

    /// Index of the nearest pickup strictly within `radius` of `position`.
    pub fn closest(&self, position: Vector2, radius: f64) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| (idx, position.distance_to(&item.position)))
            .filter(|(_, distance)| *distance < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }

    /// Position and velocity of a pickup.
    pub fn position(&self, id: usize) -> Option<(Vector2, Vector2)> {
        self.items.get(id).map(|item| (item.position, item.velocity))
    }

    /// Scoops every pickup within reach of the hold.
    ///
    /// A failed scoop leaves the pickup in space. The "cannot gather" notice is given at most once per
    /// notice interval.
    pub fn gather(&mut self, hold: &mut dyn CargoHold, catalog: &CommodityCatalog) -> Vec<GatherEvent> {
        let mut events = Vec::new();
        let here = hold.position();
        let mut idx = 0;

        while idx < self.items.len() {
            if here.distance_to(&self.items[idx].position) >= self.gather_distance {
                idx += 1;
                continue;
            }

            let commodity = self.items[idx].commodity;
            let quantity = hold.add_cargo(commodity, self.rng.gen_range(1..=5));

            if quantity > 0 {
                self.items.remove(idx);
                if hold.is_player() {
                    info!("{} {} of {} gathered", quantity, if quantity == 1 { "ton" } else { "tons" }, catalog.commodity(commodity).name);
                }
                events.push(GatherEvent::Gathered { commodity, quantity });

                if hold.free_space() < 1 && hold.is_player() {
                    info!("No more cargo space available");
                    events.push(GatherEvent::HoldFull);
                }
            } else {
                if hold.is_player() && self.no_scoop_timer > self.notice_interval {
                    self.no_scoop_timer = 0.0;
                    info!("Cannot gather material: no more cargo space available");
                    events.push(GatherEvent::CannotGather);
                }
                idx += 1;
            }
        }

        events
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
