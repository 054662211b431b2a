//! Thrust plant: fuel, efficiency, thermal loss, response-rate
//! limiting, wear, and an optionally embedded [`Controller`] driving
//! thrust toward a target value. Grounded on `projectile/propulsion.h`.

use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use byul_numeq::Controller;

/// Thrust plant state. Defaults match `propulsion_init`'s "small rocket
/// engine or drone motor" reference numbers from the source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct Propulsion {
    pub max_thrust: f32,
    pub current_thrust: f32,
    pub fuel_capacity: f32,
    pub fuel_remaining: f32,
    pub burn_rate: f32,
    pub efficiency: f32,
    pub thermal_loss: f32,
    pub energy_density: f32,
    pub response_time: f32,
    pub max_thrust_rate: f32,
    pub delay_time: f32,
    pub heat: f32,
    pub heat_dissipation_rate: f32,
    pub wear_level: f32,
    pub controller: Option<Controller>,
    pub active: bool,
}

impl Default for Propulsion {
    fn default() -> Self {
        Self {
            max_thrust: 120.0,
            current_thrust: 0.0,
            fuel_capacity: 50.0,
            fuel_remaining: 50.0,
            burn_rate: 0.05,
            efficiency: 0.7,
            thermal_loss: 0.05,
            energy_density: 42.0,
            response_time: 0.8,
            max_thrust_rate: 30.0,
            delay_time: 0.2,
            heat: 0.0,
            heat_dissipation_rate: 0.3,
            wear_level: 0.0,
            controller: None,
            active: false,
        }
    }
}

impl Propulsion {
    pub fn new(max_thrust: f32, fuel_capacity: f32, burn_rate: f32, controller: Option<Controller>, active: bool) -> Self {
        Self {
            max_thrust,
            fuel_capacity,
            fuel_remaining: fuel_capacity,
            burn_rate,
            controller,
            active,
            ..Default::default()
        }
    }

    /// Resets fuel and thrust to their initial-capacity state; leaves
    /// max_thrust/efficiency/etc. and the attached controller alone.
    pub fn reset(&mut self) {
        self.current_thrust = 0.0;
        self.fuel_remaining = self.fuel_capacity;
        self.heat = 0.0;
        self.wear_level = 0.0;
        if let Some(c) = &mut self.controller {
            c.reset();
        }
    }

    /// Advances the plant one step toward `target_thrust`.
    pub fn update(&mut self, target_thrust: f32, dt: f32) {
        if !self.active || self.fuel_remaining <= 0.0 {
            self.current_thrust = 0.0;
            self.active = false;
            return;
        }

        let target_thrust = target_thrust.clamp(0.0, self.max_thrust);

        let mut desired = if let Some(ctrl) = &mut self.controller {
            ctrl.compute(target_thrust, self.current_thrust, dt).clamp(0.0, self.max_thrust)
        } else {
            target_thrust
        };

        desired *= self.efficiency * (1.0 - self.thermal_loss) * (1.0 - 0.3 * self.wear_level);

        let delta_max = self.max_thrust_rate * dt;
        let delta = (desired - self.current_thrust).clamp(-delta_max, delta_max);
        self.current_thrust += delta;

        let need = self.burn_rate * self.current_thrust * dt;
        if need >= self.fuel_remaining {
            if self.burn_rate * dt > 0.0 {
                self.current_thrust = self.fuel_remaining / (self.burn_rate * dt);
            } else {
                self.current_thrust = 0.0;
            }
            self.fuel_remaining = 0.0;
            self.active = false;
        } else {
            self.fuel_remaining -= need;
        }

        self.heat = (self.heat + 0.05 * self.current_thrust - self.heat_dissipation_rate * dt).max(0.0);
        self.wear_level = (self.wear_level + 1e-4 * self.current_thrust * dt).min(1.0);
    }

    pub fn get_thrust(&self) -> f32 {
        self.current_thrust
    }

    pub fn is_empty(&self) -> bool {
        self.fuel_remaining <= 0.0
    }

    pub fn fuel_ratio(&self) -> f32 {
        if self.fuel_capacity <= 0.0 {
            0.0
        } else {
            self.fuel_remaining / self.fuel_capacity
        }
    }

    /// `fuel_remaining / (burn_rate * current_thrust)`; 0 when
    /// current_thrust is 0 (no burn, so "runtime" is undefined/moot).
    pub fn max_runtime(&self) -> f32 {
        if self.burn_rate <= 0.0 || self.current_thrust <= 0.0 {
            0.0
        } else {
            self.fuel_remaining / (self.burn_rate * self.current_thrust)
        }
    }

    pub fn refuel(&mut self, amount: f32) {
        self.fuel_remaining = (self.fuel_remaining + amount).min(self.fuel_capacity);
    }

    /// Forces fuel consumption (e.g. leak simulation); deactivates once
    /// fuel reaches zero.
    pub fn consume(&mut self, amount: f32) {
        self.fuel_remaining = (self.fuel_remaining - amount).max(0.0);
        if self.fuel_remaining <= 0.0 {
            self.active = false;
        }
    }

    pub fn remaining_impulse(&self) -> f32 {
        if self.burn_rate <= 0.0 {
            0.0
        } else {
            self.fuel_remaining / self.burn_rate
        }
    }

    /// `runtime = fuel_remaining / (burn_rate * desired_thrust)`; 0 if
    /// `desired_thrust <= 0`.
    pub fn predict_runtime(&self, desired_thrust: f32) -> f32 {
        if desired_thrust <= 0.0 || self.burn_rate <= 0.0 {
            0.0
        } else {
            self.fuel_remaining / (self.burn_rate * desired_thrust)
        }
    }

    pub fn predict_empty_time(&self) -> f32 {
        self.predict_runtime(self.current_thrust)
    }

    /// `min(max_thrust, fuel_remaining / (burn_rate * duration))`.
    pub fn predict_max_thrust(&self, duration: f32) -> f32 {
        if duration <= 0.0 || self.burn_rate <= 0.0 {
            0.0
        } else {
            self.max_thrust.min(self.fuel_remaining / (self.burn_rate * duration))
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn attach_controller(&mut self, controller: Controller) {
        self.controller = Some(controller);
    }

    pub fn detach_controller(&mut self) {
        self.controller = None;
    }
}

impl fmt::Display for Propulsion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Propulsion {{ thrust: {:.2}/{:.2} N, fuel: {:.2}/{:.2} kg, active: {} }}",
            self.current_thrust, self.max_thrust, self.fuel_remaining, self.fuel_capacity, self.active
        )
    }
}
