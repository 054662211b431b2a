//! `Projectile`: an [`EntityDynamic`] plus damage, attribute flags, and
//! a hit callback. Grounded on `balix/projectile/projectile.h`'s
//! `projectile_t`/`on_hit` pairing, reshaped around `EntityDynamic`
//! rather than the source's separate shell/missile structs (those are
//! distinguished here by whether a [`crate::propulsion::Propulsion`] is
//! attached by the caller, not by a type tag).

use std::ops::{BitOr, BitOrAssign};

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::entity::{entity_radius, EntityDynamic};

/// Behavioral flags a projectile can carry, as a plain bitset over
/// `u8`. `PIERCE` and `ANCHOR` are read by whatever owns `on_hit`'s
/// invocation (the predictor just reports the hit); the engine core
/// does not special-case them beyond carrying the bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct ProjectileAttrs(u8);

impl ProjectileAttrs {
    pub const NONE: Self = Self(0);
    pub const IMPACT: Self = Self(1 << 0);
    pub const PIERCE: Self = Self(1 << 1);
    pub const ANCHOR: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ProjectileAttrs {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ProjectileAttrs {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Invoked at most once per projectile, on impact or on lifetime
/// expiry. The no-op default matches `projectile_default_hit_cb`.
pub type HitCallback = fn(&Projectile);

fn default_hit_cb(_proj: &Projectile) {}

#[derive(Clone)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct Projectile {
    pub base: EntityDynamic,
    pub damage: f32,
    pub attrs: ProjectileAttrs,
    #[cfg_attr(feature = "with-serde", serde(skip, default = "default_on_hit"))]
    pub on_hit: HitCallback,
    already_hit: bool,
}

fn default_on_hit() -> HitCallback {
    default_hit_cb
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            base: EntityDynamic::default(),
            damage: 1.0,
            attrs: ProjectileAttrs::NONE,
            on_hit: default_hit_cb,
            already_hit: false,
        }
    }
}

impl Projectile {
    pub fn new(base: EntityDynamic) -> Self {
        Self { base, ..Default::default() }
    }

    /// This projectile's own collision radius; see [`entity_radius`].
    /// Sphere CCD against a target uses the *sum* of both radii, not
    /// this alone.
    pub fn entity_size(&self) -> f32 {
        entity_radius(&self.base)
    }

    /// Fires `on_hit` exactly once; subsequent calls (e.g. a stray
    /// repeat from a ticker that hasn't detached yet) are no-ops.
    pub fn fire_hit_once(&mut self) {
        if self.already_hit {
            return;
        }
        self.already_hit = true;
        (self.on_hit)(self);
    }

    pub fn has_fired_hit(&self) -> bool {
        self.already_hit
    }
}
