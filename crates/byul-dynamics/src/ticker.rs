//! Online stateful driver: `ProjectileTick` advances a projectile one
//! `dt` at a time from an external tick source, rather than running
//! the whole trajectory to completion like [`crate::predictor`].
//! Grounded on `balix/projectile/projectile.h`'s tick-driver contract
//! (§5 of the spec names only the callback shape, not a timing policy,
//! as in scope — so the driver itself lives outside this crate).

use byul_core::{AttitudeState, Environ, EnvironPeriodic, LinearState, MotionState, Trajectory, Vec3};
use byul_numeq::integrator::rk4_env_step;
use byul_numeq::model::sphere_ccd_substep;

use crate::entity::{entity_radius, EntityDynamic};
use crate::predictor::{assemble_thrust_accel, GuidanceFn};
use crate::projectile::Projectile;
use crate::propulsion::Propulsion;

/// Ground generalization hook. The only implementation this crate
/// ships is [`HalfSpaceGround`] (`y = 0`); a richer mesh/heightfield
/// ground is out of scope (source is under-specified there — see
/// `DESIGN.md`).
pub trait GroundShape {
    /// First crossing time `tau` in `[0, dt]`, or `None` if the step
    /// doesn't cross the surface.
    fn raycast(&self, p_prev: Vec3, v_prev: Vec3, a: Vec3, p_curr: Vec3, dt: f32) -> Option<f32>;
}

/// `y = 0` half-space, matching the predictor's ground CCD exactly.
#[derive(Clone, Copy, Debug, Default)]
pub struct HalfSpaceGround;

impl GroundShape for HalfSpaceGround {
    fn raycast(&self, p_prev: Vec3, v_prev: Vec3, a: Vec3, p_curr: Vec3, dt: f32) -> Option<f32> {
        byul_numeq::model::ground_plane_ccd(p_prev, v_prev, a, p_curr, dt)
    }
}

/// Stateful per-tick simulation. Owns (deep-copy-on-clone) its
/// environment, ground, and propulsion; the projectile itself, the
/// guidance function, and the hit callback are driven externally.
pub struct ProjectileTick {
    pub projectile: Projectile,
    pub target: Option<EntityDynamic>,
    pub env: Option<Environ>,
    /// Drives `env.wind_vel` when set via [`Self::set_periodic_wind`],
    /// ticked once per step so the `periodic` built-in actually
    /// modulates the drag term instead of sitting unused.
    pub env_periodic: Option<EnvironPeriodic>,
    pub ground: HalfSpaceGround,
    pub propulsion: Option<Propulsion>,
    pub sample_trajectory: Option<Trajectory>,
    state: MotionState,
    elapsed: f32,
    attached: bool,
    completed: bool,
}

impl Clone for ProjectileTick {
    /// Deep copy: `env`/`propulsion` clone their owned state (the
    /// `Environ::clone` caveat around custom `environ_fn` hooks
    /// applies transitively here, same as a bare `Environ` clone).
    fn clone(&self) -> Self {
        Self {
            projectile: self.projectile.clone(),
            target: self.target,
            env: self.env.clone(),
            env_periodic: self.env_periodic,
            ground: self.ground,
            propulsion: self.propulsion.clone(),
            sample_trajectory: self.sample_trajectory.clone(),
            state: self.state,
            elapsed: self.elapsed,
            attached: self.attached,
            completed: self.completed,
        }
    }
}

impl ProjectileTick {
    pub fn new(projectile: Projectile, env: Option<Environ>, propulsion: Option<Propulsion>) -> Self {
        let state = MotionState {
            linear: LinearState::new(projectile.base.position(), projectile.base.velocity, Vec3::zero()),
            angular: AttitudeState::new(projectile.base.orientation(), projectile.base.angular_velocity, Vec3::zero()),
        };
        Self {
            projectile,
            target: None,
            env,
            env_periodic: None,
            ground: HalfSpaceGround,
            propulsion,
            sample_trajectory: None,
            state,
            elapsed: 0.0,
            attached: false,
            completed: false,
        }
    }

    /// Attaches a gust-modulated wind source; each `tick` writes its
    /// current wind back into `env.wind_vel` before the step runs.
    /// Requires `env` to already be set (a no-op otherwise).
    pub fn set_periodic_wind(&mut self, periodic: EnvironPeriodic) {
        self.env_periodic = Some(periodic);
    }

    /// Registers this instance with an external driver; subsequent
    /// `tick` calls run the simulation. Idempotent.
    pub fn prepare(&mut self) {
        self.attached = true;
        self.completed = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_impacted(&self) -> bool {
        self.projectile.has_fired_hit()
    }

    /// One driver callback. Returns `true` while still attached and
    /// simulating; `false` once detached (post-impact or expired).
    pub fn tick(&mut self, dt: f32, guidance: Option<&GuidanceFn<'_>>) -> bool {
        if !self.attached {
            return false;
        }
        if self.completed {
            self.complete();
            return false;
        }

        self.projectile.base.age += dt;
        if self.projectile.base.is_expired() {
            log::debug!("projectile {} expired at age {:.3}s, detaching", self.projectile.base.id, self.projectile.base.age);
            self.projectile.fire_hit_once();
            self.complete();
            return false;
        }

        if let (Some(periodic), Some(env)) = (self.env_periodic.as_mut(), self.env.as_mut()) {
            env.wind_vel = periodic.tick(dt);
        }

        let p_prev = self.state.linear.position;
        let v_prev = self.state.linear.velocity;

        let thrust_accel = assemble_thrust_accel(
            &self.projectile.base,
            self.target.as_ref(),
            guidance,
            self.propulsion.as_mut(),
            dt,
        );
        self.state.linear.acceleration = thrust_accel;
        self.state.linear = rk4_env_step(&self.state.linear, self.env.as_ref(), &self.projectile.base.props, dt);
        self.state.linear.velocity = self.projectile.base.props.apply_friction(self.state.linear.velocity, dt);

        self.projectile.base.xform.pos = self.state.linear.position;
        self.projectile.base.velocity = self.state.linear.velocity;

        if let Some(tgt) = self.target.as_mut() {
            tgt.advance(dt);
        }

        self.elapsed += dt;
        if let Some(traj) = self.sample_trajectory.as_mut() {
            traj.add_sample(self.elapsed, self.state);
        }

        let accel = self.state.linear.acceleration;

        if let Some(tgt) = self.target.as_ref() {
            let r_sum = self.projectile.entity_size() + entity_radius(tgt);
            let p_rel0 = p_prev - tgt.position();
            let v_rel0 = v_prev - tgt.velocity;
            if let Some(tau) = sphere_ccd_substep(p_rel0, v_rel0, accel, r_sum, dt) {
                let impact_pos = p_prev + v_prev.scale(tau) + accel.scale(0.5 * tau * tau);
                self.record_hit(impact_pos);
                return true;
            }
        }

        if let Some(tau) = self.ground.raycast(p_prev, v_prev, accel, self.state.linear.position, dt) {
            let impact_pos = Vec3::new(p_prev.x + v_prev.x * tau, 0.0, p_prev.z + v_prev.z * tau);
            self.projectile.base.is_grounded = true;
            self.record_hit(impact_pos);
            return true;
        }

        true
    }

    fn record_hit(&mut self, impact_pos: Vec3) {
        self.state.linear.position = impact_pos;
        self.projectile.base.xform.pos = impact_pos;
        self.projectile.fire_hit_once();
        self.completed = true;
    }

    /// Detaches from the driver. Called automatically the tick after a
    /// hit or expiry is recorded.
    pub fn complete(&mut self) {
        self.attached = false;
    }

    pub fn position(&self) -> Vec3 {
        self.state.linear.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byul_core::BodyProps;
    use crate::entity::Xform;

    fn falling() -> ProjectileTick {
        let mut base = EntityDynamic::new(Xform::new(Vec3::new(0.0, 50.0, 0.0), byul_core::Quat::identity()), Vec3::zero(), BodyProps { drag_coef: 0.0, ..Default::default() }, f32::INFINITY);
        base.props.cross_section = 0.0;
        let proj = Projectile::new(base);
        ProjectileTick::new(proj, Some(Environ::gravity_only()), None)
    }

    #[test]
    fn tick_eventually_hits_ground() {
        let mut t = falling();
        t.prepare();
        let mut impacted = false;
        for _ in 0..2000 {
            if !t.tick(0.01, None) {
                break;
            }
            if t.is_impacted() {
                impacted = true;
                break;
            }
        }
        assert!(impacted);
        assert!(t.position().y.abs() < 1.0);
        assert!(t.projectile.base.is_grounded);
    }

    #[test]
    fn tick_after_completion_detaches() {
        let mut t = falling();
        t.prepare();
        for _ in 0..2000 {
            if t.is_impacted() {
                break;
            }
            t.tick(0.01, None);
        }
        assert!(t.is_impacted());
        t.tick(0.01, None);
        assert!(!t.is_attached());
    }

    #[test]
    fn expiry_fires_hit_callback_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn cb(_p: &Projectile) {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }
        let mut base = EntityDynamic::new(Xform::identity(), Vec3::zero(), BodyProps::default(), 0.05);
        base.props.cross_section = 0.0;
        let mut proj = Projectile::new(base);
        proj.on_hit = cb;
        let mut t = ProjectileTick::new(proj, Some(Environ::none()), None);
        t.prepare();
        t.tick(0.1, None);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn periodic_wind_updates_env_each_tick() {
        let mut t = falling();
        t.env = Some(Environ::periodic(Vec3::new(2.0, 0.0, 0.0)));
        t.set_periodic_wind(EnvironPeriodic::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0), 1.0));
        t.prepare();
        t.tick(0.1, None);
        let wind = t.env.as_ref().unwrap().wind_vel;
        assert!((wind.x - 2.0).abs() < 1e-5);
        assert!(wind.z.abs() > 1e-4);
    }

    #[test]
    fn clone_deep_copies_propulsion_independently() {
        let mut t = falling();
        t.propulsion = Some(Propulsion { active: true, fuel_remaining: 10.0, ..Default::default() });
        let mut cloned = t.clone();
        cloned.propulsion.as_mut().unwrap().consume(10.0);
        assert_eq!(t.propulsion.as_ref().unwrap().fuel_remaining, 10.0);
        assert_eq!(cloned.propulsion.as_ref().unwrap().fuel_remaining, 0.0);
    }
}
