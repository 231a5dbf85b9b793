//! Single cart, single pole-balance physics.
//!
//! Grounded on `examples/original_source/src/bin/cart_pole/physics/{Cart,Pole}.cpp`:
//! same state variables (cart position/velocity, pole angle/angular
//! velocity), same RK4 step size and force/angle limits. The original
//! generalizes to an arbitrary number of carts, each carrying an
//! arbitrary number of poles coupled through springs, and integrates
//! `Cart::compute_acc`/`Pole::compute_alpha` against each other's
//! *previous* RK4 substage value. This demo only needs the textbook
//! single-cart/single-pole case, so it solves the pair of equations
//! simultaneously at each substage instead — the standard closed-form
//! cart-pole dynamics, not an approximation of the original's coupling
//! scheme. Track friction and hinge friction (`tfc`/`hfc` in the
//! original) are omitted; spec.md's control scenario names no friction
//! term.

use std::f64::consts::PI;

/// Gravitational acceleration (m/s^2), matching the original's `g < 0`
/// sign convention.
pub const GRAVITY: f64 = -9.81;
/// Integration step (s).
pub const DT: f64 = 0.01;
/// Force magnitude applied for a unit-normalized action (N).
pub const MAX_FORCE: f64 = 10.0;
/// Half the track length (m); `Max::pos` in the original.
pub const TRACK_HALF: f64 = 2.4;
/// Angle past which the pole counts as fallen (radians); the original's
/// `Max::theta` is configured in degrees, here fixed at 36 degrees.
pub const THETA_MAX: f64 = 36.0 * PI / 180.0;
/// Steps a network must survive to be considered a champion run.
pub const SOLVED_STEPS: u64 = 100_000;

/// Cart-pole system state, advanced one `DT` at a time by [`CartPole::step`].
#[derive(Debug, Clone, Copy)]
pub struct CartPole {
    cart_pos: f64,
    cart_vel: f64,
    pole_theta: f64,
    pole_omega: f64,
    cart_mass: f64,
    pole_mass: f64,
    half_len: f64,
}

impl CartPole {
    /// A system at rest at the track centre with the pole tilted
    /// `theta0` radians from vertical.
    pub fn new(theta0: f64) -> Self {
        Self {
            cart_pos: 0.0,
            cart_vel: 0.0,
            pole_theta: theta0,
            pole_omega: 0.0,
            cart_mass: 1.0,
            pole_mass: 0.1,
            half_len: 0.5,
        }
    }

    /// Whether the cart is still on the track and the pole still upright.
    pub fn in_range(&self) -> bool {
        self.cart_pos.abs() <= TRACK_HALF && self.pole_theta.abs() <= THETA_MAX
    }

    /// State vector normalized to roughly `[-1, 1]`, suitable as a
    /// network's input sample.
    pub fn normalized_state(&self) -> [f64; 4] {
        [
            self.cart_pos / TRACK_HALF,
            (self.cart_vel / 10.0).clamp(-1.0, 1.0),
            self.pole_theta / THETA_MAX,
            (self.pole_omega / 10.0).clamp(-1.0, 1.0),
        ]
    }

    /// Advance the system by one `DT`, applying `action` (in `[-1, 1]`,
    /// scaled to `+/- MAX_FORCE`) via 4th-order Runge-Kutta integration.
    pub fn step(&mut self, action: f64) {
        let force = action.clamp(-1.0, 1.0) * MAX_FORCE;
        let state = [self.cart_pos, self.cart_vel, self.pole_theta, self.pole_omega];

        let k1 = self.derivative(state, force);
        let s2 = add_scaled(state, k1, DT / 2.0);
        let k2 = self.derivative(s2, force);
        let s3 = add_scaled(state, k2, DT / 2.0);
        let k3 = self.derivative(s3, force);
        let s4 = add_scaled(state, k3, DT);
        let k4 = self.derivative(s4, force);

        let mut next = [0.0; 4];
        for i in 0..4 {
            next[i] = state[i] + (DT / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }

        self.cart_pos = next[0];
        self.cart_vel = next[1];
        self.pole_theta = next[2];
        self.pole_omega = next[3];
    }

    /// Closed-form `d/dt [pos, vel, theta, omega]` for the standard
    /// cart-pole system (see e.g. Barto, Sutton & Anderson 1983).
    fn derivative(&self, state: [f64; 4], force: f64) -> [f64; 4] {
        let [_, vel, theta, omega] = state;
        let total_mass = self.cart_mass + self.pole_mass;
        let pole_mass_len = self.pole_mass * self.half_len;

        let sin_t = theta.sin();
        let cos_t = theta.cos();

        let temp = (force + pole_mass_len * omega * omega * sin_t) / total_mass;
        let alpha_num = GRAVITY * sin_t - cos_t * temp;
        let alpha_den = self.half_len * (4.0 / 3.0 - self.pole_mass * cos_t * cos_t / total_mass);
        let alpha = alpha_num / alpha_den;
        let accel = temp - pole_mass_len * alpha * cos_t / total_mass;

        [vel, accel, omega, alpha]
    }
}

fn add_scaled(base: [f64; 4], delta: [f64; 4], scale: f64) -> [f64; 4] {
    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = base[i] + delta[i] * scale;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_upright_stationary_pole_stays_in_range_under_zero_force() {
        let mut cp = CartPole::new(0.0);
        for _ in 0..100 {
            cp.step(0.0);
        }
        assert!(cp.in_range());
    }

    #[test]
    fn a_large_initial_tilt_eventually_falls() {
        let mut cp = CartPole::new(THETA_MAX * 0.99);
        let mut steps = 0u64;
        while cp.in_range() && steps < 1000 {
            cp.step(0.0);
            steps += 1;
        }
        assert!(steps < 1000);
    }

    #[test]
    fn normalized_state_stays_roughly_bounded_near_the_origin() {
        let cp = CartPole::new(0.05);
        let state = cp.normalized_state();
        assert!(state.iter().all(|v| v.abs() <= 1.5));
    }
}
