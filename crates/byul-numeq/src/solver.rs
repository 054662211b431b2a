//! Closed-form and iterative root finders shared by the force model,
//! guidance, and MPC.

/// Solve `a*x + b = 0`. Returns `None` if `a` is ~0 (no unique root).
pub fn solve_linear(a: f32, b: f32) -> Option<f32> {
    if a.abs() < 1e-9 {
        return None;
    }
    Some(-b / a)
}

/// Solve `a*x^2 + b*x + c = 0`, returning both real roots ascending.
/// `None` if `a` is ~0 (falls through to [`solve_linear`]) or the
/// discriminant is negative.
pub fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < 1e-9 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_d = disc.sqrt();
    let r1 = (-b - sqrt_d) / (2.0 * a);
    let r2 = (-b + sqrt_d) / (2.0 * a);
    Some((r1.min(r2), r1.max(r2)))
}

/// Numerically stable variant of [`solve_quadratic`]: avoids catastrophic
/// cancellation when `b` dominates by computing one root via the
/// conjugate formula and the other via Vieta's relation.
pub fn solve_quadratic_stable(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < 1e-9 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_d = disc.sqrt();
    let q = if b >= 0.0 { -0.5 * (b + sqrt_d) } else { -0.5 * (b - sqrt_d) };
    if q.abs() < 1e-12 {
        let r = -b / (2.0 * a);
        return Some((r, r));
    }
    let r1 = q / a;
    let r2 = c / q;
    Some((r1.min(r2), r1.max(r2)))
}

/// Smallest non-negative root of `a*x^2 + b*x + c = 0`, or `None`.
pub fn smallest_nonnegative_root(a: f32, b: f32, c: f32) -> Option<f32> {
    let (r1, r2) = solve_quadratic_stable(a, b, c)?;
    if r1 >= 0.0 {
        Some(r1)
    } else if r2 >= 0.0 {
        Some(r2)
    } else {
        None
    }
}

/// Real roots of `a*x^3 + b*x^2 + c*x + d = 0` via Cardano's method.
/// Returns 1 to 3 roots depending on the discriminant. Degenerates to
/// [`solve_quadratic`] when `a` is ~0.
pub fn solve_cubic(a: f32, b: f32, c: f32, d: f32) -> Vec<f32> {
    if a.abs() < 1e-9 {
        return match solve_quadratic(b, c, d) {
            Some((r1, r2)) if (r2 - r1).abs() > 1e-9 => vec![r1, r2],
            Some((r1, _)) => vec![r1],
            None => Vec::new(),
        };
    }

    // Normalize to x^3 + px' ... (depressed cubic via x = t - b/(3a)).
    let (b, c, d) = (b / a, c / a, d / a);
    let shift = b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;

    let disc = (q / 2.0).powi(2) + (p / 3.0).powi(3);

    if disc > 1e-9 {
        let sqrt_disc = disc.sqrt();
        let u = cbrt(-q / 2.0 + sqrt_disc);
        let v = cbrt(-q / 2.0 - sqrt_disc);
        vec![u + v - shift]
    } else if disc.abs() <= 1e-9 {
        let u = cbrt(-q / 2.0);
        vec![2.0 * u - shift, -u - shift]
    } else {
        // Three distinct real roots via trigonometric solution.
        let r = (-(p / 3.0).powi(3)).sqrt();
        let phi = (-q / (2.0 * r)).clamp(-1.0, 1.0).acos();
        let m = 2.0 * r.cbrt();
        let two_pi = core::f32::consts::TAU;
        vec![
            m * (phi / 3.0).cos() - shift,
            m * ((phi + two_pi) / 3.0).cos() - shift,
            m * ((phi + 2.0 * two_pi) / 3.0).cos() - shift,
        ]
    }
}

#[inline]
fn cbrt(x: f32) -> f32 {
    x.signum() * x.abs().powf(1.0 / 3.0)
}

/// Smallest non-negative real root of a cubic, or `None`.
pub fn smallest_nonnegative_cubic_root(a: f32, b: f32, c: f32, d: f32) -> Option<f32> {
    solve_cubic(a, b, c, d)
        .into_iter()
        .filter(|r| *r >= 0.0)
        .fold(None, |best, r| match best {
            Some(b) if b <= r => Some(b),
            _ => Some(r),
        })
}

/// Bisection root finder for a monotone (or at least sign-changing)
/// continuous function over `[lo, hi]`. Returns `None` if `f(lo)` and
/// `f(hi)` share the same sign, or if convergence is not reached within
/// `max_iter` iterations.
pub fn solve_bisection<F>(mut f: F, lo: f32, hi: f32, tol: f32, max_iter: u32) -> Option<f32>
where
    F: FnMut(f32) -> f32,
{
    let (mut lo, mut hi) = (lo, hi);
    let (mut flo, mut fhi) = (f(lo), f(hi));
    if flo == 0.0 {
        return Some(lo);
    }
    if fhi == 0.0 {
        return Some(hi);
    }
    if flo.signum() == fhi.signum() {
        return None;
    }
    for _ in 0..max_iter {
        let mid = 0.5 * (lo + hi);
        let fmid = f(mid);
        if fmid.abs() < tol || (hi - lo) < tol {
            return Some(mid);
        }
        if fmid.signum() == flo.signum() {
            lo = mid;
            flo = fmid;
        } else {
            hi = mid;
            fhi = fmid;
        }
    }
    Some(0.5 * (lo + hi))
}
