//! Affine value transforms and the temperature clamp.

/// Variables the temperature clamp applies to.
pub const TEMPERATURE_VARIABLES: [&str; 3] = ["t", "2t", "skt"];

/// Post-transform clamp for temperature-like variables: any value inside
/// `[low, high]` is forced to `fix`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampSpec {
    pub low: f64,
    pub high: f64,
    pub fix: f64,
}

impl Default for ClampSpec {
    fn default() -> Self {
        Self {
            low: 270.0,
            high: 274.5,
            fix: 274.5,
        }
    }
}

/// `values[mask] = values[mask] * zmul + zadd`; unmasked points untouched.
pub fn apply_affine(values: &mut [f64], mask: &[bool], zmul: f64, zadd: f64) {
    for (value, &selected) in values.iter_mut().zip(mask) {
        if selected {
            *value = *value * zmul + zadd;
        }
    }
}

/// Apply the affine transform to every point.
pub fn apply_affine_all(values: &mut [f64], zmul: f64, zadd: f64) {
    for value in values.iter_mut() {
        *value = *value * zmul + zadd;
    }
}

/// Whether a (zmul, zadd) pair is the identity transform.
pub fn is_identity(zmul: f64, zadd: f64) -> bool {
    zmul == 1.0 && zadd == 0.0
}

/// Clamp the whole value array if (and only if) `variable` is
/// temperature-like. Runs once per matching message, over every point,
/// regardless of any selection mask.
pub fn clamp_temperature(values: &mut [f64], variable: &str, spec: &ClampSpec) {
    if !TEMPERATURE_VARIABLES.contains(&variable) {
        return;
    }

    for value in values.iter_mut() {
        if *value >= spec.low && *value <= spec.high {
            *value = spec.fix;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_touches_only_masked_points() {
        let mut values = vec![10.0, 20.0, 30.0];
        apply_affine(&mut values, &[false, true, false], 1.1, 1.0);

        assert_eq!(values, vec![10.0, 20.0 * 1.1 + 1.0, 30.0]);
    }

    #[test]
    fn affine_all_touches_everything() {
        let mut values = vec![1.0, 2.0];
        apply_affine_all(&mut values, 2.0, -1.0);
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn identity_detection() {
        assert!(is_identity(1.0, 0.0));
        assert!(!is_identity(1.0, 0.5));
        assert!(!is_identity(1.1, 0.0));
    }

    #[test]
    fn clamp_applies_to_temperature_variables_only() {
        let spec = ClampSpec::default();

        let mut values = vec![269.0, 271.0, 275.0, 273.0];
        clamp_temperature(&mut values, "t", &spec);
        assert_eq!(values, vec![269.0, 274.5, 275.0, 274.5]);

        let mut untouched = vec![271.0];
        clamp_temperature(&mut untouched, "msl", &spec);
        assert_eq!(untouched, vec![271.0]);
    }

    #[test]
    fn clamp_bounds_are_inclusive() {
        let spec = ClampSpec::default();
        let mut values = vec![270.0, 274.5, 269.999, 274.501];
        clamp_temperature(&mut values, "skt", &spec);
        assert_eq!(values, vec![274.5, 274.5, 269.999, 274.501]);
    }

    #[test]
    fn custom_clamp_spec() {
        let spec = ClampSpec {
            low: 268.0,
            high: 274.0,
            fix: 273.0,
        };
        let mut values = vec![268.0, 270.0, 274.0, 275.0];
        clamp_temperature(&mut values, "2t", &spec);
        assert_eq!(values, vec![273.0, 273.0, 273.0, 275.0]);
    }
}
