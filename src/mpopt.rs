use derive_builder::Builder;

/// HELM power flow options.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct HelmOpt {
    /// Termination tolerance on the change in voltage magnitude (p.u.)
    /// and angle (radians) between successive Padé approximants.
    /// Default value is 1e-4.
    pub mismatch: f64,

    /// Maximum number of series coefficients. A run that has not
    /// converged when the series reaches this length has no physical
    /// solution. Default value is 100.
    pub max_coefficients: usize,

    /// Multiplier applied to all loads and generator outputs.
    pub scale: f64,

    /// Enforce gen reactive power limits at expense of |V|.
    pub enforce_q_limits: bool,
}

impl Default for HelmOpt {
    fn default() -> Self {
        Self {
            mismatch: 1e-4,
            max_coefficients: 100,
            scale: 1.0,
            enforce_q_limits: true,
        }
    }
}

impl HelmOpt {
    pub fn builder() -> HelmOptBuilder {
        HelmOptBuilder::default()
    }
}

impl HelmOptBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(mismatch) = self.mismatch {
            if !(mismatch > 0.0) {
                return Err(format!("mismatch ({}) must be positive", mismatch));
            }
        }
        if let Some(max_coefficients) = self.max_coefficients {
            if max_coefficients < 3 {
                return Err(format!(
                    "max_coefficients ({}) must be at least 3",
                    max_coefficients
                ));
            }
        }
        if let Some(scale) = self.scale {
            if !scale.is_finite() {
                return Err(format!("scale ({}) must be finite", scale));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HelmOpt;

    #[test]
    fn test_defaults() {
        let opt = HelmOpt::builder().build().unwrap();
        assert_eq!(opt, HelmOpt::default());
        assert_eq!(opt.mismatch, 1e-4);
        assert_eq!(opt.max_coefficients, 100);
        assert_eq!(opt.scale, 1.0);
        assert!(opt.enforce_q_limits);
    }

    #[test]
    fn test_validate() {
        assert!(HelmOpt::builder().mismatch(0.0).build().is_err());
        assert!(HelmOpt::builder().max_coefficients(2).build().is_err());
        assert!(HelmOpt::builder().scale(f64::NAN).build().is_err());

        let opt = HelmOpt::builder()
            .mismatch(1e-8)
            .scale(1.5)
            .enforce_q_limits(false)
            .build()
            .unwrap();
        assert_eq!(opt.mismatch, 1e-8);
        assert_eq!(opt.scale, 1.5);
        assert_eq!(opt.max_coefficients, 100);
        assert!(!opt.enforce_q_limits);
    }
}
