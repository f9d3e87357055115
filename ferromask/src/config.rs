//! Mask configuration: design rules, layer table, and placement plan.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::blocks::plan::MaskPlan;
use crate::error::{with_err_context, ErrorContext, ErrorSource, Result};
use crate::layout::layers::{reference_layer_records, LayerRecord, Layers};
use crate::layout::library::CollisionPolicy;

/// Dimensional design rules, in microns.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
#[builder(default)]
pub struct DesignRules {
    /// Clearance for UV-lithography features.
    pub coarse_clearance: f64,
    /// Clearance for e-beam features.
    pub fine_clearance: f64,
    pub wire_width: f64,
    /// Width of the ring drawn around boundary-mode layers.
    pub boundary_width: f64,
    /// Side length of contact pads.
    pub pad_dim: f64,
    /// Distance between a device terminal and the near edge of its pad.
    pub pad_device_spacing: f64,
    /// Smallest via opening a lower pad may leave.
    pub min_pad_feature: f64,
    /// Height of label text.
    pub label_size: f64,
    /// Fraction of each side cut back to form octagon corners.
    pub octagon_ratio: f64,
    /// Device pitch of crossbar arrays.
    pub crossbar_gap: f64,
}

impl Default for DesignRules {
    fn default() -> Self {
        Self {
            coarse_clearance: 2.,
            fine_clearance: 0.05,
            wire_width: 3.,
            boundary_width: 1.,
            pad_dim: 50.,
            pad_device_spacing: 10.,
            min_pad_feature: 30.,
            label_size: 10.,
            octagon_ratio: 1. / 6.,
            crossbar_gap: 25.,
        }
    }
}

impl DesignRules {
    #[inline]
    pub fn builder() -> DesignRulesBuilder {
        DesignRulesBuilder::default()
    }

    /// Checks that every rule is a finite length in range.
    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("coarse_clearance", self.coarse_clearance),
            ("fine_clearance", self.fine_clearance),
            ("boundary_width", self.boundary_width),
            ("pad_device_spacing", self.pad_device_spacing),
            ("min_pad_feature", self.min_pad_feature),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value >= 0.) {
                return Err(ErrorSource::InvalidArgs(format!(
                    "{name} must be a non-negative length, got {value}"
                ))
                .into());
            }
        }
        let sizes = [
            ("wire_width", self.wire_width),
            ("pad_dim", self.pad_dim),
            ("label_size", self.label_size),
            ("crossbar_gap", self.crossbar_gap),
        ];
        for (name, value) in sizes {
            if !(value.is_finite() && value > 0.) {
                return Err(ErrorSource::InvalidArgs(format!(
                    "{name} must be positive, got {value}"
                ))
                .into());
            }
        }
        if !(0.0..0.5).contains(&self.octagon_ratio) {
            return Err(ErrorSource::InvalidArgs(format!(
                "octagon_ratio must be in [0, 0.5), got {}",
                self.octagon_ratio
            ))
            .into());
        }
        Ok(())
    }
}

/// A complete mask description.
///
/// Every field falls back to its default when missing from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub rules: DesignRules,
    pub layers: Vec<LayerRecord>,
    pub collision: CollisionPolicy,
    pub plan: MaskPlan,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            rules: DesignRules::default(),
            layers: reference_layer_records(),
            collision: CollisionPolicy::default(),
            plan: MaskPlan::default(),
        }
    }
}

impl MaskConfig {
    /// The reference ferroelectric mask: the default plan drawn with 100um pads.
    pub fn reference_mask() -> Self {
        let mut cfg = Self::default();
        cfg.rules.pad_dim = 100.;
        cfg
    }

    /// Parses a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = crate::io::read_to_string(path)?;
        with_err_context(Self::from_toml_str(&s), || {
            ErrorContext::ReadFile(path.to_path_buf())
        })
    }

    /// Builds the layer table.
    pub fn layer_table(&self) -> Result<Layers> {
        Layers::from_records(&self.layers)
    }

    fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        self.layer_table()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::plan::Block;
    use crate::layout::layers::LayerMode;

    #[test]
    fn test_empty_toml_is_default() {
        let cfg = MaskConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, MaskConfig::default());
        assert_eq!(cfg.rules.pad_dim, 50.);
        assert_eq!(MaskConfig::reference_mask().rules.pad_dim, 100.);
    }

    #[test]
    fn test_partial_toml() {
        let cfg = MaskConfig::from_toml_str(
            r#"
            collision = "error"

            [rules]
            pad_dim = 80
            wire_width = 4.5

            [[layers]]
            name = "W1"
            layer = 10
            datatype = 0
            mode = "boundary"

            [plan]
            top = "CHIP"

            [[plan.blocks]]
            kind = "two_terminal"
            name = "FE"
            mesa = 20
            at = [0, 0]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.rules.pad_dim, 80.);
        assert_eq!(cfg.rules.wire_width, 4.5);
        assert_eq!(cfg.rules.coarse_clearance, 2.);
        assert_eq!(cfg.collision, CollisionPolicy::Error);
        assert_eq!(cfg.layers.len(), 1);
        assert_eq!(cfg.layers[0].mode, LayerMode::Boundary);
        assert_eq!(cfg.plan.top, "CHIP");
        assert!(matches!(&cfg.plan.blocks[..], [Block::TwoTerminal(b)] if b.mesa == 20.));
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let err = MaskConfig::from_toml_str("[rules]\npad_dim = -1\n").unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidArgs(_)));
        let err = MaskConfig::from_toml_str("[rules]\npad_dim = \"big\"\n").unwrap_err();
        assert!(matches!(err.source(), ErrorSource::TomlParsing(_)));
    }

    #[test]
    fn test_rules_validate() {
        assert!(DesignRules::default().validate().is_ok());
        let bad = [
            DesignRules::builder().coarse_clearance(f64::NAN).build(),
            DesignRules::builder().min_pad_feature(-1.).build(),
            DesignRules::builder().wire_width(0.).build(),
            DesignRules::builder().pad_dim(f64::INFINITY).build(),
            DesignRules::builder().octagon_ratio(0.5).build(),
        ];
        for rules in bad {
            let err = rules.unwrap().validate().unwrap_err();
            assert!(matches!(err.source(), ErrorSource::InvalidArgs(_)));
        }
    }

    #[test]
    fn test_rules_builder() {
        let rules = DesignRules::builder().pad_dim(100.).build().unwrap();
        assert_eq!(rules.pad_dim, 100.);
        assert_eq!(rules.label_size, 10.);
    }
}
