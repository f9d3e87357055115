use ferromask::blocks::plan::{Block, BuildBlock};
use ferromask::config::MaskConfig;
use ferromask::data::MaskCtx;
use ferromask::error::{ErrorContext, ErrorSource};
use maskgeom::Point;

mod common;
use common::{polygons_on, W1};

const PLAN: &str = r#"
[rules]
pad_dim = 60

[plan]
top = "CHIP"

[[plan.blocks]]
kind = "two_terminal"
name = "D1"
mesa = 10
via = 3
at = [0, 0]

[[plan.blocks]]
kind = "vector"
name = "V4"
mesas = [4, 6, 8, 10]
at = [250, 0]

[[plan.blocks]]
kind = "crossbar"
name = "X"
mesas = [[2, 2], [2, 2]]
at = [500, 0]
"#;

#[test]
fn test_plan_from_toml() {
    let cfg = MaskConfig::from_toml_str(PLAN).unwrap();
    assert_eq!(cfg.plan.blocks.len(), 3);
    assert!(matches!(&cfg.plan.blocks[1], Block::Vector(v) if v.mesas == vec![4., 6., 8., 10.]));
    assert_eq!(cfg.plan.blocks[2].at(), [500., 0.]);

    let ctx = MaskCtx::from_config(cfg).unwrap();
    let top = ctx.build_plan().unwrap();
    assert_eq!(top.name().as_str(), "CHIP");
    let placed: Vec<(String, Point)> = top
        .insts()
        .map(|inst| (inst.cell().name().to_string(), inst.loc()))
        .collect();
    assert_eq!(
        placed,
        vec![
            ("2T_M10000_V3000".to_string(), Point::zero()),
            (
                "Vector4_M4000_6000_8000_10000_V2000".to_string(),
                Point::new(250., 0.)
            ),
            (
                "XBAR_M2000_2000__2000_2000_V2000".to_string(),
                Point::new(500., 0.)
            ),
        ]
    );

    let mask = ctx.build_mask(&top);
    assert!(!polygons_on(&mask, W1).is_empty());
    assert_eq!(mask.annotations().count(), 3);
}

#[test]
fn test_undersized_pads_fail_before_drawing() {
    let cfg = MaskConfig::from_toml_str(
        r#"
        [rules]
        pad_dim = 30

        [[plan.blocks]]
        kind = "crossbar"
        name = "X"
        mesas = [[2, 2], [2, 2]]
        at = [100, 50]
        "#,
    )
    .unwrap();
    let ctx = MaskCtx::from_config(cfg).unwrap();
    let err = ctx.build_plan().unwrap_err();
    assert!(matches!(err.source(), ErrorSource::PadTooSmall { .. }));
    assert!(matches!(
        err.context(),
        [ErrorContext::PlaceBlock { name, at }] if name.as_str() == "X" && *at == [100., 50.]
    ));
    assert_eq!(ctx.num_cells(), 0);
}

#[test]
fn test_unknown_block_kind() {
    let err = MaskConfig::from_toml_str(
        r#"
        [[plan.blocks]]
        kind = "spiral"
        name = "S"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err.source(), ErrorSource::TomlParsing(_)));
}
