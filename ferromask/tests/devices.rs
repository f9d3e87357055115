use ferromask::devices::ferro::{FerroDevice, FerroDeviceParams};
use ferromask::devices::pad::{LowerPad, PadParams};
use ferromask::error::ErrorSource;
use ferromask::layout::routing::manual::jog::{route_90deg, RouteMode};
use maskgeom::{Dims, Point};

mod common;
use common::setup_ctx;

#[test]
fn test_terminals_inside_device() {
    let ctx = setup_ctx();
    for mesa in [0.5, 1., 5., 8., 20., 50.] {
        for via in [2., 4.] {
            let params = FerroDeviceParams::builder()
                .mesa(mesa)
                .via(via)
                .build()
                .unwrap();
            let dev = ctx.make_ferro_device(&params).unwrap();
            let bbox = dev.inst.cell().bbox();
            assert!(bbox.contains_strictly(dev.top), "mesa {mesa}, via {via}");
            assert!(bbox.contains_strictly(dev.bottom), "mesa {mesa}, via {via}");
            assert!(dev.top.x < dev.bottom.x);
        }
    }
}

#[test]
fn test_feasibility_boundary() {
    let ctx = setup_ctx();
    // 2v + 14c + m with v = c = 2
    let min = FerroDevice::min_width(20., 2., 2.);
    assert_eq!(min, 52.);

    let at = |width: f64| {
        FerroDeviceParams::builder()
            .mesa(20.)
            .extent(Dims::new(width, 30.))
            .build()
            .unwrap()
    };
    assert!(ctx.make_ferro_device(&at(min)).is_ok());
    let err = ctx.make_ferro_device(&at(min - 0.001)).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::Dimension(_)));
}

#[test]
fn test_lower_pad_threshold() {
    let ctx = setup_ctx();
    let c = ctx.rules().coarse_clearance;
    let min_feature = ctx.rules().min_pad_feature;
    let threshold = 4. * c + min_feature;
    assert!(ctx
        .instantiate_layout::<LowerPad>(&PadParams::square(threshold))
        .is_ok());
    assert!(ctx
        .instantiate_layout::<LowerPad>(&PadParams::square(threshold - 0.5))
        .is_err());

    let relaxed = PadParams::builder()
        .size_x(threshold - 0.5)
        .min_feature(10.)
        .build()
        .unwrap();
    assert!(ctx.instantiate_layout::<LowerPad>(&relaxed).is_ok());
}

#[test]
fn test_routing_modes() {
    let (p0, p1) = (Point::new(0., 0.), Point::new(5., 7.));
    let hv: RouteMode = "-|".parse().unwrap();
    let vh: RouteMode = "vertical-then-horizontal".parse().unwrap();
    assert_eq!(route_90deg(p0, p1, hv), [p0, Point::new(5., 0.), p1]);
    assert_eq!(route_90deg(p0, p1, vh), [p0, Point::new(0., 7.), p1]);

    let err = "diagonal".parse::<RouteMode>().unwrap_err();
    assert!(matches!(err.source(), ErrorSource::InvalidRoutingMode(mode) if mode == "diagonal"));
}
