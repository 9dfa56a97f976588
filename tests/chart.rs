use tonalyzer::chart::{make_ticks, nice_step};
use tonalyzer::chart::raster::{ChartStyle, ChartSurface};
use tonalyzer::types::SeriesPoint;

#[test]
fn unit_domain_with_five_ticks_uses_a_nice_step() {
    let ticks = make_ticks(0.0, 1.0, 5);
    let step = ticks.ticks[1] - ticks.ticks[0];
    let nice = [0.1, 0.2, 0.25, 0.5];
    assert!(
        nice.iter().any(|candidate| (step - candidate).abs() < 1e-9),
        "step {step} is not a nice sub-1.0 value"
    );
    assert!(ticks.ticks.windows(2).all(|pair| pair[1] > pair[0]));
    assert!(*ticks.ticks.first().unwrap() <= 0.0);
    assert!(*ticks.ticks.last().unwrap() >= 1.0);
}

#[test]
fn tick_steps_are_always_one_two_five_or_ten_scaled() {
    let domains = [
        (0.0, 0.004),
        (0.0, 0.7),
        (3.0, 9.5),
        (-40.0, 260.0),
        (1_000.0, 98_000.0),
    ];
    for (min, max) in domains {
        let ticks = make_ticks(min, max, 6);
        let step = ticks.ticks[1] - ticks.ticks[0];
        let exponent = step.log10().floor();
        let mantissa = step / 10f64.powf(exponent);
        let accepted = [1.0, 2.0, 5.0, 10.0];
        assert!(
            accepted.iter().any(|m| (mantissa - m).abs() < 1e-6),
            "domain {min}..{max} produced step {step}"
        );
    }
}

#[test]
fn nice_step_threshold_edges() {
    // Mantissa 1.5 promotes to 2, 3 to 5, 7 to 10.
    assert!((nice_step(1.5) - 2.0).abs() < 1e-12);
    assert!((nice_step(3.0) - 5.0).abs() < 1e-12);
    assert!((nice_step(7.0) - 10.0).abs() < 1e-9);
    assert!((nice_step(1.49) - 1.0).abs() < 1e-12);
}

#[test]
fn single_point_render_shows_no_data_and_does_not_panic() {
    let mut surface = ChartSurface::new(480, 220);
    surface.render(
        &[SeriesPoint { t: 1.0, v: 150.0 }],
        &ChartStyle::pitch(),
    );
    // The line color must be absent; the label color must be present.
    let line = ChartStyle::pitch().line;
    let line_pixels = surface
        .pixels()
        .chunks_exact(4)
        .filter(|pixel| *pixel == line)
        .count();
    assert_eq!(line_pixels, 0);
}

#[test]
fn constant_series_widens_its_domain_instead_of_panicking() {
    let flat: Vec<SeriesPoint> = (0..20)
        .map(|i| SeriesPoint {
            t: i as f64 * 0.5,
            v: 0.04,
        })
        .collect();
    let mut surface = ChartSurface::new(480, 220);
    surface.render(&flat, &ChartStyle::energy());
    let line = ChartStyle::energy().line;
    let line_pixels = surface
        .pixels()
        .chunks_exact(4)
        .filter(|pixel| *pixel == line)
        .count();
    assert!(line_pixels > 0, "flat series should still draw a line");
}

#[test]
fn export_reflects_the_rendered_buffer() {
    let points: Vec<SeriesPoint> = (0..50)
        .map(|i| SeriesPoint {
            t: i as f64 * 0.1,
            v: 100.0 + (i as f64).sin() * 20.0,
        })
        .collect();
    let mut surface = ChartSurface::new(400, 200);
    surface.render(&points, &ChartStyle::pitch());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.png");
    surface.export_png(&path).unwrap();
    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.width(), surface.width());
    assert_eq!(decoded.height(), surface.height());
    // Lossless round trip: the saved image equals the live buffer.
    assert_eq!(decoded.as_raw().as_slice(), surface.pixels());
}
