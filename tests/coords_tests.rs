//! Coordinate pipeline tests: projection, inverse, depth ordering.

use isostack::core::{
    CoordinateTransformer, GridConfig, HeadlessBackend, ScreenPoint, StackedGrid,
};
use isostack::types::{
    CellContent, Direction, TileKind, DEFAULT_TILE_WIDTH, MAX_GRID_SIDE, MAX_TILE_EXTENT,
};

fn transformer() -> CoordinateTransformer {
    CoordinateTransformer::new(&GridConfig::default())
}

#[test]
fn test_reference_points_for_each_view() {
    let t = transformer();
    let cases = [
        (Direction::North, (320, 320), (400.0, 260.0)),
        (Direction::East, (320, 256), (432.0, 244.0)),
        (Direction::South, (256, 256), (400.0, 228.0)),
        (Direction::West, (256, 320), (368.0, 244.0)),
    ];
    for (dir, cart, expected) in cases {
        assert_eq!(t.project(5, 5, dir), cart);
        let p = t.cell_to_screen(5, 5, 0, dir);
        assert_eq!((p.x, p.y), expected, "view {}", dir.as_str());
    }
}

#[test]
fn test_origin_lands_on_offset() {
    let t = transformer();
    let p = t.cell_to_screen(0, 0, 0, Direction::North);
    assert_eq!((p.x, p.y), (400.0, 100.0));
    let raised = t.cell_to_screen(0, 0, 3, Direction::North);
    assert_eq!((raised.x, raised.y), (400.0, 52.0));
}

#[test]
fn test_screen_to_cell_round_trip_every_cell_and_view() {
    let cfg = GridConfig::default();
    let t = transformer();
    for dir in Direction::ALL {
        for y in 0..cfg.row_count {
            for x in 0..cfg.column_count {
                for z in [0, 4] {
                    let p = t.cell_to_screen(x, y, z, dir);
                    let (iso_x, iso_y) = t.screen_to_iso(p, z);
                    let (cx, cy) = CoordinateTransformer::from_iso(iso_x, iso_y);
                    let (px, py) = t.project(x as i32, y as i32, dir);
                    assert_eq!((cx, cy), (px as f64, py as f64));
                }
            }
        }
    }
}

#[test]
fn test_raising_moves_up_and_draws_later() {
    let t = transformer();
    for dir in Direction::ALL {
        for z in 0..7 {
            let low = t.cell_to_screen(4, 4, z, dir);
            let high = t.cell_to_screen(4, 4, z + 1, dir);
            assert!(high.y < low.y);
            assert_eq!(high.x, low.x);
            assert!(t.depth(4, 4, z + 1, dir) > t.depth(4, 4, z, dir));
        }
    }
}

#[test]
fn test_front_cells_draw_after_back_cells() {
    let t = transformer();
    // North view: larger x + y is nearer the viewer.
    assert!(t.depth(5, 5, 0, Direction::North) > t.depth(4, 5, 0, Direction::North));
    // South view reverses that.
    assert!(t.depth(5, 5, 0, Direction::South) < t.depth(4, 5, 0, Direction::South));
}

#[test]
fn test_iso_transform_inverse() {
    for (cx, cy) in [(0.0, 0.0), (64.0, 128.0), (-32.0, 96.0)] {
        let (ix, iy) = CoordinateTransformer::to_iso(cx, cy);
        assert_eq!(CoordinateTransformer::from_iso(ix, iy), (cx, cy));
    }
    let p = ScreenPoint { x: 400.0, y: 100.0 };
    assert_eq!(transformer().screen_to_iso(p, 0), (0.0, 0.0));
}

#[test]
fn test_oversized_tile_width_falls_back_before_placement() {
    let cfg = GridConfig::from_json_str(r#"{"tileWidth": 300000000}"#);
    assert_eq!(cfg.tile_width, DEFAULT_TILE_WIDTH);

    let mut g = StackedGrid::new(cfg, HeadlessBackend::new(&cfg));
    g.place(9, 0, 0, CellContent::Simple(TileKind(2)));
    let p = g.lookup(9, 0, None).unwrap().screen_position();
    assert_eq!(p, g.transformer().cell_to_screen(9, 0, 0, Direction::North));
}

#[test]
fn test_projection_at_config_limits_stays_positive() {
    let cfg = GridConfig {
        tile_width: MAX_TILE_EXTENT,
        tile_height: MAX_TILE_EXTENT,
        column_count: MAX_GRID_SIDE,
        row_count: MAX_GRID_SIDE,
        ..GridConfig::default()
    };
    let t = CoordinateTransformer::new(&cfg);
    let far = (MAX_GRID_SIDE - 1) as i32;
    let edge = i64::from(MAX_TILE_EXTENT) * i64::from(MAX_GRID_SIDE - 1);

    assert_eq!(t.project(far, far, Direction::North), (edge, edge));
    assert_eq!(t.project(0, 0, Direction::South), (edge, edge));
    for dir in Direction::ALL {
        let (cx, cy) = t.project(far, 0, dir);
        assert!(cx >= 0 && cy >= 0, "view {}", dir.as_str());
        let p = t.cell_to_screen(far as u32, far as u32, 0, dir);
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
