//! StackedGrid tests - column mutations, lookup, picking, backend failures

use isostack::core::{
    parse_layout, BackendError, GridConfig, HandleId, HeadlessBackend, RenderBackend,
    RenderIntent, StackedGrid, Tile,
};
use isostack::types::{CellContent, Direction, ObjectKind, TileKind};

fn grid() -> StackedGrid<HeadlessBackend> {
    let cfg = GridConfig::default();
    StackedGrid::new(cfg, HeadlessBackend::new(&cfg))
}

/// Small deterministic generator for mutation sequences.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self, bound: u32) -> i32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % u64::from(bound)) as i32
    }
}

fn assert_contiguous(g: &StackedGrid<HeadlessBackend>) {
    let cfg = *g.config();
    for y in 0..cfg.row_count as i32 {
        for x in 0..cfg.column_count as i32 {
            let mut seen_gap = false;
            for z in 0..cfg.levels() as i32 {
                match g.lookup(x, y, Some(z)) {
                    Some(_) => assert!(!seen_gap, "gap below ({x}, {y}, {z})"),
                    None => seen_gap = true,
                }
            }
        }
    }
}

#[test]
fn test_columns_stay_contiguous_under_random_mutation() {
    let mut g = grid();
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    for step in 0..500 {
        let (x, y, z) = (rng.next(12) - 1, rng.next(12) - 1, rng.next(10) - 1);
        if rng.next(3) == 0 {
            g.remove(x, y, z);
        } else {
            g.place(x, y, z, CellContent::Simple(TileKind(1 + rng.next(8) as u16)));
        }
        if step % 50 == 0 {
            assert_contiguous(&g);
        }
    }
    assert_contiguous(&g);
    // Every tile owns exactly one live sprite in the backend.
    assert_eq!(g.backend().sprite_count(), g.tile_count());
}

#[test]
fn test_lookup_top_and_exact_level() {
    let mut g = grid();
    g.place(3, 4, 2, CellContent::Simple(TileKind(6)));
    assert_eq!(g.lookup(3, 4, None).map(Tile::z), Some(2));
    assert_eq!(g.lookup(3, 4, Some(0)).map(Tile::kind), Some(TileKind::FILL));
    assert_eq!(g.lookup(3, 4, Some(2)).map(Tile::kind), Some(TileKind(6)));
    assert!(g.lookup(3, 4, Some(3)).is_none());
    assert!(g.lookup(4, 3, None).is_none());
}

#[test]
fn test_bulk_load_replaces_contents() {
    let mut g = grid();
    g.place(9, 9, 5, CellContent::Simple(TileKind(2)));

    let layout = parse_layout(
        r#"[
            [1, 0, {"kind": 9, "height": 2, "facing": 1}],
            [null, {"kind": 3, "height": 1, "object": 2}]
        ]"#,
    )
    .unwrap();
    g.bulk_load(&layout);

    assert!(g.lookup(9, 9, None).is_none());
    assert_eq!(g.lookup(0, 0, None).map(Tile::z), Some(0));
    assert!(g.lookup(1, 0, None).is_none());
    let stair = g.lookup(2, 0, None).unwrap();
    assert_eq!((stair.kind(), stair.z()), (TileKind::STAIR, 2));
    assert_eq!(g.column_height(2, 0), Some(3));
    let with_object = g.lookup(1, 1, None).unwrap();
    assert_eq!(with_object.object_kind(), Some(ObjectKind(2)));
    assert!(with_object.object_handle().is_some());
    // 1 + 3 + 2 tiles, plus one object sprite.
    assert_eq!(g.tile_count(), 6);
    assert_eq!(g.backend().sprite_count(), 7);
}

#[test]
fn test_bulk_load_skips_out_of_range_entries() {
    let mut g = grid();
    let wide = vec![vec![CellContent::Simple(TileKind(1)); 12]; 1];
    g.bulk_load(&wide);
    assert_eq!(g.tile_count(), 10);

    let too_high = vec![vec![CellContent::Detailed {
        kind: TileKind(2),
        height: 9,
        facing: None,
        object: None,
    }]];
    g.bulk_load(&too_high);
    assert_eq!(g.tile_count(), 0);
}

#[test]
fn test_clear_destroys_everything() {
    let mut g = grid();
    g.place(1, 1, 3, CellContent::Simple(TileKind(2)));
    g.place(2, 2, 0, CellContent::Detailed {
        kind: TileKind(2),
        height: 0,
        facing: None,
        object: Some(ObjectKind(1)),
    });
    g.clear();
    assert_eq!(g.tile_count(), 0);
    assert_eq!(g.backend().sprite_count(), 0);
    assert_eq!(g.backend().sprites_destroyed(), g.backend().sprites_created());
}

#[test]
fn test_pick_single_tile() {
    let mut g = grid();
    g.place(4, 4, 0, CellContent::Simple(TileKind(2)));
    g.place(5, 4, 0, CellContent::Simple(TileKind(2)));
    let at = g.lookup(4, 4, None).unwrap().screen_position();

    let picked = g.pick_by_screen_point(at.x, at.y).unwrap();
    assert_eq!((picked.x(), picked.y(), picked.z()), (4, 4, 0));
    assert!(g.pick_by_screen_point(-500.0, -500.0).is_none());
}

#[test]
fn test_pick_prefers_highest_level() {
    let mut g = grid();
    g.place(3, 3, 1, CellContent::Simple(TileKind(2)));
    let base = g.lookup(3, 3, Some(0)).unwrap().screen_position();

    // Halfway between the two stacked faces: inside both diamonds.
    let picked = g.pick_by_screen_point(base.x, base.y - 8.0).unwrap();
    assert_eq!(picked.z(), 1);
}

#[test]
fn test_pick_follows_rotation() {
    let mut g = grid();
    g.place(0, 0, 0, CellContent::Simple(TileKind(2)));
    g.rotate_view_to(Direction::South);
    let at = g
        .transformer()
        .cell_to_screen(0, 0, 0, Direction::South);
    let picked = g.pick_by_screen_point(at.x, at.y).unwrap();
    assert_eq!((picked.x(), picked.y()), (0, 0));
}

/// Hit-tests every handle, so any tie is decided by scan order alone.
struct EverywhereBackend(HeadlessBackend);

impl RenderBackend for EverywhereBackend {
    fn apply(&mut self, intent: &RenderIntent) -> Result<(), BackendError> {
        self.0.apply(intent)
    }

    fn contains_point(&self, _handle: HandleId, _x: f64, _y: f64) -> bool {
        true
    }

    fn has_texture(&self, key: &str) -> bool {
        self.0.has_texture(key)
    }
}

#[test]
fn test_pick_tie_breaks_by_row_major_scan() {
    let cfg = GridConfig::default();
    let mut g = StackedGrid::new(cfg, EverywhereBackend(HeadlessBackend::new(&cfg)));
    g.place(7, 2, 1, CellContent::Simple(TileKind(2)));
    g.place(3, 5, 1, CellContent::Simple(TileKind(2)));
    g.place(1, 2, 1, CellContent::Simple(TileKind(2)));

    let picked = g.pick_by_screen_point(0.0, 0.0).unwrap();
    assert_eq!((picked.x(), picked.y(), picked.z()), (1, 2, 1));
}

#[test]
fn test_failing_cell_does_not_block_others() {
    let mut g = grid();
    g.place(0, 0, 0, CellContent::Simple(TileKind(2)));
    g.place(1, 0, 0, CellContent::Simple(TileKind(2)));
    let bad = g.lookup(0, 0, None).unwrap().handle();
    let good = g.lookup(1, 0, None).unwrap().handle();
    g.backend_mut().fail_on(bad);

    g.set_z_tint(true);

    assert!(g.backend().rejected() > 0);
    assert!(g.backend().sprite(bad).unwrap().tint.is_none());
    assert!(g.backend().sprite(good).unwrap().tint.is_some());
    // Domain state is updated regardless of the backend.
    assert!(g.lookup(0, 0, None).unwrap().z_tint().is_some());
}

#[test]
fn test_missing_texture_still_places_tile() {
    let cfg = GridConfig::default();
    let backend = HeadlessBackend::new(&cfg).with_textures(["tile_1"]);
    let mut g = StackedGrid::new(cfg, backend);
    g.place(2, 2, 0, CellContent::Simple(TileKind(42)));

    let tile = g.lookup(2, 2, None).unwrap();
    assert_eq!(g.backend().sprite(tile.handle()).unwrap().texture, "tile_42");
    assert!(!g.backend().has_texture("tile_42"));
}

#[test]
fn test_rotation_reframes_stairs_against_the_view() {
    let mut g = grid();
    let layout = parse_layout(r#"[[{"kind": 9, "facing": 1}, {"kind": 4, "facing": 1}]]"#).unwrap();
    g.bulk_load(&layout);

    let stair = g.lookup(0, 0, None).unwrap().handle();
    let wall = g.lookup(1, 0, None).unwrap().handle();
    g.rotate_view_cw();
    assert_eq!(g.direction(), Direction::East);
    assert_eq!(g.backend().sprite(stair).unwrap().frame, 0);
    assert_eq!(g.backend().sprite(wall).unwrap().frame, 2);

    g.rotate_view_ccw();
    g.rotate_view_ccw();
    assert_eq!(g.direction(), Direction::West);
    assert_eq!(g.backend().sprite(stair).unwrap().frame, 2);
    assert_eq!(g.backend().sprite(wall).unwrap().frame, 0);
}
