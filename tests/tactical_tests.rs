//! Tactical overlay tests - z-tint labels, x-ray tops/alpha, ghost pooling

use std::collections::HashSet;

use isostack::core::{
    GridConfig, HandleId, HeadlessBackend, StackedGrid, TacticalVisibilityEngine, Tile,
};
use isostack::types::{
    CellContent, Direction, TileKind, GHOST_ALPHA, GHOST_TEXTURE_KEY, XRAY_ALPHA_CAP,
    XRAY_BASE_ALPHA,
};

fn grid() -> StackedGrid<HeadlessBackend> {
    let cfg = GridConfig::default();
    StackedGrid::new(cfg, HeadlessBackend::new(&cfg))
}

/// Terraced hill: column (x, y) has height `(x + y) % 4`.
fn terraced() -> StackedGrid<HeadlessBackend> {
    let mut g = grid();
    let layout: Vec<Vec<CellContent>> = (0..10u32)
        .map(|y| {
            (0..10u32)
                .map(|x| CellContent::Detailed {
                    kind: TileKind(2),
                    height: (x + y) % 4,
                    facing: None,
                    object: None,
                })
                .collect()
        })
        .collect();
    g.bulk_load(&layout);
    g
}

fn ghost_handles(g: &StackedGrid<HeadlessBackend>) -> HashSet<HandleId> {
    g.tactical().ghosts().iter().map(|gh| gh.handle).collect()
}

#[test]
fn test_xray_marks_exactly_one_top_per_column() {
    let mut g = terraced();
    g.set_xray(true);
    for y in 0..10 {
        for x in 0..10 {
            let tops = (0..8)
                .filter_map(|z| g.lookup(x, y, Some(z)))
                .filter(|t| t.is_top_of_column())
                .count();
            assert_eq!(tops, 1, "column ({x}, {y})");
            assert!(g.lookup(x, y, None).unwrap().is_top_of_column());
        }
    }
}

#[test]
fn test_xray_alpha_bounds() {
    let mut g = terraced();
    g.set_xray(true);
    for tile in g.tiles() {
        assert!(tile.is_visible());
        if tile.is_top_of_column() {
            assert_eq!(tile.alpha(), 1.0);
        } else {
            assert!(tile.alpha() >= XRAY_BASE_ALPHA && tile.alpha() <= XRAY_ALPHA_CAP);
        }
        let sprite = g.backend().sprite(tile.handle()).unwrap();
        assert_eq!(sprite.alpha, tile.alpha());
        assert!(sprite.visible);
    }
}

#[test]
fn test_xray_off_restores_stack_visibility() {
    let mut g = terraced();
    let before: Vec<(bool, f32)> = g.tiles().map(|t| (t.is_visible(), t.alpha())).collect();
    g.set_xray(true);
    g.set_xray(false);
    let after: Vec<(bool, f32)> = g.tiles().map(|t| (t.is_visible(), t.alpha())).collect();
    assert_eq!(before, after);
    assert!(g.tiles().all(|t| !t.is_xrayed()));
    assert_eq!(g.backend().visible_sprite_count(), 100);
}

#[test]
fn test_one_ghost_per_empty_slot() {
    let mut g = terraced();
    g.set_xray(true);
    let slots = g.config().slot_count();
    assert_eq!(g.tactical().ghosts().len(), slots - g.tile_count());

    for ghost in g.tactical().ghosts() {
        assert!(g.lookup(ghost.x as i32, ghost.y as i32, Some(ghost.z as i32)).is_none());
        let sprite = g.backend().sprite(ghost.handle).unwrap();
        assert_eq!(sprite.texture, GHOST_TEXTURE_KEY);
        assert_eq!(sprite.alpha, GHOST_ALPHA);
        assert!(sprite.visible);
    }
}

#[test]
fn test_ghost_handles_are_reused_across_toggles() {
    let mut g = terraced();
    g.set_xray(true);
    let first = ghost_handles(&g);
    let created = g.backend().sprites_created();

    g.set_xray(false);
    assert!(g.tactical().ghosts().is_empty());
    assert_eq!(g.tactical().pool().idle(), first.len());
    for handle in &first {
        assert!(!g.backend().sprite(*handle).unwrap().visible);
    }

    g.set_xray(true);
    assert_eq!(ghost_handles(&g), first);
    assert_eq!(g.backend().sprites_created(), created);
}

#[test]
fn test_pool_overflow_destroys_extra_ghosts() {
    let cfg = GridConfig::default();
    let mut g = StackedGrid::new(cfg, HeadlessBackend::new(&cfg))
        .with_tactical(TacticalVisibilityEngine::with_pool_capacity(10));
    g.place(0, 0, 0, CellContent::Simple(TileKind(2)));
    g.set_xray(true);
    let shown = g.tactical().ghosts().len();
    g.set_xray(false);

    assert_eq!(g.tactical().pool().idle(), 10);
    assert_eq!(g.backend().sprites_destroyed(), shown - 10);
    assert_eq!(g.backend().sprite_count(), 1 + 10);
}

#[test]
fn test_ghosts_follow_rotation() {
    let mut g = terraced();
    g.set_xray(true);
    g.rotate_view_to(Direction::West);
    for ghost in g.tactical().ghosts() {
        let expected = g
            .transformer()
            .cell_to_screen(ghost.x, ghost.y, ghost.z, Direction::West);
        let sprite = g.backend().sprite(ghost.handle).unwrap();
        assert_eq!(sprite.at, expected);
        assert_eq!(sprite.frame, Direction::West.index());
    }
}

#[test]
fn test_mutation_during_xray_recomputes_overlay() {
    let mut g = terraced();
    g.set_xray(true);
    g.place(0, 0, 5, CellContent::Simple(TileKind(3)));

    assert!(g.tactical().xray_active());
    assert_eq!(
        g.tactical().ghosts().len(),
        g.config().slot_count() - g.tile_count()
    );
    let top = g.lookup(0, 0, None).unwrap();
    assert_eq!(top.z(), 5);
    assert!(top.is_top_of_column());
    assert!(!g.lookup(0, 0, Some(4)).unwrap().is_top_of_column());
    assert!(g.lookup(0, 0, Some(4)).unwrap().alpha() < 1.0);

    g.set_xray(false);
    assert!(!g.lookup(0, 0, Some(4)).unwrap().is_visible());
    assert!(g.lookup(0, 0, Some(5)).unwrap().is_visible());
}

#[test]
fn test_z_tint_labels_every_tile() {
    let mut g = terraced();
    g.set_z_tint(true);
    for tile in g.tiles() {
        let label = tile.label().expect("label created");
        let state = g.backend().label(label).unwrap();
        assert_eq!(state.text, format!("z{}", tile.z()));
        assert!(state.visible);
        assert!(tile.z_tint().is_some());
    }

    g.set_z_tint(false);
    for tile in g.tiles() {
        assert!(!g.backend().label(tile.label().unwrap()).unwrap().visible);
        assert!(tile.effective_tint().is_none());
    }
}

#[test]
fn test_z_tint_reuses_labels_and_covers_new_tiles() {
    let mut g = grid();
    g.place(1, 1, 0, CellContent::Simple(TileKind(2)));
    g.toggle_z_tint();
    let label = g.lookup(1, 1, None).and_then(Tile::label);
    g.toggle_z_tint();
    g.toggle_z_tint();
    assert_eq!(g.lookup(1, 1, None).and_then(Tile::label), label);

    g.place(2, 2, 1, CellContent::Simple(TileKind(2)));
    let fresh = g.lookup(2, 2, None).unwrap();
    assert_eq!(
        g.backend().label(fresh.label().unwrap()).unwrap().text,
        "z1"
    );
}

#[test]
fn test_highlight_wins_over_z_tint() {
    let mut g = grid();
    g.place(4, 4, 2, CellContent::Simple(TileKind(2)));
    g.set_z_tint(true);
    let z_tint = g.lookup(4, 4, None).unwrap().z_tint();
    assert!(g.highlight(4, 4, 2));
    let tile = g.lookup(4, 4, None).unwrap();
    assert_ne!(tile.effective_tint(), z_tint);
    assert_eq!(g.backend().sprite(tile.handle()).unwrap().tint, tile.effective_tint());
    g.clear_highlight();
    assert_eq!(g.lookup(4, 4, None).unwrap().effective_tint(), z_tint);
}

#[test]
fn test_rejected_fresh_ghost_is_neither_shown_nor_pooled() {
    let mut g = grid();
    g.place(0, 0, 0, CellContent::Simple(TileKind(2)));
    // The tile took handle 0, so the first ghost gets handle 1.
    let doomed = HandleId(1);
    g.backend_mut().fail_on(doomed);

    g.set_xray(true);
    let empty = g.config().slot_count() - g.tile_count();
    assert_eq!(g.tactical().ghosts().len(), empty - 1);
    assert!(!ghost_handles(&g).contains(&doomed));
    assert!(g.backend().sprite(doomed).is_none());
    assert!(g.backend().rejected() > 0);

    g.set_xray(false);
    assert_eq!(g.tactical().pool().idle(), empty - 1);
    assert_eq!(g.backend().sprite_count(), 1 + empty - 1);
}

#[test]
fn test_place_under_xray_only_cycles_its_column() {
    let cfg = GridConfig::default();
    let mut g = StackedGrid::new(cfg, HeadlessBackend::new(&cfg))
        .with_tactical(TacticalVisibilityEngine::with_pool_capacity(10));
    g.place(0, 0, 0, CellContent::Simple(TileKind(2)));
    g.set_xray(true);
    let untouched: HashSet<HandleId> = g
        .tactical()
        .ghosts()
        .iter()
        .filter(|gh| (gh.x, gh.y) != (5, 5))
        .map(|gh| gh.handle)
        .collect();
    let created = g.backend().sprites_created();
    let destroyed = g.backend().sprites_destroyed();

    g.place(5, 5, 2, CellContent::Simple(TileKind(3)));

    // Three new tiles; the column's ghosts went through the pool.
    assert_eq!(g.backend().sprites_created(), created + 3);
    assert_eq!(g.backend().sprites_destroyed(), destroyed);
    assert_eq!(
        g.tactical().ghosts().len(),
        g.config().slot_count() - g.tile_count()
    );
    assert!(untouched.is_subset(&ghost_handles(&g)));
    assert_eq!(g.tactical().pool().idle(), 3);
    for ghost in g.tactical().ghosts().iter().filter(|gh| (gh.x, gh.y) == (5, 5)) {
        assert!(ghost.z > 2);
        assert!(g.backend().sprite(ghost.handle).unwrap().visible);
    }
    let top = g.lookup(5, 5, None).unwrap();
    assert!(top.is_top_of_column() && top.is_xrayed());
    assert!(g.lookup(5, 5, Some(0)).unwrap().alpha() < 1.0);

    g.remove(5, 5, 0);
    assert_eq!(g.backend().sprites_destroyed(), destroyed + 3);
    assert_eq!(
        g.tactical().ghosts().len(),
        g.config().slot_count() - g.tile_count()
    );
}
