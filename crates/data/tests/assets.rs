use delvecard_core::{CardId, EventBus, Game, PurchaseKind, Rarity};
use delvecard_data::{load_catalog, load_game_config, load_snapshot, save_snapshot};
use std::path::PathBuf;

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

#[test]
fn bundled_assets_load() {
    let config = load_game_config(&assets_root()).expect("load config");
    let catalog = load_catalog(&assets_root()).expect("load catalog");
    assert_eq!(config.shop.prices.pack, 150.0);
    assert_eq!(config.dungeon.cell_weights.entries().len(), 7);
    for rarity in Rarity::ALL {
        assert!(catalog.has_rarity(rarity), "no {rarity:?} cards bundled");
    }
    for card_id in &config.starter.cards {
        assert!(catalog.contains(*card_id));
    }
}

#[test]
fn bundled_assets_match_default_rules() {
    let config = load_game_config(&assets_root()).expect("load config");
    let defaults = delvecard_core::GameConfig::default();
    assert_eq!(config.dungeon.cell_weights, defaults.dungeon.cell_weights);
    assert_eq!(config.shop.rarity_weights, defaults.shop.rarity_weights);
    assert_eq!(config.starter.cards, vec![CardId(1), CardId(2), CardId(3)]);
}

#[test]
fn snapshot_file_roundtrip() {
    let config = load_game_config(&assets_root()).expect("load config");
    let catalog = load_catalog(&assets_root()).expect("load catalog");
    let mut game = Game::with_seed(config.clone(), catalog.clone(), 5).expect("game");
    let mut events = EventBus::default();
    let start = chrono::Utc::now();
    let id = game.create_player("archivist", start, &mut events).expect("player");
    game.accrue_gold(id, start + chrono::Duration::seconds(6 * 200), &mut events)
        .expect("accrue");
    game.purchase(
        id,
        PurchaseKind::Random,
        start + chrono::Duration::seconds(6 * 200),
        &mut events,
    )
    .expect("purchase");
    game.generate_dungeon(id, None, Some(31), &mut events)
        .expect("dungeon");

    let path = std::env::temp_dir().join(format!("delvecard-snapshot-{}.json", std::process::id()));
    save_snapshot(&path, &game.export_state(id).expect("export")).expect("save");
    let loaded = load_snapshot(&path).expect("load");
    let _ = std::fs::remove_file(&path);

    let mut restored = Game::with_seed(config, catalog, 6).expect("game");
    restored.import_state(loaded, &mut events).expect("import");
    assert_eq!(
        restored.player(id).expect("player").collection,
        game.player(id).expect("player").collection
    );
    assert_eq!(restored.dungeon(id), game.dungeon(id));
}
