use crate::schema::{Card, CatalogFile, DungeonRule, EconomyRule, GameConfig, ShopRule, StarterRule};
use anyhow::{bail, Context};
use delvecard_core::{Catalog, GameSnapshot};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const CATALOG_FILE: &str = "catalog.json";
const ECONOMY_FILE: &str = "economy.json";
const SHOP_FILE: &str = "shop.json";
const DUNGEON_FILE: &str = "dungeon.json";
const STARTER_FILE: &str = "starter.json";
const ASSETS_ENV: &str = "DELVECARD_ASSETS";

/// Assets directory from `DELVECARD_ASSETS`, falling back to `./assets`.
pub fn default_assets_dir() -> PathBuf {
    std::env::var_os(ASSETS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"))
}

pub fn load_catalog(dir: &Path) -> anyhow::Result<Catalog> {
    let file: CatalogFile = load_json(dir.join(CATALOG_FILE))?;
    validate_cards(&file.cards)?;
    let catalog = Catalog::new(file.cards).context("build catalog")?;
    log::debug!("loaded {} cards from {}", catalog.len(), dir.display());
    Ok(catalog)
}

/// Reads every rule file present in `dir`. Missing files keep their defaults.
pub fn load_game_config(dir: &Path) -> anyhow::Result<GameConfig> {
    let config = GameConfig {
        economy: load_optional_json::<EconomyRule>(dir.join(ECONOMY_FILE))?,
        shop: load_optional_json::<ShopRule>(dir.join(SHOP_FILE))?,
        dungeon: load_optional_json::<DungeonRule>(dir.join(DUNGEON_FILE))?,
        starter: load_optional_json::<StarterRule>(dir.join(STARTER_FILE))?,
    };
    config
        .validate()
        .with_context(|| format!("validate rules in {}", dir.display()))?;
    Ok(config)
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<GameSnapshot> {
    load_json(path)
}

pub fn save_snapshot(path: &Path, snapshot: &GameSnapshot) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(snapshot).context("serialize snapshot")?;
    fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn validate_cards(cards: &[Card]) -> anyhow::Result<()> {
    let mut names = HashSet::new();
    for card in cards {
        if card.name.trim().is_empty() {
            bail!("card {} has an empty name", card.id);
        }
        if !names.insert(card.name.as_str()) {
            bail!("duplicate card name {:?}", card.name);
        }
        if card.power_level < 0 {
            bail!("card {} has negative power level", card.id);
        }
    }
    Ok(())
}

fn load_optional_json<T: DeserializeOwned + Default>(path: PathBuf) -> anyhow::Result<T> {
    if !path.exists() {
        log::debug!("{} not found, using defaults", path.display());
        return Ok(T::default());
    }
    load_json(path)
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "delvecard-data-{}-{nanos}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn empty_dir_yields_default_rules() {
        let dir = unique_temp_dir();
        let config = load_game_config(&dir).expect("config");
        assert_eq!(config.dungeon.grid_size, 10);
        assert_eq!(config.shop.cards_per_pack, 5);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let dir = unique_temp_dir();
        fs::write(dir.join(DUNGEON_FILE), r#"{"grid_size": 1}"#).expect("write");
        let err = load_game_config(&dir).unwrap_err();
        assert!(format!("{err:#}").contains("grid size"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dir = unique_temp_dir();
        let body = r#"{"cards": [
            {"id": 1, "name": "Twin", "power_level": 1, "rarity": "Common"},
            {"id": 2, "name": "Twin", "power_level": 2, "rarity": "Rare"}
        ]}"#;
        fs::write(dir.join(CATALOG_FILE), body).expect("write");
        assert!(load_catalog(&dir).is_err());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_catalog_mentions_path() {
        let dir = unique_temp_dir();
        let err = load_catalog(&dir).unwrap_err();
        assert!(format!("{err:#}").contains(CATALOG_FILE));
        let _ = fs::remove_dir_all(dir);
    }
}
