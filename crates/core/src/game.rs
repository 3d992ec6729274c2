use crate::{
    accrue, draw_stocked, open_pack, Card, CardId, Catalog, CellView, Deck, DungeonInstance,
    DungeonSnapshot, Event, EventBus, GameConfig, GameError, GameSnapshot, MoveOutcome, Player,
    PlayerId, Position, PurchaseKind, PurchaseReceipt, RngState, ShopState, ShopView, ViewScope,
    SNAPSHOT_VERSION,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedCard {
    pub card: Card,
    pub quantity: u32,
}

/// Engine entry point for every player action.
///
/// Catalog and config are handed in at construction; nothing is global.
/// Each operation works on copies of the touched player and dungeon records
/// and writes them back only once every check has passed.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    catalog: Catalog,
    shop: ShopState,
    players: BTreeMap<PlayerId, Player>,
    dungeons: HashMap<PlayerId, DungeonInstance>,
    rng: RngState,
}

impl Game {
    pub fn new(config: GameConfig, catalog: Catalog) -> Result<Self, GameError> {
        Self::with_rng(config, catalog, RngState::from_entropy())
    }

    /// Fixes the engine's draw sequence (shop, gacha, encounters). Layout seeds are separate.
    pub fn with_seed(config: GameConfig, catalog: Catalog, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(config, catalog, RngState::from_seed(seed))
    }

    fn with_rng(config: GameConfig, catalog: Catalog, rng: RngState) -> Result<Self, GameError> {
        config.validate()?;
        if let Some(missing) = config
            .starter
            .cards
            .iter()
            .find(|card_id| !catalog.contains(**card_id))
        {
            return Err(GameError::InvalidConfiguration(format!(
                "starter card {missing} is not in the catalog"
            )));
        }
        log::debug!(
            "engine ready: {} cards, rng seed {}",
            catalog.len(),
            rng.seed()
        );
        Ok(Self {
            config,
            catalog,
            shop: ShopState::default(),
            players: BTreeMap::new(),
            dungeons: HashMap::new(),
            rng,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn shop_state(&self) -> &ShopState {
        &self.shop
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(&player_id)
            .ok_or(GameError::UnknownPlayer(player_id))
    }

    pub fn player_by_name(&self, username: &str) -> Option<&Player> {
        self.players
            .values()
            .find(|player| player.username == username)
    }

    pub fn dungeon(&self, player_id: PlayerId) -> Option<&DungeonInstance> {
        self.dungeons.get(&player_id)
    }

    /// New player with the configured starting gold and the starter deck,
    /// whose cards are credited to the collection.
    pub fn create_player(
        &mut self,
        username: &str,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<PlayerId, GameError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(GameError::InvalidConfiguration(
                "username must not be empty".to_string(),
            ));
        }
        if self.player_by_name(username).is_some() {
            return Err(GameError::DuplicateUsername(username.to_string()));
        }
        let id = self.next_player_id()?;
        let mut player = Player::new(id, username, self.config.economy.starting_gold, now);
        let starter = &self.config.starter;
        player.collection.add_cards(starter.cards.iter().copied());
        player.decks.push(Deck {
            name: starter.deck_name.clone(),
            cards: starter.cards.clone(),
            is_starter: true,
        });
        self.players.insert(id, player);
        log::info!("created {id} ({username})");
        events.push(Event::PlayerCreated {
            player: id,
            username: username.to_string(),
        });
        Ok(id)
    }

    pub fn accrue_gold(
        &mut self,
        player_id: PlayerId,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<f64, GameError> {
        let seconds_per_gold = self.config.economy.seconds_per_gold;
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;
        let accrual = accrue(player.gold, player.last_gold_update, now, seconds_per_gold);
        player.gold = accrual.balance;
        player.last_gold_update = accrual.last_update;
        if accrual.earned > 0.0 {
            events.push(Event::GoldAccrued {
                player: player_id,
                earned: accrual.earned,
                balance: accrual.balance,
            });
        }
        Ok(accrual.balance)
    }

    /// Current shop offer. Refreshes the featured card first when it is
    /// missing or older than the refresh interval.
    pub fn shop(
        &mut self,
        player_id: PlayerId,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<ShopView, GameError> {
        self.player(player_id)?;
        if self
            .shop
            .should_refresh(now, self.config.economy.shop_refresh_hours)
        {
            let card = self.shop.refresh(&self.catalog, &mut self.rng, now)?;
            events.push(Event::ShopRefreshed { featured: card.id });
        }
        Ok(ShopView {
            featured_card: self
                .shop
                .featured
                .and_then(|card_id| self.catalog.card(card_id))
                .cloned(),
            prices: self.config.shop.prices.clone(),
            last_refresh: self.shop.last_refresh,
        })
    }

    /// Accrues gold, checks the price, draws the card(s), then debits and
    /// credits together. Any failure leaves the player exactly as it was.
    pub fn purchase(
        &mut self,
        player_id: PlayerId,
        item: PurchaseKind,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<PurchaseReceipt, GameError> {
        let mut player = self.player(player_id)?.clone();
        let accrual = accrue(
            player.gold,
            player.last_gold_update,
            now,
            self.config.economy.seconds_per_gold,
        );
        player.gold = accrual.balance;
        player.last_gold_update = accrual.last_update;

        let price = item.price(&self.config.shop.prices);
        if player.gold < price {
            log::warn!(
                "{player_id} cannot afford {item}: {:.2} < {price:.2}",
                player.gold
            );
            return Err(GameError::InsufficientFunds {
                balance: player.gold,
                price,
            });
        }

        let cards = self.draw_purchase(item)?;
        player.gold -= price;
        player
            .collection
            .add_cards(cards.iter().map(|card| card.id));
        let gold_remaining = player.gold;
        self.players.insert(player_id, player);

        let card_ids: Vec<CardId> = cards.iter().map(|card| card.id).collect();
        log::info!(
            "{player_id} bought {item} for {price:.2}, received {} card(s)",
            cards.len()
        );
        events.push(Event::Purchased {
            player: player_id,
            item,
            price,
            cards: card_ids,
            gold: gold_remaining,
        });
        Ok(PurchaseReceipt {
            item,
            price,
            cards_received: cards,
            gold_remaining,
        })
    }

    fn draw_purchase(&mut self, item: PurchaseKind) -> Result<Vec<Card>, GameError> {
        if self.catalog.is_empty() {
            return Err(GameError::EmptyCatalog);
        }
        let cards = match item {
            PurchaseKind::Featured => {
                let card = self
                    .shop
                    .featured
                    .and_then(|card_id| self.catalog.card(card_id))
                    .ok_or(GameError::NoFeaturedCard)?;
                vec![card.clone()]
            }
            PurchaseKind::Random => {
                draw_stocked(&self.catalog, &self.config.shop.rarity_weights, &mut self.rng)
                    .cloned()
                    .into_iter()
                    .collect()
            }
            PurchaseKind::Pack => open_pack(&self.catalog, &self.config.shop, &mut self.rng),
        };
        if cards.is_empty() {
            return Err(GameError::EmptyCatalog);
        }
        Ok(cards)
    }

    pub fn collection(&self, player_id: PlayerId) -> Result<Vec<OwnedCard>, GameError> {
        let player = self.player(player_id)?;
        player
            .collection
            .entries()
            .iter()
            .map(|entry| {
                self.catalog
                    .card(entry.card_id)
                    .map(|card| OwnedCard {
                        card: card.clone(),
                        quantity: entry.quantity,
                    })
                    .ok_or(GameError::UnknownCard(entry.card_id))
            })
            .collect()
    }

    /// Builds a deck from owned cards. Returns the new deck's index.
    pub fn create_deck(
        &mut self,
        player_id: PlayerId,
        name: &str,
        cards: Vec<CardId>,
        events: &mut EventBus,
    ) -> Result<usize, GameError> {
        if let Some(unknown) = cards.iter().find(|id| !self.catalog.contains(**id)) {
            return Err(GameError::UnknownCard(*unknown));
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;
        if let Some(card_id) = player.missing_copies(&cards) {
            return Err(GameError::CardNotOwned(card_id));
        }
        let count = cards.len();
        player.decks.push(Deck {
            name: name.to_string(),
            cards,
            is_starter: false,
        });
        events.push(Event::DeckCreated {
            player: player_id,
            name: name.to_string(),
            cards: count,
        });
        Ok(player.decks.len() - 1)
    }

    /// Starts a fresh dungeon for the player, replacing any previous one.
    pub fn generate_dungeon(
        &mut self,
        player_id: PlayerId,
        grid_size: Option<usize>,
        seed: Option<u64>,
        events: &mut EventBus,
    ) -> Result<DungeonSnapshot, GameError> {
        self.player(player_id)?;
        let grid_size = grid_size.unwrap_or(self.config.dungeon.grid_size);
        let dungeon = DungeonInstance::start(grid_size, seed, &self.config.dungeon)?;
        let snapshot = dungeon.snapshot();
        if self.dungeons.insert(player_id, dungeon).is_some() {
            log::debug!("{player_id} abandoned a previous dungeon");
        }
        log::info!("{player_id} entered a {grid_size}x{grid_size} dungeon");
        events.push(Event::DungeonStarted {
            player: player_id,
            grid_size,
            seed,
        });
        Ok(snapshot)
    }

    pub fn move_player(
        &mut self,
        player_id: PlayerId,
        target: Position,
        events: &mut EventBus,
    ) -> Result<MoveOutcome, GameError> {
        self.player(player_id)?;
        let dungeon = self
            .dungeons
            .get_mut(&player_id)
            .ok_or(GameError::NoActiveDungeon)?;
        let outcome = dungeon
            .move_to(target, &self.config.dungeon.encounters, &mut self.rng)
            .inspect_err(|err| log::warn!("{player_id} move rejected: {err}"))?;
        events.push(Event::Moved {
            player: player_id,
            position: outcome.position,
            encounter: outcome.event.kind().to_string(),
        });
        Ok(outcome)
    }

    /// Full fog-masked grid for the player's active dungeon.
    pub fn visible_cells(&self, player_id: PlayerId) -> Result<Vec<CellView>, GameError> {
        self.player(player_id)?;
        self.dungeons
            .get(&player_id)
            .map(|dungeon| dungeon.visible_cells(ViewScope::FullGrid))
            .ok_or(GameError::NoActiveDungeon)
    }

    pub fn descend(
        &mut self,
        player_id: PlayerId,
        seed: Option<u64>,
        events: &mut EventBus,
    ) -> Result<DungeonSnapshot, GameError> {
        self.player(player_id)?;
        let dungeon = self
            .dungeons
            .get_mut(&player_id)
            .ok_or(GameError::NoActiveDungeon)?;
        let mut next = dungeon.clone();
        next.descend(seed, &self.config.dungeon)?;
        *dungeon = next;
        events.push(Event::FloorReached {
            player: player_id,
            floor: dungeon.floor(),
        });
        Ok(dungeon.snapshot())
    }

    pub fn export_state(&self, player_id: PlayerId) -> Result<GameSnapshot, GameError> {
        let player = self.player(player_id)?;
        Ok(GameSnapshot {
            version: SNAPSHOT_VERSION,
            player: player.clone(),
            dungeon: self.dungeons.get(&player_id).cloned(),
        })
    }

    /// Installs a previously exported player, replacing any record with the same id.
    pub fn import_state(
        &mut self,
        snapshot: GameSnapshot,
        events: &mut EventBus,
    ) -> Result<PlayerId, GameError> {
        let mut snapshot = snapshot;
        snapshot.player.username = snapshot.player.username.trim().to_string();
        snapshot.validate(&self.catalog)?;
        let id = snapshot.player.id;
        if let Some(other) = self.player_by_name(&snapshot.player.username) {
            if other.id != id {
                return Err(GameError::DuplicateUsername(snapshot.player.username));
            }
        }
        match snapshot.dungeon {
            Some(dungeon) => {
                self.dungeons.insert(id, dungeon);
            }
            None => {
                self.dungeons.remove(&id);
            }
        }
        self.players.insert(id, snapshot.player);
        log::info!("imported {id}");
        events.push(Event::PlayerImported { player: id });
        Ok(id)
    }

    fn next_player_id(&self) -> Result<PlayerId, GameError> {
        match self.players.keys().next_back() {
            None => Ok(PlayerId(1)),
            Some(last) => last.0.checked_add(1).map(PlayerId).ok_or_else(|| {
                GameError::InvalidConfiguration("player ids are exhausted".to_string())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rarity, WeightedTable};
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0)
            .single()
            .expect("timestamp")
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Card::new(1, "Basic Warrior", 3, Rarity::Common),
            Card::new(2, "Basic Mage", 2, Rarity::Common),
            Card::new(3, "Basic Healer", 2, Rarity::Common),
            Card::new(10, "Ember Imp", 4, Rarity::Uncommon),
            Card::new(20, "Glass Knight", 7, Rarity::Rare),
            Card::new(30, "Storm Titan", 11, Rarity::Legendary),
        ])
        .expect("catalog")
    }

    fn game() -> Game {
        Game::with_seed(GameConfig::default(), catalog(), 42).expect("game")
    }

    fn set_gold(game: &mut Game, player_id: PlayerId, gold: f64) {
        let player = game.players.get_mut(&player_id).expect("player");
        player.gold = gold;
    }

    #[test]
    fn starter_cards_must_exist() {
        let small = Catalog::new(vec![Card::new(1, "Basic Warrior", 3, Rarity::Common)])
            .expect("catalog");
        assert!(matches!(
            Game::new(GameConfig::default(), small),
            Err(GameError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn new_player_gets_starter_deck() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        let player = game.player(id).expect("player");
        assert_eq!(player.decks.len(), 1);
        assert!(player.decks[0].is_starter);
        assert_eq!(player.decks[0].card_count(), 3);
        assert_eq!(player.collection.total_cards(), 3);
        assert_eq!(
            game.create_player("ada", at(0), &mut events),
            Err(GameError::DuplicateUsername("ada".to_string()))
        );
        let second = game.create_player("bo", at(0), &mut events).expect("player");
        assert_eq!(second, PlayerId(2));
    }

    #[test]
    fn insufficient_funds_leaves_player_untouched() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        set_gold(&mut game, id, 40.0);
        let before = game.player(id).expect("player").clone();
        let err = game
            .purchase(id, PurchaseKind::Random, at(0), &mut events)
            .unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientFunds {
                balance: 40.0,
                price: 50.0
            }
        );
        assert_eq!(game.player(id).expect("player"), &before);
    }

    #[test]
    fn purchase_accrues_before_checking_price() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        set_gold(&mut game, id, 40.0);
        // 60 seconds earn 10 gold, exactly covering the random card
        let receipt = game
            .purchase(id, PurchaseKind::Random, at(60), &mut events)
            .expect("purchase");
        assert_eq!(receipt.cards_received.len(), 1);
        assert!(receipt.gold_remaining.abs() < 1e-9);
        assert_eq!(game.player(id).expect("player").collection.total_cards(), 4);
    }

    #[test]
    fn featured_purchase_needs_a_featured_card() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        set_gold(&mut game, id, 500.0);
        assert_eq!(
            game.purchase(id, PurchaseKind::Featured, at(0), &mut events)
                .unwrap_err(),
            GameError::NoFeaturedCard
        );
        let view = game.shop(id, at(0), &mut events).expect("shop");
        let featured = view.featured_card.expect("featured card");
        let receipt = game
            .purchase(id, PurchaseKind::Featured, at(0), &mut events)
            .expect("purchase");
        assert_eq!(receipt.cards_received, vec![featured]);
        assert!((receipt.gold_remaining - 400.0).abs() < 1e-9);
    }

    #[test]
    fn shop_refreshes_lazily() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        game.shop(id, at(0), &mut events).expect("shop");
        let first_refresh = game.shop_state().last_refresh;
        game.shop(id, at(3600), &mut events).expect("shop");
        assert_eq!(game.shop_state().last_refresh, first_refresh);
        game.shop(id, at(25 * 3600), &mut events).expect("shop");
        assert_eq!(game.shop_state().last_refresh, Some(at(25 * 3600)));
    }

    #[test]
    fn moves_need_a_dungeon() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        assert_eq!(
            game.move_player(id, Position::new(1, 0), &mut events)
                .unwrap_err(),
            GameError::NoActiveDungeon
        );
        assert_eq!(game.visible_cells(id).unwrap_err(), GameError::NoActiveDungeon);
        assert_eq!(
            game.move_player(PlayerId(99), Position::new(1, 0), &mut events)
                .unwrap_err(),
            GameError::UnknownPlayer(PlayerId(99))
        );
    }

    fn game_without_starter(cards: Vec<Card>) -> Game {
        let mut config = GameConfig::default();
        config.starter.cards.clear();
        config.shop.rarity_weights = WeightedTable::new([(Rarity::Common, 1.0)]);
        Game::with_seed(config, Catalog::new(cards).expect("catalog"), 3).expect("game")
    }

    #[test]
    fn fruitless_draws_charge_nothing() {
        let mut game =
            game_without_starter(vec![Card::new(30, "Storm Titan", 11, Rarity::Legendary)]);
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        set_gold(&mut game, id, 500.0);
        let before = game.player(id).expect("player").clone();
        for item in [PurchaseKind::Pack, PurchaseKind::Random] {
            assert_eq!(
                game.purchase(id, item, at(0), &mut events).unwrap_err(),
                GameError::EmptyCatalog
            );
        }
        assert_eq!(game.player(id).expect("player"), &before);
        assert_eq!(game.player(id).expect("player").collection.total_cards(), 0);
    }

    #[test]
    fn empty_catalog_fails_shop_and_purchases() {
        let mut game = game_without_starter(Vec::new());
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        set_gold(&mut game, id, 500.0);
        assert_eq!(
            game.shop(id, at(0), &mut events).unwrap_err(),
            GameError::EmptyCatalog
        );
        assert_eq!(
            game.purchase(id, PurchaseKind::Pack, at(0), &mut events)
                .unwrap_err(),
            GameError::EmptyCatalog
        );
        assert_eq!(game.player(id).expect("player").gold, 500.0);
    }

    #[test]
    fn exhausted_player_ids_are_an_error() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        let mut snapshot = game.export_state(id).expect("export");
        snapshot.player.id = PlayerId(u64::MAX);
        snapshot.player.username = "max".to_string();
        game.import_state(snapshot, &mut events).expect("import");
        assert!(matches!(
            game.create_player("cy", at(0), &mut events),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(game.player_by_name("cy").is_none());
    }

    #[test]
    fn imported_usernames_are_trimmed() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        let mut snapshot = game.export_state(id).expect("export");
        snapshot.player.id = PlayerId(7);
        snapshot.player.username = " ada ".to_string();
        assert_eq!(
            game.import_state(snapshot.clone(), &mut events),
            Err(GameError::DuplicateUsername("ada".to_string()))
        );

        snapshot.player.username = "  bo".to_string();
        let imported = game.import_state(snapshot, &mut events).expect("import");
        assert_eq!(game.player(imported).expect("player").username, "bo");
    }

    #[test]
    fn deepest_floor_does_not_descend() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        game.generate_dungeon(id, Some(2), Some(1), &mut events)
            .expect("dungeon");
        let mut snapshot = game.export_state(id).expect("export");
        let mut json = serde_json::to_value(&snapshot).expect("json");
        json["dungeon"]["floor"] = serde_json::json!(u32::MAX);
        json["dungeon"]["position"] = serde_json::json!({"x": 1, "y": 1});
        snapshot = serde_json::from_value(json).expect("snapshot");
        game.import_state(snapshot, &mut events).expect("import");
        assert!(matches!(
            game.descend(id, None, &mut events),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert_eq!(game.dungeon(id).expect("dungeon").floor(), u32::MAX);
    }

    #[test]
    fn deck_requires_owned_copies() {
        let mut game = game();
        let mut events = EventBus::default();
        let id = game.create_player("ada", at(0), &mut events).expect("player");
        assert_eq!(
            game.create_deck(id, "greedy", vec![CardId(1), CardId(1)], &mut events),
            Err(GameError::CardNotOwned(CardId(1)))
        );
        assert_eq!(
            game.create_deck(id, "ghost", vec![CardId(404)], &mut events),
            Err(GameError::UnknownCard(CardId(404)))
        );
        let index = game
            .create_deck(id, "duo", vec![CardId(1), CardId(2)], &mut events)
            .expect("deck");
        assert_eq!(index, 1);
    }
}
