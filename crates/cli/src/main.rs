use anyhow::Context;
use chrono::Utc;
use delvecard_core::{
    render_map, CardId, DungeonSnapshot, Encounter, EventBus, Game, GameError, MoveOutcome,
    PlayerId, Position, PurchaseKind, PurchaseReceipt, ShopView,
};
use delvecard_data::{
    default_assets_dir, load_catalog, load_game_config, load_snapshot, save_snapshot,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod logger;

const DEFAULT_PLAYER: &str = "adventurer";
const DEFAULT_SAVE_FILE: &str = "delvecard_save.json";

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    assets: PathBuf,
    seed: Option<u64>,
    verbose: bool,
    name: String,
    save: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    fn apply(self, from: Position) -> Position {
        match self {
            Direction::North => Position::new(from.x, from.y - 1),
            Direction::South => Position::new(from.x, from.y + 1),
            Direction::East => Position::new(from.x + 1, from.y),
            Direction::West => Position::new(from.x - 1, from.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    Status,
    Shop,
    Buy(PurchaseKind),
    Collection,
    Decks,
    NewDeck { name: String, cards: Vec<CardId> },
    Start { size: Option<usize>, seed: Option<u64> },
    MoveTo(Position),
    Step(Direction),
    Map,
    Descend(Option<u64>),
    Save(Option<PathBuf>),
    Load(Option<PathBuf>),
    Export,
    Quit,
}

fn parse_cli_options(args: &[String]) -> CliOptions {
    let mut options = CliOptions {
        assets: default_assets_dir(),
        seed: None,
        verbose: false,
        name: DEFAULT_PLAYER.to_string(),
        save: PathBuf::from(DEFAULT_SAVE_FILE),
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--verbose" | "-v" => options.verbose = true,
            "--assets" => {
                if let Some(value) = args.get(idx + 1) {
                    options.assets = PathBuf::from(value);
                    idx += 1;
                }
            }
            "--seed" => {
                if let Some(value) = args.get(idx + 1) {
                    options.seed = value.parse::<u64>().ok();
                    idx += 1;
                }
            }
            "--name" => {
                if let Some(value) = args.get(idx + 1) {
                    options.name = value.clone();
                    idx += 1;
                }
            }
            "--save" => {
                if let Some(value) = args.get(idx + 1) {
                    options.save = PathBuf::from(value);
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    options
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = parts.split_first() else {
        return Ok(None);
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "help" | "h" | "?" => Command::Help,
        "status" | "gold" => Command::Status,
        "shop" => Command::Shop,
        "buy" => {
            let item = args.first().ok_or("usage: buy <featured|random|pack>")?;
            Command::Buy(item.parse()?)
        }
        "collection" | "inv" => Command::Collection,
        "decks" => Command::Decks,
        "deck" => {
            let (name, ids) = args
                .split_first()
                .ok_or("usage: deck <name> <card id>...")?;
            let cards = ids
                .iter()
                .map(|raw| parse_number::<u32>(raw).map(CardId))
                .collect::<Result<Vec<_>, _>>()?;
            Command::NewDeck {
                name: (*name).to_string(),
                cards,
            }
        }
        "start" => Command::Start {
            size: args.first().map(|raw| parse_number(raw)).transpose()?,
            seed: args.get(1).map(|raw| parse_number(raw)).transpose()?,
        },
        "move" | "go" => match args {
            [x, y] => Command::MoveTo(Position::new(parse_number(x)?, parse_number(y)?)),
            _ => return Err("usage: move <x> <y>".to_string()),
        },
        "n" | "north" => Command::Step(Direction::North),
        "s" | "south" => Command::Step(Direction::South),
        "e" | "east" => Command::Step(Direction::East),
        "w" | "west" => Command::Step(Direction::West),
        "map" | "look" => Command::Map,
        "descend" => Command::Descend(args.first().map(|raw| parse_number(raw)).transpose()?),
        "save" => Command::Save(args.first().map(PathBuf::from)),
        "load" => Command::Load(args.first().map(PathBuf::from)),
        "export" | "json" => Command::Export,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command: {other} (try help)")),
    };
    Ok(Some(command))
}

fn parse_number<T: std::str::FromStr>(raw: &str) -> Result<T, String> {
    raw.parse::<T>()
        .map_err(|_| format!("not a valid number: {raw}"))
}

struct Session {
    game: Game,
    player: PlayerId,
    events: EventBus,
    save_path: PathBuf,
}

impl Session {
    /// Returns `false` once the player asks to quit.
    fn execute(&mut self, command: Command) -> anyhow::Result<bool> {
        let now = Utc::now();
        match command {
            Command::Help => print_help(),
            Command::Status => {
                let gold = self.game.accrue_gold(self.player, now, &mut self.events)?;
                let player = self.game.player(self.player)?;
                println!("{} | gold {:.2}", player.username, gold);
                match self.game.dungeon(self.player) {
                    Some(dungeon) => println!(
                        "dungeon floor {} at {} ({}x{})",
                        dungeon.floor(),
                        dungeon.position(),
                        dungeon.grid_size(),
                        dungeon.grid_size()
                    ),
                    None => println!("no active dungeon"),
                }
            }
            Command::Shop => {
                let view = self.game.shop(self.player, now, &mut self.events)?;
                print_shop(&view);
            }
            Command::Buy(item) => {
                let receipt = self
                    .game
                    .purchase(self.player, item, now, &mut self.events)?;
                print_receipt(&receipt);
            }
            Command::Collection => {
                for owned in self.game.collection(self.player)? {
                    println!(
                        "{:>4} x{:<3} {:<18} {:<9} power {}",
                        owned.card.id.0,
                        owned.quantity,
                        owned.card.name,
                        owned.card.rarity.label(),
                        owned.card.power_level
                    );
                }
            }
            Command::Decks => {
                let player = self.game.player(self.player)?;
                for (index, deck) in player.decks.iter().enumerate() {
                    let ids: Vec<String> = deck.cards.iter().map(|id| id.0.to_string()).collect();
                    let marker = if deck.is_starter { " (starter)" } else { "" };
                    println!("{index}: {}{marker} [{}]", deck.name, ids.join(", "));
                }
            }
            Command::NewDeck { name, cards } => {
                let index = self
                    .game
                    .create_deck(self.player, &name, cards, &mut self.events)?;
                println!("deck {index} created: {name}");
            }
            Command::Start { size, seed } => {
                let snapshot = self
                    .game
                    .generate_dungeon(self.player, size, seed, &mut self.events)?;
                println!("entered floor {}", snapshot.floor);
                print_snapshot(&snapshot);
            }
            Command::MoveTo(target) => {
                let outcome = self
                    .game
                    .move_player(self.player, target, &mut self.events)?;
                print_outcome(&outcome);
            }
            Command::Step(direction) => {
                let from = self
                    .game
                    .dungeon(self.player)
                    .ok_or(GameError::NoActiveDungeon)?
                    .position();
                let outcome =
                    self.game
                        .move_player(self.player, direction.apply(from), &mut self.events)?;
                print_outcome(&outcome);
            }
            Command::Map => {
                let dungeon = self
                    .game
                    .dungeon(self.player)
                    .ok_or(GameError::NoActiveDungeon)?;
                print_snapshot(&dungeon.snapshot());
            }
            Command::Descend(seed) => {
                let snapshot = self
                    .game
                    .descend(self.player, seed, &mut self.events)?;
                println!("descended to floor {}", snapshot.floor);
                print_snapshot(&snapshot);
            }
            Command::Save(path) => {
                let path = path.unwrap_or_else(|| self.save_path.clone());
                let snapshot = self.game.export_state(self.player)?;
                save_snapshot(&path, &snapshot)?;
                println!("saved to {}", path.display());
            }
            Command::Load(path) => {
                let path = path.unwrap_or_else(|| self.save_path.clone());
                let snapshot = load_snapshot(&path)?;
                self.player = self.game.import_state(snapshot, &mut self.events)?;
                println!("loaded {}", path.display());
            }
            Command::Export => {
                let snapshot = self.game.export_state(self.player)?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            Command::Quit => return Ok(false),
        }
        for event in self.events.drain() {
            log::debug!("event: {event:?}");
        }
        Ok(true)
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args);
    logger::init(options.verbose);
    if let Err(err) = run(options) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(options: CliOptions) -> anyhow::Result<()> {
    let config = load_game_config(&options.assets)?;
    let catalog = load_catalog(&options.assets)?;
    let mut game = match options.seed {
        Some(seed) => Game::with_seed(config, catalog, seed),
        None => Game::new(config, catalog),
    }
    .context("start engine")?;
    let mut events = EventBus::default();
    let player = game
        .create_player(&options.name, Utc::now(), &mut events)
        .context("create player")?;
    let mut session = Session {
        game,
        player,
        events,
        save_path: options.save,
    };
    println!("Welcome, {}. Type help for commands.", options.name);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let command = match parse_command(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        match session.execute(command) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => eprintln!("{err:#}"),
        }
    }
    Ok(())
}

fn print_help() {
    println!("status                 gold balance and dungeon position");
    println!("shop                   show the featured card and prices");
    println!("buy <featured|random|pack>");
    println!("collection             owned cards");
    println!("decks | deck <name> <id>...");
    println!("start [size] [seed]    enter a new dungeon");
    println!("move <x> <y> | n s e w");
    println!("map                    fog-of-war map");
    println!("descend [seed]         next floor (stand on the exit)");
    println!("save [path] | load [path]");
    println!("export                 print the saved state as json");
    println!("quit");
}

fn print_shop(view: &ShopView) {
    match &view.featured_card {
        Some(card) => println!(
            "featured: {} ({}, power {}) for {:.0}",
            card.name,
            card.rarity.label(),
            card.power_level,
            view.prices.featured
        ),
        None => println!("featured: none"),
    }
    println!("random card: {:.0}", view.prices.random);
    println!("card pack:   {:.0}", view.prices.pack);
}

fn print_receipt(receipt: &PurchaseReceipt) {
    println!("bought {} for {:.0}:", receipt.item, receipt.price);
    for card in &receipt.cards_received {
        println!("  {} ({})", card.name, card.rarity.label());
    }
    println!("gold remaining: {:.2}", receipt.gold_remaining);
}

fn print_snapshot(snapshot: &DungeonSnapshot) {
    print!(
        "{}",
        render_map(&snapshot.cells, snapshot.grid_size, snapshot.position)
    );
}

fn print_outcome(outcome: &MoveOutcome) {
    println!("at {}: {}", outcome.position, describe_encounter(&outcome.event));
}

fn describe_encounter(event: &Encounter) -> String {
    match event {
        Encounter::Combat { enemy } => format!("{} attacks (power {})", enemy.name, enemy.power_level),
        Encounter::Miniboss { enemy } => format!(
            "{} blocks the way (power {}, {})",
            enemy.name,
            enemy.power_level,
            enemy.special_ability.as_deref().unwrap_or("no ability")
        ),
        Encounter::Treasure { gold } => format!("treasure worth {gold} gold"),
        Encounter::Trap { damage } => format!("a trap deals {damage} damage"),
        Encounter::Merchant { items } => {
            let wares: Vec<String> = items
                .iter()
                .map(|item| format!("{} ({})", item.name, item.cost))
                .collect();
            format!("a merchant offers {}", wares.join(", "))
        }
        Encounter::Shrine { effect } => format!("a shrine grants: {}", effect.label()),
        Encounter::Exit { message } => message.clone(),
        Encounter::Empty(()) => "nothing here".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn options_parse_flags() {
        let options = parse_cli_options(&args(&["--seed", "42", "-v", "--name", "kit"]));
        assert_eq!(options.seed, Some(42));
        assert!(options.verbose);
        assert_eq!(options.name, "kit");
        assert_eq!(options.save, PathBuf::from(DEFAULT_SAVE_FILE));
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(
            parse_command("buy pack"),
            Ok(Some(Command::Buy(PurchaseKind::Pack)))
        );
        assert_eq!(
            parse_command("move 3 -1"),
            Ok(Some(Command::MoveTo(Position::new(3, -1))))
        );
        assert_eq!(
            parse_command("start 6"),
            Ok(Some(Command::Start {
                size: Some(6),
                seed: None
            }))
        );
        assert_eq!(
            parse_command("deck duo 1 2"),
            Ok(Some(Command::NewDeck {
                name: "duo".to_string(),
                cards: vec![CardId(1), CardId(2)]
            }))
        );
        assert!(parse_command("buy voucher").is_err());
        assert!(parse_command("move 1").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn steps_are_orthogonal() {
        let from = Position::new(2, 2);
        assert_eq!(Direction::North.apply(from), Position::new(2, 1));
        assert_eq!(Direction::East.apply(from), Position::new(3, 2));
    }
}
