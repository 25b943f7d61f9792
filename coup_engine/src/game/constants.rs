use super::entities::Coins;

/// Number of copies of each role in a fresh deck.
pub const COPIES_PER_ROLE: usize = 3;
/// Total number of cards in play, dealt or not.
pub const TOTAL_CARDS: usize = COPIES_PER_ROLE * 5;
/// Cards dealt to each player at the start of a game.
pub const CARDS_PER_PLAYER: usize = 2;
/// Cards drawn by an exchange.
pub const EXCHANGE_DRAW: usize = 2;

pub const DEFAULT_STARTING_MONEY: Coins = 2;
pub const DEFAULT_FORCED_COUP_AT: Coins = 10;
pub const DEFAULT_MIN_PLAYERS: usize = 2;
/// Six players hold twelve cards, which leaves three in the deck; enough for
/// an exchange to draw from.
pub const MAX_PLAYERS: usize = 6;

/// Counted in characters.
pub const MAX_USERNAME_LENGTH: usize = 32;
