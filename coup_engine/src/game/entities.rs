use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::constants;

/// The five character identities printed on the cards.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ambassador,
    Assassin,
    Captain,
    Contessa,
    Duke,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Self::Ambassador,
        Self::Assassin,
        Self::Captain,
        Self::Contessa,
        Self::Duke,
    ];

    /// Four letter code shown on the table.
    #[must_use]
    pub const fn short_code(&self) -> &'static str {
        match self {
            Self::Ambassador => "AMBA",
            Self::Assassin => "ASSN",
            Self::Captain => "CAPT",
            Self::Contessa => "CONT",
            Self::Duke => "DUKE",
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ambassador => "ambassador",
            Self::Assassin => "assassin",
            Self::Captain => "captain",
            Self::Contessa => "contessa",
            Self::Duke => "duke",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
#[error("I've never heard of a {0}; try ambassador, assassin, captain, contessa or duke.")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.name() == lowered || role.short_code().eq_ignore_ascii_case(&lowered))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A single card. Once eliminated a card stays face up for the rest of the
/// game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    role: Role,
    eliminated: bool,
}

impl Card {
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self {
            role,
            eliminated: false,
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    pub(crate) fn eliminate(&mut self) {
        self.eliminated = true;
    }

    /// Render the card for a viewer. `public` hides live cards from anyone
    /// but their owner; `strike` marks eliminated cards.
    #[must_use]
    pub fn view(&self, public: bool, strike: bool) -> String {
        let code = self.role.short_code();
        if self.eliminated && strike {
            format!("~[{code}]~")
        } else if !public || self.eliminated {
            format!("[{code}]")
        } else {
            "[????]".to_string()
        }
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum DeckError {
    #[error("the deck has {available} card(s) but {requested} were needed")]
    Empty { requested: usize, available: usize },
}

/// The undealt cards.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A shuffled deck holding every copy of every role.
    #[must_use]
    pub fn full() -> Self {
        let cards = Role::ALL
            .into_iter()
            .flat_map(|role| std::iter::repeat_n(Card::new(role), constants::COPIES_PER_ROLE))
            .collect();
        let mut deck = Self { cards };
        deck.shuffle();
        deck
    }

    /// Build a deck from explicit cards, in draw order from the back.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Shuffle with the thread-local CSPRNG. It is seeded from the OS and
    /// never exposed, so no player can predict the order.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if self.cards.len() < n {
            return Err(DeckError::Empty {
                requested: n,
                available: self.cards.len(),
            });
        }
        let at = self.cards.len() - n;
        Ok(self.cards.split_off(at))
    }

    /// Return a card and reshuffle, so nobody (including whoever just showed
    /// it) knows where it went.
    pub fn put_back(&mut self, card: Card) {
        self.cards.push(Card::new(card.role()));
        self.shuffle();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

/// Whole coins. Nobody gets near the limits of a u32 in a game of Coup.
pub type Coins = u32;

/// An opaque, already authenticated user name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    /// Normalize a raw name: a leading `@` mention marker is dropped and
    /// whitespace becomes `_`.
    pub fn new(s: &str) -> Self {
        let username: String = s
            .trim()
            .trim_start_matches('@')
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(constants::MAX_USERNAME_LENGTH)
            .collect();
        Self(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn mention(&self) -> String {
        format!("@{}", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum PlayerError {
    #[error("{username} has no live {role}")]
    NotFound { username: Username, role: Role },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub username: Username,
    pub cards: Vec<Card>,
    pub money: Coins,
}

impl Player {
    #[must_use]
    pub fn new(username: Username, cards: Vec<Card>, money: Coins) -> Self {
        Self {
            username,
            cards,
            money,
        }
    }

    /// Render the player's seat. With `public` set the live cards are
    /// hidden; players who are out are struck through as a whole.
    #[must_use]
    pub fn view(&self, public: bool) -> String {
        if self.is_out() {
            let cards = self
                .cards
                .iter()
                .map(|card| card.view(public, false))
                .collect::<Vec<_>>()
                .join(" ");
            format!("~{}: {}\u{2022} {cards}~", self.username, self.money)
        } else {
            let cards = self
                .cards
                .iter()
                .map(|card| card.view(public, true))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}: {}\u{2022} {cards}", self.username, self.money)
        }
    }

    pub fn live_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| !card.is_eliminated())
    }

    #[must_use]
    pub fn live_roles(&self) -> Vec<Role> {
        self.live_cards().map(Card::role).collect()
    }

    #[must_use]
    pub fn num_live(&self) -> usize {
        self.live_cards().count()
    }

    #[must_use]
    pub fn count_live(&self, role: Role) -> usize {
        self.live_cards().filter(|card| card.role() == role).count()
    }

    #[must_use]
    pub fn find_live_card(&self, role: Role) -> Option<&Card> {
        self.live_cards().find(|card| card.role() == role)
    }

    /// Take the first live card of the given role out of the hand.
    pub fn remove_card(&mut self, role: Role) -> Result<Card, PlayerError> {
        let idx = self
            .cards
            .iter()
            .position(|card| card.role() == role && !card.is_eliminated())
            .ok_or_else(|| PlayerError::NotFound {
                username: self.username.clone(),
                role,
            })?;
        Ok(self.cards.remove(idx))
    }

    /// Flip the first live card of the given role face up for good.
    pub(crate) fn eliminate(&mut self, role: Role) -> Result<(), PlayerError> {
        let card = self
            .cards
            .iter_mut()
            .find(|card| card.role() == role && !card.is_eliminated())
            .ok_or_else(|| PlayerError::NotFound {
                username: self.username.clone(),
                role,
            })?;
        card.eliminate();
        Ok(())
    }

    #[must_use]
    pub fn is_out(&self) -> bool {
        self.num_live() == 0
    }

    #[must_use]
    pub fn has_one_live_card(&self) -> bool {
        self.num_live() == 1
    }

    /// The role of the only live card, if exactly one is left.
    #[must_use]
    pub fn sole_live_role(&self) -> Option<Role> {
        if self.has_one_live_card() {
            self.live_cards().next().map(Card::role)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(cards: &[Role]) -> Player {
        Player::new(
            Username::new("alice"),
            cards.iter().copied().map(Card::new).collect(),
            2,
        )
    }

    // === Role Tests ===

    #[test]
    fn test_role_parses_names_and_codes() {
        assert_eq!("duke".parse::<Role>(), Ok(Role::Duke));
        assert_eq!("Contessa".parse::<Role>(), Ok(Role::Contessa));
        assert_eq!("capt".parse::<Role>(), Ok(Role::Captain));
        assert_eq!("AMBA".parse::<Role>(), Ok(Role::Ambassador));
        assert!("queen".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Assassin.to_string(), "assassin");
        assert_eq!(Role::Assassin.short_code(), "ASSN");
    }

    // === Card Tests ===

    #[test]
    fn test_card_view() {
        let mut card = Card::new(Role::Duke);
        assert_eq!(card.view(true, true), "[????]");
        assert_eq!(card.view(false, true), "[DUKE]");

        card.eliminate();
        assert!(card.is_eliminated());
        assert_eq!(card.view(true, true), "~[DUKE]~");
        assert_eq!(card.view(true, false), "[DUKE]");
    }

    // === Deck Tests ===

    #[test]
    fn test_full_deck_has_three_of_each_role() {
        let deck = Deck::full();
        assert_eq!(deck.len(), constants::TOTAL_CARDS);
        for role in Role::ALL {
            assert_eq!(deck.iter().filter(|card| card.role() == role).count(), 3);
        }
        assert!(deck.iter().all(|card| !card.is_eliminated()));
    }

    #[test]
    fn test_deck_draw() {
        let mut deck = Deck::full();
        let drawn = deck.draw(2).unwrap();
        assert_eq!(drawn.len(), 2);
        assert_eq!(deck.len(), 13);
    }

    #[test]
    fn test_deck_draw_too_many_leaves_deck_alone() {
        let mut deck = Deck::from_cards(vec![Card::new(Role::Duke)]);
        let err = deck.draw(2).unwrap_err();
        assert_eq!(
            err,
            DeckError::Empty {
                requested: 2,
                available: 1
            }
        );
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn test_deck_put_back_revives_card() {
        let mut deck = Deck::from_cards(vec![]);
        let mut card = Card::new(Role::Captain);
        card.eliminate();
        deck.put_back(card);
        assert_eq!(deck.len(), 1);
        assert!(deck.iter().all(|card| !card.is_eliminated()));
    }

    #[test]
    fn test_deck_shuffle_keeps_cards() {
        let mut deck = Deck::full();
        let mut before: Vec<Role> = deck.iter().map(Card::role).collect();
        deck.shuffle();
        let mut after: Vec<Role> = deck.iter().map(Card::role).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    // === Username Tests ===

    #[test]
    fn test_username_strips_mention() {
        assert_eq!(Username::new("@alice"), Username::new("alice"));
        assert_eq!(Username::new("@alice").mention(), "@alice");
    }

    #[test]
    fn test_username_replaces_whitespace() {
        assert_eq!(Username::new("alice smith").as_str(), "alice_smith");
    }

    #[test]
    fn test_username_truncates_on_char_boundary() {
        let username = Username::new(&format!("{}é", "a".repeat(31)));
        assert_eq!(username.as_str().chars().count(), 32);
        assert!(username.as_str().ends_with('é'));

        let username = Username::new(&"é".repeat(40));
        assert_eq!(username.as_str(), "é".repeat(32));
    }

    // === Player Tests ===

    #[test]
    fn test_player_live_cards() {
        let mut alice = player(&[Role::Duke, Role::Captain]);
        assert_eq!(alice.num_live(), 2);
        assert!(!alice.is_out());
        assert!(!alice.has_one_live_card());

        alice.eliminate(Role::Duke).unwrap();
        assert!(alice.has_one_live_card());
        assert_eq!(alice.sole_live_role(), Some(Role::Captain));
        assert!(alice.find_live_card(Role::Duke).is_none());

        alice.eliminate(Role::Captain).unwrap();
        assert!(alice.is_out());
        assert_eq!(alice.cards.len(), 2);
    }

    #[test]
    fn test_player_remove_card() {
        let mut alice = player(&[Role::Duke, Role::Duke]);
        alice.eliminate(Role::Duke).unwrap();
        let removed = alice.remove_card(Role::Duke).unwrap();
        assert!(!removed.is_eliminated());
        assert_eq!(alice.cards.len(), 1);
        assert!(matches!(
            alice.remove_card(Role::Duke),
            Err(PlayerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_player_view_hides_live_cards() {
        let mut alice = player(&[Role::Duke, Role::Contessa]);
        assert_eq!(alice.view(true), "alice: 2\u{2022} [????] [????]");
        assert_eq!(alice.view(false), "alice: 2\u{2022} [DUKE] [CONT]");

        alice.eliminate(Role::Duke).unwrap();
        assert_eq!(alice.view(true), "alice: 2\u{2022} ~[DUKE]~ [????]");

        alice.eliminate(Role::Contessa).unwrap();
        assert_eq!(alice.view(true), "~alice: 2\u{2022} [DUKE] [CONT]~");
    }

    #[test]
    fn test_count_live() {
        let alice = player(&[Role::Duke, Role::Duke, Role::Captain]);
        assert_eq!(alice.count_live(Role::Duke), 2);
        assert_eq!(alice.count_live(Role::Assassin), 0);
        assert_eq!(alice.live_roles(), vec![Role::Duke, Role::Duke, Role::Captain]);
    }
}
