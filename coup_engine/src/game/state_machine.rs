//! Game state for a single room and the turn-taking half of the state
//! machine. Challenges, blocks, card loss and exchanges live in
//! [`super::resolution`].

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashSet, VecDeque},
    fmt,
};
use thiserror::Error;

use super::actions::{ActionKind, UnknownAction};
use super::constants::{
    CARDS_PER_PLAYER, COPIES_PER_ROLE, DEFAULT_FORCED_COUP_AT, DEFAULT_MIN_PLAYERS,
    DEFAULT_STARTING_MONEY, MAX_PLAYERS, TOTAL_CARDS,
};
use super::entities::{
    Card, Coins, Deck, DeckError, Player, PlayerError, Role, UnknownRole, Username,
};

/// Rooms are keyed by whatever the host uses to identify a channel.
pub type RoomId = String;

/// Every way a command can break the rules. The message is meant for the
/// player who sent the command.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum InvalidMove {
    #[error("It's not your turn! It's {next}'s turn.")]
    OutOfTurn { next: Username },
    #[error("It's not time for the next person to go yet!")]
    NotReady,
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
    #[error("You don't have enough money to do that; you need {cost} and only have {money}.")]
    InsufficientFunds { cost: Coins, money: Coins },
    #[error("You have {money} coins; you must coup.")]
    MustCoup { money: Coins },
    #[error("{0} needs a target.")]
    MissingTarget(ActionKind),
    #[error("{0} doesn't take a target.")]
    UnexpectedTarget(ActionKind),
    #[error("You can't target yourself.")]
    SelfTarget,
    #[error("{0} is out.")]
    TargetOut(Username),
    #[error("{0} isn't in this game.")]
    PlayerNotFound(Username),
    #[error("You're out of the game.")]
    PlayerOut,
    #[error("There's nothing to challenge.")]
    NothingToChallenge,
    #[error("You can't challenge yourself.")]
    SelfChallenge,
    #[error("You haven't been challenged.")]
    NotChallenged,
    #[error("You don't have a {0}.")]
    CardNotHeld(Role),
    #[error("You don't have {count} {role}s.")]
    NotEnoughCopies { role: Role, count: usize },
    #[error("You can't block right now.")]
    CannotBlockNow,
    #[error("{0} can't be blocked.")]
    Unblockable(ActionKind),
    #[error("You can't block yourself.")]
    SelfBlock,
    #[error("Only the target of a {0} can block it.")]
    NotTheTarget(ActionKind),
    #[error("You can't block {action} with a {role}.")]
    WrongBlockingRole { action: ActionKind, role: Role },
    #[error("It's not your turn.")]
    NotYourAction,
    #[error("You didn't exchange.")]
    NotExchanging,
    #[error("You can't take your cards right now.")]
    CannotTakeCards,
    #[error("You didn't take cards! Take them before choosing what to keep.")]
    CardsNotTaken,
    #[error("You need to keep exactly {expected} card(s), not {given}.")]
    WrongKeepCount { expected: usize, given: usize },
    #[error("You don't need to lose a card now.")]
    NoCardToLose,
    #[error("You weren't the target of the {0}.")]
    NotTargeted(ActionKind),
    #[error("It's not time to flip a card yet.")]
    NotTimeToFlip,
    #[error("The game is over; {0} has won.")]
    GameOver(Username),
    #[error("A game needs between {min} and {max} players, not {got}.")]
    PlayerCount { min: usize, max: usize, got: usize },
    #[error("{0} is listed twice.")]
    DuplicatePlayer(Username),
    #[error("Usernames can't be blank.")]
    BlankUsername,
    #[error("{0} must be dealt at least one card.")]
    EmptyHand(Username),
    #[error("There are only three {0}s in the deck.")]
    TooManyCopies(Role),
    #[error("The deck ran out of cards.")]
    DeckExhausted,
}

impl From<DeckError> for InvalidMove {
    fn from(value: DeckError) -> Self {
        error!("deck error: {value}");
        Self::DeckExhausted
    }
}

impl From<PlayerError> for InvalidMove {
    fn from(value: PlayerError) -> Self {
        match value {
            PlayerError::NotFound { role, .. } => Self::CardNotHeld(role),
        }
    }
}

/// Where the current action is in its resolution.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ready,
    Acted,
    Challenged,
    ChallengeLost,
    ChallengeLossResolved,
    Blocked,
    BlockChallenged,
    BlockChallengeWon,
    BlockChallengeLost,
    BlockChallengeLossResolved,
    CardsTaken,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Ready => "READY",
            Self::Acted => "ACTED",
            Self::Challenged => "CHALLENGED",
            Self::ChallengeLost => "CHALLENGE_LOST",
            Self::ChallengeLossResolved => "CHALLENGE_LOSS_RESOLVED",
            Self::Blocked => "BLOCKED",
            Self::BlockChallenged => "BLOCK_CHALLENGED",
            Self::BlockChallengeWon => "BLOCK_CHALLENGE_WON",
            Self::BlockChallengeLost => "BLOCK_CHALLENGE_LOST",
            Self::BlockChallengeLossResolved => "BLOCK_CHALLENGE_LOSS_RESOLVED",
            Self::CardsTaken => "CARDS_TAKEN",
        };
        write!(f, "{repr}")
    }
}

/// The action that was announced last and hasn't been settled yet.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub actor: Username,
    pub target: Option<Username>,
}

/// What happened as a result of a command, one sentence per line. Meant to
/// be shown to the whole room.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Narrative(Vec<String>);

impl Narrative {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !line.is_empty() {
            self.0.push(line);
        }
    }

    pub fn append(&mut self, other: Narrative) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Narrative {
    fn from(value: String) -> Self {
        let mut narrative = Self::new();
        narrative.push(value);
        narrative
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("\n"))
    }
}

/// Table rules that can vary between rooms.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub starting_money: Coins,
    /// Players holding at least this much must coup.
    pub forced_coup_at: Coins,
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_STARTING_MONEY,
            DEFAULT_FORCED_COUP_AT,
            DEFAULT_MIN_PLAYERS,
            MAX_PLAYERS,
        )
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(
        starting_money: Coins,
        forced_coup_at: Coins,
        min_players: usize,
        max_players: usize,
    ) -> Self {
        Self {
            starting_money,
            forced_coup_at,
            min_players,
            max_players,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_players < DEFAULT_MIN_PLAYERS {
            return Err(format!("Min players must be at least {DEFAULT_MIN_PLAYERS}"));
        }
        if self.max_players > MAX_PLAYERS {
            return Err(format!("Max players must be at most {MAX_PLAYERS}"));
        }
        if self.min_players > self.max_players {
            return Err("Min players can't exceed max players".to_string());
        }
        if self.forced_coup_at < ActionKind::Coup.cost() {
            return Err(format!(
                "Forced coup threshold must be at least the cost of a coup ({})",
                ActionKind::Coup.cost()
            ));
        }
        Ok(())
    }
}

/// One game of Coup. Players are kept in rotation order: the front of the
/// queue acts next.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameState {
    pub(super) room_id: RoomId,
    pub(super) players: VecDeque<Player>,
    pub(super) deck: Deck,
    pub(super) status: Status,
    pub(super) pending: Option<PendingAction>,
    pub(super) challenger: Option<Username>,
    pub(super) blocker: Option<Username>,
    pub(super) blocked_with: Option<Role>,
    pub(super) settings: GameSettings,
    pub(super) last_updated: DateTime<Utc>,
}

impl GameState {
    /// Deal a new game. The first username acts first.
    pub fn create(
        room_id: impl Into<RoomId>,
        usernames: &[Username],
        settings: GameSettings,
    ) -> Result<Self, InvalidMove> {
        Self::validate_roster(usernames, &settings)?;
        let mut deck = Deck::full();
        let mut players = VecDeque::with_capacity(usernames.len());
        for username in usernames {
            let cards = deck.draw(CARDS_PER_PLAYER)?;
            players.push_back(Player::new(username.clone(), cards, settings.starting_money));
        }

        let game = Self::assemble(room_id.into(), players, deck, settings);
        info!(
            "room {}: dealt a game for {}",
            game.room_id,
            game.player_usernames()
                .iter()
                .map(Username::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(game)
    }

    /// Deal a game with known hands. Whatever isn't dealt goes into the deck,
    /// shuffled. Handy for replays and for setting up a specific table.
    pub fn from_hands(
        room_id: impl Into<RoomId>,
        hands: Vec<(Username, Vec<Role>)>,
        settings: GameSettings,
    ) -> Result<Self, InvalidMove> {
        let usernames: Vec<Username> = hands.iter().map(|(username, _)| username.clone()).collect();
        Self::validate_roster(&usernames, &settings)?;

        let mut remaining: Vec<Card> = Role::ALL
            .into_iter()
            .flat_map(|role| std::iter::repeat_n(Card::new(role), COPIES_PER_ROLE))
            .collect();
        let mut players = VecDeque::with_capacity(hands.len());
        for (username, roles) in hands {
            if roles.is_empty() {
                return Err(InvalidMove::EmptyHand(username));
            }
            let mut cards = Vec::with_capacity(roles.len());
            for role in roles {
                let idx = remaining
                    .iter()
                    .position(|card| card.role() == role)
                    .ok_or(InvalidMove::TooManyCopies(role))?;
                cards.push(remaining.swap_remove(idx));
            }
            players.push_back(Player::new(username, cards, settings.starting_money));
        }

        let mut deck = Deck::from_cards(remaining);
        deck.shuffle();
        Ok(Self::assemble(room_id.into(), players, deck, settings))
    }

    fn validate_roster(usernames: &[Username], settings: &GameSettings) -> Result<(), InvalidMove> {
        let got = usernames.len();
        if got < settings.min_players || got > settings.max_players {
            return Err(InvalidMove::PlayerCount {
                min: settings.min_players,
                max: settings.max_players,
                got,
            });
        }
        let mut seen = HashSet::with_capacity(got);
        for username in usernames {
            if username.as_str().is_empty() {
                return Err(InvalidMove::BlankUsername);
            }
            if !seen.insert(username) {
                return Err(InvalidMove::DuplicatePlayer(username.clone()));
            }
        }
        Ok(())
    }

    fn assemble(
        room_id: RoomId,
        players: VecDeque<Player>,
        deck: Deck,
        settings: GameSettings,
    ) -> Self {
        Self {
            room_id,
            players,
            deck,
            status: Status::Ready,
            pending: None,
            challenger: None,
            blocker: None,
            blocked_with: None,
            settings,
            last_updated: Utc::now(),
        }
    }

    // QUERIES

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn challenger(&self) -> Option<&Username> {
        self.challenger.as_ref()
    }

    #[must_use]
    pub fn blocker(&self) -> Option<&Username> {
        self.blocker.as_ref()
    }

    #[must_use]
    pub fn blocked_with(&self) -> Option<Role> {
        self.blocked_with
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Players in rotation order, next to act first.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    #[must_use]
    pub fn player_usernames(&self) -> Vec<Username> {
        self.players.iter().map(|player| player.username.clone()).collect()
    }

    #[must_use]
    pub fn get_player(&self, username: &Username) -> Option<&Player> {
        self.players.iter().find(|player| &player.username == username)
    }

    pub(super) fn player_mut(&mut self, username: &Username) -> Result<&mut Player, InvalidMove> {
        self.players
            .iter_mut()
            .find(|player| &player.username == username)
            .ok_or_else(|| InvalidMove::PlayerNotFound(username.clone()))
    }

    pub(super) fn require_player(&self, username: &Username) -> Result<&Player, InvalidMove> {
        self.get_player(username)
            .ok_or_else(|| InvalidMove::PlayerNotFound(username.clone()))
    }

    /// Like [`Self::require_player`], but also refuses players who are out.
    pub(super) fn require_live_player(&self, username: &Username) -> Result<&Player, InvalidMove> {
        let player = self.require_player(username)?;
        if player.is_out() {
            return Err(InvalidMove::PlayerOut);
        }
        Ok(player)
    }

    pub fn remaining_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| !player.is_out())
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn next_player(&self) -> &Player {
        // Never empty: a game can't be dealt with fewer than two players.
        &self.players[0]
    }

    #[must_use]
    pub fn winner(&self) -> Option<&Username> {
        let mut remaining = self.remaining_players();
        match (remaining.next(), remaining.next()) {
            (Some(player), None) => Some(&player.username),
            _ => None,
        }
    }

    /// Cards in the deck plus cards in hands, live or not.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.deck.len() + self.players.iter().map(|player| player.cards.len()).sum::<usize>()
    }

    pub(super) fn ensure_not_over(&self) -> Result<(), InvalidMove> {
        match self.winner() {
            Some(winner) => Err(InvalidMove::GameOver(winner.clone())),
            None => Ok(()),
        }
    }

    /// The player who must show a card for the current challenge.
    pub(super) fn challengee(&self) -> Option<&Username> {
        match self.status {
            Status::Challenged | Status::ChallengeLost => {
                self.pending.as_ref().map(|pending| &pending.actor)
            }
            Status::BlockChallenged | Status::BlockChallengeLost => self.blocker.as_ref(),
            _ => None,
        }
    }

    // VIEWS

    #[must_use]
    pub fn status_line(&self) -> String {
        if let Some(winner) = self.winner() {
            return format!("*{winner} has won!*");
        }
        let Some(pending) = &self.pending else {
            return format!("It's {}'s turn.", self.next_player().username);
        };

        let mut action_bit = format!("{} used {}", pending.actor, pending.kind);
        if let Some(target) = &pending.target {
            action_bit.push_str(&format!(" on {target}"));
        }
        let challenger = self.challenger.as_ref().map_or("someone", Username::as_str);
        let blocker = self.blocker.as_ref().map_or("someone", Username::as_str);
        let blocked_with = self.blocked_with.map_or("card", |role| role.name());

        match self.status {
            Status::Ready => format!("It's {}'s turn.", self.next_player().username),
            Status::Acted => format!("{action_bit}."),
            Status::Challenged => format!("{action_bit}, and {challenger} challenged."),
            Status::ChallengeLost => format!(
                "{action_bit}, and {challenger}'s challenge failed. {challenger} must flip a card."
            ),
            Status::ChallengeLossResolved => {
                format!("{action_bit}, and {challenger}'s challenge failed.")
            }
            Status::Blocked => format!("{action_bit}, and {blocker} blocked with a {blocked_with}."),
            Status::BlockChallenged => format!(
                "{action_bit}, {blocker} blocked with a {blocked_with}, and {challenger} challenged."
            ),
            Status::BlockChallengeWon => format!(
                "{action_bit}, {blocker} blocked with a {blocked_with}, and {challenger}'s challenge was successful."
            ),
            Status::BlockChallengeLost => format!(
                "{action_bit}, {blocker} blocked with a {blocked_with}, and {challenger}'s challenge failed. {challenger} must flip a card."
            ),
            Status::BlockChallengeLossResolved => format!(
                "{action_bit}, {blocker} blocked with a {blocked_with}, and {challenger}'s challenge failed."
            ),
            Status::CardsTaken => format!("{action_bit}, and has taken cards."),
        }
    }

    /// The status line followed by every seat. Live cards are only shown to
    /// their owner.
    #[must_use]
    pub fn status_view(&self, viewer: Option<&Username>) -> String {
        let mut lines = vec![self.status_line()];
        lines.extend(
            self.players
                .iter()
                .map(|player| player.view(viewer != Some(&player.username))),
        );
        lines.join("\n")
    }

    /// A player's own hand, for their eyes only.
    pub fn player_view(&self, username: &Username) -> Result<String, InvalidMove> {
        Ok(self.require_player(username)?.view(false))
    }

    // TURNS

    /// Start a new action. This is the only way the turn moves on, and it
    /// settles whatever the previous player did first.
    pub fn take_action(
        &mut self,
        username: &Username,
        action: ActionKind,
        target: Option<&Username>,
    ) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        let actor = self.require_player(username)?;
        let next = self.next_player();
        if actor.username != next.username {
            return Err(InvalidMove::OutOfTurn {
                next: next.username.clone(),
            });
        }

        let previous_settled = match (&self.status, &self.pending) {
            (Status::Ready | Status::Blocked, _) => true,
            (Status::Acted | Status::ChallengeLossResolved, pending) => {
                pending.as_ref().is_none_or(|pending| !pending.kind.needs_response())
            }
            _ => false,
        };
        if !previous_settled {
            return Err(InvalidMove::NotReady);
        }

        // Money the actor will hold once the previous action pays out.
        let money = self.money_after_settling(username);
        let cost = action.cost();
        if money < cost {
            return Err(InvalidMove::InsufficientFunds { cost, money });
        }
        if money >= self.settings.forced_coup_at && action != ActionKind::Coup {
            return Err(InvalidMove::MustCoup { money });
        }

        match (action.needs_target(), target) {
            (true, None) => return Err(InvalidMove::MissingTarget(action)),
            (false, Some(_)) => return Err(InvalidMove::UnexpectedTarget(action)),
            (true, Some(target)) => {
                if target == username {
                    return Err(InvalidMove::SelfTarget);
                }
                if self.require_player(target)?.is_out() {
                    return Err(InvalidMove::TargetOut(target.clone()));
                }
            }
            (false, None) => {}
        }

        let mut narrative = self.settle_previous();
        narrative.append(self.begin_action(username, action, target.cloned())?);
        narrative.append(self.maybe_autoresolve(false, false));
        self.touch();
        Ok(narrative)
    }

    /// What `username` will hold after [`Self::settle_previous`].
    fn money_after_settling(&self, username: &Username) -> Coins {
        let money = self.get_player(username).map_or(0, |player| player.money);
        let Some(pending) = &self.pending else {
            return money;
        };
        if self.status == Status::Blocked {
            return money;
        }
        match pending.kind {
            ActionKind::Steal => {
                let stolen = self.steal_amount();
                if pending.target.as_ref() == Some(username) {
                    money.saturating_sub(stolen)
                } else if &pending.actor == username {
                    money + stolen
                } else {
                    money
                }
            }
            kind if &pending.actor == username => money + kind.gain(),
            _ => money,
        }
    }

    /// A steal takes two coins, or whatever the target has left.
    pub(super) fn steal_amount(&self) -> Coins {
        self.pending
            .as_ref()
            .and_then(|pending| pending.target.as_ref())
            .and_then(|target| self.get_player(target))
            .map_or(0, |target| target.money.min(ActionKind::Steal.gain()))
    }

    /// Close out the previous action before a new one starts. A block nobody
    /// challenged stands; anything else goes through.
    fn settle_previous(&mut self) -> Narrative {
        if self.status == Status::Blocked {
            let mut narrative = Narrative::new();
            if let Some(pending) = &self.pending {
                narrative.push(format!("{}'s {} was blocked.", pending.actor, pending.kind));
            }
            self.clear_action();
            narrative
        } else {
            self.flush_action()
        }
    }

    fn begin_action(
        &mut self,
        username: &Username,
        kind: ActionKind,
        target: Option<Username>,
    ) -> Result<Narrative, InvalidMove> {
        // Costs are paid no matter what happens next; gains wait until the
        // action goes through.
        let actor = self.player_mut(username)?;
        actor.money -= kind.cost();

        let mut narrative = Narrative::new();
        match &target {
            Some(target) => narrative.push(format!("{username} used {kind} on {target}!")),
            None => narrative.push(format!("{username} used {kind}!")),
        }
        if kind.is_challengeable() {
            narrative.push("Anyone may challenge.");
        }
        if kind.is_blockable() {
            narrative.push(Self::block_prompt(kind, target.as_ref()));
        }
        debug!("room {}: {username} used {kind}", self.room_id);

        self.pending = Some(PendingAction {
            kind,
            actor: username.clone(),
            target,
        });
        self.challenger = None;
        self.blocker = None;
        self.blocked_with = None;
        self.status = Status::Acted;
        self.advance_turn();
        Ok(narrative)
    }

    pub(super) fn block_prompt(kind: ActionKind, target: Option<&Username>) -> String {
        let roles = kind
            .blocking_roles()
            .iter()
            .map(Role::name)
            .collect::<Vec<_>>()
            .join(" or ");
        match target {
            Some(target) if !kind.blockable_by_anyone() => {
                format!("{target} may block with a {roles}.")
            }
            _ => format!("Anyone may block with a {roles}."),
        }
    }

    /// Move the current player to the back and skip anyone who is out.
    fn advance_turn(&mut self) {
        self.players.rotate_left(1);
        self.skip_out_players();
    }

    /// Keep the front of the rotation on a live player.
    pub(super) fn skip_out_players(&mut self) {
        for _ in 0..self.players.len() {
            if !self.next_player().is_out() {
                return;
            }
            self.players.rotate_left(1);
        }
    }

    /// Apply whatever the pending action is still owed and reset to
    /// [`Status::Ready`]. Never used for actions that need a response.
    pub(super) fn flush_action(&mut self) -> Narrative {
        let Some(pending) = self.pending.clone() else {
            return Narrative::new();
        };

        let gain = match pending.kind {
            ActionKind::Steal => {
                let stolen = self.steal_amount();
                if let Some(target) = &pending.target
                    && let Ok(target) = self.player_mut(target)
                {
                    target.money -= stolen;
                }
                stolen
            }
            kind => kind.gain(),
        };
        if let Ok(actor) = self.player_mut(&pending.actor) {
            actor.money += gain;
        }

        self.clear_action();
        debug!(
            "room {}: {}'s {} completed",
            self.room_id, pending.actor, pending.kind
        );
        Narrative::from(format!(
            "{}'s {} was completed successfully.",
            pending.actor, pending.kind
        ))
    }

    pub(super) fn clear_action(&mut self) {
        self.pending = None;
        self.challenger = None;
        self.blocker = None;
        self.blocked_with = None;
        self.status = Status::Ready;
    }

    /// Push the pending action as far as it can go without anyone else
    /// saying anything.
    pub(super) fn maybe_autoresolve(
        &mut self,
        challenge_complete: bool,
        block_complete: bool,
    ) -> Narrative {
        let Some(pending) = self.pending.clone() else {
            return Narrative::new();
        };
        match pending.kind {
            ActionKind::Income => {
                // Nobody needs to be told income went through.
                self.flush_action();
                Narrative::new()
            }
            ActionKind::Assassinate | ActionKind::Coup => {
                let target = pending.target.unwrap_or_else(|| pending.actor.clone());
                if self.get_player(&target).is_none_or(Player::is_out) {
                    self.clear_action();
                    Narrative::from(format!("{target} has no cards left to lose."))
                } else {
                    Narrative::from(format!("{target}, when you're ready, lose a card."))
                }
            }
            ActionKind::Exchange => {
                Narrative::from(format!("{}, pick up your cards.", pending.actor))
            }
            kind if block_complete || (challenge_complete && !kind.is_blockable()) => {
                self.flush_action()
            }
            _ => Narrative::new(),
        }
    }

    pub(super) fn touch(&mut self) {
        self.last_updated = Utc::now();
        self.check_invariants();
    }

    /// Conservation and rotation must hold after every command. A breach is
    /// a bug, not a user error.
    fn check_invariants(&self) {
        let count = self.card_count();
        if count != TOTAL_CARDS {
            error!(
                "room {}: card conservation broken, {count} cards in play",
                self.room_id
            );
        }
        debug_assert_eq!(count, TOTAL_CARDS);

        let head_out = self.next_player().is_out();
        if head_out {
            error!("room {}: rotation head is out", self.room_id);
        }
        debug_assert!(!head_out);
    }
}
