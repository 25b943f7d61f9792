//! Everything that happens between an action being announced and the next
//! turn: challenges, blocks, losing cards and exchanging them.

use log::{debug, info};
use std::collections::HashMap;

use super::actions::ActionKind;
use super::constants::EXCHANGE_DRAW;
use super::entities::{Role, Username};
use super::state_machine::{GameState, InvalidMove, Narrative, Status};

impl GameState {
    // CHALLENGES

    /// Call the current claim (an action or a block) a bluff.
    pub fn pose_challenge(&mut self, username: &Username) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        self.require_live_player(username)?;

        let (status, verb, challengee) = match (&self.status, &self.pending, &self.blocker) {
            (Status::Acted, Some(pending), _) if pending.kind.is_challengeable() => (
                Status::Challenged,
                pending.kind.to_string(),
                pending.actor.clone(),
            ),
            (Status::Blocked, Some(_), Some(blocker)) => {
                (Status::BlockChallenged, "block".to_string(), blocker.clone())
            }
            _ => return Err(InvalidMove::NothingToChallenge),
        };
        if &challengee == username {
            return Err(InvalidMove::SelfChallenge);
        }

        self.status = status;
        self.challenger = Some(username.clone());
        debug!("room {}: {username} challenged {challengee}", self.room_id);

        let mut narrative =
            Narrative::from(format!("{username} has challenged {challengee}'s {verb}."));
        let sole_role = self
            .get_player(&challengee)
            .and_then(|player| player.sole_live_role());
        match sole_role {
            Some(role) => narrative.append(self.reveal(role)?),
            None => narrative.push(format!("{challengee}, please show a card.")),
        }
        self.touch();
        Ok(narrative)
    }

    /// The challenged player shows a card.
    pub fn resolve_challenge(
        &mut self,
        username: &Username,
        role: Role,
    ) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        if !matches!(self.status, Status::Challenged | Status::BlockChallenged)
            || self.challengee() != Some(username)
        {
            return Err(InvalidMove::NotChallenged);
        }
        if self.require_player(username)?.find_live_card(role).is_none() {
            return Err(InvalidMove::CardNotHeld(role));
        }

        let narrative = self.reveal(role)?;
        self.touch();
        Ok(narrative)
    }

    /// The losing challenger flips one of their own cards.
    pub fn lose_challenge(
        &mut self,
        username: &Username,
        role: Role,
    ) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        if !matches!(
            self.status,
            Status::ChallengeLost | Status::BlockChallengeLost
        ) || self.challenger.as_ref() != Some(username)
        {
            return Err(InvalidMove::NotChallenged);
        }
        if self.require_player(username)?.find_live_card(role).is_none() {
            return Err(InvalidMove::CardNotHeld(role));
        }

        let narrative = self.settle_lost_challenge(role)?;
        self.touch();
        Ok(narrative)
    }

    /// Settle a challenge with the card the challengee showed. A matching
    /// card is swapped for a fresh one and the challenger pays; anything else
    /// was a bluff and costs the challengee that card.
    fn reveal(&mut self, role: Role) -> Result<Narrative, InvalidMove> {
        let (Some(challengee), Some(challenger), Some(pending)) = (
            self.challengee().cloned(),
            self.challenger.clone(),
            self.pending.clone(),
        ) else {
            return Err(InvalidMove::NotChallenged);
        };

        let claimed = match self.status {
            Status::Challenged => pending.kind.claimed_role(),
            _ => self.blocked_with,
        };

        if claimed == Some(role) {
            self.status = match self.status {
                Status::Challenged => Status::ChallengeLost,
                _ => Status::BlockChallengeLost,
            };
            let mut narrative =
                Narrative::from(format!("{challengee} showed a {role}, and it was real."));
            narrative.append(self.redeal_card(&challengee, role)?);

            let sole_role = self
                .get_player(&challenger)
                .and_then(|player| player.sole_live_role());
            match sole_role {
                Some(role) => narrative.append(self.settle_lost_challenge(role)?),
                None => narrative.push(format!("{challenger}, please flip a card.")),
            }
            return Ok(narrative);
        }

        let mut narrative = self.flip_card(&challengee, role)?;
        match self.status {
            Status::Challenged => {
                narrative.push(format!("The {} failed.", pending.kind));
                self.clear_action();
            }
            _ => {
                narrative.push("The block failed.");
                self.status = Status::BlockChallengeWon;
                narrative.append(self.maybe_autoresolve(false, true));
            }
        }
        Ok(narrative)
    }

    fn settle_lost_challenge(&mut self, role: Role) -> Result<Narrative, InvalidMove> {
        let Some(challenger) = self.challenger.clone() else {
            return Err(InvalidMove::NotChallenged);
        };
        let mut narrative = self.flip_card(&challenger, role)?;

        match self.status {
            Status::ChallengeLost => {
                self.status = Status::ChallengeLossResolved;
                let Some(pending) = self.pending.clone() else {
                    return Ok(narrative);
                };
                let target_out = pending
                    .target
                    .as_ref()
                    .and_then(|target| self.get_player(target))
                    .is_some_and(|target| target.is_out());
                if pending.kind.costs_a_card() && target_out {
                    narrative.append(self.maybe_autoresolve(true, false));
                } else if pending.kind.is_blockable() {
                    narrative.push(Self::block_prompt(pending.kind, pending.target.as_ref()));
                    if pending.kind.costs_a_card() {
                        narrative.append(self.maybe_autoresolve(true, false));
                    }
                } else {
                    narrative.append(self.maybe_autoresolve(true, false));
                }
            }
            _ => {
                self.status = Status::BlockChallengeLossResolved;
                if let Some(pending) = &self.pending {
                    narrative.push(format!("The {} was blocked.", pending.kind));
                }
                self.clear_action();
            }
        }
        Ok(narrative)
    }

    /// Swap a card that survived a challenge for a random one. It goes back
    /// into the deck and the deck is shuffled before the replacement is drawn.
    fn redeal_card(&mut self, username: &Username, role: Role) -> Result<Narrative, InvalidMove> {
        let card = self.player_mut(username)?.remove_card(role)?;
        self.deck.put_back(card);
        let drawn = self.deck.draw(1)?;
        self.player_mut(username)?.cards.extend(drawn);
        Ok(Narrative::from(format!("{username} drew a new card.")))
    }

    /// Turn a card face up for good, then make sure the rotation still points
    /// at someone who is in.
    fn flip_card(&mut self, username: &Username, role: Role) -> Result<Narrative, InvalidMove> {
        self.player_mut(username)?.eliminate(role)?;
        self.skip_out_players();

        let mut narrative = Narrative::from(format!("{username} flipped over a {role}."));
        if let Some(winner) = self.winner() {
            info!("room {}: {winner} won", self.room_id);
            narrative.push(format!("{winner} wins!"));
        }
        Ok(narrative)
    }

    // BLOCKS

    pub fn pose_block(&mut self, username: &Username, role: Role) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        self.require_live_player(username)?;

        let pending = match (&self.status, &self.pending) {
            (
                Status::Acted | Status::ChallengeLossResolved | Status::BlockChallengeLossResolved,
                Some(pending),
            ) => pending,
            _ => return Err(InvalidMove::CannotBlockNow),
        };
        let kind = pending.kind;
        if !kind.is_blockable() {
            return Err(InvalidMove::Unblockable(kind));
        }
        if &pending.actor == username {
            return Err(InvalidMove::SelfBlock);
        }
        if !kind.blockable_by_anyone() && pending.target.as_ref() != Some(username) {
            return Err(InvalidMove::NotTheTarget(kind));
        }
        if !kind.can_be_blocked_with(role) {
            return Err(InvalidMove::WrongBlockingRole { action: kind, role });
        }

        let actor = pending.actor.clone();
        self.status = Status::Blocked;
        self.blocker = Some(username.clone());
        self.blocked_with = Some(role);
        self.challenger = None;
        debug!("room {}: {username} blocked {actor}'s {kind}", self.room_id);

        let mut narrative = Narrative::from(format!(
            "{username} has blocked {actor}'s {kind} with a {role}."
        ));
        narrative.push("Anyone may challenge the block.");
        self.touch();
        Ok(narrative)
    }

    // EXCHANGE

    /// Draw the two exchange cards into the actor's hand.
    pub fn take_cards(&mut self, username: &Username) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        self.ensure_exchanging(username)?;
        if !matches!(
            self.status,
            Status::Acted | Status::ChallengeLossResolved | Status::BlockChallengeLossResolved
        ) {
            return Err(InvalidMove::CannotTakeCards);
        }
        if self.deck.len() < EXCHANGE_DRAW {
            return Err(InvalidMove::DeckExhausted);
        }

        self.deck.shuffle();
        let drawn = self.deck.draw(EXCHANGE_DRAW)?;
        self.player_mut(username)?.cards.extend(drawn);
        self.status = Status::CardsTaken;
        self.touch();
        Ok(Narrative::from(format!(
            "{username} drew two cards and must now choose which to keep."
        )))
    }

    /// Keep `roles` and send the rest of the live hand back to the deck. The
    /// actor keeps as many cards as they held before drawing.
    pub fn keep_cards(
        &mut self,
        username: &Username,
        roles: &[Role],
    ) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        self.ensure_exchanging(username)?;
        if self.status != Status::CardsTaken {
            return Err(InvalidMove::CardsNotTaken);
        }

        let player = self.require_player(username)?;
        let expected = player.num_live().saturating_sub(EXCHANGE_DRAW);
        if roles.len() != expected {
            return Err(InvalidMove::WrongKeepCount {
                expected,
                given: roles.len(),
            });
        }
        let mut wanted: HashMap<Role, usize> = HashMap::new();
        for role in roles {
            *wanted.entry(*role).or_default() += 1;
        }
        for (&role, &count) in &wanted {
            if player.count_live(role) < count {
                return Err(match count {
                    1 => InvalidMove::CardNotHeld(role),
                    _ => InvalidMove::NotEnoughCopies { role, count },
                });
            }
        }

        let mut returned = player.live_roles();
        for role in roles {
            if let Some(idx) = returned.iter().position(|held| held == role) {
                returned.swap_remove(idx);
            }
        }
        for role in returned {
            let card = self.player_mut(username)?.remove_card(role)?;
            self.deck.put_back(card);
        }

        self.clear_action();
        self.touch();
        Ok(Narrative::from(format!("{username} returned their cards.")))
    }

    fn ensure_exchanging(&self, username: &Username) -> Result<(), InvalidMove> {
        let Some(pending) = &self.pending else {
            return Err(InvalidMove::NotExchanging);
        };
        if &pending.actor != username {
            return Err(InvalidMove::NotYourAction);
        }
        if pending.kind != ActionKind::Exchange {
            return Err(InvalidMove::NotExchanging);
        }
        Ok(())
    }

    // CARD LOSS

    /// The target of an assassination or coup gives up a card.
    pub fn lose_card(&mut self, username: &Username, role: Role) -> Result<Narrative, InvalidMove> {
        self.ensure_not_over()?;
        let pending = match &self.pending {
            Some(pending) if pending.kind.costs_a_card() => pending,
            _ => return Err(InvalidMove::NoCardToLose),
        };
        if pending.target.as_ref() != Some(username) {
            return Err(InvalidMove::NotTargeted(pending.kind));
        }
        if !matches!(
            self.status,
            Status::Acted
                | Status::ChallengeLossResolved
                | Status::BlockChallengeLossResolved
                | Status::BlockChallengeWon
        ) {
            return Err(InvalidMove::NotTimeToFlip);
        }
        if self.require_player(username)?.find_live_card(role).is_none() {
            return Err(InvalidMove::CardNotHeld(role));
        }

        let narrative = self.flip_card(username, role)?;
        self.clear_action();
        self.touch();
        Ok(narrative)
    }
}
