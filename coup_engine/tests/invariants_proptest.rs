/// Property-based tests for the game invariants using proptest
///
/// These tests throw long random command sequences at a freshly dealt game
/// and check that card conservation, rotation and win detection hold after
/// every command, and that rejected commands change nothing.
use coup_engine::{
    ActionKind, GameSettings, GameState, InvalidMove, Narrative, Role, Status, TOTAL_CARDS,
    Username,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Act { action: usize, target: usize },
    Challenge(usize),
    Reveal(usize, usize),
    Flip(usize, usize),
    Block(usize, usize),
    TakeCards(usize),
    Keep(usize),
    LoseCard(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..ActionKind::ALL.len(), 0..6usize)
            .prop_map(|(action, target)| Op::Act { action, target }),
        2 => (0..6usize).prop_map(Op::Challenge),
        2 => (0..6usize, 0..4usize).prop_map(|(p, c)| Op::Reveal(p, c)),
        2 => (0..6usize, 0..4usize).prop_map(|(p, c)| Op::Flip(p, c)),
        2 => (0..6usize, 0..Role::ALL.len()).prop_map(|(p, r)| Op::Block(p, r)),
        1 => (0..6usize).prop_map(Op::TakeCards),
        1 => (0..6usize).prop_map(Op::Keep),
        2 => (0..6usize, 0..4usize).prop_map(|(p, c)| Op::LoseCard(p, c)),
    ]
}

fn usernames(n: usize) -> Vec<Username> {
    (0..n).map(|i| Username::new(&format!("player{i}"))).collect()
}

/// Pick one of the player's live roles, or any role if they have none.
fn live_role(game: &GameState, username: &Username, idx: usize) -> Role {
    let roles = game
        .get_player(username)
        .map(|player| player.live_roles())
        .unwrap_or_default();
    if roles.is_empty() {
        Role::ALL[idx % Role::ALL.len()]
    } else {
        roles[idx % roles.len()]
    }
}

fn apply(game: &mut GameState, names: &[Username], op: &Op) -> Result<Narrative, InvalidMove> {
    let pick = |i: usize| &names[i % names.len()];
    match *op {
        Op::Act { action, target } => {
            let actor = game.next_player().username.clone();
            let action = ActionKind::ALL[action];
            let target = action.needs_target().then(|| pick(target).clone());
            game.take_action(&actor, action, target.as_ref())
        }
        Op::Challenge(p) => game.pose_challenge(pick(p)),
        Op::Reveal(p, c) => {
            let role = live_role(game, pick(p), c);
            game.resolve_challenge(pick(p), role)
        }
        Op::Flip(p, c) => {
            let role = live_role(game, pick(p), c);
            game.lose_challenge(pick(p), role)
        }
        Op::Block(p, r) => game.pose_block(pick(p), Role::ALL[r]),
        Op::TakeCards(p) => game.take_cards(pick(p)),
        Op::Keep(p) => {
            let roles = game
                .get_player(pick(p))
                .map(|player| player.live_roles())
                .unwrap_or_default();
            let keep = roles.len().saturating_sub(2);
            game.keep_cards(pick(p), &roles[..keep])
        }
        Op::LoseCard(p, c) => {
            let role = live_role(game, pick(p), c);
            game.lose_card(pick(p), role)
        }
    }
}

fn check_invariants(game: &GameState) -> Result<(), TestCaseError> {
    prop_assert_eq!(game.card_count(), TOTAL_CARDS, "cards were created or lost");
    prop_assert!(
        !game.next_player().is_out(),
        "rotation head {} is out",
        game.next_player().username
    );
    let remaining = game.remaining_players().count();
    prop_assert_eq!(game.winner().is_some(), remaining == 1);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_invariants_hold_over_random_play(
        n_players in 2usize..=6,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let names = usernames(n_players);
        let mut game = GameState::create("prop", &names, GameSettings::default()).unwrap();
        check_invariants(&game)?;

        for op in &ops {
            let before = game.clone();
            match apply(&mut game, &names, op) {
                Ok(_) => check_invariants(&game)?,
                Err(_) => prop_assert_eq!(&game, &before, "rejected {:?} changed the game", op),
            }
            if game.winner().is_some() {
                let winner = game.winner().cloned().unwrap();
                prop_assert_eq!(
                    game.take_action(&winner, ActionKind::Income, None),
                    Err(InvalidMove::GameOver(winner))
                );
                break;
            }
        }
    }

    #[test]
    fn test_forced_coup(starting_money in 10u32..30, action in 0usize..6) {
        let names = usernames(3);
        let settings = GameSettings { starting_money, ..GameSettings::default() };
        let mut game = GameState::create("prop", &names, settings).unwrap();
        let before = game.clone();

        let action = ActionKind::ALL[action];
        prop_assume!(action != ActionKind::Coup);
        let target = action.needs_target().then(|| names[1].clone());
        prop_assert_eq!(
            game.take_action(&names[0], action, target.as_ref()),
            Err(InvalidMove::MustCoup { money: starting_money })
        );
        prop_assert_eq!(game, before);
    }

    #[test]
    fn test_challenging_tax(n_players in 2usize..=6) {
        let names = usernames(n_players);
        let mut game = GameState::create("prop", &names, GameSettings::default()).unwrap();
        let actor = &names[0];
        let challenger = &names[1];

        game.take_action(actor, ActionKind::Tax, None).unwrap();
        game.pose_challenge(challenger).unwrap();

        let holds_duke = game.get_player(actor).unwrap().find_live_card(Role::Duke).is_some();
        if holds_duke {
            game.resolve_challenge(actor, Role::Duke).unwrap();
            prop_assert_eq!(game.status(), Status::ChallengeLost);
            prop_assert_eq!(game.get_player(actor).unwrap().num_live(), 2);
            prop_assert_eq!(game.card_count(), TOTAL_CARDS);
        } else {
            let shown = game.get_player(actor).unwrap().live_roles()[0];
            game.resolve_challenge(actor, shown).unwrap();
            prop_assert_eq!(game.status(), Status::Ready);
            prop_assert_eq!(game.get_player(actor).unwrap().num_live(), 1);
            prop_assert_eq!(game.get_player(actor).unwrap().money, 2);
        }
    }
}
