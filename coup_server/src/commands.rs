//! Turns input lines into room commands.
//!
//! A line reads `<room> <user> <command> [args...]`. Command names and their
//! aliases are resolved here; action and role names are parsed by the engine.

use coup_engine::{
    ActionKind, RoomCommand, Username,
    game::{InvalidMove, Role},
};
use thiserror::Error;

/// A fully parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub room: String,
    pub username: Username,
    pub command: RoomCommand,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected `<room> <user> <command> [args...]`.")]
    Incomplete,
    #[error("I don't know the command {0}. Try `help`.")]
    UnknownCommand(String),
    #[error("`{0}` needs an argument.")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Invalid(#[from] InvalidMove),
}

pub const USAGE: &str = "\
Commands:
  deal|new <users...>       Deal a new game; the first user goes first
  restart <users...>        Cancel the current game and deal a new one
  cancel                    Cancel the current game
  status|state              Show the table to the room
  view|board                Show the table to yourself
  cards|money|me|look       Show your own hand
  action <action> [target]  Take your turn
  challenge                 Call the last claim a bluff
  reveal|show <role>        Show a card after being challenged
  flip <role>               Flip a card after losing a challenge
  block <role>              Block the current action
  take                      Draw your exchange cards
  keep <roles...>           Keep these cards after an exchange
  lose <role>               Give up a card to an assassination or coup";

/// Parse one input line. Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<Request>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(room) = words.next() else {
        return Ok(None);
    };
    let (Some(user), Some(verb)) = (words.next(), words.next()) else {
        return Err(ParseError::Incomplete);
    };
    let args: Vec<&str> = words.collect();

    Ok(Some(Request {
        room: room.to_string(),
        username: Username::new(user),
        command: parse_command(verb, &args)?,
    }))
}

/// Parse a command name and its arguments.
pub fn parse_command(verb: &str, args: &[&str]) -> Result<RoomCommand, ParseError> {
    let command = match verb.to_ascii_lowercase().as_str() {
        "deal" | "new" => RoomCommand::Deal(usernames(args)),
        "restart" => RoomCommand::Restart(usernames(args)),
        "cancel" => RoomCommand::Cancel,
        "status" | "state" => RoomCommand::Status,
        "view" | "board" => RoomCommand::View,
        "cards" | "money" | "me" | "look" => RoomCommand::Hand,
        "action" => {
            let name = args.first().ok_or(ParseError::MissingArgument("action"))?;
            let action = name.parse::<ActionKind>().map_err(InvalidMove::from)?;
            RoomCommand::Action {
                action,
                target: args.get(1).map(|target| Username::new(target)),
            }
        }
        "challenge" => RoomCommand::Challenge,
        "reveal" | "show" => RoomCommand::Reveal(role_arg("reveal", args)?),
        "flip" => RoomCommand::Flip(role_arg("flip", args)?),
        "block" => RoomCommand::Block(role_arg("block", args)?),
        "take" => RoomCommand::TakeCards,
        "keep" => RoomCommand::Keep(
            args.iter()
                .map(|arg| arg.parse::<Role>().map_err(InvalidMove::from))
                .collect::<Result<_, _>>()?,
        ),
        "lose" => RoomCommand::LoseCard(role_arg("lose", args)?),
        _ => return Err(ParseError::UnknownCommand(verb.to_string())),
    };
    Ok(command)
}

fn usernames(args: &[&str]) -> Vec<Username> {
    args.iter().map(|arg| Username::new(arg)).collect()
}

fn role_arg(command: &'static str, args: &[&str]) -> Result<Role, ParseError> {
    let name = args.first().ok_or(ParseError::MissingArgument(command))?;
    Ok(name.parse::<Role>().map_err(InvalidMove::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coup_engine::game::{UnknownAction, UnknownRole};

    #[test]
    fn test_parse_deal() {
        let request = parse_line("general alice deal @alice bob").unwrap().unwrap();
        assert_eq!(request.room, "general");
        assert_eq!(request.username, Username::new("alice"));
        assert_eq!(
            request.command,
            RoomCommand::Deal(vec![Username::new("alice"), Username::new("bob")])
        );
    }

    #[test]
    fn test_blank_and_short_lines() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("general alice"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_action_aliases() {
        assert_eq!(
            parse_command("action", &["captain", "bob"]),
            Ok(RoomCommand::Action {
                action: ActionKind::Steal,
                target: Some(Username::new("bob")),
            })
        );
        assert_eq!(
            parse_command("ACTION", &["money"]),
            Ok(RoomCommand::Action {
                action: ActionKind::Income,
                target: None,
            })
        );
        assert_eq!(
            parse_command("action", &["bribe"]),
            Err(ParseError::Invalid(InvalidMove::UnknownAction(UnknownAction(
                "bribe".to_string()
            ))))
        );
        assert_eq!(
            parse_command("action", &[]),
            Err(ParseError::MissingArgument("action"))
        );
    }

    #[test]
    fn test_view_aliases() {
        assert_eq!(parse_command("board", &[]), Ok(RoomCommand::View));
        assert_eq!(parse_command("state", &[]), Ok(RoomCommand::Status));
        assert_eq!(parse_command("look", &[]), Ok(RoomCommand::Hand));
    }

    #[test]
    fn test_role_commands() {
        assert_eq!(parse_command("show", &["DUKE"]), Ok(RoomCommand::Reveal(Role::Duke)));
        assert_eq!(parse_command("flip", &["capt"]), Ok(RoomCommand::Flip(Role::Captain)));
        assert_eq!(
            parse_command("keep", &["duke", "contessa"]),
            Ok(RoomCommand::Keep(vec![Role::Duke, Role::Contessa]))
        );
        assert_eq!(
            parse_command("block", &["king"]),
            Err(ParseError::Invalid(InvalidMove::UnknownRole(UnknownRole(
                "king".to_string()
            ))))
        );
        assert_eq!(
            parse_command("lose", &[]),
            Err(ParseError::MissingArgument("lose"))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_command("fold", &[]),
            Err(ParseError::UnknownCommand("fold".to_string()))
        );
    }
}
