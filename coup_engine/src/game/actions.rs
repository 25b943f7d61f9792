//! The catalogue of turn actions and the rules attached to each.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::entities::{Coins, Role};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Income,
    ForeignAid,
    Tax,
    Steal,
    Exchange,
    Assassinate,
    Coup,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        Self::Income,
        Self::ForeignAid,
        Self::Tax,
        Self::Steal,
        Self::Exchange,
        Self::Assassinate,
        Self::Coup,
    ];

    /// Paid up front when the action is announced, whatever happens next.
    #[must_use]
    pub const fn cost(&self) -> Coins {
        match self {
            Self::Assassinate => 3,
            Self::Coup => 7,
            _ => 0,
        }
    }

    /// Credited to the actor once the action goes through.
    #[must_use]
    pub const fn gain(&self) -> Coins {
        match self {
            Self::Income => 1,
            Self::ForeignAid | Self::Steal => 2,
            Self::Tax => 3,
            _ => 0,
        }
    }

    /// The role the actor implicitly claims to hold.
    #[must_use]
    pub const fn claimed_role(&self) -> Option<Role> {
        match self {
            Self::Tax => Some(Role::Duke),
            Self::Steal => Some(Role::Captain),
            Self::Exchange => Some(Role::Ambassador),
            Self::Assassinate => Some(Role::Assassin),
            _ => None,
        }
    }

    #[must_use]
    pub const fn blocking_roles(&self) -> &'static [Role] {
        match self {
            Self::ForeignAid => &[Role::Duke],
            Self::Steal => &[Role::Ambassador, Role::Captain],
            Self::Assassinate => &[Role::Contessa],
            _ => &[],
        }
    }

    #[must_use]
    pub const fn is_challengeable(&self) -> bool {
        self.claimed_role().is_some()
    }

    #[must_use]
    pub const fn is_blockable(&self) -> bool {
        !self.blocking_roles().is_empty()
    }

    #[must_use]
    pub fn can_be_blocked_with(&self, role: Role) -> bool {
        self.blocking_roles().contains(&role)
    }

    #[must_use]
    pub const fn needs_target(&self) -> bool {
        matches!(self, Self::Steal | Self::Assassinate | Self::Coup)
    }

    /// Foreign aid can be blocked by anyone; everything else only by its
    /// target.
    #[must_use]
    pub const fn blockable_by_anyone(&self) -> bool {
        matches!(self, Self::ForeignAid)
    }

    #[must_use]
    pub const fn costs_a_card(&self) -> bool {
        matches!(self, Self::Assassinate | Self::Coup)
    }

    /// Actions that stay open until a player follows up on them, so the next
    /// turn can't start on top of them.
    #[must_use]
    pub const fn needs_response(&self) -> bool {
        matches!(self, Self::Assassinate | Self::Coup | Self::Exchange)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Income => "income",
            Self::ForeignAid => "foreign aid",
            Self::Tax => "tax",
            Self::Steal => "steal",
            Self::Exchange => "exchange",
            Self::Assassinate => "assassinate",
            Self::Coup => "coup",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
#[error(
    "I've never heard of {0}, try one of these: income, foreignaid, tax, steal, exchange, assassinate, coup."
)]
pub struct UnknownAction(pub String);

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.trim().to_ascii_lowercase().as_str() {
            "ambassador" | "ambassade" | "exchange" => Self::Exchange,
            "assassinate" | "assassin" => Self::Assassinate,
            "captain" | "steal" | "take" => Self::Steal,
            "duke" | "tax" => Self::Tax,
            "income" | "money" => Self::Income,
            "foreignaid" | "foreign" | "aid" => Self::ForeignAid,
            "coup" => Self::Coup,
            _ => return Err(UnknownAction(s.to_string())),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("ambassade".parse::<ActionKind>(), Ok(ActionKind::Exchange));
        assert_eq!("take".parse::<ActionKind>(), Ok(ActionKind::Steal));
        assert_eq!("Duke".parse::<ActionKind>(), Ok(ActionKind::Tax));
        assert_eq!("money".parse::<ActionKind>(), Ok(ActionKind::Income));
        assert_eq!("aid".parse::<ActionKind>(), Ok(ActionKind::ForeignAid));
        assert_eq!("assassin".parse::<ActionKind>(), Ok(ActionKind::Assassinate));
        assert_eq!(
            "contessa".parse::<ActionKind>(),
            Err(UnknownAction("contessa".to_string()))
        );
    }

    #[test]
    fn test_costs_and_gains() {
        assert_eq!(ActionKind::Coup.cost(), 7);
        assert_eq!(ActionKind::Assassinate.cost(), 3);
        assert_eq!(ActionKind::Tax.cost(), 0);
        assert_eq!(ActionKind::Tax.gain(), 3);
        assert_eq!(ActionKind::Income.gain(), 1);
        assert_eq!(ActionKind::Coup.gain(), 0);
    }

    #[test]
    fn test_claims() {
        assert_eq!(ActionKind::Steal.claimed_role(), Some(Role::Captain));
        assert!(!ActionKind::Income.is_challengeable());
        assert!(!ActionKind::ForeignAid.is_challengeable());
        assert!(!ActionKind::Coup.is_challengeable());
        assert!(ActionKind::Exchange.is_challengeable());
    }

    #[test]
    fn test_blocks() {
        assert!(ActionKind::Steal.can_be_blocked_with(Role::Ambassador));
        assert!(ActionKind::Steal.can_be_blocked_with(Role::Captain));
        assert!(!ActionKind::Steal.can_be_blocked_with(Role::Duke));
        assert!(ActionKind::ForeignAid.blockable_by_anyone());
        assert!(!ActionKind::Tax.is_blockable());
        assert!(!ActionKind::Coup.is_blockable());
    }

    #[test]
    fn test_follow_up_actions() {
        let needing: Vec<_> = ActionKind::ALL
            .into_iter()
            .filter(ActionKind::needs_response)
            .collect();
        assert_eq!(
            needing,
            vec![ActionKind::Exchange, ActionKind::Assassinate, ActionKind::Coup]
        );
    }
}
