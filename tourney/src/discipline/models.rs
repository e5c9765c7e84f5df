use crate::config::EngineConfig;
use crate::db::{Record, RecordKind};
use crate::ids::{ActionId, MatchId, ParticipantId, TournamentId};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Card {
    /// Warning; a second active yellow becomes a ban
    Yellow,
    /// Sanction scoped to one match
    Orange,
    /// Immediate ban
    Red,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Card::Yellow => "yellow card",
            Card::Orange => "orange card",
            Card::Red => "red card",
        };
        f.write_str(name)
    }
}

/// Card and ban durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisciplinePolicy {
    pub yellow_validity: TimeDelta,
    pub ban_length: TimeDelta,
}

impl From<&EngineConfig> for DisciplinePolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            yellow_validity: TimeDelta::days(config.yellow_card_days),
            ban_length: TimeDelta::days(config.ban_days),
        }
    }
}

impl Default for DisciplinePolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YellowCard {
    pub action: ActionId,
    pub expires_at: DateTime<Utc>,
}

/// What a card did to the participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardOutcome {
    /// First active yellow
    Warning { expires_at: DateTime<Utc> },
    /// Red card or second active yellow
    Banned { until: DateTime<Utc> },
    /// Orange card recorded against a match
    MatchSanction { match_id: MatchId },
}

/// Running disciplinary state of one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplineRecord {
    pub id: Uuid,
    pub participant: ParticipantId,
    pub yellow_cards: Vec<YellowCard>,
    pub banned_until: Option<DateTime<Utc>>,
    /// Every action issued, oldest first
    pub actions: Vec<ActionId>,
}

impl DisciplineRecord {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            id: Self::id_for(participant),
            participant,
            yellow_cards: Vec::new(),
            banned_until: None,
            actions: Vec::new(),
        }
    }

    pub fn id_for(participant: ParticipantId) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, &participant.0.to_be_bytes())
    }

    pub fn is_banned(&self, now: DateTime<Utc>) -> bool {
        self.banned_until.is_some_and(|until| until > now)
    }

    pub fn active_yellows(&self, now: DateTime<Utc>) -> usize {
        self.yellow_cards
            .iter()
            .filter(|card| card.expires_at > now)
            .count()
    }

    /// Apply a card issued at `now`
    ///
    /// Orange cards leave the record untouched apart from the action log; the
    /// caller marks the match.
    pub fn apply(
        &mut self,
        action: ActionId,
        card: Card,
        match_id: Option<MatchId>,
        now: DateTime<Utc>,
        policy: DisciplinePolicy,
    ) -> Option<CardOutcome> {
        self.yellow_cards.retain(|yellow| yellow.expires_at > now);
        self.actions.push(action);

        match card {
            Card::Yellow if !self.yellow_cards.is_empty() => {
                self.yellow_cards.clear();
                Some(self.ban(now + policy.ban_length))
            }
            Card::Yellow => {
                let expires_at = now + policy.yellow_validity;
                self.yellow_cards.push(YellowCard { action, expires_at });
                Some(CardOutcome::Warning { expires_at })
            }
            Card::Red => Some(self.ban(now + policy.ban_length)),
            Card::Orange => match_id.map(|match_id| CardOutcome::MatchSanction { match_id }),
        }
    }

    /// Never shortens a longer ban already in force
    fn ban(&mut self, until: DateTime<Utc>) -> CardOutcome {
        let until = self.banned_until.map_or(until, |current| current.max(until));
        self.banned_until = Some(until);
        CardOutcome::Banned { until }
    }

    /// Clear the ban and any active yellows; `false` if there was nothing to lift
    pub fn lift(&mut self, now: DateTime<Utc>) -> bool {
        let had_sanction = self.is_banned(now) || self.active_yellows(now) > 0;
        self.banned_until = None;
        self.yellow_cards.clear();
        had_sanction
    }

    pub fn status(&self, now: DateTime<Utc>) -> DisciplineStatus {
        DisciplineStatus {
            participant: self.participant,
            banned_until: self.banned_until.filter(|&until| until > now),
            active_yellows: self.active_yellows(now),
        }
    }
}

impl Record for DisciplineRecord {
    const KIND: RecordKind = RecordKind::Discipline;
    type Id = Uuid;

    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// Log entry for an issued card or a lifted ban
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplinaryAction {
    pub id: ActionId,
    pub participant: ParticipantId,
    pub tournament: TournamentId,
    pub kind: ActionKind,
    pub match_id: Option<MatchId>,
    pub reason: String,
    pub issued_by: ParticipantId,
    pub issued_at: DateTime<Utc>,
    pub outcome: Option<CardOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Card(Card),
    BanLifted,
}

impl Record for DisciplinaryAction {
    const KIND: RecordKind = RecordKind::DisciplinaryAction;
    type Id = ActionId;

    fn record_id(&self) -> ActionId {
        self.id
    }
}

/// A card to issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub participant: ParticipantId,
    pub tournament: TournamentId,
    pub card: Card,
    /// Required for orange cards
    pub match_id: Option<MatchId>,
    pub reason: String,
    pub issued_by: ParticipantId,
}

/// Point-in-time view of a participant's sanctions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplineStatus {
    pub participant: ParticipantId,
    pub banned_until: Option<DateTime<Utc>>,
    pub active_yellows: usize,
}

impl DisciplineStatus {
    pub fn clean(participant: ParticipantId) -> Self {
        Self {
            participant,
            banned_until: None,
            active_yellows: 0,
        }
    }

    pub fn is_banned(&self) -> bool {
        self.banned_until.is_some()
    }
}
