//! Per-viewer projections of game state.
//!
//! A [`PlayerView`] contains only what its viewer is entitled to see:
//! their own hand, every public zone, and counts for everything hidden.
//! Views are plain data, ready to serialize for a client.

use serde::{Deserialize, Serialize};

use crate::cards::CardId;
use crate::core::{EntityId, GameError, GameState, LossReason, PlayerId};
use crate::queue::StepId;
use crate::stack::{StackItemId, StackItemKind};
use crate::turn::Step;
use crate::zones::{CounterKind, Zone};

/// A card the viewer can identify.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub entity: EntityId,
    pub card: CardId,
    pub name: String,
}

/// One battlefield permanent, with derived power and toughness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentView {
    pub entity: EntityId,
    pub card: CardId,
    pub name: String,
    pub controller: PlayerId,
    pub tapped: bool,
    pub summoning_sick: bool,
    pub damage: i64,
    pub power: Option<i64>,
    pub toughness: Option<i64>,
    pub counters: Vec<(CounterKind, u32)>,
    pub attached_to: Option<EntityId>,
    pub is_token: bool,
}

/// Public information about one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub player: PlayerId,
    pub life: i64,
    pub hand_size: usize,
    pub library_size: usize,
    pub graveyard: Vec<CardView>,
    pub commander: Option<EntityId>,
    pub commander_in_command_zone: bool,
    pub commander_tax: u32,
    pub commander_damage_taken: Vec<(EntityId, i64)>,
    pub lost: Option<LossReason>,
}

/// One stack item, top of stack first in [`PlayerView::stack`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackItemView {
    pub id: StackItemId,
    pub controller: PlayerId,
    pub description: String,
    pub is_spell: bool,
    pub awaiting_targets: bool,
}

/// A resolution step waiting on the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStepView {
    pub id: StepId,
    pub mandatory: bool,
    pub description: String,
}

/// A trigger the engine could not evaluate, surfaced for table agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndecidedView {
    pub source_name: String,
    pub controller: PlayerId,
    pub clause: String,
}

/// Everything one player is allowed to see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub viewer: PlayerId,
    pub turn_number: u32,
    pub active: PlayerId,
    pub step: Step,
    pub priority: PlayerId,
    pub hand: Vec<CardView>,
    pub players: Vec<PlayerSummary>,
    pub battlefield: Vec<PermanentView>,
    pub stack: Vec<StackItemView>,
    pub pending_steps: Vec<PendingStepView>,
    pub undecided: Vec<UndecidedView>,
    /// Events logged so far; pass back to [`PlayerView::project`] callers
    /// polling [`crate::core::EventLog::events_since`].
    pub event_cursor: usize,
}

impl PlayerView {
    /// Project the state as seen by `viewer`.
    pub fn project(state: &GameState, viewer: PlayerId) -> Result<Self, GameError> {
        if viewer.index() >= state.player_count() {
            return Err(GameError::not_in_game(viewer));
        }

        let card_view = |entity: EntityId| -> Option<CardView> {
            let instance = state.card(entity)?;
            let def = state.registry.get(instance.card)?;
            Some(CardView {
                entity,
                card: instance.card,
                name: def.name.clone(),
            })
        };

        let mut hand_entities: Vec<EntityId> =
            state.zones.in_zone(Zone::Hand(viewer)).collect();
        hand_entities.sort();
        let hand = hand_entities
            .into_iter()
            .filter_map(|e| card_view(e))
            .collect();

        let players = PlayerId::all(state.player_count())
            .map(|player| {
                let ps = &state.players[player];
                let mut commander_damage_taken: Vec<(EntityId, i64)> =
                    ps.commander_damage.iter().map(|(&e, &d)| (e, d)).collect();
                commander_damage_taken.sort();
                PlayerSummary {
                    player,
                    life: ps.life,
                    hand_size: state.zones.size(Zone::Hand(player)),
                    library_size: state.zones.size(Zone::Library(player)),
                    graveyard: state
                        .zones
                        .ordered(Zone::Graveyard(player))
                        .iter()
                        .filter_map(|&e| card_view(e))
                        .collect(),
                    commander: ps.commander,
                    commander_in_command_zone: ps
                        .commander
                        .is_some_and(|c| state.zones.is_in(c, Zone::Command(player))),
                    commander_tax: ps.commander_tax,
                    commander_damage_taken,
                    lost: ps.lost,
                }
            })
            .collect();

        let mut battlefield: Vec<PermanentView> = state
            .battlefield
            .values()
            .filter_map(|perm| {
                let instance = state.card(perm.entity)?;
                let def = state.registry.get(instance.card)?;
                let pt = state.effective_pt(perm.entity);
                let mut counters: Vec<(CounterKind, u32)> = perm
                    .counters
                    .iter()
                    .map(|(k, &n)| (k.clone(), n))
                    .collect();
                counters.sort_by(|a, b| format!("{:?}", a.0).cmp(&format!("{:?}", b.0)));
                Some(PermanentView {
                    entity: perm.entity,
                    card: instance.card,
                    name: def.name.clone(),
                    controller: perm.controller,
                    tapped: perm.tapped,
                    summoning_sick: perm.summoning_sick,
                    damage: perm.damage,
                    power: pt.map(|(p, _)| p),
                    toughness: pt.map(|(_, t)| t),
                    counters,
                    attached_to: perm.attached_to,
                    is_token: instance.is_token,
                })
            })
            .collect();
        battlefield.sort_by_key(|p| p.entity);

        let mut stack: Vec<StackItemView> = state
            .stack
            .iter()
            .map(|item| StackItemView {
                id: item.id,
                controller: item.controller,
                description: item.describe(),
                is_spell: matches!(item.kind, StackItemKind::Spell { .. }),
                awaiting_targets: matches!(
                    &item.kind,
                    StackItemKind::Ability { awaiting_targets: true, .. }
                ),
            })
            .collect();
        stack.reverse();

        let pending_steps = state
            .queue
            .iter_for(viewer)
            .map(|step| PendingStepView {
                id: step.id,
                mandatory: step.mandatory,
                description: step.kind.describe(),
            })
            .collect();

        let undecided = state
            .undecided
            .iter()
            .map(|u| UndecidedView {
                source_name: u.source_name.clone(),
                controller: u.controller,
                clause: u.clause.clone(),
            })
            .collect();

        Ok(Self {
            viewer,
            turn_number: state.turn.turn_number,
            active: state.turn.active,
            step: state.turn.step,
            priority: state.priority.holder(),
            hand,
            players,
            battlefield,
            stack,
            pending_steps,
            undecided,
            event_cursor: state.log.event_count(),
        })
    }
}

impl super::session::GameSession {
    /// The game as `viewer` sees it.
    pub fn view(&self, viewer: PlayerId) -> Result<PlayerView, GameError> {
        PlayerView::project(self.state(), viewer)
    }
}
