//! The effect applier.
//!
//! Exactly one place interprets [`SpellEffect`]: this module. The session
//! has already validated targets when it gets here, so application is
//! infallible; anything requiring a further player choice (discard
//! selection, mana color, graveyard picks) is enqueued as a resolution
//! step instead of being decided silently.

use crate::cards::{CardDefinition, CardId, ManaCost};
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::core::state::{ContinuousEffect, GameState};
use crate::queue::{DiscardReason, StepKind};
use crate::stack::StackItemKind;
use crate::triggers::GameEvent;
use crate::zones::{Zone, ZonePosition};

use super::effect::{PlayerGroup, SpellEffect};
use super::targeting::TargetRef;

/// Standpoint of a resolving clause or ability.
pub struct EffectContext {
    /// Controller of the resolving spell or ability.
    pub controller: PlayerId,
    /// The spell's card entity, or the ability's source. Target-directed
    /// effects with no bound targets fall back to this (pattern-derived
    /// "put a counter on ~" abilities).
    pub source: EntityId,
    /// The resolving clause's targets. Already re-validated.
    pub targets: Vec<TargetRef>,
    /// Bound X, if the spell had one.
    pub x: Option<i64>,
}

/// Apply a clause's effects in order.
pub fn apply_effects(state: &mut GameState, ctx: &EffectContext, effects: &[SpellEffect]) {
    for effect in effects {
        apply_one(state, ctx, effect);
    }
}

fn apply_one(state: &mut GameState, ctx: &EffectContext, effect: &SpellEffect) {
    match effect {
        SpellEffect::DealDamage { amount } => {
            let amount = amount.resolve(ctx.x);
            for target in targets_or_source(ctx) {
                deal_damage(state, ctx.source, target, amount);
            }
        }

        SpellEffect::DestroyTarget => {
            for target in targets_or_source(ctx) {
                if let TargetRef::Permanent(entity) = target {
                    if let Some(owner) = owner_of(state, entity) {
                        state.move_card(entity, Zone::Graveyard(owner), ZonePosition::Top);
                    }
                }
            }
        }

        SpellEffect::ExileTarget => {
            for target in targets_or_source(ctx) {
                if let TargetRef::Permanent(entity) = target {
                    state.move_card(entity, Zone::Exile, ZonePosition::Top);
                }
            }
        }

        SpellEffect::TapTarget | SpellEffect::UntapTarget => {
            let tapped = matches!(effect, SpellEffect::TapTarget);
            for target in targets_or_source(ctx) {
                if let TargetRef::Permanent(entity) = target {
                    if let Some(perm) = state.permanent_mut(entity) {
                        perm.tapped = tapped;
                    }
                }
            }
        }

        SpellEffect::ReturnTargetToHand => {
            for target in targets_or_source(ctx) {
                if let TargetRef::Permanent(entity) = target {
                    if let Some(owner) = owner_of(state, entity) {
                        state.move_card(entity, Zone::Hand(owner), ZonePosition::Top);
                    }
                }
            }
        }

        SpellEffect::CounterTarget => {
            for target in targets_or_source(ctx) {
                if let TargetRef::Spell(item_id) = target {
                    counter_spell(state, item_id);
                }
            }
        }

        SpellEffect::PumpTarget { power, toughness } => {
            for target in targets_or_source(ctx) {
                if let TargetRef::Permanent(entity) = target {
                    if state.permanent(entity).is_some() {
                        let timestamp = state.next_timestamp();
                        state.continuous.push(ContinuousEffect {
                            target: entity,
                            power: *power,
                            toughness: *toughness,
                            until_end_of_turn: true,
                            timestamp,
                        });
                    }
                }
            }
        }

        SpellEffect::AddCountersToTarget { kind, count } => {
            for target in targets_or_source(ctx) {
                if let TargetRef::Permanent(entity) = target {
                    if let Some(perm) = state.permanent_mut(entity) {
                        perm.add_counters(kind.clone(), *count);
                    }
                }
            }
        }

        SpellEffect::DrawCards { who, count } => {
            let count = count.resolve(ctx.x).max(0);
            for player in audience(state, ctx, *who) {
                for _ in 0..count {
                    state.draw_card(player);
                }
            }
        }

        SpellEffect::GainLife { who, amount } => {
            let amount = amount.resolve(ctx.x).max(0);
            for player in audience(state, ctx, *who) {
                state.change_life(player, amount);
            }
        }

        SpellEffect::LoseLife { who, amount } => {
            let amount = amount.resolve(ctx.x).max(0);
            for player in audience(state, ctx, *who) {
                state.change_life(player, -amount);
            }
        }

        SpellEffect::DiscardCards { who, count } => {
            for player in audience(state, ctx, *who) {
                let in_hand = state.zones.size(Zone::Hand(player));
                let count = (*count as usize).min(in_hand);
                if count > 0 {
                    state.queue.enqueue(
                        player,
                        true,
                        StepKind::Discard { count, reason: DiscardReason::Effect },
                    );
                }
            }
        }

        SpellEffect::CreateToken { name, type_line, power, toughness, count } => {
            let mut definition = CardDefinition::new(CardId::new(0), name.clone(), type_line);
            definition.mana_cost = Some(ManaCost::free());
            definition.power = *power;
            definition.toughness = *toughness;
            let card = state.registry.mint_token(definition);
            for _ in 0..*count {
                state.create_token(card, ctx.controller);
            }
        }

        SpellEffect::AddMana { color, count } => match color {
            Some(color) => state.players[ctx.controller].mana.add(*color, *count),
            None => {
                state.queue.enqueue(
                    ctx.controller,
                    true,
                    StepKind::ChooseManaColor { count: *count },
                );
            }
        },

        SpellEffect::ReturnFromOwnGraveyard { count } => {
            let in_graveyard = state.zones.size(Zone::Graveyard(ctx.controller));
            let count = (*count as usize).min(in_graveyard);
            if count > 0 {
                state.queue.enqueue(
                    ctx.controller,
                    true,
                    StepKind::ChooseFromGraveyard { count },
                );
            }
        }
    }
}

/// The clause's targets, or the source itself for self-directed abilities.
fn targets_or_source(ctx: &EffectContext) -> Vec<TargetRef> {
    if ctx.targets.is_empty() {
        vec![TargetRef::Permanent(ctx.source)]
    } else {
        ctx.targets.clone()
    }
}

/// The players a player-directed effect applies to, in APNAP order for
/// opponents.
fn audience(state: &GameState, ctx: &EffectContext, who: PlayerGroup) -> Vec<PlayerId> {
    match who {
        PlayerGroup::Controller => vec![ctx.controller],
        PlayerGroup::EachOpponent => {
            let mut opponents: Vec<PlayerId> = state
                .alive_players()
                .into_iter()
                .filter(|&p| p != ctx.controller)
                .collect();
            opponents.sort_by_key(|p| p.seats_after(state.turn.active, state.player_count()));
            opponents
        }
        PlayerGroup::Target => ctx
            .targets
            .iter()
            .filter_map(|t| match t {
                TargetRef::Player(p) => Some(*p),
                _ => None,
            })
            .collect(),
    }
}

fn owner_of(state: &GameState, entity: EntityId) -> Option<PlayerId> {
    state.card(entity).map(|c| c.owner)
}

/// Damage: marked on creatures, loss of life for players. Damage from a
/// commander also accumulates toward the 21-damage rule.
fn deal_damage(state: &mut GameState, source: EntityId, target: TargetRef, amount: i64) {
    if amount <= 0 {
        return;
    }
    match target {
        TargetRef::Permanent(entity) => {
            let Some(perm) = state.permanent_mut(entity) else {
                return;
            };
            perm.damage += amount;
            state.emit(GameEvent::DamageDealt { target, amount, source });
        }
        TargetRef::Player(player) => {
            state.change_life(player, -amount);
            if is_commander(state, source) {
                *state.players[player]
                    .commander_damage
                    .entry(source)
                    .or_insert(0) += amount;
            }
            state.emit(GameEvent::DamageDealt { target, amount, source });
        }
        TargetRef::Spell(_) => {}
    }
}

fn is_commander(state: &GameState, entity: EntityId) -> bool {
    state
        .players
        .iter()
        .any(|(_, p)| p.commander == Some(entity))
}

/// Counter a spell or ability on the stack: removed without resolving, and
/// a countered spell's card goes to its owner's graveyard.
fn counter_spell(state: &mut GameState, item_id: crate::stack::StackItemId) {
    let Some(item) = state.stack.remove(item_id) else {
        return;
    };
    if let StackItemKind::Spell { card, .. } = item.kind {
        let controller = item.controller;
        if let Some(owner) = owner_of(state, card) {
            state.move_card(card, Zone::Graveyard(owner), ZonePosition::Top);
        }
        state.emit(GameEvent::SpellCountered { card, controller });
    }
}
