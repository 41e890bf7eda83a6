//! State-based actions.
//!
//! The sweep runs to a fixed point before any player receives priority:
//! each pass applies every check once, and the loop repeats until a pass
//! changes nothing. A death in one pass can push a player to 0 life in the
//! next; the fixed point guarantees no stale intermediate state is ever
//! observable.
//!
//! The legend rule is the one check that cannot finish on its own: it
//! enqueues a [`StepKind::LegendChoice`] for the controller and leaves the
//! duplicates in place until the choice resolves.

use rustc_hash::FxHashMap;

use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::core::state::{GameState, LossReason};
use crate::queue::StepKind;
use crate::stack::StackItemKind;
use crate::triggers::GameEvent;
use crate::zones::{Zone, ZonePosition};

/// Hard cap on sweep passes; a correct sweep converges in a handful.
const MAX_PASSES: u32 = 64;

/// Run state-based actions to a fixed point. Returns `true` if anything
/// changed.
pub fn run_state_based_actions(state: &mut GameState) -> bool {
    let mut any = false;
    for _ in 0..MAX_PASSES {
        let changed = pass(state);
        any |= changed;
        if !changed {
            return any;
        }
    }
    debug_assert!(false, "state-based actions did not converge");
    any
}

fn pass(state: &mut GameState) -> bool {
    let mut changed = false;

    changed |= check_player_losses(state);
    changed |= remove_lost_players_objects(state);
    changed |= check_dead_creatures(state);
    changed |= check_illegal_attachments(state);
    changed |= remove_stray_tokens(state);
    changed |= check_legend_rule(state);

    changed
}

/// Life at or below 0, a failed draw, or 21+ damage from one commander.
fn check_player_losses(state: &mut GameState) -> bool {
    let mut losses: Vec<(PlayerId, LossReason)> = Vec::new();

    for (player, ps) in state.players.iter() {
        if ps.lost.is_some() {
            continue;
        }
        if ps.life <= 0 {
            losses.push((player, LossReason::LifeZero));
        } else if ps.drew_from_empty {
            losses.push((player, LossReason::EmptyLibrary));
        } else if ps.commander_damage.values().any(|&d| d >= 21) {
            losses.push((player, LossReason::CommanderDamage));
        }
    }

    for (player, reason) in &losses {
        state.apply_loss(*player, *reason);
    }
    !losses.is_empty()
}

/// A departed player's objects leave the game: everything they own, plus
/// their items on the stack.
fn remove_lost_players_objects(state: &mut GameState) -> bool {
    let lost: Vec<PlayerId> = state
        .players
        .iter()
        .filter(|(_, ps)| ps.lost.is_some())
        .map(|(p, _)| p)
        .collect();
    if lost.is_empty() {
        return false;
    }

    let mut changed = false;

    // Abilities the departed player controlled vanish from the stack.
    let their_items: Vec<_> = state
        .stack
        .iter()
        .filter(|item| lost.contains(&item.controller))
        .map(|item| item.id)
        .collect();
    for id in their_items {
        state.stack.remove(id);
        changed = true;
    }

    let mut owned: Vec<EntityId> = state
        .cards
        .values()
        .filter(|c| lost.contains(&c.owner))
        .map(|c| c.entity)
        .collect();
    if owned.is_empty() {
        return changed;
    }
    owned.sort();
    for entity in owned {
        if state.zones.is_in(entity, Zone::Battlefield) {
            let (former_controller, card, name) = departure_info(state, entity);
            state.emit(GameEvent::PermanentLeft { entity, former_controller, card, name });
        }
        // Spells the departed player had on the stack vanish with the card.
        let on_stack: Vec<_> = state
            .stack
            .iter()
            .filter(|item| matches!(item.kind, StackItemKind::Spell { card, .. } if card == entity))
            .map(|item| item.id)
            .collect();
        for id in on_stack {
            state.stack.remove(id);
        }
        state.remove_from_game(entity);
        changed = true;
    }
    changed
}

fn departure_info(state: &GameState, entity: EntityId) -> (PlayerId, crate::cards::CardId, String) {
    let card = state.card(entity);
    let card_id = card.map_or(crate::cards::CardId::new(0), |c| c.card);
    let controller = state
        .permanent(entity)
        .map_or_else(|| card.map_or(PlayerId::new(0), |c| c.owner), |p| p.controller);
    let name = state
        .registry
        .get(card_id)
        .map_or_else(|| format!("{entity}"), |d| d.name.clone());
    (controller, card_id, name)
}

/// Zero-or-less toughness, or marked damage at or above toughness.
fn check_dead_creatures(state: &mut GameState) -> bool {
    let mut dead: Vec<EntityId> = Vec::new();

    let mut on_field: Vec<EntityId> = state.zones.in_zone(Zone::Battlefield).collect();
    on_field.sort();
    for entity in on_field {
        let Some((_, toughness)) = state.effective_pt(entity) else {
            continue;
        };
        let damage = state.permanent(entity).map_or(0, |p| p.damage);
        if toughness <= 0 || damage >= toughness {
            dead.push(entity);
        }
    }

    for entity in &dead {
        if let Some(owner) = state.card(*entity).map(|c| c.owner) {
            state.move_card(*entity, Zone::Graveyard(owner), ZonePosition::Top);
        }
    }
    !dead.is_empty()
}

/// Auras attached to nothing (or to a departed host) go to the graveyard;
/// equipment merely becomes unattached.
fn check_illegal_attachments(state: &mut GameState) -> bool {
    let mut doomed_auras: Vec<EntityId> = Vec::new();
    let mut loose_equipment: Vec<EntityId> = Vec::new();

    let mut on_field: Vec<EntityId> = state.zones.in_zone(Zone::Battlefield).collect();
    on_field.sort();
    for entity in on_field {
        let Some(def) = state.definition_of(entity) else {
            continue;
        };
        let (is_aura, is_equipment) = (def.type_line.is_aura(), def.type_line.is_equipment());
        if !is_aura && !is_equipment {
            continue;
        }
        let Some(perm) = state.permanent(entity) else {
            continue;
        };
        let host_ok = perm
            .attached_to
            .is_some_and(|host| state.zones.is_in(host, Zone::Battlefield));

        if is_aura && !host_ok {
            doomed_auras.push(entity);
        } else if is_equipment && !host_ok && perm.attached_to.is_some() {
            loose_equipment.push(entity);
        }
    }

    for entity in &doomed_auras {
        if let Some(owner) = state.card(*entity).map(|c| c.owner) {
            state.move_card(*entity, Zone::Graveyard(owner), ZonePosition::Top);
        }
    }
    for entity in &loose_equipment {
        if let Some(perm) = state.permanent_mut(*entity) {
            perm.attached_to = None;
        }
    }
    !doomed_auras.is_empty() || !loose_equipment.is_empty()
}

/// Tokens cease to exist anywhere but the battlefield.
fn remove_stray_tokens(state: &mut GameState) -> bool {
    let mut strays: Vec<EntityId> = state
        .cards
        .values()
        .filter(|c| c.is_token && !state.zones.is_in(c.entity, Zone::Battlefield))
        .map(|c| c.entity)
        .collect();
    strays.sort();

    for entity in &strays {
        state.remove_from_game(*entity);
    }
    !strays.is_empty()
}

/// Two or more legendary permanents with the same name under one
/// controller: the controller keeps one. The choice is a resolution step;
/// the duplicates stay until it resolves.
fn check_legend_rule(state: &mut GameState) -> bool {
    let mut groups: FxHashMap<(PlayerId, String), Vec<EntityId>> = FxHashMap::default();

    let mut on_field: Vec<EntityId> = state.zones.in_zone(Zone::Battlefield).collect();
    on_field.sort();
    for entity in on_field {
        let Some(def) = state.definition_of(entity) else {
            continue;
        };
        if !def.type_line.is_legendary() {
            continue;
        }
        let name = def.name.clone();
        let Some(controller) = state.permanent(entity).map(|p| p.controller) else {
            continue;
        };
        groups.entry((controller, name)).or_default().push(entity);
    }

    let mut changed = false;
    let mut duplicated: Vec<((PlayerId, String), Vec<EntityId>)> = groups
        .into_iter()
        .filter(|(_, candidates)| candidates.len() >= 2)
        .collect();
    duplicated.sort_by(|a, b| a.0.cmp(&b.0));

    for ((controller, name), candidates) in duplicated {
        let already_pending = state.queue.iter_for(controller).any(|step| {
            matches!(&step.kind, StepKind::LegendChoice { name: pending, .. } if *pending == name)
        });
        if already_pending {
            continue;
        }
        state.queue.enqueue(
            controller,
            true,
            StepKind::LegendChoice { name, candidates },
        );
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId, CardRegistry};

    fn registry() -> CardRegistry {
        let mut registry = CardRegistry::new();
        registry.register(
            CardDefinition::new(CardId::new(1), "Grizzly Bears", "Creature — Bear").with_pt(2, 2),
        );
        registry.register(
            CardDefinition::new(CardId::new(2), "Urza, Lord High Artificer", "Legendary Creature — Human Artificer")
                .with_pt(1, 4),
        );
        registry
    }

    fn put_on_battlefield(state: &mut GameState, card: CardId, controller: PlayerId) -> EntityId {
        let entity = state.create_card(card, controller, Zone::Hand(controller));
        state.move_card(entity, Zone::Battlefield, ZonePosition::Top);
        state.take_events();
        entity
    }

    #[test]
    fn test_lethal_damage_kills() {
        let mut state = GameState::new(2, 1, registry());
        let bear = put_on_battlefield(&mut state, CardId::new(1), PlayerId::new(0));
        state.permanent_mut(bear).unwrap().damage = 2;

        assert!(run_state_based_actions(&mut state));
        assert_eq!(
            state.zones.zone_of(bear),
            Some(Zone::Graveyard(PlayerId::new(0)))
        );
    }

    #[test]
    fn test_sublethal_damage_survives() {
        let mut state = GameState::new(2, 1, registry());
        let bear = put_on_battlefield(&mut state, CardId::new(1), PlayerId::new(0));
        state.permanent_mut(bear).unwrap().damage = 1;

        run_state_based_actions(&mut state);
        assert!(state.zones.is_in(bear, Zone::Battlefield));
    }

    #[test]
    fn test_zero_toughness_dies_without_damage() {
        let mut state = GameState::new(2, 1, registry());
        let bear = put_on_battlefield(&mut state, CardId::new(1), PlayerId::new(0));
        state
            .permanent_mut(bear)
            .unwrap()
            .add_counters(crate::zones::CounterKind::MinusOneMinusOne, 2);

        run_state_based_actions(&mut state);
        assert!(!state.zones.is_in(bear, Zone::Battlefield));
    }

    #[test]
    fn test_life_zero_loses_and_objects_leave() {
        let mut state = GameState::new(2, 1, registry());
        let p1 = PlayerId::new(1);
        let bear = put_on_battlefield(&mut state, CardId::new(1), p1);
        state.players[p1].life = 0;

        run_state_based_actions(&mut state);
        assert_eq!(state.players[p1].lost, Some(LossReason::LifeZero));
        assert!(state.card(bear).is_none());
    }

    #[test]
    fn test_commander_damage_rule() {
        let mut state = GameState::new(2, 1, registry());
        let commander = put_on_battlefield(&mut state, CardId::new(2), PlayerId::new(1));
        state.players[PlayerId::new(1)].commander = Some(commander);
        state.players[PlayerId::new(0)]
            .commander_damage
            .insert(commander, 21);

        run_state_based_actions(&mut state);
        assert_eq!(
            state.players[PlayerId::new(0)].lost,
            Some(LossReason::CommanderDamage)
        );
        // Life was never touched by the rule itself.
        assert_eq!(state.players[PlayerId::new(0)].life, 40);
    }

    #[test]
    fn test_legend_rule_enqueues_choice_once() {
        let mut state = GameState::new(2, 1, registry());
        let p0 = PlayerId::new(0);
        let a = put_on_battlefield(&mut state, CardId::new(2), p0);
        let b = put_on_battlefield(&mut state, CardId::new(2), p0);

        assert!(run_state_based_actions(&mut state));
        let front = state.queue.front(p0).unwrap();
        let StepKind::LegendChoice { candidates, .. } = &front.kind else {
            panic!("expected legend choice");
        };
        let mut sorted = candidates.clone();
        sorted.sort();
        assert_eq!(sorted, vec![a, b]);

        // A second sweep does not enqueue a duplicate.
        run_state_based_actions(&mut state);
        assert_eq!(state.queue.len_for(p0), 1);
    }

    #[test]
    fn test_legends_under_different_controllers_coexist() {
        let mut state = GameState::new(2, 1, registry());
        put_on_battlefield(&mut state, CardId::new(2), PlayerId::new(0));
        put_on_battlefield(&mut state, CardId::new(2), PlayerId::new(1));

        run_state_based_actions(&mut state);
        assert!(!state.queue.any_pending());
    }

    #[test]
    fn test_fixed_point_cascades() {
        // A 0-toughness creature dies in pass one; its controller at 0 life
        // loses in the same sweep.
        let mut state = GameState::new(2, 1, registry());
        let p1 = PlayerId::new(1);
        let bear = put_on_battlefield(&mut state, CardId::new(1), p1);
        state.permanent_mut(bear).unwrap().damage = 5;
        state.players[p1].life = 0;

        run_state_based_actions(&mut state);
        assert_eq!(state.players[p1].lost, Some(LossReason::LifeZero));
        assert!(state.card(bear).is_none());
    }

    #[test]
    fn test_clean_state_is_stable() {
        let mut state = GameState::new(2, 1, registry());
        put_on_battlefield(&mut state, CardId::new(1), PlayerId::new(0));
        assert!(!run_state_based_actions(&mut state));
    }
}
