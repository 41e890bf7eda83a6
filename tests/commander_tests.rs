//! Commander-specific rules: the command zone, the tax, and damage
//! tracking.

mod common;

use commander_engine::cards::{ActivatedAbilityDef, ActivationCost, CardDefinition, CardId};
use commander_engine::effects::{SpellEffect, TargetKind, TargetRef, TargetSpec};
use commander_engine::zones::Zone;
use commander_engine::{Action, Color, PlayerId, PlayerSetup, Step};

use common::*;

fn commander_game() -> commander_engine::GameSession {
    game_with(2, |i| PlayerSetup {
        deck: mono_deck(FOREST),
        commander: (i == 0).then_some(SYLVAN_PRIMORDIAL),
    })
}

/// The commander starts in the command zone and can be cast from there.
#[test]
fn test_commander_casts_from_command_zone() {
    let mut game = commander_game();
    let p0 = PlayerId::new(0);

    let commander = game.state().players[p0].commander.unwrap();
    assert!(game.state().zones.is_in(commander, Zone::Command(p0)));

    pass_until(&mut game, Step::Main1);
    add_mana(&mut game, p0, Color::Green, 5);
    game.submit(p0, Action::CastSpell { card: commander, targets: vec![], x: None })
        .unwrap();
    assert_eq!(game.state().players[p0].commander_tax, 1);

    pass_until_stack_empty(&mut game);
    assert!(game.state().zones.is_in(commander, Zone::Battlefield));
}

/// A dying commander returns to the command zone; the death is still a
/// death.
#[test]
fn test_commander_death_redirects_to_command_zone() {
    let mut game = commander_game();
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);

    let commander = game.state().players[p0].commander.unwrap();
    pass_until(&mut game, Step::Main1);
    add_mana(&mut game, p0, Color::Green, 5);
    game.submit(p0, Action::CastSpell { card: commander, targets: vec![], x: None })
        .unwrap();
    pass_until_stack_empty(&mut game);

    // A Blood Artist watches for the death.
    put_on_battlefield(&mut game, p1, BLOOD_ARTIST);

    let blade = put_in_hand(&mut game, p1, DOOM_BLADE);
    add_mana(&mut game, p1, Color::Black, 2);
    game.submit(p1, Action::PassPriority).unwrap_err(); // not the holder yet
    game.submit(p0, Action::PassPriority).unwrap();
    game.submit(
        p1,
        Action::CastSpell {
            card: blade,
            targets: vec![vec![TargetRef::Permanent(commander)]],
            x: None,
        },
    )
    .unwrap();
    pass_until_stack_empty(&mut game);

    assert!(game.state().zones.is_in(commander, Zone::Command(p0)));
    assert!(!game.state().zones.is_in(commander, Zone::Graveyard(p0)));
    // The dies-trigger saw it.
    assert_eq!(game.state().players[p1].life, 41);
    assert_eq!(game.state().players[p0].life, 39);
}

/// Each cast from the command zone adds two generic mana per prior cast.
#[test]
fn test_commander_tax_escalates() {
    let mut game = commander_game();
    let p0 = PlayerId::new(0);

    let commander = game.state().players[p0].commander.unwrap();
    pass_until(&mut game, Step::Main1);

    // First cast: {3}{G}{G}.
    add_mana(&mut game, p0, Color::Green, 5);
    game.submit(p0, Action::CastSpell { card: commander, targets: vec![], x: None })
        .unwrap();
    pass_until_stack_empty(&mut game);

    // Send it home.
    game.state_mut().move_card(
        commander,
        Zone::Graveyard(p0),
        commander_engine::zones::ZonePosition::Top,
    );
    game.state_mut().take_events();
    assert!(game.state().zones.is_in(commander, Zone::Command(p0)));

    // Second cast: {3}{G}{G} plus {2} tax. Five mana no longer covers it.
    add_mana(&mut game, p0, Color::Green, 5);
    let err = game
        .submit(p0, Action::CastSpell { card: commander, targets: vec![], x: None })
        .unwrap_err();
    assert_eq!(err.code(), "illegal_action");

    add_mana(&mut game, p0, Color::Green, 2);
    game.submit(p0, Action::CastSpell { card: commander, targets: vec![], x: None })
        .unwrap();
    assert_eq!(game.state().players[p0].commander_tax, 2);
    assert_eq!(game.state().players[p0].mana.total(), 0);
}

/// Damage dealt by a commander accumulates per victim and kills at 21.
#[test]
fn test_commander_damage_accumulates_to_21() {
    let mut registry = card_pool();
    registry.register(
        CardDefinition::new(CardId(950), "Rakdos Firebrand", "Legendary Creature — Devil")
            .with_cost(commander_engine::ManaCost::parse("{2}{R}"))
            .with_pt(3, 3)
            .with_activated(ActivatedAbilityDef {
                cost: ActivationCost { tap: true, mana: None, per_turn_limit: None },
                effects: vec![SpellEffect::damage(7)],
                target: Some(TargetSpec::one(TargetKind::Player)),
                mana_ability: false,
                description: "deal 7 damage to target player".to_string(),
            }),
    );
    let setup = commander_engine::GameSetup {
        seed: 0xC0FFEE,
        registry,
        players: vec![
            PlayerSetup { deck: mono_deck(FOREST), commander: Some(CardId(950)) },
            PlayerSetup { deck: mono_deck(FOREST), commander: None },
        ],
        starting_player: Some(PlayerId::new(0)),
    };
    let mut game =
        commander_engine::GameSession::new(commander_engine::GameId::new(1), setup).unwrap();
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);

    let commander = game.state().players[p0].commander.unwrap();
    pass_until(&mut game, Step::Main1);
    add_mana(&mut game, p0, Color::Red, 3);
    game.submit(p0, Action::CastSpell { card: commander, targets: vec![], x: None })
        .unwrap();
    pass_until_stack_empty(&mut game);
    // Creatures cannot tap the turn they arrive.
    game.state_mut().permanent_mut(commander).unwrap().summoning_sick = false;

    for hit in 1..=3 {
        game.submit(
            p0,
            Action::ActivateAbility {
                source: commander,
                ability: 0,
                targets: vec![TargetRef::Player(p1)],
            },
        )
        .unwrap();
        pass_until_stack_empty(&mut game);
        assert_eq!(
            game.state().players[p1].commander_damage.get(&commander),
            Some(&(7 * hit))
        );
        if hit < 3 {
            game.state_mut().permanent_mut(commander).unwrap().tapped = false;
        }
    }

    // 21 damage from one commander: dead regardless of life total.
    assert!(game.is_over());
    assert_eq!(game.winner(), Some(p0));
}
