//! Shared fixtures for the integration suites.
//!
//! A small card pool covering every engine feature, plus helpers that set
//! up games and shortcut the boring parts (mana in pools, cards in hands)
//! through [`GameSession::state_mut`]. Everything under test still goes
//! through [`GameSession::submit`].

use commander_engine::cards::{
    ActivatedAbilityDef, ActivationCost, CardDefinition, CardId, CardRegistry, ManaCost,
    SpellClause, TriggeredAbilityDef,
};
use commander_engine::effects::{
    Amount, PlayerGroup, SpellEffect, TargetKind, TargetSpec,
};
use commander_engine::game::{GameId, GameSession, GameSetup, PlayerSetup};
use commander_engine::triggers::TriggerCondition;
use commander_engine::zones::Zone;
use commander_engine::{Color, EntityId, PlayerId, Step};

pub const FOREST: CardId = CardId(1);
pub const MOUNTAIN: CardId = CardId(2);
pub const ISLAND: CardId = CardId(3);
pub const SWAMP: CardId = CardId(4);
pub const GRIZZLY_BEARS: CardId = CardId(10);
pub const LIGHTNING_BOLT: CardId = CardId(11);
pub const CANCEL: CardId = CardId(12);
pub const DIVINATION: CardId = CardId(13);
pub const FIREBALL: CardId = CardId(14);
pub const ELVISH_VISIONARY: CardId = CardId(15);
pub const DOOM_BLADE: CardId = CardId(16);
pub const KEEPER_OF_LEINA: CardId = CardId(17);
pub const HEALERS_APPRENTICE: CardId = CardId(18);
pub const BLOOD_ARTIST: CardId = CardId(19);
pub const SYLVAN_PRIMORDIAL: CardId = CardId(20);

fn basic_land(id: CardId, name: &str, color: Color) -> CardDefinition {
    CardDefinition::new(id, name, &format!("Basic Land — {name}")).with_activated(
        ActivatedAbilityDef {
            cost: ActivationCost { tap: true, mana: None, per_turn_limit: None },
            effects: vec![SpellEffect::AddMana { color: Some(color), count: 1 }],
            target: None,
            mana_ability: true,
            description: format!("add {}", color.symbol()),
        },
    )
}

/// The full test card pool.
pub fn card_pool() -> CardRegistry {
    let mut registry = CardRegistry::new();

    registry.register(basic_land(FOREST, "Forest", Color::Green));
    registry.register(basic_land(MOUNTAIN, "Mountain", Color::Red));
    registry.register(basic_land(ISLAND, "Island", Color::Blue));
    registry.register(basic_land(SWAMP, "Swamp", Color::Black));

    registry.register(
        CardDefinition::new(GRIZZLY_BEARS, "Grizzly Bears", "Creature — Bear")
            .with_cost(ManaCost::parse("{1}{G}"))
            .with_pt(2, 2),
    );

    registry.register(
        CardDefinition::new(LIGHTNING_BOLT, "Lightning Bolt", "Instant")
            .with_cost(ManaCost::parse("{R}"))
            .with_clause(SpellClause::targeted(
                TargetSpec::one(TargetKind::CreatureOrPlayer),
                vec![SpellEffect::damage(3)],
            )),
    );

    registry.register(
        CardDefinition::new(CANCEL, "Cancel", "Instant")
            .with_cost(ManaCost::parse("{1}{U}{U}"))
            .with_clause(SpellClause::targeted(
                TargetSpec::one(TargetKind::SpellOnStack),
                vec![SpellEffect::CounterTarget],
            )),
    );

    registry.register(
        CardDefinition::new(DIVINATION, "Divination", "Sorcery")
            .with_cost(ManaCost::parse("{2}{U}"))
            .with_clause(SpellClause::untargeted(vec![SpellEffect::draw(2)])),
    );

    registry.register(
        CardDefinition::new(FIREBALL, "Fireball", "Sorcery")
            .with_cost(ManaCost::parse("{X}{R}"))
            .with_clause(SpellClause::targeted(
                TargetSpec::one(TargetKind::CreatureOrPlayer),
                vec![SpellEffect::DealDamage { amount: Amount::X }],
            )),
    );

    registry.register(
        CardDefinition::new(ELVISH_VISIONARY, "Elvish Visionary", "Creature — Elf Shaman")
            .with_cost(ManaCost::parse("{1}{G}"))
            .with_pt(1, 1)
            .with_triggered(TriggeredAbilityDef {
                condition: TriggerCondition::SelfEnters,
                effects: vec![SpellEffect::draw(1)],
                target: None,
                may: false,
                description: "draw a card".to_string(),
            }),
    );

    registry.register(
        CardDefinition::new(DOOM_BLADE, "Doom Blade", "Instant")
            .with_cost(ManaCost::parse("{1}{B}"))
            .with_clause(SpellClause::targeted(
                TargetSpec::one(TargetKind::Creature),
                vec![SpellEffect::DestroyTarget],
            )),
    );

    registry.register(
        CardDefinition::new(
            KEEPER_OF_LEINA,
            "Keeper of Leina",
            "Legendary Creature — Elf Warrior",
        )
        .with_cost(ManaCost::parse("{2}{G}"))
        .with_pt(2, 3),
    );

    // No structured abilities: exercises the oracle-text fallback.
    registry.register(
        CardDefinition::new(
            HEALERS_APPRENTICE,
            "Healer's Apprentice",
            "Creature — Human Cleric",
        )
        .with_cost(ManaCost::parse("{1}{G}"))
        .with_pt(1, 1)
        .with_oracle_text(
            "When Healer's Apprentice enters the battlefield, you gain 2 life.",
        ),
    );

    registry.register(
        CardDefinition::new(BLOOD_ARTIST, "Blood Artist", "Creature — Vampire")
            .with_cost(ManaCost::parse("{1}{B}"))
            .with_pt(0, 1)
            .with_triggered(TriggeredAbilityDef {
                condition: TriggerCondition::CreatureDies { yours_only: false },
                effects: vec![
                    SpellEffect::gain_life(1),
                    SpellEffect::LoseLife {
                        who: PlayerGroup::EachOpponent,
                        amount: Amount::Fixed(1),
                    },
                ],
                target: None,
                may: false,
                description: "you gain 1 life and each opponent loses 1 life".to_string(),
            }),
    );

    registry.register(
        CardDefinition::new(
            SYLVAN_PRIMORDIAL,
            "Sylvan Primordial",
            "Legendary Creature — Avatar",
        )
        .with_cost(ManaCost::parse("{3}{G}{G}"))
        .with_pt(5, 5),
    );

    registry
}

/// A deck of 40 of the given basic, enough for a short test game.
pub fn mono_deck(land: CardId) -> Vec<CardId> {
    vec![land; 40]
}

/// A seeded game with the shared pool, mono-basic decks, and no
/// commanders.
pub fn game(player_count: usize) -> GameSession {
    game_with(player_count, |_| PlayerSetup {
        deck: mono_deck(FOREST),
        commander: None,
    })
}

/// A seeded game with per-player setup.
pub fn game_with(
    player_count: usize,
    per_player: impl Fn(usize) -> PlayerSetup,
) -> GameSession {
    let setup = GameSetup {
        seed: 0xC0FFEE,
        registry: card_pool(),
        players: (0..player_count).map(per_player).collect(),
        starting_player: Some(PlayerId::new(0)),
    };
    GameSession::new(GameId::new(1), setup).expect("test setup is valid")
}

/// Put a fresh instance of `card` into `player`'s hand, bypassing the
/// library.
pub fn put_in_hand(session: &mut GameSession, player: PlayerId, card: CardId) -> EntityId {
    session
        .state_mut()
        .create_card(card, player, Zone::Hand(player))
}

/// Put a fresh instance of `card` straight onto the battlefield under
/// `player`'s control.
pub fn put_on_battlefield(
    session: &mut GameSession,
    player: PlayerId,
    card: CardId,
) -> EntityId {
    let state = session.state_mut();
    let entity = state.create_card(card, player, Zone::Hand(player));
    state.move_card(
        entity,
        Zone::Battlefield,
        commander_engine::zones::ZonePosition::Top,
    );
    // Direct placement is setup, not a spell resolving: drop the entry
    // events so no ETB trigger fires, but register the permanent's
    // triggers so later events reach it.
    state.take_events();
    state.register_triggers(entity);
    entity
}

/// The cards in a player's hand, in entity order.
pub fn hand_of(session: &GameSession, player: PlayerId) -> Vec<EntityId> {
    let mut hand: Vec<EntityId> = session
        .state()
        .zones
        .in_zone(Zone::Hand(player))
        .collect();
    hand.sort();
    hand
}

/// Fill `player`'s mana pool.
pub fn add_mana(session: &mut GameSession, player: PlayerId, color: Color, count: u32) {
    session.state_mut().players[player].mana.add(color, count);
}

/// Pass priority with whoever holds it until the turn reaches `step`.
/// Panics if a full trip around the table fails to advance.
pub fn pass_until(session: &mut GameSession, step: Step) {
    for _ in 0..200 {
        if session.state().turn.step == step {
            return;
        }
        let holder = session.state().priority.holder();
        session
            .submit(holder, commander_engine::Action::PassPriority)
            .expect("pass while settling to a step");
    }
    panic!(
        "never reached {step}, stuck at {}",
        session.state().turn.step
    );
}

/// Pass priority with everyone until the stack is empty again.
pub fn pass_until_stack_empty(session: &mut GameSession) {
    for _ in 0..200 {
        if session.state().stack.is_empty() {
            return;
        }
        let holder = session.state().priority.holder();
        session
            .submit(holder, commander_engine::Action::PassPriority)
            .expect("pass while resolving the stack");
    }
    panic!("stack never emptied");
}
