//! The authoritative state of one game.
//!
//! `GameState` aggregates every mutable structure a game owns: players,
//! card instances, zones, battlefield permanents, the turn/priority
//! machinery, the stack, the resolution queue, the trigger registry, and
//! the event log. All mutation happens through `&mut self`; the session is
//! the only caller and serializes access per game.
//!
//! Mutators emit [`GameEvent`]s into both the permanent log and a pending
//! buffer the session drains for trigger matching after each mutation
//! completes.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::{CardDefinition, CardId, CardInstance, CardRegistry, ManaPool};
use crate::effects::TargetRef;
use crate::queue::ResolutionQueue;
use crate::stack::GameStack;
use crate::triggers::{
    scan_oracle_text, GameEvent, PendingTrigger, RegisteredTrigger, TriggerConfidence,
    TriggerRegistry, UndecidedTrigger,
};
use crate::turn::{PrioritySystem, TurnState};
use crate::zones::{Permanent, Zone, ZoneManager, ZonePosition};

use super::action::EventLog;
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;

/// Why a player is out of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    /// Life total reached 0 or less.
    LifeZero,
    /// Attempted to draw from an empty library.
    EmptyLibrary,
    /// Took 21 or more combat-relevant damage from a single commander.
    CommanderDamage,
    Conceded,
}

/// Per-player game state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Commander starts at 40.
    pub life: i64,

    /// The player's commander, once assigned at setup.
    pub commander: Option<EntityId>,

    /// Times the commander has been cast from the command zone. Each cast
    /// adds `{2}` per prior cast to its cost.
    pub commander_tax: u32,

    /// Damage received from each commander, for the 21-damage rule.
    pub commander_damage: FxHashMap<EntityId, i64>,

    /// Floating mana; emptied at every step boundary.
    pub mana: ManaPool,

    /// `Some` once the player has lost.
    pub lost: Option<LossReason>,

    /// Set on a failed draw; the loss itself is applied by the next
    /// state-based action sweep.
    pub drew_from_empty: bool,
}

impl PlayerState {
    fn new() -> Self {
        Self {
            life: 40,
            commander: None,
            commander_tax: 0,
            commander_damage: FxHashMap::default(),
            mana: ManaPool::new(),
            lost: None,
            drew_from_empty: false,
        }
    }
}

/// A cast parked while its X and targets are collected through resolution
/// steps. Mana is paid only when the cast finishes and the spell actually
/// moves to the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCast {
    pub player: PlayerId,
    pub card: EntityId,
    /// Bound X, once chosen.
    pub x: Option<i64>,
    /// Targets collected so far, one list per targeted clause.
    pub targets: Vec<SmallVec<[TargetRef; 2]>>,
    /// Cast from the command zone (commander tax applies).
    pub from_command: bool,
}

/// A floating power/toughness modification ("+3/+3 until end of turn").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousEffect {
    pub target: EntityId,
    pub power: i64,
    pub toughness: i64,
    /// Expires during cleanup when set.
    pub until_end_of_turn: bool,
    pub timestamp: u64,
}

/// All mutable state for one game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    player_count: usize,
    pub players: PlayerMap<PlayerState>,

    /// Card definitions, seeded from the database plus minted tokens.
    pub registry: CardRegistry,

    /// Every card instance in the game, including tokens.
    pub cards: FxHashMap<EntityId, CardInstance>,

    pub zones: ZoneManager,

    /// Battlefield state, keyed by card instance.
    pub battlefield: FxHashMap<EntityId, Permanent>,

    pub turn: TurnState,
    pub priority: PrioritySystem,
    pub stack: GameStack,
    pub queue: ResolutionQueue,

    pub triggers: TriggerRegistry,

    /// Triggers matched but not yet placed on the stack; placed in APNAP
    /// order at the next priority grant.
    pub pending_triggers: Vec<PendingTrigger>,

    /// Triggers whose conditions could not be decided, surfaced to clients.
    pub undecided: Vec<UndecidedTrigger>,

    pub continuous: Vec<ContinuousEffect>,

    pub pending_cast: Option<PendingCast>,

    pub log: EventLog,
    pub rng: GameRng,

    next_entity: u32,
    next_timestamp: u64,

    /// Events emitted since the session last drained them.
    unprocessed: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh game. Player 0 starts; the session reseats via
    /// [`TurnState`] if a die roll decides otherwise.
    #[must_use]
    pub fn new(player_count: usize, seed: u64, registry: CardRegistry) -> Self {
        let starting = PlayerId::new(0);
        Self {
            player_count,
            players: PlayerMap::new(player_count, |_| PlayerState::new()),
            registry,
            cards: FxHashMap::default(),
            zones: ZoneManager::new(),
            battlefield: FxHashMap::default(),
            turn: TurnState::new(player_count, starting),
            priority: PrioritySystem::new(player_count, starting),
            stack: GameStack::new(),
            queue: ResolutionQueue::new(player_count),
            triggers: TriggerRegistry::new(),
            pending_triggers: Vec::new(),
            undecided: Vec::new(),
            continuous: Vec::new(),
            pending_cast: None,
            log: EventLog::new(),
            rng: GameRng::new(seed),
            next_entity: EntityId::first_non_player(player_count),
            next_timestamp: 1,
            unprocessed: Vec::new(),
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Whether a player is still in the game.
    #[must_use]
    pub fn alive(&self, player: PlayerId) -> bool {
        self.players
            .get(player)
            .is_some_and(|p| p.lost.is_none())
    }

    /// Players still in the game, in seating order.
    #[must_use]
    pub fn alive_players(&self) -> Vec<PlayerId> {
        PlayerId::all(self.player_count)
            .filter(|&p| self.alive(p))
            .collect()
    }

    /// Alive players starting from the active player, in turn order. This
    /// is the order priority rotates through.
    #[must_use]
    pub fn priority_order(&self) -> Vec<PlayerId> {
        let mut order = self.alive_players();
        order.sort_by_key(|p| p.seats_after(self.turn.active, self.player_count));
        order
    }

    /// Allocate a fresh entity ID.
    pub fn allocate_entity(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity += 1;
        id
    }

    /// Next battlefield-entry timestamp.
    pub fn next_timestamp(&mut self) -> u64 {
        let ts = self.next_timestamp;
        self.next_timestamp += 1;
        ts
    }

    /// Emit an event: appended to the permanent log and to the pending
    /// buffer the session drains for trigger matching.
    pub fn emit(&mut self, event: GameEvent) {
        self.log.record_event(event.clone());
        self.unprocessed.push(event);
    }

    /// Drain events emitted since the last drain.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.unprocessed)
    }

    // === Lookup ===

    #[must_use]
    pub fn card(&self, entity: EntityId) -> Option<&CardInstance> {
        self.cards.get(&entity)
    }

    pub fn card_mut(&mut self, entity: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&entity)
    }

    #[must_use]
    pub fn permanent(&self, entity: EntityId) -> Option<&Permanent> {
        self.battlefield.get(&entity)
    }

    pub fn permanent_mut(&mut self, entity: EntityId) -> Option<&mut Permanent> {
        self.battlefield.get_mut(&entity)
    }

    /// The definition behind a card instance.
    #[must_use]
    pub fn definition_of(&self, entity: EntityId) -> Option<&CardDefinition> {
        self.registry.get(self.cards.get(&entity)?.card)
    }

    // === Card creation ===

    /// Bring a card instance into the game in `zone`.
    pub fn create_card(&mut self, card: CardId, owner: PlayerId, zone: Zone) -> EntityId {
        let entity = self.allocate_entity();
        self.cards
            .insert(entity, CardInstance::new(entity, card, owner, zone));
        self.zones.place(entity, zone, ZonePosition::Top);
        entity
    }

    /// Create a token directly on the battlefield under `owner`'s control.
    pub fn create_token(&mut self, card: CardId, owner: PlayerId) -> EntityId {
        let entity = self.allocate_entity();
        self.cards.insert(entity, CardInstance::token(entity, card, owner));
        self.zones.place(entity, Zone::Battlefield, ZonePosition::Top);
        let timestamp = self.next_timestamp();
        self.battlefield.insert(entity, Permanent::new(entity, owner, timestamp));
        self.emit(GameEvent::PermanentEntered { entity, controller: owner, card });
        entity
    }

    /// Register an entity's triggered abilities: structured descriptors
    /// when the definition carries any, the oracle-text pattern scan
    /// otherwise.
    pub fn register_triggers(&mut self, entity: EntityId) {
        let Some(def) = self.definition_of(entity) else {
            return;
        };
        let registered: Vec<RegisteredTrigger> = if def.triggered.is_empty() {
            scan_oracle_text(def)
        } else {
            def.triggered
                .iter()
                .map(|t| RegisteredTrigger {
                    condition: t.condition.clone(),
                    effects: t.effects.clone(),
                    target: t.target.clone(),
                    may: t.may,
                    confidence: TriggerConfidence::Structured,
                    description: t.description.clone(),
                })
                .collect()
        };
        self.triggers.register(entity, registered);
    }

    /// Shuffle a player's library.
    pub fn shuffle_library(&mut self, player: PlayerId) {
        let zone = Zone::Library(player);
        let mut order = self.zones.ordered(zone).to_vec();
        self.rng.shuffle(&mut order);
        self.zones.set_order(zone, order);
    }

    // === Zone movement ===

    /// Move a card between zones, maintaining every derived structure:
    /// battlefield state, attachment links, continuous effects, the
    /// instance's zone tag, and the events departure and arrival produce.
    ///
    /// Commanders headed for a graveyard or exile go to the command zone
    /// instead; the departure event still fires from the requested
    /// destination, so dies-triggers see the death.
    ///
    /// Returns the previous zone, or `None` for an unknown entity.
    pub fn move_card(
        &mut self,
        entity: EntityId,
        to: Zone,
        position: ZonePosition,
    ) -> Option<Zone> {
        let (card_id, owner) = {
            let card = self.cards.get(&entity)?;
            (card.card, card.owner)
        };
        let from = self.zones.zone_of(entity)?;

        let to = if self.players[owner].commander == Some(entity)
            && matches!(to, Zone::Graveyard(_) | Zone::Exile)
        {
            Zone::Command(owner)
        } else {
            to
        };
        if from == to {
            return Some(from);
        }

        // Departure from the battlefield: capture last-known info and tear
        // down battlefield-only state before anything else observes it.
        if from == Zone::Battlefield {
            let name = self
                .registry
                .get(card_id)
                .map_or_else(|| format!("{entity}"), |d| d.name.clone());
            let was_creature = self
                .registry
                .get(card_id)
                .is_some_and(|d| d.type_line.is_creature());
            let former_controller = self
                .battlefield
                .get(&entity)
                .map_or(owner, |p| p.controller);

            self.sever_attachments(entity);
            self.battlefield.remove(&entity);
            self.continuous.retain(|effect| effect.target != entity);

            let event = if matches!(to, Zone::Graveyard(_)) {
                GameEvent::PermanentDied {
                    entity,
                    former_controller,
                    card: card_id,
                    name,
                    was_creature,
                }
            } else {
                GameEvent::PermanentLeft { entity, former_controller, card: card_id, name }
            };
            self.emit(event);
        }

        self.zones.transfer(entity, to, position);
        if let Some(card) = self.cards.get_mut(&entity) {
            card.zone = to;
            // Control changes end outside the battlefield and stack.
            if !matches!(to, Zone::Battlefield | Zone::Stack) {
                card.controller = card.owner;
            }
        }

        // Arrival on the battlefield: fresh permanent state, new timestamp.
        if to == Zone::Battlefield {
            let controller = self.cards[&entity].controller;
            let timestamp = self.next_timestamp();
            self.battlefield
                .insert(entity, Permanent::new(entity, controller, timestamp));
            self.emit(GameEvent::PermanentEntered { entity, controller, card: card_id });
        }

        // Tokens exist only on the battlefield; a token moved elsewhere is
        // removed by the next state-based action sweep.
        Some(from)
    }

    /// Remove a card instance from the game entirely (tokens ceasing to
    /// exist).
    pub fn remove_from_game(&mut self, entity: EntityId) {
        self.sever_attachments(entity);
        self.battlefield.remove(&entity);
        self.continuous.retain(|effect| effect.target != entity);
        self.zones.remove(entity);
        self.cards.remove(&entity);
        self.triggers.unregister(entity);
    }

    fn sever_attachments(&mut self, entity: EntityId) {
        let (host, attached): (Option<EntityId>, Vec<EntityId>) = match self.battlefield.get(&entity)
        {
            Some(perm) => (perm.attached_to, perm.attachments.to_vec()),
            None => return,
        };

        if let Some(host) = host {
            if let Some(host_perm) = self.battlefield.get_mut(&host) {
                host_perm.attachments.retain(|&mut e| e != entity);
            }
        }
        for attachment in attached {
            if let Some(perm) = self.battlefield.get_mut(&attachment) {
                perm.attached_to = None;
            }
        }
        if let Some(perm) = self.battlefield.get_mut(&entity) {
            perm.attached_to = None;
            perm.attachments.clear();
        }
    }

    // === Derived stats ===

    /// Effective power/toughness: base from the definition, plus counters,
    /// plus continuous effects. `None` for non-creatures.
    #[must_use]
    pub fn effective_pt(&self, entity: EntityId) -> Option<(i64, i64)> {
        let def = self.definition_of(entity)?;
        if !def.type_line.is_creature() {
            return None;
        }
        let mut power = def.power.unwrap_or(0);
        let mut toughness = def.toughness.unwrap_or(0);

        if let Some(perm) = self.permanent(entity) {
            let delta = perm.counter_pt_delta();
            power += delta;
            toughness += delta;
        }
        for effect in &self.continuous {
            if effect.target == entity {
                power += effect.power;
                toughness += effect.toughness;
            }
        }
        Some((power, toughness))
    }

    // === Life and drawing ===

    /// Change a player's life total, emitting the event.
    pub fn change_life(&mut self, player: PlayerId, delta: i64) {
        if delta == 0 {
            return;
        }
        self.players[player].life += delta;
        self.emit(GameEvent::LifeChanged { player, delta });
    }

    /// Draw the top card of a player's library into their hand.
    ///
    /// A draw from an empty library does not lose the game immediately; it
    /// flags the player and the next state-based sweep applies the loss.
    pub fn draw_card(&mut self, player: PlayerId) -> Option<EntityId> {
        let Some(top) = self.zones.top(Zone::Library(player)) else {
            self.players[player].drew_from_empty = true;
            return None;
        };
        self.move_card(top, Zone::Hand(player), ZonePosition::Top);
        self.turn.draws_this_turn[player] += 1;
        let nth_this_turn = self.turn.draws_this_turn[player];
        self.emit(GameEvent::CardDrawn { player, nth_this_turn });
        Some(top)
    }

    /// Mark a player as having lost, emitting the event. Their permanents
    /// and spells are cleaned up by the caller.
    pub fn apply_loss(&mut self, player: PlayerId, reason: LossReason) {
        if self.players[player].lost.is_some() {
            return;
        }
        self.players[player].lost = Some(reason);
        self.emit(GameEvent::PlayerLost { player, reason });
    }

    /// Empty every player's mana pool (step boundaries).
    pub fn empty_mana_pools(&mut self) {
        for (_, player) in self.players.iter_mut() {
            player.mana.empty();
        }
    }
}
