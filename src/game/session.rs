//! The game session: one actor owning one game.
//!
//! Every player command enters through [`GameSession::submit`], is fully
//! validated against the current state, and only then mutates. After each
//! mutation the session settles the game: emitted events are matched
//! against registered triggers, state-based actions run to a fixed point,
//! matched triggers are placed on the stack in APNAP order, and auto-pass
//! preferences are applied until a player genuinely has a decision to
//! make.

use smallvec::SmallVec;

use crate::cards::CardId;
use crate::core::{Action, EntityId, GameError, GameState, LossReason, PendingCast, PlayerId};
use crate::effects::{
    apply_effects, legal_targets, validate_targets, EffectContext, SpellEffect, TargetRef,
};
use crate::queue::{DiscardReason, Response, ResolutionStep, StepId, StepKind, TargetPurpose};
use crate::rules::run_state_based_actions;
use crate::stack::StackItemKind;
use crate::triggers::{
    order_apnap, GameEvent, PendingTrigger, TriggerConfidence, UndecidedTrigger,
};
use crate::turn::Step;
use crate::zones::{Zone, ZonePosition};

use super::registry::GameId;

/// Cards in the opening hand.
const STARTING_HAND: usize = 7;

/// Maximum hand size enforced at cleanup.
const MAX_HAND: usize = 7;

/// Safety cap on consecutive automatic passes.
const MAX_AUTO_PASSES: u32 = 1024;

/// One player's deck and commander for game creation.
#[derive(Clone, Debug)]
pub struct PlayerSetup {
    /// Library contents by definition ID; order is irrelevant, the library
    /// is shuffled.
    pub deck: Vec<CardId>,
    /// The commander starts in the command zone.
    pub commander: Option<CardId>,
}

/// Everything needed to create a game.
#[derive(Clone, Debug)]
pub struct GameSetup {
    pub seed: u64,
    pub registry: crate::cards::CardRegistry,
    pub players: Vec<PlayerSetup>,
    /// Fixed starting player, or `None` to roll one from the seed.
    pub starting_player: Option<PlayerId>,
}

/// One running game. All mutation is serialized through `&mut self`.
#[derive(Clone, Debug)]
pub struct GameSession {
    id: GameId,
    state: GameState,
}

impl GameSession {
    /// Create a game: seed libraries, shuffle, place commanders, deal
    /// opening hands, and start the first turn.
    pub fn new(id: GameId, setup: GameSetup) -> Result<Self, GameError> {
        let player_count = setup.players.len();
        if !(2..=8).contains(&player_count) {
            return Err(GameError::illegal(format!(
                "a game takes 2 to 8 players, got {player_count}"
            )));
        }
        for (i, ps) in setup.players.iter().enumerate() {
            for &card in ps.deck.iter().chain(ps.commander.iter()) {
                if !setup.registry.contains(card) {
                    return Err(GameError::selection(format!(
                        "player {i}: unknown card definition {card}"
                    )));
                }
            }
        }

        let mut state = GameState::new(player_count, setup.seed, setup.registry);

        let starting = match setup.starting_player {
            Some(p) => {
                if p.index() >= player_count {
                    return Err(GameError::not_in_game(p));
                }
                p
            }
            None => PlayerId::new(state.rng.gen_range(0..player_count) as u8),
        };

        for (i, ps) in setup.players.iter().enumerate() {
            let player = PlayerId::new(i as u8);
            if let Some(commander) = ps.commander {
                let entity = state.create_card(commander, player, Zone::Command(player));
                state.players[player].commander = Some(entity);
            }
            for &card in &ps.deck {
                state.create_card(card, player, Zone::Library(player));
            }
            state.shuffle_library(player);
            for _ in 0..STARTING_HAND.min(ps.deck.len()) {
                if let Some(top) = state.zones.top(Zone::Library(player)) {
                    state.move_card(top, Zone::Hand(player), ZonePosition::Top);
                }
            }
        }

        state.turn = crate::turn::TurnState::new(player_count, starting);
        state.priority = crate::turn::PrioritySystem::new(player_count, starting);
        state.emit(GameEvent::TurnStarted { turn: 1, active: starting });
        // Opening moves don't trigger anything; drop the setup events from
        // the pending buffer but keep them in the log.
        state.take_events();

        let mut session = Self { id, state };
        session.begin_step(Step::Untap);
        Ok(session)
    }

    #[must_use]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct mutable access to the underlying state.
    ///
    /// Bypasses all validation. Intended for test setup and offline
    /// tooling; gameplay goes through [`GameSession::submit`].
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// The game is over once at most one player remains.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state.alive_players().len() <= 1
    }

    /// The last player standing, once the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        let alive = self.state.alive_players();
        match alive[..] {
            [winner] => Some(winner),
            _ => None,
        }
    }

    /// Submit a player command. Validation is complete before any state
    /// changes; an `Err` means the game is byte-identical to before.
    pub fn submit(&mut self, player: PlayerId, action: Action) -> Result<(), GameError> {
        if player.index() >= self.state.player_count() {
            return Err(GameError::not_in_game(player));
        }
        if self.is_over() {
            return Err(GameError::illegal("the game is over"));
        }
        if !self.state.alive(player) {
            return Err(GameError::illegal("you are no longer in the game"));
        }

        let record = action.clone();
        match action {
            Action::PlayLand { card } => self.play_land(player, card)?,
            Action::CastSpell { card, targets, x } => self.cast_spell(player, card, targets, x)?,
            Action::ActivateAbility { source, ability, targets } => {
                self.activate_ability(player, source, ability, targets)?;
            }
            Action::PassPriority => self.pass_priority(player)?,
            Action::AdvanceStep => self.advance_step_action(player)?,
            Action::SubmitResponse { step, response } => {
                self.submit_response(player, step, response)?;
            }
            Action::CancelStep { step } => self.cancel_step(player, step)?,
            Action::SetAutoPass { prefs } => {
                self.state.priority.prefs[player] = prefs;
                self.auto_pass_loop();
            }
            Action::Concede => self.concede(player),
        }
        self.state.log.record_action(player, record);
        Ok(())
    }

    // === Action handlers ===

    fn play_land(&mut self, player: PlayerId, card: EntityId) -> Result<(), GameError> {
        self.require_open_priority(player)?;
        if !self.state.turn.is_main_phase_of(player) || !self.state.stack.is_empty() {
            return Err(GameError::illegal(
                "lands are played in your main phase with an empty stack",
            ));
        }
        if self.state.turn.lands_played >= 1 {
            return Err(GameError::illegal("you already played a land this turn"));
        }
        if !self.state.zones.is_in(card, Zone::Hand(player)) {
            return Err(GameError::illegal("that card is not in your hand"));
        }
        let is_land = self
            .state
            .definition_of(card)
            .is_some_and(|d| d.type_line.is_land());
        if !is_land {
            return Err(GameError::illegal("that card is not a land"));
        }

        self.state.move_card(card, Zone::Battlefield, ZonePosition::Top);
        self.state.turn.lands_played += 1;
        self.state.emit(GameEvent::LandPlayed { entity: card, controller: player });
        self.settle();
        self.state.priority.grant(player);
        self.auto_pass_loop();
        Ok(())
    }

    fn cast_spell(
        &mut self,
        player: PlayerId,
        card: EntityId,
        targets: Vec<Vec<TargetRef>>,
        x: Option<i64>,
    ) -> Result<(), GameError> {
        self.require_open_priority(player)?;
        if self.state.pending_cast.is_some() {
            return Err(GameError::illegal("a cast is already in progress"));
        }

        let in_hand = self.state.zones.is_in(card, Zone::Hand(player));
        let from_command = self.state.zones.is_in(card, Zone::Command(player));
        if !in_hand && !from_command {
            return Err(GameError::illegal(
                "that card is not in your hand or command zone",
            ));
        }
        if from_command && self.state.players[player].commander != Some(card) {
            return Err(GameError::illegal("only your commander casts from the command zone"));
        }

        let Some(def) = self.state.definition_of(card).cloned() else {
            return Err(GameError::illegal("unknown card"));
        };
        if def.type_line.is_land() {
            return Err(GameError::illegal("lands are played, not cast"));
        }
        let is_instant = def.type_line.has_type(crate::cards::CardType::Instant);
        if !is_instant
            && (!self.state.turn.is_main_phase_of(player) || !self.state.stack.is_empty())
        {
            return Err(GameError::illegal(
                "that spell can only be cast in your main phase with an empty stack",
            ));
        }

        let cost = def.mana_cost.clone().unwrap_or_default();
        let tax = if from_command {
            2 * self.state.players[player].commander_tax
        } else {
            0
        };

        if let Some(x) = x {
            if !def.has_x_cost() {
                return Err(GameError::selection("this spell has no X in its cost"));
            }
            if x < 0 {
                return Err(GameError::selection("X cannot be negative"));
            }
            if !self.state.players[player].mana.can_pay(&cost, x, tax) {
                return Err(GameError::illegal("you cannot pay that cost"));
            }
        } else if !self.state.players[player].mana.can_pay(&cost, 0, tax) {
            return Err(GameError::illegal("you cannot pay that cost"));
        }

        let specs = def.targeted_clauses();
        if targets.is_empty() {
            // Targets will be collected through resolution steps; every
            // clause must have enough legal targets right now.
            for spec in &specs {
                if legal_targets(&self.state, spec, player, Some(card)).len() < spec.count {
                    return Err(GameError::target("no legal targets for that spell"));
                }
            }
        } else {
            if targets.len() != specs.len() {
                return Err(GameError::selection(format!(
                    "expected {} target list(s), got {}",
                    specs.len(),
                    targets.len()
                )));
            }
            for (spec, list) in specs.iter().zip(&targets) {
                validate_targets(&self.state, spec, player, Some(card), list)?;
            }
        }

        self.state.pending_cast = Some(PendingCast {
            player,
            card,
            x,
            targets: targets.into_iter().map(SmallVec::from_vec).collect(),
            from_command,
        });
        self.continue_cast();
        self.auto_pass_loop();
        Ok(())
    }

    fn activate_ability(
        &mut self,
        player: PlayerId,
        source: EntityId,
        ability: usize,
        targets: Vec<TargetRef>,
    ) -> Result<(), GameError> {
        self.require_open_priority(player)?;
        let controls = self
            .state
            .permanent(source)
            .is_some_and(|p| p.controller == player);
        if !controls {
            return Err(GameError::illegal("you do not control that permanent"));
        }
        let Some(def) = self.state.definition_of(source).cloned() else {
            return Err(GameError::illegal("unknown permanent"));
        };
        let Some(ability_def) = def.activated.get(ability).cloned() else {
            return Err(GameError::illegal("no such ability"));
        };

        let perm = &self.state.battlefield[&source];
        if ability_def.cost.tap {
            if perm.tapped {
                return Err(GameError::illegal("that permanent is already tapped"));
            }
            if perm.summoning_sick && def.type_line.is_creature() {
                return Err(GameError::illegal("that creature is summoning sick"));
            }
        }
        if let Some(limit) = ability_def.cost.per_turn_limit {
            let used = perm.activations_this_turn.get(&ability).copied().unwrap_or(0);
            if used >= limit {
                return Err(GameError::illegal("that ability has reached its per-turn limit"));
            }
        }
        if let Some(mana) = &ability_def.cost.mana {
            if !self.state.players[player].mana.can_pay(mana, 0, 0) {
                return Err(GameError::illegal("you cannot pay that cost"));
            }
        }
        match &ability_def.target {
            Some(spec) => validate_targets(&self.state, spec, player, Some(source), &targets)?,
            None if !targets.is_empty() => {
                return Err(GameError::selection("this ability takes no targets"));
            }
            None => {}
        }

        // Validation complete; pay costs.
        let perm = self.state.permanent_mut(source).expect("validated above");
        if ability_def.cost.tap {
            perm.tapped = true;
        }
        *perm.activations_this_turn.entry(ability).or_insert(0) += 1;
        if let Some(mana) = &ability_def.cost.mana {
            self.state.players[player].mana.pay(mana, 0, 0);
        }

        if ability_def.mana_ability {
            // Mana abilities resolve immediately, off the stack.
            let ctx = EffectContext { controller: player, source, targets, x: None };
            apply_effects(&mut self.state, &ctx, &ability_def.effects);
            self.settle();
        } else {
            self.state.stack.push(
                player,
                StackItemKind::Ability {
                    source,
                    source_name: def.name.clone(),
                    controller_at_creation: player,
                    effects: ability_def.effects.clone(),
                    targets: SmallVec::from_vec(targets),
                    awaiting_targets: false,
                    may: false,
                    confidence: TriggerConfidence::Structured,
                    description: ability_def.description.clone(),
                },
            );
            self.settle();
            self.state.priority.grant(player);
        }
        self.auto_pass_loop();
        Ok(())
    }

    fn pass_priority(&mut self, player: PlayerId) -> Result<(), GameError> {
        if self.state.priority.holder() != player {
            return Err(GameError::illegal("you do not have priority"));
        }
        if self.state.queue.has_mandatory(player) {
            return Err(GameError::illegal("answer your pending step first"));
        }
        if self
            .state
            .pending_cast
            .as_ref()
            .is_some_and(|pc| pc.player == player)
        {
            return Err(GameError::illegal("finish your cast first"));
        }
        self.do_pass(player);
        self.auto_pass_loop();
        Ok(())
    }

    fn advance_step_action(&mut self, player: PlayerId) -> Result<(), GameError> {
        if self.state.turn.active != player || self.state.priority.holder() != player {
            return Err(GameError::illegal(
                "only the active player with priority can advance the step",
            ));
        }
        if !self.state.stack.is_empty() || self.waiting() {
            return Err(GameError::illegal("something is still pending"));
        }
        let others_auto = self
            .state
            .alive_players()
            .into_iter()
            .filter(|&p| p != player)
            .all(|p| self.state.priority.prefs[p].enabled);
        if !others_auto {
            return Err(GameError::illegal(
                "advancing requires every other player to have auto-pass enabled",
            ));
        }
        self.advance_step();
        Ok(())
    }

    fn submit_response(
        &mut self,
        player: PlayerId,
        step: Option<StepId>,
        response: Response,
    ) -> Result<(), GameError> {
        let step_ref = match step {
            Some(id) => self.state.queue.get(player, id),
            None => self.state.queue.front(player),
        };
        let Some(step_ref) = step_ref else {
            return Err(GameError::selection("no pending step to answer"));
        };
        step_ref.validate(&self.state, &response)?;
        let id = step_ref.id;

        // Validated; removal is the point of no return.
        let step = self.state.queue.take(player, id).expect("looked up above");
        self.apply_step(step, response);
        self.settle();
        self.finish_cleanup_if_ready();
        self.auto_pass_loop();
        Ok(())
    }

    fn cancel_step(&mut self, player: PlayerId, step: StepId) -> Result<(), GameError> {
        let Some(step_ref) = self.state.queue.get(player, step) else {
            return Err(GameError::selection("no such pending step"));
        };
        if step_ref.mandatory {
            return Err(GameError::illegal("that step is mandatory"));
        }
        self.state.queue.cancel(player, step);
        self.auto_pass_loop();
        Ok(())
    }

    fn concede(&mut self, player: PlayerId) {
        self.state.apply_loss(player, LossReason::Conceded);

        if self
            .state
            .pending_cast
            .as_ref()
            .is_some_and(|pc| pc.player == player)
        {
            self.state.pending_cast = None;
        }
        let ids: Vec<StepId> = self.state.queue.iter_for(player).map(|s| s.id).collect();
        for id in ids {
            self.state.queue.take(player, id);
        }
        self.state.pending_triggers.retain(|t| t.controller != player);

        self.settle();
        if self.is_over() {
            return;
        }
        if !self.state.alive(self.state.priority.holder()) {
            if let Some(&first) = self.state.priority_order().first() {
                self.state.priority.grant(first);
            }
        }
        self.auto_pass_loop();
    }

    // === Casting machinery ===

    /// Drive a parked cast forward: enqueue the next needed choice, or
    /// finish the cast when everything is bound.
    fn continue_cast(&mut self) {
        let Some(pc) = &self.state.pending_cast else {
            return;
        };
        let (player, card, x, from_command, have) =
            (pc.player, pc.card, pc.x, pc.from_command, pc.targets.len());
        let Some(def) = self.state.definition_of(card).cloned() else {
            self.state.pending_cast = None;
            return;
        };

        if def.has_x_cost() && x.is_none() {
            let cost = def.mana_cost.clone().unwrap_or_default();
            let tax = if from_command {
                2 * self.state.players[player].commander_tax
            } else {
                0
            };
            let pool = &self.state.players[player].mana;
            let max = (0..=i64::from(pool.total()))
                .rev()
                .find(|&x| pool.can_pay(&cost, x, tax))
                .unwrap_or(0);
            self.state
                .queue
                .enqueue(player, true, StepKind::ChooseX { min: 0, max });
            return;
        }

        let specs = def.targeted_clauses();
        if have < specs.len() {
            let spec = specs[have].clone();
            self.state.queue.enqueue(
                player,
                true,
                StepKind::ChooseTargets {
                    spec,
                    purpose: TargetPurpose::FinishCast,
                    source: Some(card),
                },
            );
            return;
        }

        self.finish_cast();
    }

    /// Pay for the parked cast and put the spell on the stack. Everything
    /// was validated as it was collected; a failure here aborts the cast
    /// without mutating further.
    fn finish_cast(&mut self) {
        let Some(pc) = self.state.pending_cast.take() else {
            return;
        };
        let Some(def) = self.state.definition_of(pc.card).cloned() else {
            return;
        };
        let cost = def.mana_cost.clone().unwrap_or_default();
        let tax = if pc.from_command {
            2 * self.state.players[pc.player].commander_tax
        } else {
            0
        };

        let specs = def.targeted_clauses();
        if specs.len() != pc.targets.len() {
            return;
        }
        for (spec, list) in specs.iter().zip(&pc.targets) {
            if validate_targets(&self.state, spec, pc.player, Some(pc.card), list).is_err() {
                return;
            }
        }
        if !self.state.players[pc.player]
            .mana
            .pay(&cost, pc.x.unwrap_or(0), tax)
        {
            return;
        }

        if pc.from_command {
            self.state.players[pc.player].commander_tax += 1;
        }
        self.state.move_card(pc.card, Zone::Stack, ZonePosition::Top);
        self.state.stack.push(
            pc.player,
            StackItemKind::Spell {
                card: pc.card,
                targets_per_clause: pc.targets,
                x: pc.x,
            },
        );
        self.state.emit(GameEvent::SpellCast {
            entity: pc.card,
            controller: pc.player,
            card: def.id,
        });
        self.settle();
        self.state.priority.grant(pc.player);
    }

    // === Resolution ===

    /// Resolve the top of the stack.
    fn resolve_top(&mut self) {
        let Some(item) = self.state.stack.pop() else {
            return;
        };
        match item.kind {
            StackItemKind::Spell { card, targets_per_clause, x } => {
                self.resolve_spell(item.controller, card, &targets_per_clause, x);
            }
            StackItemKind::Ability {
                source,
                source_name,
                effects,
                targets,
                may,
                description,
                ..
            } => {
                if may {
                    // "You may": the controller confirms now, at resolution.
                    self.state.queue.enqueue(
                        item.controller,
                        true,
                        StepKind::MayAbility {
                            description,
                            source,
                            source_name,
                            effects,
                            targets: targets.to_vec(),
                        },
                    );
                    return;
                }
                self.resolve_ability(item.controller, source, &effects, targets.to_vec());
            }
        }
    }

    /// Clause-by-clause spell resolution. Each targeted clause re-validates
    /// its own targets and fizzles independently; untargeted clauses always
    /// apply.
    fn resolve_spell(
        &mut self,
        controller: PlayerId,
        card: EntityId,
        targets_per_clause: &[SmallVec<[TargetRef; 2]>],
        x: Option<i64>,
    ) {
        let Some(def) = self.state.definition_of(card).cloned() else {
            return;
        };

        let mut targeted_idx = 0;
        for clause in &def.clauses {
            let targets: Vec<TargetRef> = match &clause.target {
                Some(spec) => {
                    let list = targets_per_clause
                        .get(targeted_idx)
                        .cloned()
                        .unwrap_or_default();
                    targeted_idx += 1;
                    if validate_targets(&self.state, spec, controller, Some(card), &list).is_err() {
                        continue;
                    }
                    list.to_vec()
                }
                None => Vec::new(),
            };
            let ctx = EffectContext { controller, source: card, targets, x };
            apply_effects(&mut self.state, &ctx, &clause.effects);
        }

        // The spell's card leaves the stack: permanents enter the
        // battlefield, everything else goes to its owner's graveyard.
        let owner = self.state.card(card).map_or(controller, |c| c.owner);
        if def.type_line.is_permanent_type() {
            self.state.move_card(card, Zone::Battlefield, ZonePosition::Top);
        } else {
            self.state.move_card(card, Zone::Graveyard(owner), ZonePosition::Top);
        }
    }

    /// Ability resolution. Targets whose objects are gone are dropped; an
    /// ability whose effects need targets and has none left fizzles.
    fn resolve_ability(
        &mut self,
        controller: PlayerId,
        source: EntityId,
        effects: &[SpellEffect],
        targets: Vec<TargetRef>,
    ) {
        let had_targets = !targets.is_empty();
        let kept: Vec<TargetRef> = targets
            .into_iter()
            .filter(|t| self.target_still_exists(*t))
            .collect();
        if had_targets && kept.is_empty() && effects.iter().any(SpellEffect::is_target_directed) {
            return;
        }
        let ctx = EffectContext { controller, source, targets: kept, x: None };
        apply_effects(&mut self.state, &ctx, effects);
    }

    fn target_still_exists(&self, target: TargetRef) -> bool {
        match target {
            TargetRef::Permanent(entity) => self.state.zones.is_in(entity, Zone::Battlefield),
            TargetRef::Player(player) => self.state.alive(player),
            TargetRef::Spell(id) => self.state.stack.get(id).is_some(),
        }
    }

    // === Resolution step appliers ===

    /// Apply a validated response. One applier arm per step kind.
    fn apply_step(&mut self, step: ResolutionStep, response: Response) {
        let player = step.player;
        match (step.kind, response) {
            (StepKind::ChooseX { .. }, Response::Number(x)) => {
                if let Some(pc) = self.state.pending_cast.as_mut() {
                    pc.x = Some(x);
                }
                self.continue_cast();
            }

            (StepKind::ChooseTargets { purpose, .. }, Response::Targets(targets)) => {
                match purpose {
                    TargetPurpose::FinishCast => {
                        if let Some(pc) = self.state.pending_cast.as_mut() {
                            pc.targets.push(SmallVec::from_vec(targets));
                        }
                        self.continue_cast();
                    }
                    TargetPurpose::BindAbility(item_id) => {
                        if let Some(item) = self.state.stack.get_mut(item_id) {
                            if let StackItemKind::Ability {
                                targets: bound,
                                awaiting_targets,
                                ..
                            } = &mut item.kind
                            {
                                *bound = SmallVec::from_vec(targets);
                                *awaiting_targets = false;
                            }
                        }
                    }
                }
            }

            (StepKind::ChooseManaColor { count }, Response::Color(color)) => {
                self.state.players[player].mana.add(color, count);
            }

            (StepKind::Discard { .. }, Response::Cards(cards)) => {
                for card in cards {
                    let owner = self.state.card(card).map_or(player, |c| c.owner);
                    self.state
                        .move_card(card, Zone::Graveyard(owner), ZonePosition::Top);
                }
            }

            (StepKind::ChooseFromGraveyard { .. }, Response::Cards(cards)) => {
                for card in cards {
                    self.state.move_card(card, Zone::Hand(player), ZonePosition::Top);
                }
            }

            (StepKind::TapChoice { tap, .. }, Response::Cards(cards)) => {
                for card in cards {
                    if let Some(perm) = self.state.permanent_mut(card) {
                        perm.tapped = tap;
                    }
                }
            }

            (StepKind::HandToBottom { .. }, Response::Cards(cards)) => {
                for card in cards {
                    self.state
                        .move_card(card, Zone::Library(player), ZonePosition::Bottom);
                }
            }

            (StepKind::LegendChoice { candidates, .. }, Response::Cards(kept)) => {
                for entity in candidates {
                    if kept.contains(&entity) {
                        continue;
                    }
                    let owner = self.state.card(entity).map_or(player, |c| c.owner);
                    self.state
                        .move_card(entity, Zone::Graveyard(owner), ZonePosition::Top);
                }
            }

            (
                StepKind::MayAbility { source, effects, targets, .. },
                Response::Confirm(confirmed),
            ) => {
                if confirmed {
                    self.resolve_ability(player, source, &effects, targets);
                }
            }

            // Validation guarantees variant agreement.
            _ => unreachable!("response variant validated against step kind"),
        }
    }

    // === The settle loop ===

    /// Bring the game to rest after a mutation: match triggers for every
    /// emitted event, run state-based actions to a fixed point, and place
    /// matched triggers on the stack in APNAP order.
    fn settle(&mut self) {
        loop {
            let events = self.state.take_events();
            if !events.is_empty() {
                self.match_triggers(&events);
                continue;
            }
            if run_state_based_actions(&mut self.state) {
                continue;
            }
            break;
        }
        self.place_pending_triggers();
    }

    fn match_triggers(&mut self, events: &[GameEvent]) {
        let mut pending: Vec<PendingTrigger> = Vec::new();
        let mut undecided: Vec<UndecidedTrigger> = Vec::new();

        for event in events {
            // A permanent's triggers register before its own entry event is
            // matched, so self-enters conditions see it; departure sources
            // unregister only after their departure event is matched.
            if let GameEvent::PermanentEntered { entity, .. } = event {
                self.state.register_triggers(*entity);
            }
            self.state
                .triggers
                .collect(event, &self.state, &mut pending, &mut undecided);
            if let GameEvent::PermanentDied { entity, .. }
            | GameEvent::PermanentLeft { entity, .. } = event
            {
                self.state.triggers.unregister(*entity);
            }
        }

        self.state.pending_triggers.extend(pending);
        self.state.undecided.extend(undecided);
    }

    /// Put matched triggers on the stack, active player's first so theirs
    /// resolve last. A trigger that needs targets gets a mandatory
    /// target-selection step for its controller; one with no legal targets
    /// never reaches the stack.
    fn place_pending_triggers(&mut self) {
        if self.state.pending_triggers.is_empty() {
            return;
        }
        let mut batch = std::mem::take(&mut self.state.pending_triggers);
        order_apnap(&mut batch, self.state.turn.active, self.state.player_count());

        for trigger in batch {
            if !self.state.alive(trigger.controller) {
                continue;
            }
            let (awaiting, spec) = match &trigger.target {
                Some(spec) => {
                    let legal =
                        legal_targets(&self.state, spec, trigger.controller, Some(trigger.source));
                    if legal.len() < spec.count {
                        // No way to choose legal targets: the trigger is
                        // removed from the game rather than placed.
                        continue;
                    }
                    (true, Some(spec.clone()))
                }
                None => (false, None),
            };

            let item_id = self.state.stack.push(
                trigger.controller,
                StackItemKind::Ability {
                    source: trigger.source,
                    source_name: trigger.source_name.clone(),
                    controller_at_creation: trigger.controller,
                    effects: trigger.effects.clone(),
                    targets: SmallVec::new(),
                    awaiting_targets: awaiting,
                    may: trigger.may,
                    confidence: trigger.confidence,
                    description: trigger.description.clone(),
                },
            );
            if let Some(spec) = spec {
                self.state.queue.enqueue(
                    trigger.controller,
                    true,
                    StepKind::ChooseTargets {
                        spec,
                        purpose: TargetPurpose::BindAbility(item_id),
                        source: Some(trigger.source),
                    },
                );
            }
        }
    }

    // === Priority and step flow ===

    fn require_open_priority(&self, player: PlayerId) -> Result<(), GameError> {
        if self.state.priority.holder() != player {
            return Err(GameError::illegal("you do not have priority"));
        }
        if self.state.queue.has_mandatory(player) {
            return Err(GameError::illegal("answer your pending step first"));
        }
        Ok(())
    }

    /// Anything that holds the game open: unplaced triggers, pending
    /// resolution steps, stack items without bound targets, or a parked
    /// cast.
    fn waiting(&self) -> bool {
        !self.state.pending_triggers.is_empty()
            || self.state.queue.any_pending()
            || self.state.stack.any_awaiting_targets()
            || self.state.pending_cast.is_some()
    }

    fn do_pass(&mut self, player: PlayerId) {
        let order = self.state.priority_order();
        if !self.state.priority.record_pass(player, &order) {
            return;
        }
        if self.state.stack.is_empty() {
            self.advance_step();
        } else {
            self.resolve_top();
            self.settle();
            if !self.is_over() {
                if let Some(&first) = self.state.priority_order().first() {
                    self.state.priority.grant(first);
                }
            }
        }
    }

    fn auto_pass_loop(&mut self) {
        for _ in 0..MAX_AUTO_PASSES {
            if self.is_over() {
                return;
            }
            let step = self.state.turn.step;
            let active = self.state.turn.active;
            if !self
                .state
                .priority
                .would_auto_pass(step, active, self.waiting())
            {
                return;
            }
            let holder = self.state.priority.holder();
            self.do_pass(holder);
        }
    }

    fn advance_step(&mut self) {
        self.state.empty_mana_pools();
        match self.state.turn.step.next() {
            Some(next) => self.begin_step(next),
            None => self.begin_next_turn(),
        }
    }

    fn begin_step(&mut self, step: Step) {
        if self.is_over() {
            return;
        }
        self.state.turn.step = step;
        let active = self.state.turn.active;
        self.state.emit(GameEvent::StepStarted { step, active });

        // Turn-based actions.
        match step {
            Step::Untap => {
                let mut perms: Vec<EntityId> = self
                    .state
                    .battlefield
                    .values()
                    .filter(|p| p.controller == active)
                    .map(|p| p.entity)
                    .collect();
                perms.sort();
                for entity in perms {
                    if let Some(perm) = self.state.permanent_mut(entity) {
                        perm.tapped = false;
                    }
                }
            }
            Step::Draw => {
                // The starting player skips their first draw in a two-player
                // game; multiplayer games draw on every turn.
                let skip = self.state.turn.turn_number == 1 && self.state.player_count() == 2;
                if !skip {
                    self.state.draw_card(active);
                }
            }
            Step::Cleanup => {
                let in_hand = self.state.zones.size(Zone::Hand(active));
                if in_hand > MAX_HAND {
                    self.state.queue.enqueue(
                        active,
                        true,
                        StepKind::Discard {
                            count: in_hand - MAX_HAND,
                            reason: DiscardReason::CleanupLimit,
                        },
                    );
                }
                // Marked damage and until-end-of-turn effects wear off as
                // cleanup's turn-based actions, visible to cleanup
                // triggers.
                for perm in self.state.battlefield.values_mut() {
                    perm.damage = 0;
                }
                self.state.continuous.retain(|e| !e.until_end_of_turn);
            }
            _ => {}
        }

        self.settle();

        if step.grants_priority() {
            if let Some(&first) = self.state.priority_order().first() {
                self.state.priority.grant(first);
            }
            self.auto_pass_loop();
        } else if step == Step::Untap {
            self.advance_step();
        } else {
            // Cleanup: wait for the discard (or anything a trigger opened);
            // otherwise the turn ends now.
            self.finish_cleanup_if_ready();
        }
    }

    /// Leave cleanup once nothing is pending there.
    fn finish_cleanup_if_ready(&mut self) {
        if self.state.turn.step != Step::Cleanup || self.is_over() {
            return;
        }
        if self.waiting() {
            return;
        }
        if !self.state.stack.is_empty() {
            // A cleanup trigger reached the stack: priority happens even
            // here.
            if let Some(&first) = self.state.priority_order().first() {
                self.state.priority.grant(first);
            }
            self.auto_pass_loop();
            return;
        }
        self.advance_step();
    }

    fn begin_next_turn(&mut self) {
        if self.is_over() {
            return;
        }

        // Unresolved table questions do not carry across turns.
        self.state.undecided.clear();

        let count = self.state.player_count();
        let mut next = self.state.turn.active.next_in_order(count);
        while !self.state.alive(next) {
            next = next.next_in_order(count);
        }

        self.state.turn.begin_turn(next);
        let mut perms: Vec<EntityId> = self.state.battlefield.keys().copied().collect();
        perms.sort();
        for entity in perms {
            if let Some(perm) = self.state.permanent_mut(entity) {
                perm.start_of_turn(next);
            }
        }
        self.state.emit(GameEvent::TurnStarted {
            turn: self.state.turn.turn_number,
            active: next,
        });
        self.begin_step(Step::Untap);
    }
}
