//! Card definitions: immutable records from the external card database.
//!
//! A `CardDefinition` carries the printed identity (name, type line, oracle
//! text, mana cost, base power/toughness) plus the structured ability
//! descriptors produced upstream by the oracle-text translator. The engine
//! never mutates a definition; per-game mutable state lives on
//! [`super::CardInstance`] and [`crate::zones::Permanent`].

use serde::{Deserialize, Serialize};

use crate::effects::{SpellEffect, TargetSpec};
use crate::triggers::TriggerCondition;

use super::mana::ManaCost;

/// Unique identifier for a card definition ("Lightning Bolt"), not an
/// instance in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Card supertypes the engine interprets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Supertype {
    Basic,
    Legendary,
    Snow,
    World,
}

/// Card types the engine interprets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Artifact,
    Battle,
    Creature,
    Enchantment,
    Instant,
    Land,
    Planeswalker,
    Sorcery,
}

impl CardType {
    /// Whether objects of this type stay on the battlefield.
    #[must_use]
    pub fn is_permanent(self) -> bool {
        !matches!(self, CardType::Instant | CardType::Sorcery)
    }
}

/// A parsed type line: supertypes, card types, and subtypes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLine {
    /// The printed line, e.g. `Legendary Creature — Elf Druid`.
    pub raw: String,
    pub supertypes: Vec<Supertype>,
    pub types: Vec<CardType>,
    pub subtypes: Vec<String>,
}

impl TypeLine {
    /// Parse a printed type line. Words before the em-dash are super/card
    /// types; words after are subtypes.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut line = Self { raw: raw.to_string(), ..Self::default() };

        let (head, tail) = match raw.split_once('—') {
            Some((h, t)) => (h, Some(t)),
            None => (raw, None),
        };

        for word in head.split_whitespace() {
            match word {
                "Basic" => line.supertypes.push(Supertype::Basic),
                "Legendary" => line.supertypes.push(Supertype::Legendary),
                "Snow" => line.supertypes.push(Supertype::Snow),
                "World" => line.supertypes.push(Supertype::World),
                "Artifact" => line.types.push(CardType::Artifact),
                "Battle" => line.types.push(CardType::Battle),
                "Creature" => line.types.push(CardType::Creature),
                "Enchantment" => line.types.push(CardType::Enchantment),
                "Instant" => line.types.push(CardType::Instant),
                "Land" => line.types.push(CardType::Land),
                "Planeswalker" => line.types.push(CardType::Planeswalker),
                "Sorcery" => line.types.push(CardType::Sorcery),
                _ => {}
            }
        }

        if let Some(tail) = tail {
            line.subtypes = tail.split_whitespace().map(str::to_string).collect();
        }

        line
    }

    #[must_use]
    pub fn has_type(&self, ty: CardType) -> bool {
        self.types.contains(&ty)
    }

    #[must_use]
    pub fn is_legendary(&self) -> bool {
        self.supertypes.contains(&Supertype::Legendary)
    }

    #[must_use]
    pub fn is_creature(&self) -> bool {
        self.has_type(CardType::Creature)
    }

    #[must_use]
    pub fn is_land(&self) -> bool {
        self.has_type(CardType::Land)
    }

    /// Instants and sorceries go to the graveyard on resolution.
    #[must_use]
    pub fn is_spell_only(&self) -> bool {
        self.has_type(CardType::Instant) || self.has_type(CardType::Sorcery)
    }

    /// Whether a resolved spell of this type line becomes a permanent.
    #[must_use]
    pub fn is_permanent_type(&self) -> bool {
        self.types.iter().any(|t| t.is_permanent())
    }

    #[must_use]
    pub fn is_aura(&self) -> bool {
        self.has_type(CardType::Enchantment) && self.has_subtype("Aura")
    }

    #[must_use]
    pub fn is_equipment(&self) -> bool {
        self.has_type(CardType::Artifact) && self.has_subtype("Equipment")
    }

    #[must_use]
    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s == subtype)
    }
}

/// One clause of an instant or sorcery: an optional target requirement and
/// the effects applied to the chosen targets (or globally when untargeted).
///
/// Clauses resolve in order. At resolution each targeted clause re-validates
/// its targets; a clause whose targets are all illegal is skipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellClause {
    /// Target requirement, `None` for untargeted clauses.
    pub target: Option<TargetSpec>,
    /// Effects applied in order.
    pub effects: Vec<SpellEffect>,
}

impl SpellClause {
    /// An untargeted clause.
    #[must_use]
    pub fn untargeted(effects: Vec<SpellEffect>) -> Self {
        Self { target: None, effects }
    }

    /// A targeted clause.
    #[must_use]
    pub fn targeted(spec: TargetSpec, effects: Vec<SpellEffect>) -> Self {
        Self { target: Some(spec), effects }
    }
}

/// A structured triggered ability: "When/Whenever <condition>, <effects>".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredAbilityDef {
    pub condition: TriggerCondition,
    pub effects: Vec<SpellEffect>,
    /// Target requirement bound when the trigger is put on the stack.
    pub target: Option<TargetSpec>,
    /// `true` for "you may" triggers; the controller confirms at resolution.
    pub may: bool,
    /// Reminder text for prompts and logs.
    pub description: String,
}

/// Non-mana activation cost of an activated ability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationCost {
    /// `{T}` — tap the source.
    pub tap: bool,
    /// Mana component, if any.
    pub mana: Option<ManaCost>,
    /// "Activate only once each turn" style limits.
    pub per_turn_limit: Option<u32>,
}

/// A structured activated ability: "<cost>: <effects>".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatedAbilityDef {
    pub cost: ActivationCost,
    pub effects: Vec<SpellEffect>,
    pub target: Option<TargetSpec>,
    /// Mana abilities resolve immediately without using the stack.
    pub mana_ability: bool,
    pub description: String,
}

/// Immutable card record consumed from the external card database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    pub type_line: TypeLine,
    pub oracle_text: String,
    /// `None` for lands.
    pub mana_cost: Option<ManaCost>,
    /// Base power, creatures only.
    pub power: Option<i64>,
    /// Base toughness, creatures only.
    pub toughness: Option<i64>,
    /// Spell clauses, instants and sorceries only.
    pub clauses: Vec<SpellClause>,
    /// Structured triggered abilities from the upstream translator.
    pub triggered: Vec<TriggeredAbilityDef>,
    /// Structured activated abilities from the upstream translator.
    pub activated: Vec<ActivatedAbilityDef>,
}

impl CardDefinition {
    /// Create a definition with the printed identity; abilities are added
    /// with the builder methods.
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>, type_line: &str) -> Self {
        Self {
            id,
            name: name.into(),
            type_line: TypeLine::parse(type_line),
            oracle_text: String::new(),
            mana_cost: None,
            power: None,
            toughness: None,
            clauses: Vec::new(),
            triggered: Vec::new(),
            activated: Vec::new(),
        }
    }

    /// Set the mana cost (builder).
    #[must_use]
    pub fn with_cost(mut self, cost: ManaCost) -> Self {
        self.mana_cost = Some(cost);
        self
    }

    /// Set base power/toughness (builder).
    #[must_use]
    pub fn with_pt(mut self, power: i64, toughness: i64) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    /// Set oracle text (builder).
    #[must_use]
    pub fn with_oracle_text(mut self, text: impl Into<String>) -> Self {
        self.oracle_text = text.into();
        self
    }

    /// Add a spell clause (builder).
    #[must_use]
    pub fn with_clause(mut self, clause: SpellClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Add a triggered ability (builder).
    #[must_use]
    pub fn with_triggered(mut self, ability: TriggeredAbilityDef) -> Self {
        self.triggered.push(ability);
        self
    }

    /// Add an activated ability (builder).
    #[must_use]
    pub fn with_activated(mut self, ability: ActivatedAbilityDef) -> Self {
        self.activated.push(ability);
        self
    }

    /// Whether this card's cost contains `{X}`.
    #[must_use]
    pub fn has_x_cost(&self) -> bool {
        self.mana_cost.as_ref().is_some_and(|c| c.has_x)
    }

    /// Number of targets each targeted clause requires, in clause order.
    #[must_use]
    pub fn targeted_clauses(&self) -> Vec<&TargetSpec> {
        self.clauses.iter().filter_map(|c| c.target.as_ref()).collect()
    }
}
