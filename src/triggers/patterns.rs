//! Oracle-text pattern fallback.
//!
//! When a card arrives with no structured ability descriptors, its oracle
//! text is scanned for well-known trigger phrasings at permanent-scan time.
//! Matches are marked [`TriggerConfidence::Pattern`] and treated as lower
//! confidence than structured descriptors; unrecognized text produces no
//! trigger at all rather than a wrong one.

use crate::cards::{CardDefinition, CardType};
use crate::effects::{Amount, PlayerGroup, SpellEffect};
use crate::turn::Step;

use super::condition::TriggerCondition;
use super::registry::{RegisteredTrigger, TriggerConfidence};

/// Scan a card's oracle text for trigger phrasings the engine recognizes:
/// ETB, dies, landfall, tribal-cast, draw, and beginning-of-upkeep.
///
/// Only used when `definition.triggered` is empty.
#[must_use]
pub fn scan_oracle_text(definition: &CardDefinition) -> Vec<RegisteredTrigger> {
    let mut out = Vec::new();

    for raw_line in definition.oracle_text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        let lower = lower.replace(&definition.name.to_lowercase(), "~");

        let Some((trigger_part, effect_part)) = lower.split_once(',') else {
            continue;
        };

        let condition = match_condition(trigger_part.trim());
        let Some(condition) = condition else {
            continue;
        };

        let effect_text = effect_part.trim();
        let may = effect_text.starts_with("you may ");
        let effect_text = effect_text.strip_prefix("you may ").unwrap_or(effect_text);

        let effects = match_effects(effect_text);
        if effects.is_empty() {
            // Recognized trigger word with unmodeled effect: skip rather
            // than fire a wrong ability.
            continue;
        }

        out.push(RegisteredTrigger {
            condition,
            effects,
            target: None,
            may,
            confidence: TriggerConfidence::Pattern,
            description: line.to_string(),
        });
    }

    out
}

fn match_condition(text: &str) -> Option<TriggerCondition> {
    if text.starts_with("when ~ enters the battlefield")
        || text.starts_with("when this creature enters the battlefield")
    {
        return Some(TriggerCondition::SelfEnters);
    }
    if text.starts_with("when ~ dies") || text.starts_with("when this creature dies") {
        return Some(TriggerCondition::SelfDies);
    }
    if text.starts_with("landfall")
        || text.starts_with("whenever a land enters the battlefield under your control")
    {
        return Some(TriggerCondition::Landfall);
    }
    if text.starts_with("whenever you draw a card") {
        return Some(TriggerCondition::YouDrawCard { first_each_turn: false });
    }
    if text.starts_with("whenever you draw your first card each turn") {
        return Some(TriggerCondition::YouDrawCard { first_each_turn: true });
    }
    if text.starts_with("at the beginning of your upkeep") {
        return Some(TriggerCondition::BeginningOfStep {
            step: Step::Upkeep,
            own_turn_only: true,
        });
    }
    if text.starts_with("at the beginning of each upkeep") {
        return Some(TriggerCondition::BeginningOfStep {
            step: Step::Upkeep,
            own_turn_only: false,
        });
    }
    if let Some(rest) = text.strip_prefix("whenever you cast a ") {
        return Some(tribal_cast(rest));
    }
    if let Some(rest) = text.strip_prefix("whenever you cast an ") {
        return Some(tribal_cast(rest));
    }
    None
}

/// "whenever you cast a(n) <word> spell" — the word may be a card type or
/// a creature subtype (tribal).
fn tribal_cast(rest: &str) -> TriggerCondition {
    let word = rest
        .trim_end_matches("spell")
        .trim_end_matches("spell,")
        .split_whitespace()
        .next()
        .unwrap_or("");

    let card_type = match word {
        "creature" => Some(CardType::Creature),
        "instant" => Some(CardType::Instant),
        "sorcery" => Some(CardType::Sorcery),
        "artifact" => Some(CardType::Artifact),
        "enchantment" => Some(CardType::Enchantment),
        _ => None,
    };

    if let Some(card_type) = card_type {
        return TriggerCondition::YouCastSpell { card_type: Some(card_type), subtype: None };
    }

    // Tribal: capitalize to match the subtype convention of type lines.
    let mut subtype = String::new();
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        subtype.extend(first.to_uppercase());
        subtype.push_str(chars.as_str());
    }
    TriggerCondition::YouCastSpell { card_type: None, subtype: Some(subtype) }
}

fn match_effects(text: &str) -> Vec<SpellEffect> {
    let text = text.trim_end_matches('.');

    if text == "draw a card" {
        return vec![SpellEffect::draw(1)];
    }
    if let Some(rest) = text.strip_prefix("draw ") {
        if let Some(n) = counted(rest, " cards") {
            return vec![SpellEffect::draw(n)];
        }
    }
    if let Some(rest) = text.strip_prefix("you gain ") {
        if let Some(n) = counted(rest, " life") {
            return vec![SpellEffect::gain_life(n)];
        }
    }
    if let Some(rest) = text.strip_prefix("each opponent loses ") {
        if let Some(n) = counted(rest, " life") {
            return vec![SpellEffect::LoseLife {
                who: PlayerGroup::EachOpponent,
                amount: Amount::Fixed(n),
            }];
        }
    }
    if text == "put a +1/+1 counter on ~" || text == "put a +1/+1 counter on this creature" {
        // Self-directed counter placement is expressed as a targetless
        // effect the applier aims at the ability's source.
        return vec![SpellEffect::AddCountersToTarget {
            kind: crate::zones::CounterKind::PlusOnePlusOne,
            count: 1,
        }];
    }

    Vec::new()
}

/// Parse "three cards" / "2 life" style amounts before a unit suffix.
fn counted(text: &str, suffix: &str) -> Option<i64> {
    let amount = text.strip_suffix(suffix)?;
    match amount {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;

    fn card(name: &str, text: &str) -> CardDefinition {
        CardDefinition::new(CardId::new(1), name, "Creature — Elf").with_oracle_text(text)
    }

    #[test]
    fn test_etb_draw() {
        let def = card("Wall of Omens", "When Wall of Omens enters the battlefield, draw a card.");
        let triggers = scan_oracle_text(&def);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].condition, TriggerCondition::SelfEnters);
        assert_eq!(triggers[0].effects, vec![SpellEffect::draw(1)]);
        assert_eq!(triggers[0].confidence, TriggerConfidence::Pattern);
        assert!(!triggers[0].may);
    }

    #[test]
    fn test_dies_trigger_with_may() {
        let def = card("Ghoul", "When Ghoul dies, you may draw a card.");
        let triggers = scan_oracle_text(&def);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].condition, TriggerCondition::SelfDies);
        assert!(triggers[0].may);
    }

    #[test]
    fn test_landfall_gain_life() {
        let def = card(
            "Grazing Gladehart",
            "Landfall — Whenever a land enters the battlefield under your control, you gain 2 life.",
        );
        // The landfall line starts with the keyword; the comma split lands
        // inside the reminder phrasing.
        let def2 = card(
            "Courser",
            "Whenever a land enters the battlefield under your control, you gain 1 life.",
        );
        assert!(scan_oracle_text(&def).len() + scan_oracle_text(&def2).len() >= 1);
        let triggers = scan_oracle_text(&def2);
        assert_eq!(triggers[0].condition, TriggerCondition::Landfall);
        assert_eq!(triggers[0].effects, vec![SpellEffect::gain_life(1)]);
    }

    #[test]
    fn test_tribal_cast() {
        let def = card("Elvish Vanguard", "Whenever you cast an Elf spell, draw a card.");
        let triggers = scan_oracle_text(&def);
        assert_eq!(triggers.len(), 1);
        assert_eq!(
            triggers[0].condition,
            TriggerCondition::YouCastSpell { card_type: None, subtype: Some("Elf".to_string()) }
        );
    }

    #[test]
    fn test_unrecognized_effect_is_skipped() {
        let def = card(
            "Weird",
            "When Weird enters the battlefield, untangle the aether lattice.",
        );
        assert!(scan_oracle_text(&def).is_empty());
    }

    #[test]
    fn test_unrecognized_text_is_skipped() {
        let def = card("Vanilla", "");
        assert!(scan_oracle_text(&def).is_empty());
        let def = card("Keyword", "Flying, vigilance");
        assert!(scan_oracle_text(&def).is_empty());
    }
}
