//! Turn structure and priority integration tests.

mod common;

use commander_engine::turn::AutoPassPrefs;
use commander_engine::{Action, PlayerId, Step};

use common::*;

/// Priority rotates in turn order; an all-pass on an empty stack advances
/// the step.
#[test]
fn test_all_pass_advances_step() {
    let mut game = game(3);
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);
    let p2 = PlayerId::new(2);

    assert_eq!(game.state().turn.step, Step::Upkeep);
    game.submit(p0, Action::PassPriority).unwrap();
    assert_eq!(game.state().priority.holder(), p1);
    game.submit(p1, Action::PassPriority).unwrap();
    assert_eq!(game.state().priority.holder(), p2);
    game.submit(p2, Action::PassPriority).unwrap();

    assert_eq!(game.state().turn.step, Step::Draw);
    // The active player gets priority first in the new step.
    assert_eq!(game.state().priority.holder(), p0);
}

/// Acting without priority is rejected.
#[test]
fn test_only_holder_may_act() {
    let mut game = game(2);
    let p1 = PlayerId::new(1);

    let err = game.submit(p1, Action::PassPriority).unwrap_err();
    assert_eq!(err.code(), "illegal_action");
    assert_eq!(game.state().priority.holder(), PlayerId::new(0));
}

/// An auto-passing opponent is passed for as soon as the engine sees the
/// window is uninteresting.
#[test]
fn test_auto_pass_skips_opponent() {
    let mut game = game(2);
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);

    game.submit(p1, Action::SetAutoPass { prefs: AutoPassPrefs::stopping_at([]) })
        .unwrap();

    // One manual pass from the active player carries the step over.
    game.submit(p0, Action::PassPriority).unwrap();
    assert_eq!(game.state().turn.step, Step::Draw);
    assert_eq!(game.state().priority.holder(), p0);
}

/// A stop list holds priority in the named steps.
#[test]
fn test_auto_pass_respects_stops() {
    let mut game = game(2);
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);

    game.submit(
        p1,
        Action::SetAutoPass { prefs: AutoPassPrefs::stopping_at([Step::Draw]) },
    )
    .unwrap();

    game.submit(p0, Action::PassPriority).unwrap();
    assert_eq!(game.state().turn.step, Step::Draw);
    game.submit(p0, Action::PassPriority).unwrap();

    // P1 stopped in the draw step instead of passing through.
    assert_eq!(game.state().turn.step, Step::Draw);
    assert_eq!(game.state().priority.holder(), p1);
}

/// The active player never auto-passes, even with auto-pass enabled.
#[test]
fn test_active_player_never_auto_passes() {
    let mut game = game(2);
    let p0 = PlayerId::new(0);

    game.submit(p0, Action::SetAutoPass { prefs: AutoPassPrefs::stopping_at([]) })
        .unwrap();
    assert_eq!(game.state().turn.step, Step::Upkeep);
    assert_eq!(game.state().priority.holder(), p0);
}

/// `AdvanceStep` is a shortcut that needs every other player on
/// auto-pass.
#[test]
fn test_advance_step_requires_consent() {
    let mut game = game(2);
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);

    let err = game.submit(p0, Action::AdvanceStep).unwrap_err();
    assert_eq!(err.code(), "illegal_action");

    game.submit(p1, Action::SetAutoPass { prefs: AutoPassPrefs::stopping_at([]) })
        .unwrap();
    game.submit(p0, Action::AdvanceStep).unwrap();
    assert_eq!(game.state().turn.step, Step::Draw);
}

/// Untap and cleanup are chained through without a priority window.
#[test]
fn test_untap_and_cleanup_grant_no_priority() {
    let mut game = game(2);
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);

    pass_until(&mut game, Step::End);
    game.submit(p0, Action::PassPriority).unwrap();
    game.submit(p1, Action::PassPriority).unwrap();

    // End's all-pass went through cleanup, the turn ended, and the next
    // turn's untap chained into P1's upkeep.
    assert_eq!(game.state().turn.turn_number, 2);
    assert_eq!(game.state().turn.active, p1);
    assert_eq!(game.state().turn.step, Step::Upkeep);
    assert_eq!(game.state().priority.holder(), p1);
}

/// Turns rotate through every seat, and the second player draws on their
/// first turn.
#[test]
fn test_turn_rotation_and_draws() {
    let mut game = game(2);
    let p1 = PlayerId::new(1);

    let hand_before = game.state().zones.size(commander_engine::Zone::Hand(p1));
    pass_until(&mut game, Step::End);
    pass_until(&mut game, Step::Main1);

    assert_eq!(game.state().turn.active, p1);
    assert_eq!(
        game.state().zones.size(commander_engine::Zone::Hand(p1)),
        hand_before + 1
    );
}

/// Permanents untap and shed summoning sickness at the start of their
/// controller's turn.
#[test]
fn test_untap_step_refreshes_permanents() {
    let mut game = game(2);
    let p1 = PlayerId::new(1);

    let bears = put_on_battlefield(&mut game, p1, GRIZZLY_BEARS);
    {
        let perm = game.state_mut().permanent_mut(bears).unwrap();
        perm.tapped = true;
        assert!(perm.summoning_sick);
    }

    pass_until(&mut game, Step::End);
    pass_until(&mut game, Step::Upkeep);

    assert_eq!(game.state().turn.active, p1);
    let perm = game.state().permanent(bears).unwrap();
    assert!(!perm.tapped);
    assert!(!perm.summoning_sick);
}

/// Marked damage and until-end-of-turn effects wear off during the
/// cleanup step itself, before the turn rolls over.
#[test]
fn test_cleanup_wears_off_damage_and_effects() {
    use commander_engine::core::ContinuousEffect;

    let mut game = game(2);
    let p0 = PlayerId::new(0);

    let bears = put_on_battlefield(&mut game, p0, GRIZZLY_BEARS);
    game.state_mut().permanent_mut(bears).unwrap().damage = 1;
    game.state_mut().continuous.push(ContinuousEffect {
        target: bears,
        power: 2,
        toughness: 2,
        until_end_of_turn: true,
        timestamp: 0,
    });
    assert_eq!(game.state().effective_pt(bears), Some((4, 4)));

    // Two extra cards force a discard, holding the turn open at cleanup.
    put_in_hand(&mut game, p0, FOREST);
    put_in_hand(&mut game, p0, FOREST);
    pass_until(&mut game, Step::Cleanup);

    assert_eq!(game.state().turn.turn_number, 1);
    assert_eq!(game.state().permanent(bears).unwrap().damage, 0);
    assert_eq!(game.state().effective_pt(bears), Some((2, 2)));
}
