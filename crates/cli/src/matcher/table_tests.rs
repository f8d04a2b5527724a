// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::Symbol;
use super::*;

const FLAVORS: [ShellFlavor; 2] = [ShellFlavor::Bash, ShellFlavor::Zsh];
const MODES: [Mode; 4] = [Mode::Term, Mode::Executing, Mode::Prompt, Mode::RightPrompt];

#[test]
fn every_pattern_is_well_formed() {
    for flavor in FLAVORS {
        for mode in MODES {
            for seq in build(flavor, mode) {
                assert!(seq.is_well_formed(), "{flavor} {mode}: {:?}", seq.pattern());
            }
        }
    }
}

#[test]
fn navigation_chords_are_eaten() {
    for flavor in FLAVORS {
        let term = build(flavor, Mode::Term);
        assert!(term.iter().all(|s| s.disposition() == Eat));
        assert_eq!(term[0].effect(), Effect::NavUp);
    }
}

#[test]
fn markers_lead_the_prompt_group() {
    let effects: Vec<Effect> =
        build(ShellFlavor::Bash, Mode::Prompt).iter().map(Sequence::effect).collect();
    assert_eq!(
        &effects[..6],
        &[
            Effect::Pwd,
            Effect::PromptEnd,
            Effect::Continuation,
            Effect::Newline,
            Effect::Newline,
            Effect::CarriageReturn,
        ]
    );
}

#[test]
fn only_carriage_return_differs_between_flavors() {
    let bash = build(ShellFlavor::Bash, Mode::Prompt);
    let zsh = build(ShellFlavor::Zsh, Mode::Prompt);
    assert_eq!(bash.len(), zsh.len());

    let differing: Vec<usize> = bash
        .iter()
        .zip(&zsh)
        .enumerate()
        .filter(|(_, (b, z))| b.pattern() != z.pattern())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(differing, vec![5]);
    assert_eq!(bash[5].pattern(), &[Symbol::Byte(b'\r'), Symbol::NotLf]);
    assert_eq!(zsh[5].pattern(), &[Symbol::Byte(b'\r'), Symbol::NotLfCr]);
}

#[test]
fn markers_are_eaten_everywhere() {
    for flavor in FLAVORS {
        for mode in [Mode::Executing, Mode::Prompt, Mode::RightPrompt] {
            let marker_effects = [
                Effect::Pwd,
                Effect::PromptEnd,
                Effect::Continuation,
                Effect::RightPromptEnd,
            ];
            for seq in build(flavor, mode) {
                if marker_effects.contains(&seq.effect()) {
                    assert_eq!(seq.disposition(), Eat, "{flavor} {mode} {:?}", seq.effect());
                } else {
                    assert_eq!(seq.disposition(), Pass, "{flavor} {mode} {:?}", seq.effect());
                }
            }
        }
    }
}

#[test]
fn right_prompt_group_order() {
    let effects: Vec<Effect> =
        build(ShellFlavor::Zsh, Mode::RightPrompt).iter().map(Sequence::effect).collect();
    assert_eq!(
        effects,
        vec![
            Effect::RightPromptEnd,
            Effect::PromptEnd,
            Effect::Pwd,
            Effect::RightPromptReturn,
            Effect::Newline,
        ]
    );
}

#[test]
fn marker_constants_share_the_prefix() {
    for marker in [PWD_MARK, PROMPT_MARK, CONTINUATION_MARK, RPROMPT_MARK] {
        assert!(marker.starts_with(MARK_PREFIX));
        assert_eq!(marker.last(), Some(&0x07));
    }
}
