// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn record() -> SessionRecord {
    SessionRecord::new("1.0.0".to_owned(), "seer-9".to_owned())
}

#[test]
fn frames_fill_the_record() {
    let mut rec = record();
    for frame in [
        Frame::new(Param::Pid, "4242"),
        Frame::new(Param::Pwd, "/srv"),
        Frame::new(Param::Cmd, "ls *.rs"),
        Frame::new(Param::DevelopingMask, "*.rs"),
        Frame::new(Param::Mask, "*.rs"),
        Frame::new(Param::VgexpandData, "1\n\ta.rs\n"),
    ] {
        assert!(rec.apply(&frame));
    }
    assert_eq!(rec.pid, Some(4242));
    assert_eq!(rec.pwd, "/srv");
    assert_eq!(rec.cmd, "ls *.rs");
    assert_eq!(rec.developing_mask, "*.rs");
    assert_eq!(rec.expansion.as_ref(), b"1\n\ta.rs\n");
    assert_eq!(rec.status, status::PROMPT);
}

#[yare::parameterized(
    purpose = { Param::Purpose },
    file    = { Param::File },
    key     = { Param::Key },
    win_id  = { Param::WinId },
)]
fn unexpected_params_are_rejected(param: Param) {
    assert!(!record().apply(&Frame::new(param, "x")));
}

#[test]
fn status_frames_update_status() {
    let mut rec = record();
    rec.apply(&Frame::new(Param::Status, status::EXECUTING));
    assert_eq!(rec.status, status::EXECUTING);
    rec.apply(&Frame::new(Param::Status, status::DEAD));
    assert!(rec.is_dead());
}

#[test]
fn snapshot_skips_empty_fields() {
    let mut rec = record();
    rec.apply(&Frame::new(Param::Pwd, "/home"));
    let params: Vec<Param> = rec.snapshot().iter().map(|f| f.param).collect();
    assert_eq!(params, vec![Param::Pwd, Param::Status]);

    rec.apply(&Frame::new(Param::Mask, "*"));
    assert!(!rec.snapshot().iter().any(|f| f.param == Param::Mask));
    rec.apply(&Frame::new(Param::VgexpandData, "0\n"));
    let params: Vec<Param> = rec.snapshot().iter().map(|f| f.param).collect();
    assert_eq!(params, vec![Param::Pwd, Param::Status, Param::Mask, Param::VgexpandData]);
}

#[test]
fn last_sender_is_active() {
    let mut state = MuxState::new();
    let a = state.register(record());
    let b = state.register(record());
    assert_ne!(a, b);
    assert_eq!(state.active(), None);

    assert_eq!(state.update(a, &Frame::new(Param::Cmd, "ls")), Update::Activated);
    assert_eq!(state.update(a, &Frame::new(Param::Cmd, "ls -l")), Update::Forward);
    assert_eq!(state.update(b, &Frame::new(Param::Pwd, "/tmp")), Update::Activated);
    assert_eq!(state.active(), Some(b));
    assert_eq!(state.active_record().map(|r| r.pwd.as_str()), Some("/tmp"));
}

#[test]
fn rejected_frames_do_not_steal_focus() {
    let mut state = MuxState::new();
    let a = state.register(record());
    let b = state.register(record());
    state.update(a, &Frame::new(Param::Cmd, "ls"));
    assert_eq!(state.update(b, &Frame::new(Param::Key, "x")), Update::Rejected);
    assert_eq!(state.active(), Some(a));
    assert_eq!(state.update(99, &Frame::new(Param::Cmd, "ls")), Update::Unknown);
}

#[test]
fn remove_reports_activity() {
    let mut state = MuxState::new();
    let a = state.register(record());
    let b = state.register(record());
    state.update(a, &Frame::new(Param::Cmd, "ls"));

    let (rec, was_active) = state.remove(b).unwrap_or_default();
    assert!(!was_active);
    assert!(rec.is_dead());

    let (_, was_active) = state.remove(a).unwrap_or_default();
    assert!(was_active);
    assert_eq!(state.active(), None);
    assert!(state.is_empty());
    assert!(state.remove(a).is_none());
}
