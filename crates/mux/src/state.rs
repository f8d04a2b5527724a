// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What the router remembers about each connected session.

use std::collections::BTreeMap;

use bytes::Bytes;

use seer::protocol::{status, Frame, Param};

/// Router-assigned connection number.
pub type ClientId = u64;

/// Last known state of one terminal session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub version: String,
    pub title: String,
    pub pid: Option<u32>,
    pub status: String,
    pub cmd: String,
    pub pwd: String,
    pub developing_mask: String,
    pub mask: String,
    pub expansion: Bytes,
}

impl SessionRecord {
    pub fn new(version: String, title: String) -> Self {
        Self { version, title, status: status::PROMPT.to_owned(), ..Self::default() }
    }

    /// Fold a frame from the session into the record. Returns false for
    /// frames a session has no business sending.
    pub fn apply(&mut self, frame: &Frame) -> bool {
        let text = || frame.value_str().into_owned();
        match frame.param {
            Param::Pid => self.pid = text().parse().ok(),
            Param::Status => self.status = text(),
            Param::Cmd => {
                self.cmd = text();
                self.status = status::PROMPT.to_owned();
            }
            Param::Pwd => self.pwd = text(),
            Param::DevelopingMask => self.developing_mask = text(),
            Param::Mask => self.mask = text(),
            Param::VgexpandData => self.expansion = frame.value.clone(),
            Param::Order => {}
            _ => return false,
        }
        true
    }

    pub fn is_dead(&self) -> bool {
        self.status == status::DEAD
    }

    /// Frames that bring a display up to date with this session.
    pub fn snapshot(&self) -> Vec<Frame> {
        let mut frames = Vec::new();
        if let Some(pid) = self.pid {
            frames.push(Frame::new(Param::Pid, pid.to_string()));
        }
        let text = [
            (Param::Pwd, &self.pwd),
            (Param::Status, &self.status),
            (Param::Cmd, &self.cmd),
            (Param::DevelopingMask, &self.developing_mask),
        ];
        for (param, value) in text {
            if !value.is_empty() {
                frames.push(Frame::new(param, Bytes::copy_from_slice(value.as_bytes())));
            }
        }
        if !self.mask.is_empty() && !self.expansion.is_empty() {
            frames.push(Frame::new(Param::Mask, Bytes::copy_from_slice(self.mask.as_bytes())));
            frames.push(Frame::new(Param::VgexpandData, self.expansion.clone()));
        }
        frames
    }
}

/// Every session known to the router and which one the display follows.
#[derive(Debug, Default)]
pub struct MuxState {
    sessions: BTreeMap<ClientId, SessionRecord>,
    active: Option<ClientId>,
    next_id: ClientId,
}

impl MuxState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, record: SessionRecord) -> ClientId {
        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(id, record);
        id
    }

    pub fn get(&self, id: ClientId) -> Option<&SessionRecord> {
        self.sessions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active(&self) -> Option<ClientId> {
        self.active
    }

    pub fn active_record(&self) -> Option<&SessionRecord> {
        self.active.and_then(|id| self.sessions.get(&id))
    }

    /// Record a frame from `id`, making it the active session.
    pub fn update(&mut self, id: ClientId, frame: &Frame) -> Update {
        let Some(record) = self.sessions.get_mut(&id) else {
            return Update::Unknown;
        };
        if !record.apply(frame) {
            return Update::Rejected;
        }
        if self.active == Some(id) {
            Update::Forward
        } else {
            self.active = Some(id);
            Update::Activated
        }
    }

    /// Forget `id`. Returns its final record with the status set to dead and
    /// whether it was the active session.
    pub fn remove(&mut self, id: ClientId) -> Option<(SessionRecord, bool)> {
        let mut record = self.sessions.remove(&id)?;
        record.status = status::DEAD.to_owned();
        let was_active = self.active == Some(id);
        if was_active {
            self.active = None;
        }
        Some((record, was_active))
    }
}

/// Outcome of [`MuxState::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// The active session sent it; forward the frame.
    Forward,
    /// The sender just became active; the display needs its whole record.
    Activated,
    /// Not a frame a session sends.
    Rejected,
    Unknown,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
