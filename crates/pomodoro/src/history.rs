//! Completed session history
//!
//! Newest first. Records are never edited; the only removal is clearing the
//! whole history.

use chrono::{NaiveDate, TimeZone};
use uuid::Uuid;

use crate::session::{NewSession, SessionRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    sessions: Vec<SessionRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap records that are already in newest-first order
    pub fn from_records(sessions: Vec<SessionRecord>) -> Self {
        Self { sessions }
    }

    /// Record a session at the front of the history and return it
    pub fn add(&mut self, session: NewSession) -> &SessionRecord {
        let record = session.into_record(Uuid::new_v4().to_string());
        self.sessions.insert(0, record);
        &self.sessions[0]
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The newest `n` records
    pub fn recent(&self, n: usize) -> &[SessionRecord] {
        &self.sessions[..n.min(self.sessions.len())]
    }

    /// Records grouped by the local date they ended on, newest day first.
    /// Records whose timestamp cannot be represented are left out.
    pub fn grouped_by_day<Tz: TimeZone>(&self, tz: &Tz) -> Vec<(NaiveDate, Vec<&SessionRecord>)> {
        let mut groups: Vec<(NaiveDate, Vec<&SessionRecord>)> = Vec::new();
        for record in &self.sessions {
            let Some(date) = record.end_date(tz) else {
                continue;
            };
            match groups.iter_mut().find(|(d, _)| *d == date) {
                Some((_, records)) => records.push(record),
                None => groups.push((date, vec![record])),
            }
        }
        groups.sort_by(|a, b| b.0.cmp(&a.0));
        groups
    }
}
