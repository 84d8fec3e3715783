use std::sync::{PoisonError, RwLock, RwLockWriteGuard};
use std::time::SystemTime;

use chrono::prelude::*;
use serde::Serialize;
use strum_macros::AsRefStr;

use crate::{lr, pr};

/// Stores debug info about current compilation.
/// Is reset by [log_start] and [log_finish].
static CURRENT_LOG: RwLock<Option<DebugLog>> = RwLock::new(None);

fn current_log() -> RwLockWriteGuard<'static, Option<DebugLog>> {
    // a panic while logging leaves a valid, if partial, log behind
    CURRENT_LOG.write().unwrap_or_else(PoisonError::into_inner)
}

pub fn log_start() {
    let started_at: DateTime<Utc> = SystemTime::now().into();
    let started_at = format!("{}", started_at.format("%+"));

    *current_log() = Some(DebugLog {
        started_at,
        version: crate::compiler_version().to_string(),
        entries: Vec::new(),

        current_stage: Stage::Parsing(StageParsing::Lexer),
    });
}

pub fn log_finish() -> Option<DebugLog> {
    current_log().take()
}

pub fn log_is_enabled() -> bool {
    let lock = CURRENT_LOG.read().unwrap_or_else(PoisonError::into_inner);
    lock.is_some()
}

pub fn log_stage(stage: Stage) {
    if let Some(log) = current_log().as_mut() {
        log.current_stage = stage;
    }
}

pub fn log_entry(entry: impl FnOnce() -> DebugEntryKind) {
    let mut lock = current_log();
    if let Some(log) = lock.as_mut() {
        let entry = DebugEntry {
            stage: log.current_stage,
            kind: entry(),
        };
        log.entries.push(entry);
    }
}

#[derive(Serialize)]
pub struct DebugLog {
    pub started_at: String,
    pub version: String,
    pub entries: Vec<DebugEntry>,

    #[serde(skip)]
    current_stage: Stage,
}

#[derive(Serialize)]
pub struct DebugEntry {
    pub stage: Stage,
    pub kind: DebugEntryKind,
}

#[derive(Serialize, AsRefStr)]
pub enum DebugEntryKind {
    ReprQuery(String),
    ReprLr(lr::Tokens),
    ReprPr(pr::Query),
    /// The entity graph after path resolution.
    ReprGraph(serde_json::Value),
    ReprSql(String),
    Message(Message),
}

#[derive(Serialize)]
pub struct Message {
    pub level: String,
    pub module_path: Option<String>,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stage {
    Parsing(StageParsing),
    Semantic(StageSemantic),
    Sql,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StageParsing {
    Lexer,
    Parser,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StageSemantic {
    /// Registering `from` and `join` sources.
    Sources,
    /// Resolving property paths.
    Paths,
}
