//! Prepared statement handles.
use lru::LruCache;
use std::{num::NonZeroUsize, sync::Arc};

use crate::mysql::StatementId;

/// Formal parameter of a prepared statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormalParameter {
    name: Option<String>,
    index: usize,
}

impl FormalParameter {
    /// Parameter written as `@name` or `?name` in the statement.
    pub fn named(name: impl Into<String>, index: usize) -> FormalParameter {
        FormalParameter { name: Some(name.into()), index }
    }

    /// Parameter written as `?`, bound to the command parameter at `index`.
    pub fn positional(index: usize) -> FormalParameter {
        FormalParameter { name: None, index }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Server side prepared statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedStatement {
    id: StatementId,
    parameters: Vec<FormalParameter>,
}

impl PreparedStatement {
    pub fn new(id: StatementId, parameters: impl IntoIterator<Item = FormalParameter>) -> Self {
        Self { id, parameters: parameters.into_iter().collect() }
    }

    pub fn id(&self) -> StatementId {
        self.id
    }

    pub fn parameters(&self) -> &[FormalParameter] {
        &self.parameters
    }
}

/// All statements prepared from one command text.
///
/// A command text containing several statements is prepared as one
/// [`PreparedStatement`] each, executed in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedStatements {
    sql: String,
    statements: Vec<PreparedStatement>,
}

impl PreparedStatements {
    pub fn new(sql: impl Into<String>, statements: Vec<PreparedStatement>) -> Self {
        Self { sql: sql.into(), statements }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn statements(&self) -> &[PreparedStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PreparedStatement> {
        self.statements.get(index)
    }
}

/// Per connection cache of prepared statements keyed by sql text.
///
/// Statements evicted from the cache are handed back to the caller, which should send
/// [`StmtClose`][crate::mysql::frontend::StmtClose] for each of them.
pub struct StatementCache {
    cache: Option<LruCache<String, Arc<PreparedStatements>>>,
}

impl StatementCache {
    /// Create cache holding up to `capacity` entries, zero disables caching.
    pub fn new(capacity: usize) -> StatementCache {
        StatementCache {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    pub fn get(&mut self, sql: &str) -> Option<Arc<PreparedStatements>> {
        self.cache.as_mut()?.get(sql).cloned()
    }

    /// Insert statements, returns the evicted or replaced entry.
    ///
    /// When caching is disabled the statements are returned immediately.
    pub fn insert(&mut self, prepared: Arc<PreparedStatements>) -> Option<Arc<PreparedStatements>> {
        let Some(cache) = self.cache.as_mut() else {
            return Some(prepared);
        };
        cache
            .push(prepared.sql().to_owned(), prepared)
            .map(|(_, evicted)| evicted)
    }

    pub fn remove(&mut self, sql: &str) -> Option<Arc<PreparedStatements>> {
        self.cache.as_mut()?.pop(sql)
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries, returns them for closing.
    pub fn clear(&mut self) -> Vec<Arc<PreparedStatements>> {
        let Some(cache) = self.cache.as_mut() else {
            return Vec::new();
        };
        let mut all = Vec::with_capacity(cache.len());
        while let Some((_, prepared)) = cache.pop_lru() {
            all.push(prepared);
        }
        all
    }
}

impl std::fmt::Debug for StatementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementCache")
            .field("len", &self.len())
            .field("capacity", &self.cache.as_ref().map_or(0, |e| e.cap().get()))
            .finish()
    }
}
