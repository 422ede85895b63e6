//! In-memory implementation of every store.
//!
//! All tables live behind one `RwLock`. No method awaits while holding the
//! lock, so the guard never crosses a suspension point. A poisoned lock is
//! reported as [`DataError::StoreUnavailable`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::data::filters::calculate_metadata;
use crate::data::tokens::hash_token;
use crate::data::{
    DataError, Filters, Metadata, Movie, MovieStore, PermissionStore, Permissions, Scope, Token,
    TokenStore, User, UserStore,
};
use crate::security::identity::{AuthenticatedUser, IdentityResolver, LookupError};

#[derive(Default)]
struct Tables {
    movies: BTreeMap<i64, Movie>,
    last_movie_id: i64,
    users: BTreeMap<i64, User>,
    last_user_id: i64,
    tokens: Vec<Token>,
    permissions: HashMap<i64, BTreeSet<String>>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DataError> {
        self.tables
            .read()
            .map_err(|_| DataError::StoreUnavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DataError> {
        self.tables
            .write()
            .map_err(|_| DataError::StoreUnavailable("memory store lock poisoned".into()))
    }
}

fn title_matches(title: &str, query: &str) -> bool {
    let title = title.to_lowercase();
    query
        .split_whitespace()
        .all(|word| title.contains(&word.to_lowercase()))
}

fn compare_movies(a: &Movie, b: &Movie, column: &str) -> Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "year" => a.year.cmp(&b.year),
        "runtime" => a.runtime.cmp(&b.runtime),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn insert(&self, mut movie: Movie) -> Result<Movie, DataError> {
        let mut tables = self.write()?;
        tables.last_movie_id += 1;
        movie.id = tables.last_movie_id;
        movie.created_at = Utc::now();
        movie.version = 1;
        tables.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn get(&self, id: i64) -> Result<Movie, DataError> {
        self.read()?.movies.get(&id).cloned().ok_or(DataError::NotFound)
    }

    async fn update(&self, mut movie: Movie) -> Result<Movie, DataError> {
        let mut tables = self.write()?;
        // A missing row is reported as a conflict: the caller read it, so it
        // must have been deleted concurrently.
        let stored = tables.movies.get_mut(&movie.id).ok_or(DataError::EditConflict)?;
        if stored.version != movie.version {
            return Err(DataError::EditConflict);
        }
        movie.version += 1;
        movie.created_at = stored.created_at;
        *stored = movie.clone();
        Ok(movie)
    }

    async fn delete(&self, id: i64) -> Result<(), DataError> {
        if id < 1 {
            return Err(DataError::NotFound);
        }
        self.write()?
            .movies
            .remove(&id)
            .map(|_| ())
            .ok_or(DataError::NotFound)
    }

    async fn get_all(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), DataError> {
        let mut matched: Vec<Movie> = self
            .read()?
            .movies
            .values()
            .filter(|m| title_matches(&m.title, title))
            .filter(|m| genres.iter().all(|g| m.genres.contains(g)))
            .cloned()
            .collect();

        let column = filters.sort_column();
        let descending = filters.descending();
        matched.sort_by(|a, b| {
            let ordering = compare_movies(a, b, column);
            let ordering = if descending { ordering.reverse() } else { ordering };
            ordering.then(a.id.cmp(&b.id))
        });

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(filters.offset())
            .take(filters.limit())
            .collect();

        Ok((page, calculate_metadata(total, filters.page, filters.page_size)))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, mut user: User) -> Result<User, DataError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DataError::DuplicateEmail);
        }
        tables.last_user_id += 1;
        user.id = tables.last_user_id;
        user.created_at = Utc::now();
        user.version = 1;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, DataError> {
        self.read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DataError::NotFound)
    }

    async fn update(&self, mut user: User) -> Result<User, DataError> {
        let mut tables = self.write()?;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(DataError::DuplicateEmail);
        }
        let stored = tables.users.get_mut(&user.id).ok_or(DataError::EditConflict)?;
        if stored.version != user.version {
            return Err(DataError::EditConflict);
        }
        user.version += 1;
        *stored = user.clone();
        Ok(user)
    }

    async fn get_for_token(&self, scope: Scope, plaintext: &str) -> Result<User, DataError> {
        let hash = hash_token(plaintext);
        let now = Utc::now();
        let tables = self.read()?;
        let token = tables
            .tokens
            .iter()
            .find(|t| t.scope == scope && t.hash == hash && !t.is_expired_at(now))
            .ok_or(DataError::NotFound)?;
        tables
            .users
            .get(&token.user_id)
            .cloned()
            .ok_or(DataError::NotFound)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn new_token(&self, user_id: i64, ttl: Duration, scope: Scope) -> Result<Token, DataError> {
        let token = Token::generate(user_id, ttl, scope);
        TokenStore::insert(self, &token).await?;
        Ok(token)
    }

    async fn insert(&self, token: &Token) -> Result<(), DataError> {
        let mut tables = self.write()?;
        // Drop expired tokens while we hold the lock anyway.
        let now = Utc::now();
        tables.tokens.retain(|t| !t.is_expired_at(now));
        tables.tokens.push(token.clone());
        Ok(())
    }

    async fn delete_all_for_user(&self, scope: Scope, user_id: i64) -> Result<(), DataError> {
        self.write()?
            .tokens
            .retain(|t| !(t.scope == scope && t.user_id == user_id));
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions, DataError> {
        Ok(self
            .read()?
            .permissions
            .get(&user_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<(), DataError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&user_id) {
            return Err(DataError::NotFound);
        }
        tables
            .permissions
            .entry(user_id)
            .or_default()
            .extend(codes.iter().map(|c| c.to_string()));
        Ok(())
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn resolve_identity_by_token(
        &self,
        plaintext: &str,
    ) -> Result<AuthenticatedUser, LookupError> {
        let hash = hash_token(plaintext);
        let tables = self
            .read()
            .map_err(|e| LookupError::StoreUnavailable(e.to_string()))?;

        let token = tables
            .tokens
            .iter()
            .find(|t| t.scope == Scope::Authentication && t.hash == hash)
            .ok_or(LookupError::NotFound)?;
        if token.is_expired_at(Utc::now()) {
            return Err(LookupError::Expired);
        }

        let user = tables.users.get(&token.user_id).ok_or(LookupError::NotFound)?;
        let permissions = tables
            .permissions
            .get(&user.id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default();

        Ok(AuthenticatedUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            activated: user.activated,
            permissions,
        })
    }
}
