//! Access control for the bot
//!
//! There is exactly one Admin, fixed by configuration, and a runtime-managed
//! set of sudo users that only the Admin can change. Everybody else is a
//! regular user and cannot use the bot.
//!
//! The Admin id never enters the sudo set: it is stripped on load and
//! `add_sudo`/`remove_sudo` leave it alone, so `is_authorized(admin)` holds no
//! matter what the file contains.
//!
//! Every change is written to the [`SudoFile`] before the call returns. A
//! failed write is reported as [`AccessError::Storage`] but the in-memory
//! change stays; the next change rewrites the whole file anyway.

mod file;

pub use file::{StorageError, SudoFile};

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use strum::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    /// Requester is not the Admin
    #[error("only the admin can manage sudo users")]
    PermissionDenied,

    /// The change was applied in memory but not saved
    #[error("sudo list updated ({change}) but could not be saved: {source}")]
    Storage {
        change: SudoChange,
        #[source]
        source: StorageError,
    },
}

/// Role of a user as seen by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Role {
    Admin,
    Sudo,
    User,
}

impl Role {
    pub fn is_authorized(self) -> bool {
        !matches!(self, Role::User)
    }
}

/// What an add/remove call did to the sudo set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SudoChange {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
    /// Target was the Admin, whose status never changes
    AdminUnchanged,
}

/// The Admin plus the persisted sudo set.
///
/// Shared between handlers behind an `Arc`. Changes are serialized by
/// `writer`, held across the in-memory update and the (blocking) file write,
/// so the file always ends at the last applied state. The set's own lock is
/// only held to update it and take a snapshot; authorization checks never
/// wait on disk I/O.
pub struct AccessStore {
    admin_id: i64,
    sudo_users: RwLock<HashSet<i64>>,
    writer: Mutex<()>,
    file: SudoFile,
}

impl AccessStore {
    /// Loads the sudo set from `file`.
    ///
    /// An unreadable or corrupt file is logged and treated as an empty set;
    /// the bot still starts and the Admin can rebuild the list.
    pub fn open(admin_id: i64, file: SudoFile) -> Self {
        let mut sudo_users = match file.load() {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("Failed to load sudo users: {}. Starting with an empty list", e);
                HashSet::new()
            }
        };

        if sudo_users.remove(&admin_id) {
            log::warn!(
                "Admin id {} found in {}; the admin is not kept in the sudo list",
                admin_id,
                file.path().display()
            );
        }

        log::info!(
            "Loaded {} sudo user(s) from {}",
            sudo_users.len(),
            file.path().display()
        );

        Self {
            admin_id,
            sudo_users: RwLock::new(sudo_users),
            writer: Mutex::new(()),
            file,
        }
    }

    pub fn admin_id(&self) -> i64 {
        self.admin_id
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_id
    }

    /// True for the Admin and for sudo users
    pub fn is_authorized(&self, user_id: i64) -> bool {
        self.role(user_id).is_authorized()
    }

    pub fn role(&self, user_id: i64) -> Role {
        if self.is_admin(user_id) {
            Role::Admin
        } else if self.read().contains(&user_id) {
            Role::Sudo
        } else {
            Role::User
        }
    }

    /// Grants sudo to `target_id`. Admin only; idempotent.
    pub fn add_sudo(&self, requester_id: i64, target_id: i64) -> Result<SudoChange, AccessError> {
        self.ensure_admin(requester_id)?;
        if self.is_admin(target_id) {
            return Ok(SudoChange::AdminUnchanged);
        }

        let _writer = self.lock_writer();
        let (change, snapshot) = {
            let mut users = self.write();
            let change = if users.insert(target_id) {
                SudoChange::Added
            } else {
                SudoChange::AlreadyPresent
            };
            (change, users.clone())
        };
        self.persist(&snapshot, change)?;

        log::info!("Sudo add {}: {}", target_id, change);
        Ok(change)
    }

    /// Revokes sudo from `target_id`. Admin only; removing an absent id is fine.
    pub fn remove_sudo(&self, requester_id: i64, target_id: i64) -> Result<SudoChange, AccessError> {
        self.ensure_admin(requester_id)?;
        if self.is_admin(target_id) {
            return Ok(SudoChange::AdminUnchanged);
        }

        let _writer = self.lock_writer();
        let (change, snapshot) = {
            let mut users = self.write();
            let change = if users.remove(&target_id) {
                SudoChange::Removed
            } else {
                SudoChange::NotPresent
            };
            (change, users.clone())
        };
        self.persist(&snapshot, change)?;

        log::info!("Sudo remove {}: {}", target_id, change);
        Ok(change)
    }

    /// Current sudo users, sorted. Admin only.
    pub fn list_sudo(&self, requester_id: i64) -> Result<Vec<i64>, AccessError> {
        self.ensure_admin(requester_id)?;
        let mut ids: Vec<i64> = self.read().iter().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn ensure_admin(&self, requester_id: i64) -> Result<(), AccessError> {
        if self.is_admin(requester_id) {
            Ok(())
        } else {
            log::warn!("User {} tried to manage sudo users without being admin", requester_id);
            Err(AccessError::PermissionDenied)
        }
    }

    fn persist(&self, users: &HashSet<i64>, change: SudoChange) -> Result<(), AccessError> {
        self.file.save(users).map_err(|source| {
            log::error!("Failed to save sudo users to {}: {}", self.file.path().display(), source);
            AccessError::Storage { change, source }
        })
    }

    // A panicking writer cannot leave the set half-updated, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<i64>> {
        self.sudo_users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<i64>> {
        self.sudo_users.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
