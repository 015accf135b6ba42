//! ALFA Wallet Vault - Session Context
//!
//! Tracks which account is unlocked and keeps its passphrase in memory only
//! for as long as it stays unlocked.
//!
//! ```text
//! Locked ──unlock──▶ Unlocking ──ok──▶ Unlocked{handle} ──lock──▶ Locking ──▶ Locked
//!                        └──error──▶ Locked
//! ```

use parking_lot::{Mutex, RwLock};
use secrecy::{ExposeSecret, SecretString};

use crate::account::AccountStore;
use crate::error::{VaultError, VaultResult};
use crate::identity::AccountHandle;

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Locked,
    Unlocking,
    Unlocked { handle: AccountHandle },
    Locking,
}

/// Current session
pub struct SessionContext {
    state: RwLock<SessionState>,
    passphrase: Mutex<Option<SecretString>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::Locked),
            passphrase: Mutex::new(None),
        }
    }

    /// Open the account for `passphrase` and keep the session unlocked
    pub fn unlock(&self, accounts: &AccountStore, passphrase: &str) -> VaultResult<AccountHandle> {
        {
            let mut state = self.state.write();
            match *state {
                SessionState::Locked => *state = SessionState::Unlocking,
                SessionState::Unlocked { .. } => {
                    return Err(VaultError::SessionBusy("already unlocked; lock first".into()))
                }
                SessionState::Unlocking | SessionState::Locking => {
                    return Err(VaultError::SessionBusy("a transition is in progress".into()))
                }
            }
        }

        match accounts.open_account(passphrase) {
            Ok(handle) => {
                *self.passphrase.lock() = Some(SecretString::new(passphrase.to_string()));
                *self.state.write() = SessionState::Unlocked {
                    handle: handle.clone(),
                };
                log::info!("Session unlocked for {}", handle);
                Ok(handle)
            }
            Err(e) => {
                *self.state.write() = SessionState::Locked;
                log::warn!("Unlock failed: {}", e);
                Err(e)
            }
        }
    }

    /// Forget the passphrase and return to `Locked`
    pub fn lock(&self) {
        {
            let mut state = self.state.write();
            if *state == SessionState::Locked {
                return;
            }
            *state = SessionState::Locking;
        }
        // SecretString zeroizes its buffer on drop
        self.passphrase.lock().take();
        *self.state.write() = SessionState::Locked;
        log::info!("Session locked");
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(*self.state.read(), SessionState::Unlocked { .. })
    }

    pub fn handle(&self) -> Option<AccountHandle> {
        match &*self.state.read() {
            SessionState::Unlocked { handle } => Some(handle.clone()),
            _ => None,
        }
    }

    /// Handle of the unlocked account, or `SessionLocked`
    pub fn require_unlocked(&self) -> VaultResult<AccountHandle> {
        self.handle().ok_or(VaultError::SessionLocked)
    }

    /// Run `f` with the unlocked account's handle and passphrase
    pub fn with_passphrase<T, F>(&self, f: F) -> VaultResult<T>
    where
        F: FnOnce(&AccountHandle, &str) -> VaultResult<T>,
    {
        let handle = self.require_unlocked()?;
        let guard = self.passphrase.lock();
        let passphrase = guard.as_ref().ok_or(VaultError::SessionLocked)?;
        f(&handle, passphrase.expose_secret())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
