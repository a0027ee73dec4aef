//! Lock-guarded editing of one preparation.

use std::fmt;

use prep_model::{AppendStep, Preparation};
use tracing::{debug, warn};

use crate::error::Result;
use crate::service::PreparationService;

/// Holds the lock of one preparation for one owner.
///
/// Every mutation refreshes the lock first, so a session whose lock expired
/// and was taken by someone else fails with
/// [`HistoryError::Locked`](crate::HistoryError::Locked) instead of writing.
/// The lock is released by [`release`](Self::release) or when the session is
/// dropped.
pub struct EditSession<'s> {
    service: &'s PreparationService,
    preparation_id: String,
    owner: String,
    released: bool,
}

impl<'s> EditSession<'s> {
    pub(crate) fn open(
        service: &'s PreparationService,
        preparation_id: &str,
        owner: &str,
    ) -> Result<Self> {
        service.get(preparation_id)?;
        service.locks().retrieve_lock(preparation_id, owner)?;
        debug!(id = preparation_id, owner, "edit session opened");
        Ok(Self {
            service,
            preparation_id: preparation_id.to_string(),
            owner: owner.to_string(),
            released: false,
        })
    }

    pub fn preparation_id(&self) -> &str {
        &self.preparation_id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn preparation(&self) -> Result<Preparation> {
        self.service.get(&self.preparation_id)
    }

    /// Take the lock again, pushing its expiration back.
    pub fn renew(&self) -> Result<()> {
        self.service
            .locks()
            .retrieve_lock(&self.preparation_id, &self.owner)?;
        Ok(())
    }

    pub fn append(&self, steps: Vec<AppendStep>) -> Result<Preparation> {
        self.renew()?;
        self.service.append(&self.preparation_id, steps)
    }

    pub fn update_at(&self, step_id: &str, new_step: AppendStep) -> Result<Preparation> {
        self.renew()?;
        self.service
            .update_at(&self.preparation_id, step_id, new_step)
    }

    pub fn delete_at(&self, step_id: &str) -> Result<Preparation> {
        self.renew()?;
        self.service.delete_at(&self.preparation_id, step_id)
    }

    pub fn move_head(&self, step_id: &str) -> Result<Preparation> {
        self.renew()?;
        self.service.move_head(&self.preparation_id, step_id)
    }

    pub fn rename(&self, name: &str) -> Result<Preparation> {
        self.renew()?;
        self.service.rename(&self.preparation_id, name)
    }

    /// Delete the preparation and end the session.
    pub fn delete_preparation(self) -> Result<()> {
        self.renew()?;
        self.service.delete_preparation(&self.preparation_id)?;
        self.release()
    }

    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.service
            .locks()
            .retrieve_unlock(&self.preparation_id, &self.owner)?;
        debug!(id = %self.preparation_id, owner = %self.owner, "edit session closed");
        Ok(())
    }
}

impl fmt::Debug for EditSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("preparation_id", &self.preparation_id)
            .field("owner", &self.owner)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = self
            .service
            .locks()
            .try_unlock(&self.preparation_id, &self.owner)
        {
            warn!(id = %self.preparation_id, owner = %self.owner, %error, "failed to release preparation lock");
        }
    }
}
