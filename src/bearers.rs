//! Per-LCID table of PDCP entities.
//!
//! Entities are independent; a containing stack owns one per configured
//! radio bearer and routes traffic by logical channel ID.

use std::collections::HashMap;

use crate::entity::PdcpEntity;
use crate::error::PdcpError;
use crate::types::Lcid;

/// Owns the PDCP entities of one UE/cell stack, keyed by LCID.
#[derive(Debug, Default)]
pub struct PdcpBearers {
    entities: HashMap<Lcid, PdcpEntity>,
}

impl PdcpBearers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity under its LCID. An existing entity for the same
    /// bearer is replaced.
    pub fn add(&mut self, entity: PdcpEntity) {
        self.entities.insert(entity.lcid(), entity);
    }

    /// # Errors
    /// - [`PdcpError::UnknownBearer`] - no entity for this LCID.
    pub fn get(&self, lcid: Lcid) -> Result<&PdcpEntity, PdcpError> {
        self.entities.get(&lcid).ok_or(PdcpError::UnknownBearer(lcid))
    }

    /// # Errors
    /// - [`PdcpError::UnknownBearer`] - no entity for this LCID.
    pub fn get_mut(&mut self, lcid: Lcid) -> Result<&mut PdcpEntity, PdcpError> {
        self.entities
            .get_mut(&lcid)
            .ok_or(PdcpError::UnknownBearer(lcid))
    }

    /// Removes and returns the entity for `lcid`, if any. The entity's
    /// timers are cancelled before it is handed back.
    pub fn remove(&mut self, lcid: Lcid) -> Option<PdcpEntity> {
        let mut entity = self.entities.remove(&lcid)?;
        entity.reset();
        Some(entity)
    }

    /// Resets every entity (RRC connection release).
    pub fn reset_all(&mut self) {
        for entity in self.entities.values_mut() {
            entity.reset();
        }
    }

    /// Sweeps the discard timers of every entity.
    pub fn run_pending_timers(&mut self) {
        for entity in self.entities.values_mut() {
            entity.run_pending_timers();
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
