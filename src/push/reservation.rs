//! Reservation lifecycle: `Reserved -> Committed | Aborted`

use crate::core::error::KapResult;
use crate::model::{AssetVersion, Reservation};
use crate::registry::RegistryClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
  Reserved,
  Committed,
  Aborted,
  /// Nothing new to publish; the registry needs no answer
  Settled,
}

/// Owns a reservation until it is committed or aborted
///
/// Dropping a guard that is still `Reserved` aborts the reservation.
pub struct ReservationGuard<'r> {
  registry: &'r dyn RegistryClient,
  reservation: Reservation,
  state: ReservationState,
}

impl<'r> ReservationGuard<'r> {
  pub fn new(registry: &'r dyn RegistryClient, reservation: Reservation) -> Self {
    Self {
      registry,
      reservation,
      state: ReservationState::Reserved,
    }
  }

  pub fn reservation(&self) -> &Reservation {
    &self.reservation
  }

  #[cfg(test)]
  pub fn state(&self) -> ReservationState {
    self.state
  }

  /// Commit the versions. On failure the guard stays `Reserved`.
  pub fn commit(&mut self, versions: &[AssetVersion]) -> KapResult<()> {
    debug_assert_eq!(self.state, ReservationState::Reserved);
    self.registry.commit_reservation(&self.reservation.id, versions)?;
    self.state = ReservationState::Committed;
    Ok(())
  }

  /// Abort if still reserved. Failures are logged, never returned.
  pub fn abort(&mut self) {
    if self.state != ReservationState::Reserved {
      return;
    }
    self.state = ReservationState::Aborted;
    match self.registry.abort_reservation(&self.reservation) {
      Ok(()) => tracing::debug!(reservation = %self.reservation.id, "reservation aborted"),
      Err(e) => tracing::warn!(reservation = %self.reservation.id, error = %e, "failed to abort reservation"),
    }
  }

  /// Release without telling the registry (every version already existed)
  pub fn settle(&mut self) {
    if self.state == ReservationState::Reserved {
      self.state = ReservationState::Settled;
    }
  }
}

impl Drop for ReservationGuard<'_> {
  fn drop(&mut self) {
    if self.state == ReservationState::Reserved {
      tracing::warn!(reservation = %self.reservation.id, "reservation dropped while reserved, aborting");
      self.abort();
    }
  }
}
