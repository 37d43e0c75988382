use tracing::info;

use tuapp_domain::id::PassengerId;
use tuapp_domain::pagination::PageRequest;

use crate::domain::repository::PassengerRepository;
use crate::domain::types::{NewPassenger, Passenger, PassengerChanges};
use crate::error::TransitError;

pub struct CreatePassengerUseCase<P: PassengerRepository> {
    pub passengers: P,
}

impl<P: PassengerRepository> CreatePassengerUseCase<P> {
    pub async fn execute(&self, input: NewPassenger) -> Result<Passenger, TransitError> {
        let input = NewPassenger {
            surname_2: input.surname_2.filter(|s| !s.trim().is_empty()),
            ..input
        };
        self.passengers.create(&input).await
    }
}

pub struct GetPassengerUseCase<P: PassengerRepository> {
    pub passengers: P,
}

impl<P: PassengerRepository> GetPassengerUseCase<P> {
    pub async fn execute(&self, id: PassengerId) -> Result<Passenger, TransitError> {
        self.passengers
            .find_by_id(id)
            .await?
            .ok_or(TransitError::PassengerNotFound)
    }
}

pub struct ListPassengersUseCase<P: PassengerRepository> {
    pub passengers: P,
}

impl<P: PassengerRepository> ListPassengersUseCase<P> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<Passenger>, TransitError> {
        self.passengers.list(page.clamped()).await
    }
}

pub struct UpdatePassengerUseCase<P: PassengerRepository> {
    pub passengers: P,
}

impl<P: PassengerRepository> UpdatePassengerUseCase<P> {
    pub async fn execute(
        &self,
        id: PassengerId,
        changes: PassengerChanges,
    ) -> Result<Passenger, TransitError> {
        let changes = PassengerChanges {
            surname_2: changes.surname_2.filter(|s| !s.trim().is_empty()),
            ..changes
        };
        if changes.is_empty() {
            return Err(TransitError::NoChanges);
        }
        self.passengers.update(id, &changes).await
    }
}

pub struct DeletePassengerUseCase<P: PassengerRepository> {
    pub passengers: P,
}

impl<P: PassengerRepository> DeletePassengerUseCase<P> {
    /// Refused with `PassengerHasCards` until every card of the passenger is gone.
    pub async fn execute(&self, id: PassengerId) -> Result<(), TransitError> {
        if !self.passengers.delete(id).await? {
            return Err(TransitError::PassengerNotFound);
        }
        info!(passenger_id = %id, "passenger deleted");
        Ok(())
    }
}
