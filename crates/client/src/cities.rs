//! City lookup used by checkout and registration. Uncached; the list is tiny
//! and requested once per flow.

use tracing::instrument;

use mercadito_core::{City, CityId};

use crate::api::ApiClient;
use crate::error::ApiError;

/// Access to the city endpoints.
#[derive(Clone)]
pub struct CityService {
    api: ApiClient,
}

impl CityService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// All active delivery cities.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<City>, ApiError> {
        self.api.get_data("cities", &[]).await
    }

    /// One city by id.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get(&self, id: &CityId) -> Result<City, ApiError> {
        self.api.get_data(&format!("cities/{id}"), &[]).await
    }
}
