use tracing::instrument;

use super::ApiClient;
use crate::api::ApiError;
use crate::api::conversions::{convert_category_list, convert_commissions};
use crate::api::types::{Category, CommissionRates};

impl ApiClient {
    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        convert_category_list(self.get("/categories").await?)
    }

    /// Commission percentage per category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn commission_rates(&self) -> Result<CommissionRates, ApiError> {
        convert_commissions(self.get("/categories/commissions").await?)
    }
}
