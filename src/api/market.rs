//! Currency detail endpoint.

use tracing::debug;

use super::{ApiClient, CURRENCY_INFO_PATH};
use crate::Result;
use crate::models::CurrencyDetail;
use crate::models::currency::CurrencyInfoResponse;

impl ApiClient {
    /// Fetches the current ticker and recent price history for a currency.
    ///
    /// # Errors
    ///
    /// Returns a rejection or network error from the call, or a JSON /
    /// malformed-message error if the nested ticker payload does not decode.
    pub async fn currency_info(&self, id: u32) -> Result<CurrencyDetail> {
        let form = [("id", id.to_string())];
        let builder = self.authed(self.post(CURRENCY_INFO_PATH)?)?.form(&form);
        let response = self.execute("currency_info", builder).await?;
        let body: CurrencyInfoResponse = Self::json(response).await?;
        let detail = body.into_detail()?;
        debug!(
            id,
            symbol = %detail.ticker.symbol,
            price = %detail.ticker.price_usd,
            history_points = detail.history.points.len(),
            "currency info received"
        );
        Ok(detail)
    }
}
