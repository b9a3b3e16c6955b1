use serde::{Deserialize, Serialize};

use super::{ShopifyError, StoreClient, Webhook, WebhookInput};

#[derive(Serialize)]
struct WebhookRequest<'a> {
    webhook: &'a WebhookInput,
}

#[derive(Deserialize)]
struct WebhookEnvelope {
    webhook: Webhook,
}

#[derive(Deserialize)]
struct WebhooksEnvelope {
    webhooks: Vec<Webhook>,
}

impl StoreClient {
    /// Subscribe `address` to a webhook topic.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Api` (422) if the subscription already exists.
    pub async fn create_webhook(&self, webhook: &WebhookInput) -> Result<Webhook, ShopifyError> {
        let envelope: WebhookEnvelope = self
            .post("/webhooks.json", &WebhookRequest { webhook })
            .await?;
        Ok(envelope.webhook)
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>, ShopifyError> {
        let envelope: WebhooksEnvelope = self.get("/webhooks.json", &[]).await?;
        Ok(envelope.webhooks)
    }
}
