//! Price rules and discount codes.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{DiscountCode, PriceRule, PriceRuleInput, ShopifyError, StoreClient, page_size};

#[derive(Serialize)]
struct PriceRuleRequest<'a> {
    price_rule: &'a PriceRuleInput,
}

#[derive(Deserialize)]
struct PriceRuleEnvelope {
    price_rule: PriceRule,
}

#[derive(Deserialize)]
struct PriceRulesEnvelope {
    price_rules: Vec<PriceRule>,
}

#[derive(Serialize)]
struct NewDiscountCode<'a> {
    code: &'a str,
}

#[derive(Serialize)]
struct DiscountCodeRequest<'a> {
    discount_code: NewDiscountCode<'a>,
}

#[derive(Deserialize)]
struct DiscountCodeEnvelope {
    discount_code: DiscountCode,
}

#[derive(Deserialize)]
struct DiscountCodesEnvelope {
    discount_codes: Vec<DiscountCode>,
}

impl StoreClient {
    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    #[instrument(skip(self, rule), fields(shop = %self.shop(), title = %rule.title))]
    pub async fn create_price_rule(&self, rule: &PriceRuleInput) -> Result<PriceRule, ShopifyError> {
        let envelope: PriceRuleEnvelope = self
            .post("/price_rules.json", &PriceRuleRequest { price_rule: rule })
            .await?;
        Ok(envelope.price_rule)
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn list_price_rules(&self, limit: u32) -> Result<Vec<PriceRule>, ShopifyError> {
        let envelope: PriceRulesEnvelope = self
            .get("/price_rules.json", &[("limit", page_size(limit))])
            .await?;
        Ok(envelope.price_rules)
    }

    /// Delete a price rule together with its discount codes.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the rule does not exist.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn delete_price_rule(&self, price_rule_id: i64) -> Result<(), ShopifyError> {
        self.delete(&format!("/price_rules/{price_rule_id}.json"))
            .await
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn create_discount_code(
        &self,
        price_rule_id: i64,
        code: &str,
    ) -> Result<DiscountCode, ShopifyError> {
        let envelope: DiscountCodeEnvelope = self
            .post(
                &format!("/price_rules/{price_rule_id}/discount_codes.json"),
                &DiscountCodeRequest {
                    discount_code: NewDiscountCode { code },
                },
            )
            .await?;
        Ok(envelope.discount_code)
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn list_discount_codes(
        &self,
        price_rule_id: i64,
    ) -> Result<Vec<DiscountCode>, ShopifyError> {
        let envelope: DiscountCodesEnvelope = self
            .get(
                &format!("/price_rules/{price_rule_id}/discount_codes.json"),
                &[],
            )
            .await?;
        Ok(envelope.discount_codes)
    }

    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the code does not exist.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn delete_discount_code(
        &self,
        price_rule_id: i64,
        discount_code_id: i64,
    ) -> Result<(), ShopifyError> {
        self.delete(&format!(
            "/price_rules/{price_rule_id}/discount_codes/{discount_code_id}.json"
        ))
        .await
    }
}
