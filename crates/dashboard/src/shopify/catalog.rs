//! Products, orders, customers and abandoned checkouts.

use serde::Deserialize;

use super::{AbandonedCheckout, Customer, Order, Product, ShopifyError, StoreClient, page_size};

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
struct CustomerEnvelope {
    customer: Customer,
}

#[derive(Deserialize)]
struct CustomersEnvelope {
    customers: Vec<Customer>,
}

#[derive(Deserialize)]
struct CheckoutsEnvelope {
    checkouts: Vec<AbandonedCheckout>,
}

impl StoreClient {
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the product does not exist.
    pub async fn get_product(&self, product_id: i64) -> Result<Product, ShopifyError> {
        let envelope: ProductEnvelope = self
            .get(&format!("/products/{product_id}.json"), &[])
            .await?;
        Ok(envelope.product)
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn list_products(&self, limit: u32) -> Result<Vec<Product>, ShopifyError> {
        let envelope: ProductsEnvelope = self
            .get("/products.json", &[("limit", page_size(limit))])
            .await?;
        Ok(envelope.products)
    }

    /// Orders of any status, newest first.
    ///
    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn list_orders(&self, limit: u32) -> Result<Vec<Order>, ShopifyError> {
        let envelope: OrdersEnvelope = self
            .get(
                "/orders.json",
                &[("status", "any".to_string()), ("limit", page_size(limit))],
            )
            .await?;
        Ok(envelope.orders)
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, ShopifyError> {
        let envelope: OrdersEnvelope = self
            .get(
                &format!("/customers/{customer_id}/orders.json"),
                &[("status", "any".to_string())],
            )
            .await?;
        Ok(envelope.orders)
    }

    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the customer does not exist.
    pub async fn get_customer(&self, customer_id: i64) -> Result<Customer, ShopifyError> {
        let envelope: CustomerEnvelope = self
            .get(&format!("/customers/{customer_id}.json"), &[])
            .await?;
        Ok(envelope.customer)
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn list_customers(&self, limit: u32) -> Result<Vec<Customer>, ShopifyError> {
        let envelope: CustomersEnvelope = self
            .get("/customers.json", &[("limit", page_size(limit))])
            .await?;
        Ok(envelope.customers)
    }

    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn abandoned_checkouts(
        &self,
        limit: u32,
    ) -> Result<Vec<AbandonedCheckout>, ShopifyError> {
        let envelope: CheckoutsEnvelope = self
            .get("/checkouts.json", &[("limit", page_size(limit))])
            .await?;
        Ok(envelope.checkouts)
    }
}
