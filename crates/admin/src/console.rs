//! The admin console: role-gated CRUD over users, orders and products.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use coralcart_core::{OrderId, OrderStatus, ProductId, UserId};
use coralcart_storefront::auth::Session;
use coralcart_storefront::gateway::{Gateway, Order, Product, ProductDraft, ProductFilters, User};

use crate::error::AdminError;

/// Page size used when listing products for the console.
const PRODUCT_PAGE_SIZE: u32 = 100;

/// Verify that the session belongs to an admin.
///
/// A missing role means "not admin" - only an explicit `admin` role opens
/// the console.
///
/// # Errors
///
/// Returns [`AdminError::NotAuthorized`] for anonymous sessions, users
/// without a role, and users with a non-admin role.
pub fn ensure_admin(session: &Session) -> Result<(), AdminError> {
    if session.user().is_some_and(User::is_admin) {
        Ok(())
    } else {
        Err(AdminError::NotAuthorized)
    }
}

/// Tabular view/edit state over the three admin collections.
///
/// Every mutation reloads the affected list from the gateway before
/// returning, so the cached rows always reflect server state.
pub struct AdminConsole<G> {
    gateway: Arc<G>,
    users: Vec<User>,
    orders: Vec<Order>,
    products: Vec<Product>,
}

impl<G: Gateway> AdminConsole<G> {
    /// Open the console for an admin session.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NotAuthorized`] unless the session's user
    /// carries the `admin` role.
    pub fn open(gateway: Arc<G>, session: &Session) -> Result<Self, AdminError> {
        ensure_admin(session)?;
        Ok(Self {
            gateway,
            users: Vec::new(),
            orders: Vec::new(),
            products: Vec::new(),
        })
    }

    // -- Users --------------------------------------------------------------

    /// Reload and return the user list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn load_users(&mut self) -> Result<&[User], AdminError> {
        self.users = self.gateway.list_users().await?;
        Ok(&self.users)
    }

    /// Update a user's name/role, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn update_user(
        &mut self,
        id: &UserId,
        name: &str,
        role: Option<&str>,
    ) -> Result<(), AdminError> {
        self.gateway.update_user(id, name, role).await?;
        info!(user_id = %id, "user updated");
        self.load_users().await?;
        Ok(())
    }

    /// Delete a user, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn delete_user(&mut self, id: &UserId) -> Result<(), AdminError> {
        self.gateway.delete_user(id).await?;
        info!(user_id = %id, "user deleted");
        self.load_users().await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    // -- Orders -------------------------------------------------------------

    /// Reload and return the order list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn load_orders(&mut self) -> Result<&[Order], AdminError> {
        self.orders = self.gateway.list_orders().await?;
        Ok(&self.orders)
    }

    /// Set an order's status, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn update_order_status(
        &mut self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), AdminError> {
        self.gateway.update_order_status(id, status).await?;
        info!(order_id = %id, %status, "order status updated");
        self.load_orders().await?;
        Ok(())
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    // -- Products -----------------------------------------------------------

    /// Reload and return the product list (first console page).
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn load_products(&mut self) -> Result<&[Product], AdminError> {
        let filters = ProductFilters {
            limit: PRODUCT_PAGE_SIZE,
            ..ProductFilters::default()
        };
        self.products = self.gateway.list_products(&filters).await?.products;
        Ok(&self.products)
    }

    /// Create a product, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn create_product(&mut self, draft: &ProductDraft) -> Result<Product, AdminError> {
        let product = self.gateway.create_product(draft).await?;
        info!(product_id = %product.id, "product created");
        self.load_products().await?;
        Ok(product)
    }

    /// Update a product, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn update_product(
        &mut self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), AdminError> {
        self.gateway.update_product(id, draft).await?;
        info!(product_id = %id, "product updated");
        self.load_products().await?;
        Ok(())
    }

    /// Delete a product, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn delete_product(&mut self, id: &ProductId) -> Result<(), AdminError> {
        self.gateway.delete_product(id).await?;
        info!(product_id = %id, "product deleted");
        self.load_products().await?;
        Ok(())
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

/// Parse the console's comma-separated list inputs (categories, image
/// URLs) into a cleaned vector.
#[must_use]
pub fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Build a product draft from the console's form fields.
#[must_use]
pub fn product_draft(
    title: &str,
    description: Option<&str>,
    price: Decimal,
    categories: &str,
    images: &str,
    stock: i64,
    is_active: bool,
) -> ProductDraft {
    ProductDraft {
        title: title.to_string(),
        description: description.map(ToString::to_string),
        price,
        images: split_csv(images),
        categories: split_csv(categories),
        stock,
        is_active,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coralcart_core::UserRole;
    use secrecy::SecretString;

    fn session_with_role(role: Option<UserRole>) -> Session {
        let user = User {
            id: UserId::new("u1"),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            role,
        };
        Session::authenticated(user, SecretString::from("tok"))
    }

    #[test]
    fn test_admin_role_required() {
        assert!(ensure_admin(&session_with_role(Some(UserRole::Admin))).is_ok());
    }

    #[test]
    fn test_customer_denied() {
        assert!(matches!(
            ensure_admin(&session_with_role(Some(UserRole::Customer))),
            Err(AdminError::NotAuthorized)
        ));
    }

    #[test]
    fn test_missing_role_denied() {
        // No role is NOT admin.
        assert!(matches!(
            ensure_admin(&session_with_role(None)),
            Err(AdminError::NotAuthorized)
        ));
    }

    #[test]
    fn test_anonymous_denied() {
        assert!(matches!(
            ensure_admin(&Session::anonymous()),
            Err(AdminError::NotAuthorized)
        ));
    }

    #[test]
    fn test_split_csv() {
        assert_eq!(split_csv("kitchen, gifts ,, books"), vec!["kitchen", "gifts", "books"]);
        assert!(split_csv("  ").is_empty());
    }

    #[test]
    fn test_product_draft_splits_lists() {
        let draft = product_draft(
            "Mug",
            Some("A mug"),
            Decimal::new(999, 2),
            "kitchen,gifts",
            "a.jpg, b.jpg",
            10,
            true,
        );
        assert_eq!(draft.categories, vec!["kitchen", "gifts"]);
        assert_eq!(draft.images, vec!["a.jpg", "b.jpg"]);
    }
}
