//! Admin console commands. All of these require an admin account.

use clap::Subcommand;
use rust_decimal::Decimal;

use coralcart_admin::console::{AdminConsole, product_draft};
use coralcart_admin::table::{orders_table, products_table, users_table};
use coralcart_core::OrderStatus;
use coralcart_storefront::Storefront;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List all users
    List,
    /// Update a user's name or role
    Update {
        /// User id
        id: String,

        #[arg(short, long)]
        name: String,

        /// Role: admin or customer
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Delete a user
    Delete {
        /// User id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List all orders
    List,
    /// Set an order's status
    Status {
        /// Order id
        id: String,

        /// pending, processing, shipped, delivered or cancelled
        status: String,
    },
}

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List the catalog
    List,
    /// Create a product
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Price in currency units
        #[arg(short, long)]
        price: Decimal,

        /// Comma-separated categories
        #[arg(short, long, default_value = "")]
        categories: String,

        /// Comma-separated image URLs
        #[arg(short, long, default_value = "")]
        images: String,

        #[arg(long, default_value_t = 0)]
        stock: i64,

        /// Whether the product is immediately purchasable
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },
}

fn parse_status(value: &str) -> Result<OrderStatus, String> {
    OrderStatus::ALL
        .into_iter()
        .find(|status| status.as_str() == value)
        .ok_or_else(|| format!("unknown order status: {value}"))
}

pub async fn run(shop: &Storefront, action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut console = AdminConsole::open(shop.gateway(), shop.auth.session())?;

    match action {
        AdminAction::Users { action } => match action {
            UsersAction::List => {
                let users = console.load_users().await?;
                println!("{}", users_table(users).render());
            }
            UsersAction::Update { id, name, role } => {
                console
                    .update_user(&id.into(), &name, role.as_deref())
                    .await?;
                println!("User updated");
            }
            UsersAction::Delete { id } => {
                console.delete_user(&id.into()).await?;
                println!("User deleted");
            }
        },
        AdminAction::Orders { action } => match action {
            OrdersAction::List => {
                let orders = console.load_orders().await?;
                println!("{}", orders_table(orders).render());
            }
            OrdersAction::Status { id, status } => {
                let status = parse_status(&status)?;
                console.update_order_status(&id.into(), status).await?;
                println!("Order status updated to {status}");
            }
        },
        AdminAction::Products { action } => match action {
            ProductsAction::List => {
                let products = console.load_products().await?;
                println!("{}", products_table(products).render());
            }
            ProductsAction::Create {
                title,
                description,
                price,
                categories,
                images,
                stock,
                active,
            } => {
                let draft = product_draft(
                    &title,
                    description.as_deref(),
                    price,
                    &categories,
                    &images,
                    stock,
                    active,
                );
                let product = console.create_product(&draft).await?;
                println!("Product created: {}", product.id);
            }
            ProductsAction::Delete { id } => {
                console.delete_product(&id.into()).await?;
                println!("Product deleted");
            }
        },
    }
    Ok(())
}
