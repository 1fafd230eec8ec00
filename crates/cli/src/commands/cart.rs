//! Cart commands.

use clap::Subcommand;

use coralcart_admin::table::money;
use coralcart_storefront::Storefront;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart with totals
    Show,
    /// Add a product
    Add {
        /// Product id
        product_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity by a delta (may be negative)
    Update {
        /// Product id
        product_id: String,

        /// Quantity delta, e.g. 1 or -2
        delta: i64,
    },
    /// Remove a line
    Remove {
        /// Product id
        product_id: String,
    },
    /// Empty the cart
    Clear,
}

pub async fn run(
    shop: &mut Storefront,
    action: CartAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = shop.auth.session().clone();

    match action {
        CartAction::Show => {
            if shop.cart.is_empty() {
                println!("Your cart is empty");
                return Ok(());
            }

            for item in shop.cart.items() {
                println!(
                    "{}  {} x{}  {}",
                    item.product_id,
                    item.title,
                    item.quantity,
                    money(item.line_total()),
                );
            }

            let subtotal = shop.cart.subtotal();
            println!();
            println!("subtotal: {}", money(subtotal));
            println!("tax:      {}", money(shop.cart.tax(subtotal)));
            let shipping = shop.cart.shipping(subtotal);
            if shipping.is_zero() {
                println!("shipping: FREE");
            } else {
                println!("shipping: {}", money(shipping));
            }
            println!("total:    {}", money(shop.cart.total()));
        }
        CartAction::Add {
            product_id,
            quantity,
        } => {
            shop.cart.add(&session, &product_id.into(), quantity).await;
            println!("Item added to cart ({} lines)", shop.cart.items().len());
        }
        CartAction::Update { product_id, delta } => {
            shop.cart
                .update_quantity(&session, &product_id.into(), delta)
                .await;
            println!("Quantity updated");
        }
        CartAction::Remove { product_id } => {
            shop.cart.remove(&session, &product_id.into()).await;
            println!("Item removed from cart");
        }
        CartAction::Clear => {
            shop.cart.clear(&session).await;
            println!("Cart cleared");
        }
    }
    Ok(())
}
