//! Order history commands.

use clap::Subcommand;

use coralcart_admin::table::{money, orders_table};
use coralcart_storefront::Storefront;
use coralcart_storefront::gateway::{Gateway, Order};

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List your orders
    Mine,
    /// Show one order
    Show {
        /// Order id
        id: String,
    },
    /// Show the most recently completed order
    Last,
}

fn print_order(order: &Order) {
    println!("order {} ({})", order.id, order.status);
    if let Some(name) = &order.customer_name {
        println!("customer: {name}");
    }
    for line in &order.items {
        println!(
            "  {} x{}  {}",
            line.title,
            line.quantity,
            money(line.price * rust_decimal::Decimal::from(line.quantity)),
        );
    }
    if let Some(summary) = order.summary {
        println!("subtotal: {}", money(summary.subtotal));
        println!("tax:      {}", money(summary.tax));
        println!("shipping: {}", money(summary.shipping));
        println!("total:    {}", money(summary.total));
    }
}

pub async fn run(shop: &Storefront, action: OrdersAction) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = shop.gateway();
    match action {
        OrdersAction::Mine => {
            let orders = gateway.my_orders().await?;
            if orders.is_empty() {
                println!("No orders yet");
            } else {
                println!("{}", orders_table(&orders).render());
            }
        }
        OrdersAction::Show { id } => {
            let order = gateway.get_order(&id.into()).await?;
            print_order(&order);
        }
        OrdersAction::Last => match shop.checkout.last_order() {
            Some(order) => print_order(&order),
            None => println!("No completed order in this profile"),
        },
    }
    Ok(())
}
