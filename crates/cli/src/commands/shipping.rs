//! Shipping commands.

use clap::Subcommand;

use coralcart_admin::table::money;
use coralcart_storefront::Storefront;
use coralcart_storefront::gateway::Destination;
use coralcart_storefront::shipping::package_from_items;

#[derive(Subcommand)]
pub enum ShippingAction {
    /// Quote carrier rates for the current cart
    Rates {
        /// Destination zip/postal code
        #[arg(short, long)]
        zip: String,

        #[arg(long, default_value = "US")]
        country: String,

        #[arg(long, default_value = "")]
        state: String,

        #[arg(long, default_value = "")]
        city: String,
    },
    /// Track a shipment
    Track {
        /// Tracking number
        tracking_number: String,
    },
    /// List shipments for an order
    ForOrder {
        /// Order id
        order_id: String,
    },
}

pub async fn run(
    shop: &mut Storefront,
    action: ShippingAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ShippingAction::Rates {
            zip,
            country,
            state,
            city,
        } => {
            let destination = Destination {
                country,
                state,
                city,
                postal_code: zip,
            };
            let package = package_from_items(shop.cart.items());
            let rates = shop.shipping.calculate_rates(package, &destination).await?;

            if rates.is_empty() {
                println!("No shipping options available");
                return Ok(());
            }
            for (index, rate) in rates.iter().enumerate() {
                let marker = if index == 0 { "*" } else { " " };
                println!(
                    "{marker} [{index}] {} {} - {} ({} business days)",
                    rate.carrier_name,
                    rate.service_name,
                    money(rate.amount),
                    rate.estimated_days,
                );
            }
        }
        ShippingAction::Track { tracking_number } => {
            let info = shop.shipping.track(&tracking_number).await?;
            println!("{}: {}", info.tracking_number, info.status);
            if let Some(eta) = info.estimated_delivery {
                println!("estimated delivery: {eta}");
            }
        }
        ShippingAction::ForOrder { order_id } => {
            let labels = shop.shipping.for_order(&order_id.into()).await?;
            if labels.is_empty() {
                println!("No shipments for this order");
            }
            for label in labels {
                println!("{}  tracking {}", label.shipment_id, label.tracking_number);
            }
        }
    }
    Ok(())
}
