//! Checkout command: collect the form, optionally quote carrier rates,
//! and place the order.

use clap::Args;

use coralcart_core::{PaymentMethod, ShippingMethod};
use coralcart_storefront::Storefront;
use coralcart_storefront::checkout::{CheckoutForm, CheckoutOutcome};
use coralcart_storefront::gateway::{Address, CardDetails, CustomerInfo, Destination};
use coralcart_storefront::shipping::package_from_items;

use coralcart_admin::table::money;

#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(short, long)]
    pub email: String,

    #[arg(long)]
    pub phone: Option<String>,

    /// Street address
    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub address2: Option<String>,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub zip: String,

    #[arg(long, default_value = "US")]
    pub country: String,

    /// Payment method: card or paypal
    #[arg(long, default_value = "card")]
    pub payment: String,

    /// Card number (required for card payments)
    #[arg(long)]
    pub card_number: Option<String>,

    /// Card expiry, MM/YY
    #[arg(long)]
    pub expiry: Option<String>,

    #[arg(long)]
    pub cvv: Option<String>,

    /// Cardholder name
    #[arg(long)]
    pub card_name: Option<String>,

    /// Shipping method: standard, express or overnight
    #[arg(long, default_value = "standard")]
    pub shipping: String,

    /// Quote carrier rates for the destination before submitting (the
    /// cheapest quote is used for the shipping cost)
    #[arg(long)]
    pub with_rates: bool,
}

fn parse_payment(value: &str) -> Result<PaymentMethod, String> {
    match value {
        "card" => Ok(PaymentMethod::Card),
        "paypal" => Ok(PaymentMethod::Paypal),
        other => Err(format!("unknown payment method: {other}")),
    }
}

fn parse_shipping(value: &str) -> Result<ShippingMethod, String> {
    match value {
        "standard" => Ok(ShippingMethod::Standard),
        "express" => Ok(ShippingMethod::Express),
        "overnight" => Ok(ShippingMethod::Overnight),
        other => Err(format!("unknown shipping method: {other}")),
    }
}

pub async fn run(
    shop: &mut Storefront,
    args: CheckoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let payment_method = parse_payment(&args.payment)?;
    let shipping_method = parse_shipping(&args.shipping)?;

    let card = match (&args.card_number, &args.expiry, &args.cvv, &args.card_name) {
        (Some(number), Some(expiry), Some(cvv), Some(holder_name)) => Some(CardDetails {
            number: number.clone(),
            expiry: expiry.clone(),
            cvv: cvv.clone(),
            holder_name: holder_name.clone(),
        }),
        _ => None,
    };

    if args.with_rates {
        let destination = Destination {
            country: args.country.clone(),
            state: args.state.clone(),
            city: args.city.clone(),
            postal_code: args.zip.clone(),
        };
        let package = package_from_items(shop.cart.items());
        let rates = shop.shipping.calculate_rates(package, &destination).await?;
        for rate in rates {
            println!(
                "{} {} - {} ({} days)",
                rate.carrier_name,
                rate.service_name,
                money(rate.amount),
                rate.estimated_days,
            );
        }
    }

    let form = CheckoutForm {
        customer: CustomerInfo {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            address: Address {
                line1: args.address,
                line2: args.address2,
                city: args.city,
                state: args.state,
                postal_code: args.zip,
                country: args.country,
            },
            billing_address: None,
        },
        payment_method,
        card,
        shipping_method,
    };

    let session = shop.auth.session().clone();
    let outcome = shop
        .checkout
        .place_order(&mut shop.cart, &session, &shop.shipping, &form)
        .await?;

    match outcome {
        CheckoutOutcome::Completed {
            order,
            receipt,
            label,
        } => {
            println!("Order placed successfully!");
            println!("order id: {}", order.id);
            if let Some(summary) = order.summary {
                println!("total:    {}", money(summary.total));
            }
            if let Some(receipt) = receipt {
                println!("payment:  {} ({})", receipt.status, receipt.transaction_id);
            }
            if let Some(label) = label {
                println!("tracking: {}", label.tracking_number);
            }
        }
        CheckoutOutcome::PaymentFailed { order, error } => {
            // The order exists; the user needs its id for support.
            println!(
                "Order created but payment failed. Please contact support with order id: {}",
                order.id
            );
            println!("payment error: {error}");
        }
    }

    Ok(())
}
