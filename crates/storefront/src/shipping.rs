//! Shipping: carrier rate quotes, selection, labels, tracking.
//!
//! The rate set is ephemeral - it belongs to one destination + package
//! combination and is recomputed whenever the destination changes. The
//! first (cheapest, per the gateway's ordering) rate is selected by
//! default.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use coralcart_core::OrderId;

use crate::gateway::{
    ApiError, CartItem, Destination, Gateway, PackageInfo, ShippingLabel, ShippingRate,
    TrackingInfo,
};

// Package defaults used when products carry no physical data: one pound
// per unit, 12x8x2 inch footprint, floored at the carrier minimums.
const DEFAULT_UNIT_WEIGHT_LBS: i64 = 1;
const MIN_LENGTH_IN: i64 = 12;
const MIN_WIDTH_IN: i64 = 8;
const MIN_HEIGHT_IN: i64 = 2;

/// Errors from shipping operations.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// Rates cannot be quoted without a postal code.
    #[error("please enter a zip code to calculate shipping")]
    MissingPostalCode,

    /// Label creation requires rates to have been calculated first.
    #[error("no shipping rate selected")]
    NoRateSelected,

    /// Rate selection index out of range.
    #[error("no shipping rate at index {0}")]
    InvalidSelection(usize),

    /// Gateway failure.
    #[error("gateway error: {0}")]
    Gateway(#[from] ApiError),
}

/// The shipping-rate engine.
pub struct ShippingService<G> {
    gateway: Arc<G>,
    rates: Vec<ShippingRate>,
    selected: Option<usize>,
    /// The package the current rate set was quoted for; reused when
    /// purchasing the label.
    package: Option<PackageInfo>,
}

impl<G: Gateway> ShippingService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            rates: Vec::new(),
            selected: None,
            package: None,
        }
    }

    /// Quote rates for a package and destination, replacing the current
    /// rate set. The first returned rate is auto-selected.
    ///
    /// # Errors
    ///
    /// Returns an error when the destination has no postal code (no
    /// network call is made) or the gateway fails.
    pub async fn calculate_rates(
        &mut self,
        package: PackageInfo,
        destination: &Destination,
    ) -> Result<&[ShippingRate], ShippingError> {
        if destination.postal_code.trim().is_empty() {
            return Err(ShippingError::MissingPostalCode);
        }

        let rates = self.gateway.shipping_rates(&package, destination).await?;
        info!(count = rates.len(), "quoted shipping rates");

        self.selected = if rates.is_empty() { None } else { Some(0) };
        self.rates = rates;
        self.package = Some(package);
        Ok(&self.rates)
    }

    /// Select a rate by index into the current rate set.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range; the selection is
    /// unchanged.
    pub fn select(&mut self, index: usize) -> Result<(), ShippingError> {
        if index >= self.rates.len() {
            return Err(ShippingError::InvalidSelection(index));
        }
        self.selected = Some(index);
        Ok(())
    }

    /// The currently selected rate, if rates have been calculated.
    #[must_use]
    pub fn selected_rate(&self) -> Option<&ShippingRate> {
        self.rates.get(self.selected?)
    }

    /// The quoted rate set.
    #[must_use]
    pub fn rates(&self) -> &[ShippingRate] {
        &self.rates
    }

    /// Drop the current rate set (the destination changed).
    pub fn reset(&mut self) {
        self.rates.clear();
        self.selected = None;
        self.package = None;
    }

    /// Purchase a label for an order using the selected rate.
    ///
    /// # Errors
    ///
    /// Returns an error when no rate is selected or the gateway fails.
    pub async fn create_label(&self, order_id: &OrderId) -> Result<ShippingLabel, ShippingError> {
        let rate = self.selected_rate().ok_or(ShippingError::NoRateSelected)?;
        let package = self.package.as_ref().ok_or(ShippingError::NoRateSelected)?;
        let label = self
            .gateway
            .create_shipping_label(order_id, rate, package)
            .await?;
        info!(order_id = %order_id, tracking = %label.tracking_number, "shipping label created");
        Ok(label)
    }

    /// Track a shipment by tracking number.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn track(&self, tracking_number: &str) -> Result<TrackingInfo, ApiError> {
        self.gateway.track_shipment(tracking_number).await
    }

    /// Shipments created for an order.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn for_order(&self, order_id: &OrderId) -> Result<Vec<ShippingLabel>, ApiError> {
        self.gateway.order_shipping(order_id).await
    }

    /// Cancel a shipment.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn cancel(&self, shipment_id: &str) -> Result<(), ApiError> {
        self.gateway.cancel_shipment(shipment_id).await
    }
}

/// Estimate the shipment package for a set of cart lines.
///
/// Products do not carry physical dimensions, so every unit is assumed to
/// weigh one pound in a 12x8x2 inch footprint, stacked by quantity and
/// floored at the carrier minimums.
#[must_use]
pub fn package_from_items(items: &[CartItem]) -> PackageInfo {
    let units: i64 = items.iter().map(|item| i64::from(item.quantity)).sum();
    let stacked_height = items
        .iter()
        .map(|item| MIN_HEIGHT_IN * i64::from(item.quantity))
        .max()
        .unwrap_or(MIN_HEIGHT_IN);

    PackageInfo {
        weight_lbs: Decimal::from((units * DEFAULT_UNIT_WEIGHT_LBS).max(1)),
        length_in: Decimal::from(MIN_LENGTH_IN),
        width_in: Decimal::from(MIN_WIDTH_IN),
        height_in: Decimal::from(stacked_height.max(MIN_HEIGHT_IN)),
    }
}
