//! Plain-text table rendering for console output.
//!
//! The admin views are tabular; this renders rows with padded columns so
//! the CLI output lines up. Column definitions double as the place where
//! each view declares what it shows.

use rust_decimal::Decimal;

use coralcart_storefront::gateway::{Order, Product, User};

/// Column definition for a rendered table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Display label for the column header.
    pub label: String,
}

impl TableColumn {
    /// Create a new column.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

/// A fully materialized table: columns plus stringified rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<TableColumn>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with the given columns.
    #[must_use]
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with empty cells; extra cells
    /// are dropped.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }

    /// Render with space-padded columns and a separator under the header.
    #[must_use]
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.label.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        push_line(
            &mut out,
            &widths,
            self.columns.iter().map(|c| c.label.as_str()),
        );
        let separators: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &widths, separators.iter().map(String::as_str));
        for row in &self.rows {
            push_line(&mut out, &widths, row.iter().map(String::as_str));
        }
        out
    }
}

fn push_line<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let line: Vec<String> = widths
        .iter()
        .zip(cells)
        .map(|(width, cell)| {
            let width = *width;
            format!("{cell:<width$}")
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// The users view.
#[must_use]
pub fn users_table(users: &[User]) -> Table {
    let mut table = Table::new(vec![
        TableColumn::new("ID"),
        TableColumn::new("Name"),
        TableColumn::new("Email"),
        TableColumn::new("Role"),
    ]);
    for user in users {
        table.push_row(vec![
            user.id.to_string(),
            user.name.clone(),
            user.email.clone(),
            user.role
                .map_or_else(|| "-".to_string(), |role| format!("{role:?}").to_lowercase()),
        ]);
    }
    table
}

/// The orders view.
#[must_use]
pub fn orders_table(orders: &[Order]) -> Table {
    let mut table = Table::new(vec![
        TableColumn::new("ID"),
        TableColumn::new("Customer"),
        TableColumn::new("Status"),
        TableColumn::new("Items"),
        TableColumn::new("Total"),
    ]);
    for order in orders {
        table.push_row(vec![
            order.id.to_string(),
            order.customer_name.clone().unwrap_or_default(),
            order.status.to_string(),
            order.items.len().to_string(),
            order
                .summary
                .map_or_else(String::new, |s| format!("{:.2}", s.total)),
        ]);
    }
    table
}

/// The products view.
#[must_use]
pub fn products_table(products: &[Product]) -> Table {
    let mut table = Table::new(vec![
        TableColumn::new("ID"),
        TableColumn::new("Title"),
        TableColumn::new("Price"),
        TableColumn::new("Stock"),
        TableColumn::new("Active"),
        TableColumn::new("Categories"),
    ]);
    for product in products {
        table.push_row(vec![
            product.id.to_string(),
            product.title.clone(),
            format!("{:.2}", product.price),
            product.stock.to_string(),
            product.is_active.to_string(),
            product.categories.join(", "),
        ]);
    }
    table
}

/// Format a decimal amount for console display.
#[must_use]
pub fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
