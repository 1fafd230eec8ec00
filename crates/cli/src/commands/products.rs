//! Catalog browsing commands.

use clap::Subcommand;
use rust_decimal::Decimal;

use coralcart_core::SortKey;
use coralcart_storefront::Storefront;
use coralcart_storefront::catalog::ALL_CATEGORIES;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products with filters
    List {
        /// Category filter (`all` clears it)
        #[arg(short, long)]
        category: Option<String>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Minimum price, in currency units
        #[arg(long)]
        min_price: Option<Decimal>,

        /// Maximum price, in currency units
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Only active (or only inactive) products
        #[arg(long)]
        active: Option<bool>,

        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Client-side sort: price-asc, price-desc, name-asc, name-desc,
        /// newest
        #[arg(long)]
        sort: Option<SortKey>,
    },
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
    /// List known categories
    Categories,
}

pub async fn run(
    shop: &mut Storefront,
    action: ProductsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProductsAction::List {
            category,
            search,
            min_price,
            max_price,
            active,
            page,
            sort,
        } => {
            shop.catalog
                .filter_by_category(category.as_deref().or(Some(ALL_CATEGORIES)))
                .await?;
            shop.catalog.set_price_range(min_price, max_price).await?;
            shop.catalog.set_availability(active).await?;
            if search.is_some() {
                shop.catalog.search(search.as_deref()).await?;
            }
            if page > 1 {
                shop.catalog.goto_page(page).await?;
            }
            if let Some(sort) = sort {
                shop.catalog.sort(sort);
            }

            let info = shop.catalog.page_info();
            println!(
                "{}",
                coralcart_admin::table::products_table(shop.catalog.products()).render()
            );
            println!(
                "page {} of {} ({} products total)",
                info.page,
                info.pages.max(1),
                info.total
            );
        }
        ProductsAction::Show { id } => {
            let product = shop.catalog.product_detail(&id.into()).await?;
            println!("{}\n", product.title);
            if let Some(description) = &product.description {
                println!("{description}\n");
            }
            println!("price:      {:.2}", product.price);
            println!("stock:      {}", product.stock);
            println!("active:     {}", product.is_active);
            println!("categories: {}", product.categories.join(", "));
            if let Some(image) = product.primary_image() {
                println!("image:      {image}");
            }
        }
        ProductsAction::Categories => {
            for category in shop.catalog.categories().await {
                println!("{category}");
            }
        }
    }
    Ok(())
}
