//! Session commands.

use clap::Subcommand;

use coralcart_storefront::Storefront;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (at least 6 characters)
        #[arg(short, long)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the signed-in user
    Whoami,
}

pub async fn run(
    shop: &mut Storefront,
    action: AuthAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login { email, password } => {
            let user = shop.auth.login(&email, &password).await?;
            // The cart switches to the server-backed store for the new
            // session.
            let session = shop.auth.session().clone();
            shop.cart.initialize(&session).await;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        AuthAction::Register {
            name,
            email,
            password,
        } => {
            let user = shop.auth.register(&name, &email, &password).await?;
            let session = shop.auth.session().clone();
            shop.cart.initialize(&session).await;
            println!("Welcome, {}! Account created.", user.name);
        }
        AuthAction::Logout => {
            shop.logout();
            println!("Logged out");
        }
        AuthAction::Whoami => match shop.auth.current_user() {
            Some(user) => {
                let role = user
                    .role
                    .map_or_else(|| "customer".to_string(), |r| format!("{r:?}").to_lowercase());
                println!("{} <{}> ({role})", user.name, user.email);
            }
            None => println!("Not signed in"),
        },
    }
    Ok(())
}
