// Portcullis CLI entry point

use portcullis_cli::{output, CommandRouter};

#[tokio::main]
async fn main() {
    match CommandRouter::route().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            output::print_error(&err.user_message());
            std::process::exit(err.exit_code());
        }
    }
}
