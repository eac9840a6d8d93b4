use clap::Parser;
use waitlist::auth::generate_secure_token;

/// Generate a high-entropy admin token for the waitlist service.
#[derive(Parser, Debug)]
#[command(name = "generate-token")]
#[command(about = "Generate an admin bearer token for the waitlist API")]
struct Args {
    /// Print only the raw token, without usage instructions
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    let token = generate_secure_token();

    if args.quiet {
        println!("{token}");
        return;
    }

    println!("Generated admin token:");
    println!();
    println!("ADMIN_TOKEN={token}");
    println!();
    println!("Usage:");
    println!("1. Add the line above to your .env file");
    println!("2. Restart the server");
    println!("3. Authenticate admin requests with it, e.g.:");
    println!("   curl -H \"Authorization: Bearer {token}\" \\");
    println!("        http://localhost:3000/api/emails?stats=true");
    println!();
    println!("Keep this token secret and out of version control.");
}
