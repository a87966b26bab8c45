//! Command-line client for a running herald instance
//!
//! Submits emails and looks up what has been sent over the gRPC interface.

use clap::{Parser, Subcommand};
use herald_rpc::proto::{
    self, EmailServiceClient, FindEmailByIdRequest, FindEmailsByReceiverRequest,
    SendEmailsRequest,
};

/// Talk to a herald instance over gRPC
#[derive(Parser, Debug)]
#[command(name = "heraldctl")]
#[command(about = "Send and look up emails through herald", long_about = None)]
#[command(version)]
struct Cli {
    /// Address of the herald gRPC server
    #[arg(short, long, default_value = "http://127.0.0.1:5001")]
    endpoint: String,

    /// Print responses as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit an email
    Send {
        /// Recipient address, may be given more than once
        #[arg(short, long = "to", required = true)]
        to: Vec<String>,
        #[arg(short, long)]
        subject: String,
        #[arg(short, long)]
        body: String,
        #[arg(long, default_value = "text/plain")]
        content_type: String,
    },
    /// Look up a sent email by its identifier
    Get {
        id: String,
    },
    /// List emails sent to a receiver, newest first
    List {
        receiver: String,
        #[arg(short, long, default_value_t = 1)]
        page: i64,
        #[arg(short, long, default_value_t = 10)]
        size: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut client = EmailServiceClient::connect(cli.endpoint.clone()).await?;

    match cli.command {
        Commands::Send {
            to,
            subject,
            body,
            content_type,
        } => {
            let response = client
                .send_emails(SendEmailsRequest {
                    to,
                    body,
                    subject,
                    content_type,
                })
                .await?
                .into_inner();

            println!("{}", response.status);
        }
        Commands::Get { id } => {
            let response = client
                .find_email_by_id(FindEmailByIdRequest { email_uuid: id })
                .await?
                .into_inner();

            match response.email {
                Some(email) => print_email(&email, cli.json)?,
                None => println!("No email returned"),
            }
        }
        Commands::List {
            receiver,
            page,
            size,
        } => {
            let response = client
                .find_emails_by_receiver(FindEmailsByReceiverRequest {
                    receiver_email: receiver,
                    page,
                    size,
                })
                .await?
                .into_inner();

            if cli.json {
                let emails = response
                    .emails
                    .iter()
                    .map(email_json)
                    .collect::<Vec<_>>();
                let listing = serde_json::json!({
                    "totalCount": response.total_count,
                    "totalPages": response.total_pages,
                    "page": response.page,
                    "size": response.size,
                    "hasMore": response.has_more,
                    "emails": emails,
                });
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                println!(
                    "Page {} of {} ({} emails total)",
                    response.page, response.total_pages, response.total_count
                );
                for email in &response.emails {
                    println!();
                    print_email(email, false)?;
                }
                if response.has_more {
                    println!("\nMore results on page {}", response.page + 1);
                }
            }
        }
    }

    Ok(())
}

fn email_json(email: &proto::Email) -> serde_json::Value {
    serde_json::json!({
        "emailId": email.email_id,
        "from": email.from,
        "to": email.to,
        "subject": email.subject,
        "body": email.body,
        "contentType": email.content_type,
        "createdAt": created_at(email),
    })
}

fn created_at(email: &proto::Email) -> Option<String> {
    email
        .created_at
        .as_ref()
        .and_then(proto::datetime)
        .map(|at| at.to_rfc3339())
}

fn print_email(email: &proto::Email, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&email_json(email))?);
        return Ok(());
    }

    println!("ID:           {}", email.email_id);
    println!("From:         {}", email.from);
    println!("To:           {}", email.to.join(", "));
    println!("Subject:      {}", email.subject);
    println!("Content-Type: {}", email.content_type);
    if let Some(at) = created_at(email) {
        println!("Created:      {at}");
    }
    println!("\n{}", email.body);

    Ok(())
}
