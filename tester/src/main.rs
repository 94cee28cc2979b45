use clap::Parser;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Donation code to embed in the transfer description
    code: String,

    /// Transfer amount in VND
    amount: i64,

    #[arg(long, default_value = "http://127.0.0.1:1111/api/hooks/sepay-payment")]
    url: String,

    #[arg(long, default_value = "test-secret")]
    secret: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let payload = json!({
        "gateway": "MBBank",
        "transactionDate": "2026-01-05 13:37:00",
        "accountNumber": "0123456789",
        "subAccount": null,
        "transferType": "in",
        "transferAmount": args.amount,
        "accumulated": args.amount,
        "content": format!("CT DEN 0123 {} chuyen tien", args.code),
        "referenceCode": "FT26005123456",
        "description": "BankAPINotify"
    });

    let client = reqwest::Client::new();
    let response = client
        .post(&args.url)
        .header("Authorization", format!("Apikey {}", args.secret))
        .json(&payload)
        .send()
        .await
        .unwrap();

    println!("Status: {}", response.status());
    println!("{}", response.text().await.unwrap());
}
