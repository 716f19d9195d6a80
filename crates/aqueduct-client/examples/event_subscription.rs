/*
[INPUT]:  AQUEDUCT_HOST / AQUEDUCT_API_KEY_ID and an account address
[OUTPUT]: Account notifications printed as they arrive
[POS]:    Examples - socket event subscription
[UPDATE]: When the subscription API changes
*/

use aqueduct_client::*;
use tokio::time::{Duration, sleep};

/// Example: subscribe to account notifications, then unsubscribe
#[tokio::main]
async fn main() -> Result<()> {
    let account = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0x0000000000000000000000000000000000000000".to_string());

    let client = Aqueduct::from_env()?;
    println!("socket: {}", client.socket_url()?);

    let subscription = client.events().subscribe_event::<AccountNotification, _>(
        &AccountParams::new(account.as_str()),
        |data| {
            println!("[{}] {}", data.notification.date_created, data.notification.label);
        },
    )?;
    println!("subscribed to {}", subscription.channel());

    sleep(Duration::from_secs(30)).await;

    // later
    subscription.unsubscribe()?;
    client.close().await;
    Ok(())
}
