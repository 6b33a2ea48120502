//! Terminal chat client.
//!
//! Usage: `cable-chat <page-url>` or set `CHAT_PAGE_URL`, e.g.
//! `cable-chat "http://localhost:9000/?user=alice"`. Each line read from
//! stdin is typed into the message box and sent. The messages container is
//! printed whenever it changes.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use cable_gateway::client::{ChatPage, ElementId, EventLoop, PageEvent, transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let page_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CHAT_PAGE_URL").ok())
        .context("usage: cable-chat <page-url> (or set CHAT_PAGE_URL)")?;

    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let mut page = ChatPage::bootstrap(&page_url, outbox_tx)?;
    let mut incoming = transport::connect(page.cable_url(), outbox_rx)
        .await
        .with_context(|| format!("connecting to {}", page.cable_url()))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut events = EventLoop::new();
    let mut last_rendered = page.container().to_string();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) => {
                    events.post(PageEvent::Input(text));
                    events.post(PageEvent::Click(ElementId::Send));
                }
                None => break,
            },
            frame = incoming.recv() => match frame {
                Some(message) => events.post(PageEvent::Server(message)),
                None => {
                    tracing::warn!("connection closed by server");
                    break;
                }
            },
        }

        events.run_until_idle(|event, _| page.dispatch(event))?;

        let rendered = page.container().to_string();
        if rendered != last_rendered {
            println!("{rendered}");
            last_rendered = rendered;
        }
    }

    Ok(())
}
