//! A shared notice board: every window can post, every other window sees
//! the post, and the poster gets a confirmation notice.
//!
//! Runs entirely in-process on the memory transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::mpsc;
use windowbridge::prelude::*;
use windowbridge::init_tracing;

// ---------------------------------------------------------------------------
// Window bookkeeping
// ---------------------------------------------------------------------------

/// Window titles mapped to their channel.
#[derive(Default)]
struct Windows(Mutex<HashMap<String, ChannelId>>);

impl Windows {
    fn open(&self, title: &str, channel: ChannelId) {
        self.lock().insert(title.into(), channel);
    }

    fn close(&self, title: &str) {
        self.lock().remove(title);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ChannelId>> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl WindowResolver for Windows {
    type Window = String;
    type WindowId = String;
    type Channel = ChannelId;

    fn sender_by_window(&self, window: &String) -> Option<ChannelId> {
        self.lock().get(window).copied()
    }

    fn window_by_sender(&self, channel: &ChannelId) -> Option<String> {
        self.lock()
            .iter()
            .find(|(_, c)| *c == channel)
            .map(|(w, _)| w.clone())
    }

    fn window_by_id(&self, id: &String) -> Option<String> {
        self.lock().contains_key(id).then(|| id.clone())
    }
}

type Server = MessageServer<MemoryBackend, Windows>;

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Opens a window: connects it, registers it, and wires up its listeners.
fn open_window(
    server: &mut Server,
    backend: &MemoryBackend,
    title: &str,
) -> MessageClient<MemoryClient> {
    let transport = Arc::new(backend.connect());
    server.resolver().open(title, transport.id());
    let slot = server.registry_mut().occupy(title.to_string());
    tracing::info!(title, %slot, channel = %transport.id(), "window opened");

    let client = MessageClient::new(transport);
    let me = title.to_string();
    client.on("posted", move |data: &Value| {
        println!("[{me}] new post: {}", data["text"]);
    });
    let me = title.to_string();
    client.on_canned(move |notice: NoticeMessage| {
        println!("[{me}] notice: {} ({})", notice.title, notice.description);
    });
    client
}

fn close_window(server: &mut Server, client: MessageClient<MemoryClient>, title: &str) {
    server.resolver().close(title);
    if let Some(slot) = server.registry().position(&title.to_string()) {
        if let Err(e) = server.registry_mut().release(slot) {
            tracing::warn!(title, error = %e, "release failed");
        }
    }
    drop(client);
    tracing::info!(title, "window closed");
}

// ---------------------------------------------------------------------------
// Backend handling
// ---------------------------------------------------------------------------

type Post = (ChannelId, Value);

/// Listener that hands every inbound post to the board loop.
///
/// Returns whether the post was queued; a stopped loop is logged.
fn forward_posts(
    tx: mpsc::UnboundedSender<Post>,
) -> impl Fn(&BackendEvent<ChannelId>) -> bool + Send + Sync + 'static {
    move |event| {
        let queued = tx.send((event.sender, event.data.clone())).is_ok();
        if !queued {
            tracing::warn!(sender = %event.sender, "post dropped, board loop has stopped");
        }
        queued
    }
}

/// Delivers one inbound frame and answers every post it produced.
async fn serve_one(
    server: &Server,
    backend: &MemoryBackend,
    posts: &mut mpsc::UnboundedReceiver<Post>,
) -> Result<(), WindowBridgeError> {
    backend.deliver_next().await?;

    while let Ok((sender, data)) = posts.try_recv() {
        let author = server
            .window_by_sender(&sender)
            .unwrap_or_else(|| "unknown".into());
        let text = data["text"].as_str().unwrap_or_default();

        if text.is_empty() {
            let error = BackendError::new("EMPTY", json!({ "author": author }), "post is empty");
            server.send_backend_error_message(&sender, &error)?;
            continue;
        }

        let fanout = server.broadcast_except(
            &sender,
            "posted",
            &json!({ "author": author, "text": text }),
        );
        for (channel, e) in &fanout.failures {
            tracing::warn!(%channel, error = %e, "post not delivered");
        }

        let notice = NoticeMessage::new(
            "icon-check",
            "Posted",
            format!("seen by {} window(s)", fanout.delivered),
        );
        server.send_backend_notice_message(&sender, &notice)?;
    }
    Ok(())
}

fn pump_windows(windows: &[&MessageClient<MemoryClient>]) {
    for window in windows {
        window.transport().pump();
    }
}

#[tokio::main]
async fn main() -> Result<(), WindowBridgeError> {
    init_tracing("notice_board=info,windowbridge=info");

    let backend = Arc::new(MemoryBackend::default());
    let mut server = MessageServer::new(
        WindowRegistry::new(),
        Windows::default(),
        Arc::clone(&backend),
    );

    let (tx, mut posts) = mpsc::unbounded_channel();
    let forward = forward_posts(tx);
    server.on("post", move |event| {
        forward(event);
    });

    let editor = open_window(&mut server, &backend, "editor");
    let preview = open_window(&mut server, &backend, "preview");
    let console = open_window(&mut server, &backend, "console");

    editor.send("post", &json!({ "text": "hello from the editor" }))?;
    serve_one(&server, &backend, &mut posts).await?;
    pump_windows(&[&editor, &preview, &console]);

    close_window(&mut server, console, "console");
    let inspector = open_window(&mut server, &backend, "inspector");

    preview.send("post", &json!({ "text": "console left, inspector joined" }))?;
    serve_one(&server, &backend, &mut posts).await?;
    pump_windows(&[&editor, &preview, &inspector]);

    inspector.send("post", &json!({ "text": "" }))?;
    serve_one(&server, &backend, &mut posts).await?;
    inspector.on_canned(|msg: windowbridge::ErrorMessage| {
        println!("[inspector] error: {}", msg.backend_error);
    });
    pump_windows(&[&editor, &preview, &inspector]);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(sender: u64, text: &str) -> BackendEvent<ChannelId> {
        BackendEvent {
            sender: ChannelId::new(sender),
            data: json!({ "text": text }),
        }
    }

    #[test]
    fn test_forward_posts_queues_post() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let forward = forward_posts(tx);

        assert!(forward(&post(3, "hi")));
        assert_eq!(rx.try_recv().unwrap(), (ChannelId::new(3), json!({ "text": "hi" })));
    }

    #[test]
    fn test_forward_posts_after_loop_stopped_reports_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let forward = forward_posts(tx);
        drop(rx);

        assert!(!forward(&post(3, "late")));
    }

    #[tokio::test]
    async fn test_serve_one_broadcasts_to_other_windows() {
        let backend = Arc::new(MemoryBackend::default());
        let mut server =
            MessageServer::new(WindowRegistry::new(), Windows::default(), Arc::clone(&backend));
        let (tx, mut posts) = mpsc::unbounded_channel();
        let forward = forward_posts(tx);
        server.on("post", move |event| {
            forward(event);
        });

        let author = open_window(&mut server, &backend, "author");
        let reader = open_window(&mut server, &backend, "reader");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        reader.on("posted", move |data: &Value| sink.lock().unwrap().push(data.clone()));

        author.send("post", &json!({ "text": "hello" })).unwrap();
        serve_one(&server, &backend, &mut posts).await.unwrap();

        assert_eq!(reader.transport().pump(), 1);
        // The author only gets the confirmation notice.
        assert_eq!(author.transport().pump(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!({ "author": "author", "text": "hello" })]
        );
    }
}
