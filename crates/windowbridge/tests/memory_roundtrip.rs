//! End-to-end tests: a `MessageServer` and several `MessageClient`s talking
//! over the in-process memory transport.

#![cfg(feature = "memory")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use windowbridge::prelude::*;
use windowbridge::TransportError;

/// Window names mapped to the channel each window was connected on.
#[derive(Default)]
struct Windows(Mutex<HashMap<String, ChannelId>>);

impl Windows {
    fn open(&self, name: &str, channel: ChannelId) {
        self.0.lock().unwrap().insert(name.into(), channel);
    }

    fn close(&self, name: &str) {
        self.0.lock().unwrap().remove(name);
    }
}

impl WindowResolver for Windows {
    type Window = String;
    type WindowId = String;
    type Channel = ChannelId;

    fn sender_by_window(&self, window: &String) -> Option<ChannelId> {
        self.0.lock().unwrap().get(window).copied()
    }

    fn window_by_sender(&self, channel: &ChannelId) -> Option<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|(_, c)| *c == channel)
            .map(|(w, _)| w.clone())
    }

    fn window_by_id(&self, id: &String) -> Option<String> {
        self.0.lock().unwrap().contains_key(id).then(|| id.clone())
    }
}

struct App {
    server: MessageServer<MemoryBackend, Windows>,
    backend: Arc<MemoryBackend>,
    clients: Vec<(MessageClient<MemoryClient>, Arc<Mutex<Vec<Value>>>)>,
}

/// Opens one window per name; every client records `"refresh"` events.
fn app(names: &[&str]) -> App {
    let backend = Arc::new(MemoryBackend::default());
    let mut server =
        MessageServer::new(WindowRegistry::new(), Windows::default(), Arc::clone(&backend));
    let mut clients = Vec::new();

    for name in names {
        let transport = Arc::new(backend.connect());
        server.resolver().open(name, transport.id());
        server.registry_mut().occupy(name.to_string());

        let client = MessageClient::new(transport);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        client.on("refresh", move |data: &Value| {
            sink.lock().unwrap().push(data.clone())
        });
        clients.push((client, seen));
    }

    App {
        server,
        backend,
        clients,
    }
}

fn pump_all(app: &App) {
    for (client, _) in &app.clients {
        client.transport().pump();
    }
}

fn counts(app: &App) -> Vec<usize> {
    app.clients
        .iter()
        .map(|(_, seen)| seen.lock().unwrap().len())
        .collect()
}

#[test]
fn test_broadcast_except_reaches_all_but_sender() {
    let app = app(&["main", "prefs", "log"]);
    let prefs = app.clients[1].0.transport().id();

    let fanout = app.server.broadcast_except(&prefs, "refresh", &json!(1));
    pump_all(&app);

    assert!(fanout.is_complete());
    assert_eq!(counts(&app), vec![1, 0, 1]);
}

#[test]
fn test_client_request_server_reply() {
    let app = app(&["main", "prefs"]);
    let server = &app.server;

    // The server answers every "ping" on the channel it came from.
    let replies = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&replies);
    server.on("ping", move |event: &BackendEvent<ChannelId>| {
        sink.lock().unwrap().push(event.sender);
    });

    app.clients[1].0.send("ping", &json!({ "n": 1 })).unwrap();
    assert_eq!(app.backend.pump(), 1);

    let sender = replies.lock().unwrap()[0];
    assert_eq!(server.window_by_sender(&sender), Some("prefs".to_string()));

    server.send(&sender, "refresh", &json!("pong")).unwrap();
    pump_all(&app);
    assert_eq!(counts(&app), vec![0, 1]);
}

#[test]
fn test_closed_window_is_skipped_by_broadcast() {
    let mut app = app(&["main", "prefs"]);

    // The prefs window closes: the resolver forgets it, the slot is
    // released, and the client end goes away.
    app.server.resolver().close("prefs");
    let index = app.server.registry().position(&"prefs".to_string()).unwrap();
    app.server.registry_mut().release(index).unwrap();
    let (closed, _) = app.clients.pop().unwrap();
    drop(closed);

    let fanout = app.server.broadcast("refresh", &Value::Null);

    assert_eq!(fanout.attempted(), 1);
    assert_eq!(
        app.server.registry().get_first_available_placeholder_index(),
        Some(index)
    );
}

#[test]
fn test_send_to_stale_channel_surfaces_transport_error() {
    let mut app = app(&["main", "prefs"]);
    let stale = app.clients[1].0.transport().id();
    app.clients.pop();

    // The registry and resolver still think prefs is open.
    let fanout = app.server.broadcast("refresh", &Value::Null);

    assert_eq!(fanout.delivered, 1);
    assert_eq!(fanout.failures.len(), 1);
    assert_eq!(fanout.failures[0].0, stale);
    assert!(matches!(
        fanout.failures[0].1,
        TransportError::ChannelClosed(c) if c == stale
    ));
}

#[test]
fn test_canned_error_message_arrives_typed() {
    let app = app(&["main"]);
    let (client, _) = &app.clients[0];
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    client.on_canned(move |msg: windowbridge::ErrorMessage| {
        sink.lock().unwrap().push(msg.backend_error);
    });

    let error = BackendError::new("EACCES", json!({ "path": "/etc" }), "denied");
    let sent = app
        .server
        .send_backend_error_message_by_window(&"main".to_string(), &error)
        .unwrap();
    pump_all(&app);

    assert!(sent);
    assert_eq!(*errors.lock().unwrap(), vec![error]);
}
