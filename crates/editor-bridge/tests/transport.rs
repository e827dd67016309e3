use std::cell::RefCell;

use vayal_editor_bridge::{BridgeError, Mailbox, Message, MessageSink, ScriptSink};

#[test]
fn mailbox_clones_share_one_fifo_queue() {
    let sender = Mailbox::new();
    let receiver = sender.clone();

    sender.post(&Message::Ready).unwrap();
    sender.post(&Message::change("<p>a</p>")).unwrap();

    assert_eq!(receiver.len(), 2);
    assert_eq!(
        receiver.take().unwrap(),
        vec![Message::Ready, Message::change("<p>a</p>")]
    );
    assert!(sender.is_empty());
}

#[test]
fn script_sink_calls_the_surface_receiver() {
    let scripts = RefCell::new(Vec::new());
    let sink = ScriptSink::new(|js: &str| {
        scripts.borrow_mut().push(js.to_string());
        Ok(())
    });

    sink.post(&Message::insert_image("u.png")).unwrap();

    assert_eq!(
        scripts.into_inner(),
        vec![r#"window.__VAYAL_BRIDGE__.receive({"type":"insert-image","url":"u.png"});"#.to_string()]
    );
}

#[test]
fn script_sink_surfaces_evaluation_failures() {
    let sink = ScriptSink::new(|_js: &str| Err(BridgeError::Transport("webview gone".into())));

    let err = sink.post(&Message::insert_image("u.png")).unwrap_err();
    assert!(matches!(err, BridgeError::Transport(message) if message == "webview gone"));
}
