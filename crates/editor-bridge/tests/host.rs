use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use vayal_editor_bridge::{
    BridgeConfig, BridgeError, EditorHost, HostEvent, Mailbox, Message, MessageSink,
};

const READY: &str = r#"{"type":"ready"}"#;

fn host(config: BridgeConfig) -> (EditorHost<Mailbox>, Mailbox) {
    let to_surface = Mailbox::new();
    let host = EditorHost::new(to_surface.clone(), config, "<p>stored</p>");
    (host, to_surface)
}

fn ready_host(config: BridgeConfig) -> (EditorHost<Mailbox>, Mailbox) {
    let (mut host, to_surface) = host(config);
    host.receive(READY).unwrap();
    (host, to_surface)
}

fn change(html: &str) -> String {
    Message::change(html).encode().unwrap()
}

/// Delivers into a mailbox after failing a set number of posts.
struct FlakySink {
    inner: Mailbox,
    failures: Cell<usize>,
}

impl MessageSink for FlakySink {
    fn post(&self, message: &Message) -> Result<(), BridgeError> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(BridgeError::Transport("webview busy".into()));
        }
        self.inner.post(message)
    }
}

#[test]
fn draft_starts_as_the_stored_document() {
    let (host, _) = host(BridgeConfig::default());
    assert_eq!(host.draft(), "<p>stored</p>");
    assert_eq!(host.document_version(), 0);
    assert!(!host.is_ready());
}

#[test]
fn change_messages_replace_the_draft_in_order() {
    let (mut host, _) = ready_host(BridgeConfig::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    host.on_change(move |html| sink.borrow_mut().push(html.to_string()))
        .unwrap();

    for html in ["<p>a</p>", "<p>ab</p>", "<p>abc</p>"] {
        assert_eq!(host.receive(&change(html)).unwrap(), HostEvent::Changed);
    }

    assert_eq!(host.draft(), "<p>abc</p>");
    assert_eq!(*seen.borrow(), vec!["<p>a</p>", "<p>ab</p>", "<p>abc</p>"]);
}

#[test]
fn change_handler_registers_once() {
    let (mut host, _) = host(BridgeConfig::default());
    host.on_change(|_| {}).unwrap();

    let err = host.on_change(|_| {}).unwrap_err();

    assert!(matches!(err, BridgeError::HandlerAlreadyRegistered));
}

#[test]
fn change_without_a_handler_still_updates_the_draft() {
    let (mut host, _) = ready_host(BridgeConfig::default());
    host.receive(&change("<p>new</p>")).unwrap();
    assert_eq!(host.draft(), "<p>new</p>");
}

#[test]
fn images_wait_for_ready_and_flush_in_order() {
    let (mut host, to_surface) = host(BridgeConfig::default());

    assert!(!host.send_insert_image("one.png").unwrap());
    assert!(!host.send_insert_image("two.png").unwrap());
    assert_eq!(host.queued(), 2);
    assert!(to_surface.is_empty());

    let event = host.receive(READY).unwrap();

    assert_eq!(event, HostEvent::Ready { flushed: 2 });
    assert_eq!(host.queued(), 0);
    assert_eq!(
        to_surface.take().unwrap(),
        vec![Message::insert_image("one.png"), Message::insert_image("two.png")]
    );

    assert!(host.send_insert_image("three.png").unwrap());
    assert_eq!(
        to_surface.take().unwrap(),
        vec![Message::insert_image("three.png")]
    );
}

#[test]
fn queueing_can_be_disabled() {
    let config = BridgeConfig {
        queue_until_ready: false,
        ..BridgeConfig::default()
    };
    let (mut host, to_surface) = host(config);

    assert!(host.send_insert_image("now.png").unwrap());
    assert_eq!(to_surface.len(), 1);
}

#[test]
fn full_queue_drops_the_oldest_image() {
    let config = BridgeConfig {
        queue_capacity: 2,
        ..BridgeConfig::default()
    };
    let (mut host, to_surface) = host(config);

    for url in ["a.png", "b.png", "c.png"] {
        host.send_insert_image(url).unwrap();
    }
    assert_eq!(host.queued(), 2);

    host.receive(READY).unwrap();
    assert_eq!(
        to_surface.take().unwrap(),
        vec![Message::insert_image("b.png"), Message::insert_image("c.png")]
    );
}

#[test]
fn reset_document_forces_a_remount() {
    let (mut host, _) = ready_host(BridgeConfig::default());
    host.receive(&change("<p>edited</p>")).unwrap();
    let mounted = host.document_version();
    assert!(!host.needs_remount(mounted));

    host.reset_document("<p>other record</p>");

    assert!(host.needs_remount(mounted));
    assert!(!host.needs_remount(host.document_version()));
    assert!(!host.is_ready());
    assert_eq!(host.draft(), "<p>other record</p>");
}

#[test]
fn content_changes_never_force_a_remount() {
    let (mut host, _) = ready_host(BridgeConfig::default());
    let mounted = host.document_version();
    for html in ["<p>x</p>", "<p>xy</p>"] {
        host.receive(&change(html)).unwrap();
    }
    assert!(!host.needs_remount(mounted));
}

#[test]
fn reset_document_discards_queued_images() {
    let (mut host, to_surface) = host(BridgeConfig::default());
    host.send_insert_image("stale.png").unwrap();

    host.reset_document("<p>fresh</p>");
    let event = host.receive(READY).unwrap();

    assert_eq!(event, HostEvent::Ready { flushed: 0 });
    assert!(to_surface.is_empty());
}

#[test]
fn pick_image_is_reported_to_the_caller() {
    let (mut host, to_surface) = ready_host(BridgeConfig::default());
    assert_eq!(
        host.receive(r#"{"type":"pick-image"}"#).unwrap(),
        HostEvent::PickImage
    );
    assert!(to_surface.is_empty());
}

#[test]
fn messages_from_an_unmounted_surface_are_dropped() {
    let (mut host, _) = ready_host(BridgeConfig::default());
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    host.on_change(move |_| counter.set(counter.get() + 1)).unwrap();
    let late = change("<p>crop A edited</p>");

    host.reset_document("<p>crop B</p>");

    assert_eq!(host.receive(&late).unwrap(), HostEvent::Stale);
    assert_eq!(
        host.receive(r#"{"type":"pick-image"}"#).unwrap(),
        HostEvent::Stale
    );
    assert_eq!(host.draft(), "<p>crop B</p>");
    assert_eq!(calls.get(), 0);

    host.receive(READY).unwrap();
    assert_eq!(host.receive(&change("<p>crop B edited</p>")).unwrap(), HostEvent::Changed);
    assert_eq!(host.draft(), "<p>crop B edited</p>");
    assert_eq!(calls.get(), 1);
}

#[test]
fn changes_before_the_first_ready_are_dropped() {
    let (mut host, _) = host(BridgeConfig::default());

    assert_eq!(host.receive(&change("<p>early</p>")).unwrap(), HostEvent::Stale);
    assert_eq!(host.draft(), "<p>stored</p>");
}

#[test]
fn images_keep_their_order_after_a_failed_flush() {
    let to_surface = Mailbox::new();
    let sink = Rc::new(FlakySink {
        inner: to_surface.clone(),
        failures: Cell::new(0),
    });
    let mut host = EditorHost::new(sink.clone(), BridgeConfig::default(), "<p>stored</p>");
    host.send_insert_image("a.png").unwrap();
    host.send_insert_image("b.png").unwrap();

    sink.failures.set(1);
    assert!(matches!(host.receive(READY), Err(BridgeError::Transport(_))));
    assert_eq!(host.queued(), 2);

    assert!(host.send_insert_image("c.png").unwrap());
    assert_eq!(host.queued(), 0);
    assert_eq!(
        to_surface.take().unwrap(),
        vec![
            Message::insert_image("a.png"),
            Message::insert_image("b.png"),
            Message::insert_image("c.png"),
        ]
    );
}

#[test]
fn host_rejects_host_bound_and_malformed_messages() {
    let (mut host, _) = host(BridgeConfig::default());

    let err = host
        .receive(r#"{"type":"insert-image","url":"x.png"}"#)
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnexpectedMessage {
            kind: "insert-image",
            receiver: "host"
        }
    ));

    for raw in ["", "{", r#"{"type":"change"}"#, r#"{"type":"format"}"#] {
        assert!(matches!(
            host.receive(raw),
            Err(BridgeError::MalformedMessage(_))
        ));
    }
    assert_eq!(host.draft(), "<p>stored</p>");
}
