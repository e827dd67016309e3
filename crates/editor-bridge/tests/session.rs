//! Surface and host wired back to back through two mailboxes.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use vayal_editor_bridge::async_runtime::block_on;
use vayal_editor_bridge::{
    AcquireOutcome, BridgeConfig, EditorHost, EditorSurface, HostEvent, ImageAcquisition,
    ImagePicker, Mailbox, Notice, Notifier, Permission, PermissionProvider, PickOutcome,
    PickedImage, PickerError, UploadError, UploadService, UploadedImage,
};

struct Granted;

impl PermissionProvider for Granted {
    async fn request_media_library(&self) -> Permission {
        Permission::Granted
    }
}

struct Gallery;

impl ImagePicker for Gallery {
    async fn pick_image(&self) -> Result<PickOutcome, PickerError> {
        Ok(PickOutcome::Picked(PickedImage {
            uri: "file:///photos/leaf.jpg".to_string(),
        }))
    }
}

struct Cdn(Result<UploadedImage, UploadError>);

impl UploadService for Cdn {
    async fn upload(&self, _local_uri: &str, _folder: &str) -> Result<UploadedImage, UploadError> {
        self.0.clone()
    }
}

#[derive(Default)]
struct Notices(RefCell<Vec<Notice>>);

impl Notifier for Notices {
    fn notify(&self, notice: Notice) {
        self.0.borrow_mut().push(notice);
    }

    fn set_busy(&self, _busy: bool) {}
}

struct Session {
    surface: EditorSurface<Mailbox>,
    host: EditorHost<Mailbox>,
    to_host: Mailbox,
    to_surface: Mailbox,
    changes: Rc<RefCell<Vec<String>>>,
}

impl Session {
    fn mount(stored: &str) -> Self {
        let to_host = Mailbox::new();
        let to_surface = Mailbox::new();
        let mut host = EditorHost::new(to_surface.clone(), BridgeConfig::default(), stored);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        host.on_change(move |html| sink.borrow_mut().push(html.to_string()))
            .unwrap();
        let mut surface = EditorSurface::new(to_host.clone());
        surface.initialize(host.draft()).unwrap();

        Self {
            surface,
            host,
            to_host,
            to_surface,
            changes,
        }
    }

    /// Delivers queued messages both ways until both mailboxes are empty.
    fn pump(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while !self.to_host.is_empty() || !self.to_surface.is_empty() {
            for raw in self.to_host.drain_raw() {
                events.push(self.host.receive(&raw).unwrap());
            }
            for raw in self.to_surface.drain_raw() {
                self.surface.receive(&raw).unwrap();
            }
        }
        events
    }

    fn acquire(&mut self, reply: Result<UploadedImage, UploadError>) -> (AcquireOutcome, Vec<Notice>) {
        let flow = ImageAcquisition::new(Granted, Gallery, Cdn(reply), Notices::default());
        let outcome = block_on(flow.run(&mut self.host)).unwrap();
        (outcome, flow.notifier.0.into_inner())
    }
}

fn uploaded(url: &str) -> Result<UploadedImage, UploadError> {
    Ok(UploadedImage {
        url: url.to_string(),
        public_id: None,
    })
}

#[test]
fn mounting_reports_ready_and_nothing_else() {
    let mut session = Session::mount("<p>Transplanting</p>");

    let events = session.pump();

    assert_eq!(events, vec![HostEvent::Ready { flushed: 0 }]);
    assert!(session.changes.borrow().is_empty());
    assert_eq!(session.host.draft(), "<p>Transplanting</p>");
}

#[test]
fn picked_image_ends_up_in_the_draft() {
    let mut session = Session::mount("<p>abcdefghij</p>");
    session.pump();
    session.surface.set_caret(5);
    session.surface.request_image_insertion().unwrap();

    assert_eq!(session.pump(), vec![HostEvent::PickImage]);
    let (outcome, notices) = session.acquire(uploaded("https://cdn.example.com/img/123.jpg"));
    session.pump();

    assert!(matches!(outcome, AcquireOutcome::Inserted { .. }));
    assert!(notices.is_empty());
    assert_eq!(
        session.host.draft(),
        r#"<p>abcde<img src="https://cdn.example.com/img/123.jpg">fghij</p>"#
    );
    assert_eq!(session.host.draft(), session.surface.content());
    assert_eq!(session.surface.caret(), Some(6));
}

#[test]
fn rejected_upload_leaves_the_document_alone() {
    let mut session = Session::mount("<p>abc</p>");
    session.pump();
    session.surface.set_caret(1);
    session.surface.request_image_insertion().unwrap();
    session.pump();

    let (outcome, notices) =
        session.acquire(Err(UploadError::Rejected("File size too large".to_string())));
    let events = session.pump();

    assert_eq!(outcome, AcquireOutcome::UploadFailed);
    assert_eq!(
        notices,
        vec![Notice::UploadFailed {
            message: "File size too large".to_string()
        }]
    );
    assert!(events.is_empty());
    assert_eq!(session.surface.content(), "<p>abc</p>");
    assert_eq!(session.host.draft(), "<p>abc</p>");
    assert!(session.changes.borrow().is_empty());
}

#[test]
fn image_uploaded_before_ready_is_delivered_on_ready() {
    let to_host = Mailbox::new();
    let to_surface = Mailbox::new();
    let mut host = EditorHost::new(to_surface.clone(), BridgeConfig::default(), "<p>ab</p>");
    let flow = ImageAcquisition::new(
        Granted,
        Gallery,
        Cdn(uploaded("https://cdn.example.com/late.jpg")),
        Notices::default(),
    );

    let outcome = block_on(flow.run(&mut host)).unwrap();
    assert!(matches!(outcome, AcquireOutcome::Queued { .. }));

    let mut surface = EditorSurface::new(to_host.clone());
    surface.initialize(host.draft()).unwrap();
    let ready = to_host.drain_raw();
    assert_eq!(
        host.receive(&ready[0]).unwrap(),
        HostEvent::Ready { flushed: 1 }
    );
    for raw in to_surface.drain_raw() {
        surface.receive(&raw).unwrap();
    }
    for raw in to_host.drain_raw() {
        host.receive(&raw).unwrap();
    }

    assert_eq!(
        host.draft(),
        r#"<p>ab<img src="https://cdn.example.com/late.jpg"></p>"#
    );
}

#[test]
fn last_change_is_the_current_document() {
    let mut session = Session::mount("");
    session.pump();
    session.surface.set_caret(0);

    for text in ["Sow", " after", " rain"] {
        session.surface.type_text(text).unwrap();
    }
    session.surface.split_block().unwrap();
    session.surface.type_text("Weed at day 20").unwrap();
    session.pump();

    let changes = session.changes.borrow();
    assert_eq!(changes.len(), 5);
    assert_eq!(changes.last().unwrap(), &session.surface.content());
    assert_eq!(
        session.host.draft(),
        "<p>Sow after rain</p><p>Weed at day 20</p>"
    );
}

#[test]
fn editing_never_asks_for_an_image_on_its_own() {
    let mut session = Session::mount("<p>x</p>");
    session.pump();
    session.surface.set_caret(1);
    session.surface.type_text("y").unwrap();
    session.surface.undo().unwrap();

    let events = session.pump();

    assert!(events.iter().all(|event| *event == HostEvent::Changed));
}

#[test]
fn replaced_document_is_remounted_once() {
    let mut session = Session::mount("<p>first</p>");
    session.pump();
    let mounted = session.host.document_version();

    session.surface.set_caret(5);
    session.surface.type_text("!").unwrap();
    session.pump();
    assert!(!session.host.needs_remount(mounted));

    session.host.reset_document("<p>second</p>");
    assert!(session.host.needs_remount(mounted));

    let mounted = session.host.document_version();
    session.surface.initialize(session.host.draft()).unwrap();
    assert_eq!(session.pump(), vec![HostEvent::Ready { flushed: 0 }]);
    assert!(!session.host.needs_remount(mounted));
    assert_eq!(session.surface.content(), "<p>second</p>");
}
