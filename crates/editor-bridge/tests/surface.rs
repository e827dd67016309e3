use pretty_assertions::assert_eq;
use vayal_editor_bridge::{BridgeError, EditorSurface, ListKind, Mailbox, Mark, Message};

fn surface_with(markup: &str) -> (EditorSurface<Mailbox>, Mailbox) {
    let outbox = Mailbox::new();
    let mut surface = EditorSurface::new(outbox.clone());
    surface.initialize(markup).unwrap();
    assert_eq!(outbox.take().unwrap(), vec![Message::Ready]);
    (surface, outbox)
}

fn changes(outbox: &Mailbox) -> Vec<String> {
    outbox
        .take()
        .unwrap()
        .into_iter()
        .map(|message| match message {
            Message::Change { html } => html,
            other => panic!("expected change, got {other:?}"),
        })
        .collect()
}

#[test]
fn initialize_then_read_back_returns_the_document() {
    let cases = [
        "<p>Paddy is sown in <strong>June</strong>.</p>",
        "<h2>நெல்</h2><ul><li>விதை</li><li>நீர்</li></ul>",
        r#"<p>Leaf <img src="https://cdn.example.com/img/1.jpg" alt="blast"> spots</p>"#,
    ];
    for markup in cases {
        let (surface, _) = surface_with(markup);
        assert_eq!(surface.content(), markup);
    }
}

#[test]
fn empty_markup_starts_blank() {
    let (surface, outbox) = surface_with("");

    assert!(surface.is_empty());
    assert_eq!(surface.caret(), None);
    assert_eq!(surface.content(), "<p><br></p>");
    assert!(outbox.is_empty());
}

#[test]
fn malformed_markup_degrades_to_text() {
    let (surface, _) = surface_with("<p>unclosed <b>bold <i>");
    assert_eq!(surface.content(), "<p>unclosed <strong>bold </strong></p>");
}

#[test]
fn initialize_twice_is_the_same_as_once() {
    let markup = "<h1>Pests</h1><p>Stem borer</p>";
    let (mut surface, outbox) = surface_with(markup);
    let once = (surface.content(), surface.len(), surface.caret());

    surface.initialize(markup).unwrap();

    assert_eq!((surface.content(), surface.len(), surface.caret()), once);
    assert_eq!(outbox.take().unwrap(), vec![Message::Ready]);
}

#[test]
fn initialize_discards_history_and_pending_request() {
    let (mut surface, outbox) = surface_with("<p>abc</p>");
    surface.set_caret(1);
    surface.request_image_insertion().unwrap();
    surface.type_text("x").unwrap();

    surface.initialize("<p>abc</p>").unwrap();
    outbox.take().unwrap();

    assert!(!surface.undo().unwrap());
    surface.insert_image_at_cursor("u.png").unwrap();
    assert_eq!(surface.content(), r#"<p>abc<img src="u.png"></p>"#);
}

#[test]
fn image_lands_at_the_caret_and_caret_moves_past_it() {
    let (mut surface, outbox) = surface_with("<p>abcdefghij</p>");
    surface.set_caret(5);

    surface
        .insert_image_at_cursor("https://cdn.example.com/img/123.jpg")
        .unwrap();

    assert_eq!(
        surface.content(),
        r#"<p>abcde<img src="https://cdn.example.com/img/123.jpg">fghij</p>"#
    );
    assert_eq!(surface.caret(), Some(6));
    assert_eq!(surface.len(), 11);
    assert_eq!(changes(&outbox), vec![surface.content()]);
}

#[test]
fn unsolicited_insert_without_a_caret_appends() {
    let (mut surface, _) = surface_with("<p>abc</p><p>def</p>");

    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(
        surface.content(),
        r#"<p>abc</p><p>def<img src="u.png"></p>"#
    );
    assert_eq!(surface.caret(), Some(surface.len()));
}

#[test]
fn request_caret_wins_over_later_caret_moves() {
    let (mut surface, outbox) = surface_with("<p>abcdefghij</p>");
    surface.set_caret(2);

    surface.request_image_insertion().unwrap();
    assert_eq!(outbox.take().unwrap(), vec![Message::PickImage]);

    surface.set_caret(8);
    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(surface.content(), r#"<p>ab<img src="u.png">cdefghij</p>"#);
    assert_eq!(surface.caret(), Some(3));
}

#[test]
fn request_caret_is_used_once() {
    let (mut surface, _) = surface_with("<p>abcdef</p>");
    surface.set_caret(1);
    surface.request_image_insertion().unwrap();
    surface.insert_image_at_cursor("one.png").unwrap();

    surface.set_caret(7);
    surface.insert_image_at_cursor("two.png").unwrap();

    assert_eq!(
        surface.content(),
        r#"<p>a<img src="one.png">bcdef<img src="two.png"></p>"#
    );
}

#[test]
fn pending_image_follows_text_typed_before_it() {
    let (mut surface, _) = surface_with("<p>0123456789</p>");
    surface.set_caret(5);
    surface.request_image_insertion().unwrap();

    surface.set_caret(0);
    surface.type_text("abc").unwrap();
    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(surface.content(), r#"<p>abc01234<img src="u.png">56789</p>"#);
}

#[test]
fn edits_after_the_pending_image_leave_it_in_place() {
    let (mut surface, _) = surface_with("<p>abcdefghij</p>");
    surface.set_caret(2);
    surface.request_image_insertion().unwrap();

    surface.set_caret(8);
    surface.type_text("xyz").unwrap();
    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(surface.content(), r#"<p>ab<img src="u.png">cdefghxyzij</p>"#);
}

#[test]
fn pending_image_follows_a_block_split_before_it() {
    let (mut surface, _) = surface_with("<p>abcdef</p>");
    surface.set_caret(4);
    surface.request_image_insertion().unwrap();

    surface.set_caret(1);
    surface.split_block().unwrap();
    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(surface.content(), r#"<p>a</p><p>bcd<img src="u.png">ef</p>"#);
}

#[test]
fn pending_image_inside_deleted_text_lands_where_it_was_cut() {
    let (mut surface, _) = surface_with("<p>abcdef</p>");
    surface.set_caret(3);
    surface.request_image_insertion().unwrap();

    surface.select(1..5);
    surface.delete_backward().unwrap();
    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(surface.content(), r#"<p>a<img src="u.png">f</p>"#);
}

#[test]
fn rejected_insert_keeps_the_pending_position() {
    let (mut surface, _) = surface_with("<p>abcdefghij</p>");
    surface.set_caret(2);
    surface.request_image_insertion().unwrap();

    assert!(surface.insert_image_at_cursor("  ").is_err());
    surface.set_caret(7);
    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(surface.content(), r#"<p>ab<img src="u.png">cdefghij</p>"#);
}

#[test]
fn request_without_caret_falls_back_to_the_end() {
    let (mut surface, _) = surface_with("<p>abc</p>");
    surface.set_caret(1);
    surface.clear_caret();

    surface.request_image_insertion().unwrap();
    surface.insert_image_at_cursor("u.png").unwrap();

    assert_eq!(surface.content(), r#"<p>abc<img src="u.png"></p>"#);
}

#[test]
fn insert_image_message_is_handled() {
    let (mut surface, outbox) = surface_with("<p>ab</p>");
    surface.set_caret(1);

    surface
        .receive(r#"{"type":"insert-image","url":"u.png"}"#)
        .unwrap();

    assert_eq!(surface.content(), r#"<p>a<img src="u.png">b</p>"#);
    assert_eq!(changes(&outbox).len(), 1);
}

#[test]
fn surface_rejects_messages_it_does_not_handle() {
    let (mut surface, outbox) = surface_with("<p>ab</p>");

    let err = surface
        .receive(r#"{"type":"change","html":"<p>hijack</p>"}"#)
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnexpectedMessage { kind: "change", .. }
    ));

    let err = surface.receive("{").unwrap_err();
    assert!(matches!(err, BridgeError::MalformedMessage(_)));

    assert_eq!(surface.content(), "<p>ab</p>");
    assert!(outbox.is_empty());
}

#[test]
fn empty_image_url_is_rejected_without_a_change() {
    let (mut surface, outbox) = surface_with("<p>ab</p>");

    let err = surface.insert_image_at_cursor("  ").unwrap_err();

    assert!(matches!(err, BridgeError::Edit(_)));
    assert_eq!(surface.content(), "<p>ab</p>");
    assert!(outbox.is_empty());
}

#[test]
fn every_edit_reports_the_full_document() {
    let (mut surface, outbox) = surface_with("");
    surface.set_caret(0);

    for ch in ["k", "a", "r", "u"] {
        assert!(surface.type_text(ch).unwrap());
    }
    surface.split_block().unwrap();
    surface.type_text("kuruvai").unwrap();
    surface.toggle_list(ListKind::Numbered).unwrap();
    surface.select(0..4);
    surface.toggle_mark(Mark::Bold).unwrap();

    let changes = changes(&outbox);
    assert_eq!(changes.len(), 8);
    assert_eq!(changes[0], "<p>k</p>");
    assert_eq!(
        changes.last().unwrap(),
        "<p><strong>karu</strong></p><ol><li>kuruvai</li></ol>"
    );
    assert_eq!(changes.last().unwrap(), &surface.content());
}

#[test]
fn no_op_edits_report_nothing() {
    let (mut surface, outbox) = surface_with("<p>abc</p>");
    surface.set_caret(0);

    assert!(!surface.delete_backward().unwrap());
    assert!(!surface.unset_heading().unwrap());
    assert!(!surface.undo().unwrap());
    assert!(!surface.redo().unwrap());

    assert!(outbox.is_empty());
}

#[test]
fn undo_and_redo_report_changes() {
    let (mut surface, outbox) = surface_with("<p>abc</p>");
    surface.set_caret(3);
    surface.type_text("d").unwrap();

    assert!(surface.undo().unwrap());
    assert!(surface.redo().unwrap());

    assert_eq!(
        changes(&outbox),
        vec!["<p>abcd</p>", "<p>abc</p>", "<p>abcd</p>"]
    );
}

#[test]
fn typing_without_a_caret_appends_to_the_document() {
    let (mut surface, _) = surface_with("<p>abc</p>");

    surface.type_text("!").unwrap();

    assert_eq!(surface.content(), "<p>abc!</p>");
    assert_eq!(surface.caret(), Some(4));
}

#[test]
fn headings_and_links_from_the_toolbar() {
    let (mut surface, _) = surface_with("<p>Rice blast</p>");
    surface.set_caret(0);
    surface.set_heading(2).unwrap();
    surface.select(5..10);
    surface.set_link("https://example.com/blast").unwrap();

    assert_eq!(
        surface.content(),
        r#"<h2>Rice <a href="https://example.com/blast">blast</a></h2>"#
    );

    surface.unset_link().unwrap();
    surface.unset_heading().unwrap();
    assert_eq!(surface.content(), "<p>Rice blast</p>");
}
