use vayal_editor_core::{Document, Editor, Marks, Node, PluginRegistry, Point, Selection, html};

fn texts(editor: &Editor) -> Vec<(String, bool)> {
    let Node::Element(paragraph) = &editor.doc().children[0] else {
        panic!("expected paragraph element");
    };
    paragraph
        .children
        .iter()
        .map(|n| match n {
            Node::Text(t) => (t.text.clone(), t.marks.bold),
            _ => ("".to_string(), false),
        })
        .collect()
}

#[test]
fn toggle_bold_only_affects_selection_range() {
    let doc = Document {
        children: vec![Node::paragraph("abcde")],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 1),
        focus: Point::new(vec![0, 0], 3),
    };
    let mut editor = Editor::new(doc, selection, PluginRegistry::richtext());

    editor.run_command("marks.toggle_bold", None).unwrap();

    assert_eq!(
        texts(&editor),
        vec![
            ("a".to_string(), false),
            ("bc".to_string(), true),
            ("de".to_string(), false),
        ]
    );
    assert_eq!(editor.selection_range(), (1, 3));
}

#[test]
fn toggle_bold_twice_restores_a_single_leaf() {
    let mut editor = Editor::from_document(html::parse("<p>abcde</p>"), PluginRegistry::richtext());
    editor.select_range(1, 3);

    editor.run_command("marks.toggle_bold", None).unwrap();
    editor.run_command("marks.toggle_bold", None).unwrap();

    assert_eq!(texts(&editor), vec![("abcde".to_string(), false)]);
}

#[test]
fn toggle_on_partially_bold_range_makes_it_all_bold() {
    let mut editor =
        Editor::from_document(html::parse("<p>a<b>bc</b>de</p>"), PluginRegistry::richtext());
    editor.select_range(0, 5);

    editor.run_command("marks.toggle_bold", None).unwrap();

    assert_eq!(
        html::serialize(editor.doc()),
        "<p><strong>abcde</strong></p>"
    );
}

#[test]
fn collapsed_toggle_applies_to_text_typed_next() {
    let mut editor = Editor::from_document(html::parse("<p>hello</p>"), PluginRegistry::richtext());
    editor.set_caret(5);

    editor.run_command("marks.toggle_italic", None).unwrap();
    let active: Marks = editor.run_query("marks.get_active", None).unwrap();
    assert!(active.italic);

    editor
        .run_command("text.insert", Some(serde_json::json!({ "text": "!" })))
        .unwrap();

    assert_eq!(html::serialize(editor.doc()), "<p>hello<em>!</em></p>");
}

#[test]
fn marks_span_multiple_blocks() {
    let mut editor =
        Editor::from_document(html::parse("<p>ab</p><p>cd</p>"), PluginRegistry::richtext());
    editor.select_range(1, 4);

    editor.run_command("marks.toggle_underline", None).unwrap();

    assert_eq!(
        html::serialize(editor.doc()),
        "<p>a<u>b</u></p><p><u>c</u>d</p>"
    );
}

#[test]
fn set_and_unset_link() {
    let mut editor =
        Editor::from_document(html::parse("<p>see docs</p>"), PluginRegistry::richtext());
    editor.select_range(4, 8);

    editor
        .run_command(
            "marks.set_link",
            Some(serde_json::json!({ "url": "https://example.com/rice" })),
        )
        .unwrap();
    assert_eq!(
        html::serialize(editor.doc()),
        r#"<p>see <a href="https://example.com/rice">docs</a></p>"#
    );

    editor.run_command("marks.unset_link", None).unwrap();
    assert_eq!(html::serialize(editor.doc()), "<p>see docs</p>");
}

#[test]
fn set_link_requires_url() {
    let mut editor = Editor::with_richtext_plugins();
    let err = editor
        .run_command("marks.set_link", Some(serde_json::json!({ "url": "  " })))
        .unwrap_err();
    assert!(err.message().contains("url"));
}

#[test]
fn marks_toggle_is_undoable() {
    let mut editor =
        Editor::from_document(html::parse("<p>abc</p>"), PluginRegistry::richtext());
    editor.select_range(0, 3);

    editor.run_command("marks.toggle_strikethrough", None).unwrap();
    assert_eq!(html::serialize(editor.doc()), "<p><s>abc</s></p>");

    assert!(editor.undo());
    assert_eq!(html::serialize(editor.doc()), "<p>abc</p>");
}
