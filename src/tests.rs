use super::*;
use crate::html::{assemble, generate_footer_bar};
use crate::resources::{default_assets, IncludedAssets};
use crate::template::{render, title_context, unescape_template, DEFAULT_TITLE_SLIDE};

const DOCUTILS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE document PUBLIC "+//IDN docutils.sourceforge.net//DTD Docutils Generic//EN//XML" "http://docutils.sourceforge.net/docs/ref/docutils.dtd">
<!-- Generated by Docutils 0.20.1 -->
<document ids="intro" names="intro" source="&lt;stdin&gt;" title="Intro">
    <title>Intro</title>
    <subtitle>A first look</subtitle>
    <docinfo>
        <author>Ada Lovelace</author>
        <field classes="transition"><field_name>Transition</field_name><field_body><paragraph>zoom</paragraph></field_body></field>
        <field classes="css-files-list"><field_name>css_files-list</field_name><field_body><bullet_list bullet="-"><list_item><paragraph>a.css</paragraph></list_item><list_item><paragraph>b.css</paragraph></list_item></bullet_list></field_body></field>
    </docinfo>
    <meta content="slides, rst" name="keywords"/>
    <topic classes="abstract"><title>Abstract</title><paragraph>Short.</paragraph></topic>
    <section ids="first" names="first"><title>First</title><paragraph>Hello <emphasis>world</emphasis> &amp; co.</paragraph></section>
</document>
"#;

fn paragraph(text: &str) -> Node {
    Node::element("paragraph", vec![Node::text_node(text)])
}

fn field(name: &str, body: Vec<Node>) -> Node {
    Node::element(
        "field",
        vec![
            Node::element("field_name", vec![Node::text_node(name)]),
            Node::element("field_body", body),
        ],
    )
}

fn bullets(items: &[&str]) -> Node {
    Node::element(
        "bullet_list",
        items
            .iter()
            .map(|i| Node::element("list_item", vec![paragraph(i)]))
            .collect(),
    )
}

fn document(docinfo: Vec<Node>) -> Node {
    Node::element("document", vec![Node::element("docinfo", docinfo)])
}

#[test]
fn test_text_collects_depth_first() {
    let node = Node::element(
        "paragraph",
        vec![
            Node::text_node("Hello "),
            Node::element(
                "emphasis",
                vec![Node::text_node("big "), Node::element("strong", vec![Node::text_node("bold")])],
            ),
            Node::text_node(" world"),
        ],
    );
    assert_eq!(node.text(), "Hello big bold world");
    assert_eq!(Node::element("empty", vec![]).text(), "");
}

#[test]
fn test_find_all_in_document_order() {
    let tree = Node::element(
        "document",
        vec![
            Node::element("section", vec![Node::element("topic", vec![Node::text_node("a")])]),
            Node::element("topic", vec![Node::element("topic", vec![Node::text_node("c")])]),
        ],
    );
    let topics: Vec<String> = tree.find_all("topic").iter().map(|t| t.text()).collect();
    assert_eq!(topics, vec!["a", "c", "c"]);
    assert!(tree.find_all("document").is_empty());
}

#[test]
fn test_field_op_classification() {
    assert_eq!(FieldOp::classify("CSS_Files-List"), FieldOp::Replace("css_files".to_string()));
    assert_eq!(FieldOp::classify("js_files-list-add"), FieldOp::Append("js_files".to_string()));
    assert_eq!(FieldOp::classify("Transition"), FieldOp::Scalar("transition".to_string()));
    assert_eq!(FieldOp::classify("playlist"), FieldOp::Scalar("playlist".to_string()));
}

#[test]
fn test_list_field_yields_one_entry_per_bullet() {
    let tree = document(vec![field("css_files-list", vec![bullets(&["a.css", "b.css", "c.css"])])]);
    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(
        settings.get("css_files"),
        Some(&Value::List(vec!["a.css".into(), "b.css".into(), "c.css".into()]))
    );
}

#[test]
fn test_list_field_replaces_existing_value() {
    let tree = document(vec![field("js_files-list", vec![paragraph("only.js")])]);
    let mut settings = Settings::with_defaults();
    settings.set("js_files", vec!["old.js".to_string()]);
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.list("js_files"), vec!["only.js"]);
}

#[test]
fn test_list_add_appends_after_existing_entries() {
    let tree = document(vec![
        field("css_files-list", vec![bullets(&["a.css", "b.css"])]),
        field("css_files-list-add", vec![bullets(&["c.css", "d.css", "e.css"])]),
    ]);
    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(
        settings.list("css_files"),
        vec!["a.css", "b.css", "c.css", "d.css", "e.css"]
    );
}

#[test]
fn test_list_add_without_bullets_appends_single_entry() {
    let tree = document(vec![field(
        "extras-list-add",
        vec![paragraph("one"), paragraph("two")],
    )]);
    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.list("extras"), vec!["onetwo"]);
}

#[test]
fn test_scalar_fields_and_plain_docinfo_tags() {
    let tree = document(vec![
        field("Transition", vec![paragraph("zoom")]),
        Node::element("date", vec![Node::text_node("2024-05-01")]),
        field("transition", vec![paragraph("cube")]),
    ]);
    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.text("transition"), Some("cube"));
    assert_eq!(settings.text("date"), Some("2024-05-01"));
}

#[test]
fn test_authors_become_a_list() {
    let authors = Node::element(
        "authors",
        vec![
            Node::element("author", vec![Node::text_node("Ada")]),
            Node::element("author", vec![Node::text_node("Grace")]),
        ],
    );
    let mut settings = Settings::new();
    extract(&document(vec![authors]), &mut settings).unwrap();
    assert_eq!(settings.list("authors"), vec!["Ada", "Grace"]);
}

#[test]
fn test_malformed_fields_fail_extraction() {
    let mut settings = Settings::new();

    let err = extract(&document(vec![Node::element("authors", vec![])]), &mut settings).unwrap_err();
    assert!(matches!(err, SlideError::MalformedMetadata { ref field, .. } if field == "authors"));

    let err = extract(&document(vec![field("css_files-list", vec![])]), &mut settings).unwrap_err();
    assert!(matches!(err, SlideError::MalformedMetadata { ref field, .. } if field == "css_files-list"));
    assert!(err.to_string().contains("Metadata extraction"));

    let nameless = Node::element("field", vec![Node::element("field_body", vec![paragraph("x")])]);
    assert!(extract(&document(vec![nameless]), &mut settings).is_err());
}

#[test]
fn test_abstract_and_dedication_topics() {
    let tree = Node::element(
        "document",
        vec![
            Node::element("topic", vec![paragraph("First abstract")]).with_attribute("classes", "Abstract"),
            Node::element("topic", vec![paragraph("For Grace")]).with_attribute("classes", "dedication"),
            Node::element("topic", vec![paragraph("Contents")]).with_attribute("classes", "contents"),
            Node::element("topic", vec![paragraph("Second abstract")]).with_attribute("classes", "abstract"),
        ],
    );
    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.text("abstract"), Some("Second abstract"));
    assert_eq!(settings.text("dedication"), Some("For Grace"));
    assert!(!settings.contains("contents"));
}

#[test]
fn test_extraction_is_idempotent() {
    let tree = XmlParser.parse(DOCUTILS_XML).unwrap();
    let mut first = Settings::new();
    let mut second = Settings::new();
    extract(&tree, &mut first).unwrap();
    extract(&tree, &mut second).unwrap();
    assert_eq!(first, second);
    assert_eq!(format!("{:?}", first), format!("{:?}", second));
}

#[test]
fn test_xml_parser_reads_docutils_output() {
    let tree = XmlParser.parse(DOCUTILS_XML).unwrap();
    assert!(tree.is_element("document"));
    assert_eq!(tree.attribute("title"), Some("Intro"));

    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.text("author"), Some("Ada Lovelace"));
    assert_eq!(settings.text("transition"), Some("zoom"));
    assert_eq!(settings.list("css_files"), vec!["a.css", "b.css"]);
    assert_eq!(settings.text("abstract"), Some("AbstractShort."));
}

#[test]
fn test_xml_parser_keeps_whitespace_inside_text() {
    let source = "<document><docinfo>\n  <field><field_name>speaker</field_name>\n    <field_body>\n      \
        <paragraph><emphasis>Ada</emphasis>\n<strong>Lovelace</strong></paragraph>\n    </field_body>\n  </field>\n\
        </docinfo></document>";
    let tree = XmlParser.parse(source).unwrap();

    let docinfo = tree.child("docinfo").unwrap();
    assert_eq!(docinfo.children().len(), 1);
    let body = docinfo.children()[0].child("field_body").unwrap();
    assert_eq!(body.children().len(), 1);

    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.text("speaker"), Some("Ada\nLovelace"));
}

#[test]
fn test_title_context_escapes_values() {
    let mut settings = Settings::new();
    settings.set("title", "R&D <x> \"q\"");
    settings.set("author", "A <b>");
    let context = title_context(&settings);
    assert_eq!(context["title"], "R&amp;D &lt;x&gt; &quot;q&quot;");
    assert_eq!(context["is_author"], ".");

    let slide = render("firstslide_template", DEFAULT_TITLE_SLIDE, &context).unwrap();
    assert!(slide.contains("<h1>R&amp;D &lt;x&gt; &quot;q&quot;</h1>"));
    assert!(slide.contains(">A &lt;b&gt;</a>"));
}

#[test]
fn test_xml_parser_rejects_unbalanced_input() {
    assert!(XmlParser.parse("<document><docinfo></document>").is_err());
    assert!(XmlParser.parse("<document>").is_err());
    assert!(XmlParser.parse("").is_err());
}

#[test]
fn test_parts_from_tree() {
    let tree = XmlParser.parse(DOCUTILS_XML).unwrap();
    let parts = Parts::from_tree(&tree);
    assert_eq!(parts.title, "Intro");
    assert_eq!(parts.subtitle, "A first look");
    assert_eq!(parts.meta, r#"<meta content="slides, rst" name="keywords" />"#);
    assert!(parts
        .body
        .contains("<section id=\"first\">\n<h2>First</h2>\n<p>Hello <em>world</em> &amp; co.</p>"));
    assert!(!parts.body.contains("Ada Lovelace"));
    assert!(!parts.body.contains("Short."));
}

#[test]
fn test_field_list_parser_builds_docinfo() {
    let source = r#".. |who| replace:: Ada

:Transition: zoom
:speaker: |who|
:css_files-list:
  - a.css
  - b.css
:authors: Ada; Grace
:note: 2 \* 3

A paragraph.

:later: value
"#;
    let tree = FieldListParser::new().parse(source).unwrap();
    let docinfo = tree.children().first().unwrap();
    assert!(docinfo.is_element("docinfo"));
    assert_eq!(docinfo.child_elements().count(), 5);
    assert_eq!(tree.find_all("field_list").len(), 1);

    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.text("transition"), Some("zoom"));
    assert_eq!(settings.text("speaker"), Some("Ada"));
    assert_eq!(settings.list("css_files"), vec!["a.css", "b.css"]);
    assert_eq!(settings.list("authors"), vec!["Ada", "Grace"]);
    assert_eq!(settings.text("note"), Some("2 * 3"));
    assert!(!settings.contains("later"));
}

#[test]
fn test_field_list_parser_keeps_undefined_references() {
    let tree = FieldListParser::new()
        .parse(":path: |nowhere|/x.css\n:pipe: a | b\n")
        .unwrap();
    let mut settings = Settings::new();
    extract(&tree, &mut settings).unwrap();
    assert_eq!(settings.text("path"), Some("|nowhere|/x.css"));
    assert_eq!(settings.text("pipe"), Some("a | b"));
}

#[test]
fn test_substitution_preamble_round_trip() {
    let mut settings = Settings::new();
    settings.set("transition", "fade");
    settings.set("css_files", vec!["a.css".to_string(), "b.css".to_string()]);
    settings.set("note", "x*y\nz");
    settings.set("controls", false);
    settings.set("stylesheet", "");

    let preamble = substitution_preamble(&settings);
    assert!(preamble.contains(".. |transition| replace:: fade\n\n"));
    assert!(preamble.contains(".. |note| replace:: x\\*y\n  z\n\n"));
    assert!(preamble.contains(".. |controls| replace:: \\ \n\n"));

    let source = format!(
        "{}:combined: |transition|-|css_files|-|note|\n:empty: [|controls|]\n",
        preamble
    );
    let tree = FieldListParser::new().parse(&source).unwrap();
    let mut parsed = Settings::new();
    extract(&tree, &mut parsed).unwrap();
    assert_eq!(parsed.text("combined"), Some("fade-a.cssb.css-x*y\nz"));
    assert_eq!(parsed.text("empty"), Some("[]"));
}

#[test]
fn test_settings_append_and_flags() {
    let mut settings = Settings::with_defaults();
    assert!(!settings.flag("controls"));
    assert!(!settings.flag("missing"));

    settings.set("controls", "True");
    assert!(settings.flag("controls"));
    settings.set("controls", "no");
    assert!(!settings.flag("controls"));

    settings.append("new_list", vec!["a".to_string()]);
    settings.append("new_list", vec!["b".to_string()]);
    assert_eq!(settings.list("new_list"), vec!["a", "b"]);

    settings.set("scalar", "first");
    settings.append("scalar", vec!["second".to_string()]);
    assert_eq!(settings.list("scalar"), vec!["first", "second"]);
}

#[test]
fn test_parse_assignment() {
    let (key, value) = settings::parse_assignment("Transition=zoom").unwrap();
    assert_eq!(key, "transition");
    assert_eq!(value, Value::Text("zoom".to_string()));

    let (_, value) = settings::parse_assignment("controls=true").unwrap();
    assert_eq!(value, Value::Flag(true));

    assert!(settings::parse_assignment("novalue").is_err());
    assert!(settings::parse_assignment("=x").is_err());
}

#[test]
fn test_render_substitutes_placeholders() {
    let mut context = template::Context::new();
    context.insert("name".to_string(), "deck".to_string());
    let out = render("test", "%(name)s is 100%% done, 50% shown", &context).unwrap();
    assert_eq!(out, "deck is 100% done, 50% shown");
}

#[test]
fn test_render_reports_missing_key() {
    let context = template::Context::new();
    let err = render("firstslide_template", "<h1>%(foo)s</h1>", &context).unwrap_err();
    match &err {
        SlideError::MissingPlaceholder { template, key } => {
            assert_eq!(template, "firstslide_template");
            assert_eq!(key, "foo");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("'foo'"));

    assert!(matches!(
        render("t", "%(open", &context),
        Err(SlideError::TemplateSyntax { .. })
    ));
}

#[test]
fn test_default_title_slide_with_only_a_title() {
    let mut settings = Settings::new();
    for key in ["subtitle", "author", "institution", "email", "date"] {
        settings.set(key, "");
    }
    settings.set("title", "Intro");
    let context = title_context(&settings);
    assert_eq!(context.get("is_institution").map(String::as_str), Some(""));
    assert_eq!(context.get("is_author").map(String::as_str), Some(""));
    assert_eq!(context.get("is_subtitle").map(String::as_str), Some(""));

    let slide = render("firstslide_template", DEFAULT_TITLE_SLIDE, &context).unwrap();
    assert!(slide.contains("<h1>Intro</h1>"));
    assert!(slide.contains("<h3></h3>"));
    assert!(!slide.contains(" - "));
}

#[test]
fn test_title_context_markers() {
    let mut settings = Settings::new();
    settings.set("title", "Intro");
    settings.set("subtitle", "Part one");
    settings.set("author", "Ada");
    settings.set("institution", "Analytical Society");
    let context = title_context(&settings);
    assert_eq!(context["is_subtitle"], ".");
    assert_eq!(context["is_author"], ".");
    assert_eq!(context["is_institution"], "-");
    assert_eq!(context["email"], "");
}

#[test]
fn test_user_templates_are_unescaped() {
    assert_eq!(
        unescape_template("&lt;b&gt;%(title)s&lt;/b&gt; &amp; more&nbsp;"),
        "<b>%(title)s</b> & more\u{a0}"
    );
    // Unknown entities leave the text alone.
    assert_eq!(unescape_template("a &bogus; b"), "a &bogus; b");

    let mut settings = Settings::with_defaults();
    settings.set("title", "Intro");
    settings.set("footer", true);
    settings.set("footer_template", "&lt;i&gt;%(title)s&lt;/i&gt;");
    let bar = generate_footer_bar(&settings, &title_context(&settings)).unwrap();
    assert_eq!(
        bar,
        "<footer id=\"footer\"><i>Intro</i><b id=\"slide_number\" style=\"padding: 1em;\"></b></footer>"
    );
}

#[test]
fn test_footer_bar_variants() {
    let mut settings = Settings::with_defaults();
    let context = title_context(&settings);
    assert_eq!(generate_footer_bar(&settings, &context).unwrap(), "");

    settings.set("page_number", "yes");
    assert_eq!(
        generate_footer_bar(&settings, &context).unwrap(),
        "<footer><b id=\"slide_number\"></b></footer>"
    );
}

#[test]
fn test_resource_policy_names() {
    assert_eq!("Inline".parse::<ResourcePolicy>().unwrap(), ResourcePolicy::Inline);
    assert_eq!(ResourcePolicy::Local.to_string(), "local");
    assert!("embedded".parse::<ResourcePolicy>().is_err());
    assert_eq!(ResourcePolicy::default(), ResourcePolicy::Central);
}

#[test]
fn test_default_assets_come_first() {
    let library = AssetLibrary::central(std::path::Path::new("/opt/rstslide"));
    let mut settings = Settings::with_defaults();
    settings.set("reveal_theme", "night");
    settings.set("js_files", vec!["mine.js".to_string()]);
    settings.set("css_files", vec!["mine.css".to_string()]);
    settings.set("stylesheet", "extra.css");

    let sources: Vec<String> = default_assets(&library, &settings)
        .into_iter()
        .map(|a| a.source)
        .collect();
    assert_eq!(
        sources,
        vec![
            "/opt/rstslide/external/mathjax/es5/tex-svg.js",
            "/opt/rstslide/external/reveal.js/dist/reveal.js",
            "mine.js",
            "/opt/rstslide/external/reveal.js/dist/reveal.css",
            "/opt/rstslide/external/reveal.js/dist/theme/night.css",
            "/opt/rstslide/css/rstslide.css",
            "mine.css",
            "extra.css",
        ]
    );
}

#[test]
fn test_online_library_uses_cdn_for_libraries_only() {
    let library = AssetLibrary::online(std::path::Path::new("/opt/rstslide"));
    assert!(library.reveal.starts_with("https://"));
    assert!(library.mathjax.starts_with("https://"));
    assert_eq!(library.css, "/opt/rstslide/css");
}

#[test]
fn test_inclusion_tags() {
    let link = Inclusion::Link {
        href: "theme/white.css".to_string(),
        kind: AssetKind::Stylesheet,
        id: Some("theme".to_string()),
    };
    assert_eq!(
        link.tag().unwrap(),
        r#"<link rel="stylesheet" href="theme/white.css" id="theme" />"#
    );

    let script = Inclusion::Link {
        href: "reveal.js".to_string(),
        kind: AssetKind::Script,
        id: None,
    };
    assert_eq!(script.tag().unwrap(), r#"<script src="reveal.js"></script>"#);

    let inline = Inclusion::Inline {
        origin: "/opt/a.css".to_string(),
        content: "body {}".to_string(),
        kind: AssetKind::Stylesheet,
    };
    assert!(inline.tag().is_none());

    let mut settings = Settings::with_defaults();
    settings.set("css_embedd", vec![".hl {}".to_string()]);
    let included = IncludedAssets::collect(&[link, script, inline], &settings);
    assert!(included.stylesheet_tags.contains("id=\"theme\""));
    assert!(included.script_tags.contains("reveal.js"));
    assert!(included.inline_styles.starts_with("\n<!-- inlining /opt/a.css --->\n\nbody {}"));
    assert!(included.inline_styles.ends_with(".hl {}"));
    assert!(included.inline_scripts.is_empty());
}

#[test]
fn test_remote_asset_detection() {
    assert!(Asset::stylesheet("https://example.com/x/style.css").is_remote());
    assert!(!Asset::stylesheet("/tmp/style.css").is_remote());
    assert!(!Asset::stylesheet("style.css").is_remote());
    assert_eq!(
        Asset::stylesheet("https://example.com/x/style.css").file_name().unwrap(),
        "style.css"
    );
    assert!(Asset::stylesheet("https://example.com/").file_name().is_err());
}

#[test]
fn test_assemble_keeps_fragment_order() {
    assert_eq!(assemble("<head>", "<body>", "</html>"), "<head><body></html>");
}

#[test]
fn test_resource_dir_naming() {
    let dir = resources::ResourceDir::for_output(std::path::Path::new("out/talk.html")).unwrap();
    assert_eq!(dir.relative, "talk_rstslide");
    assert_eq!(dir.path, std::path::Path::new("out/talk_rstslide"));
    assert_eq!(dir.reference("reveal.js"), "talk_rstslide/reveal.js");

    let bare = resources::ResourceDir::for_output(std::path::Path::new("talk.html")).unwrap();
    assert_eq!(bare.path, std::path::Path::new("./talk_rstslide"));
}

#[test]
fn test_theme_resolver_search_order() {
    let first = tempfile::TempDir::new().expect("Failed to create temp dir");
    let second = tempfile::TempDir::new().expect("Failed to create temp dir");
    for dir in [first.path(), second.path()] {
        std::fs::create_dir_all(dir.join("plain")).unwrap();
        std::fs::write(dir.join("plain").join("theme.rst"), ":transition: none\n").unwrap();
    }
    std::fs::create_dir_all(second.path().join("only_second")).unwrap();
    std::fs::write(second.path().join("only_second").join("theme.rst"), "").unwrap();
    // A directory without theme.rst is not a theme.
    std::fs::create_dir_all(first.path().join("only_second")).unwrap();

    let resolver = ThemeResolver::with_search_dirs(vec![first.path().into(), second.path().into()]);
    assert_eq!(resolver.locate("plain"), Some(first.path().join("plain")));
    assert_eq!(resolver.locate("only_second"), Some(second.path().join("only_second")));
    assert_eq!(resolver.locate("absent"), None);

    let mut settings = Settings::with_defaults();
    let before = settings.clone();
    assert!(!resolver.apply("absent", &mut settings, ThemeMode::Overlay).unwrap());
    assert_eq!(settings, before);
}
