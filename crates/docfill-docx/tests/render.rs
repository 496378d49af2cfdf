//! End-to-end rendering tests over in-memory DOCX archives

use std::io::Cursor;

use docfill_band::{BandData, ParameterValue};
use docfill_docx::test_utils::{
    create_docx_with_parts, create_template_docx, document_part, header_part, paragraph, table_row,
};
use docfill_docx::{
    ContentInliner, Document, DocxArchive, DocxFiller, FillError, Template, TextFragment,
};
use regex::Regex;

fn rendered_part(bytes: &[u8], part: &str) -> Document {
    let archive = DocxArchive::from_reader(Cursor::new(bytes)).unwrap();
    Document::parse(archive.get(part).unwrap()).unwrap()
}

fn render(body: &str, data: &BandData) -> Document {
    let template = Template::from_bytes("test", &create_template_docx(body)).unwrap();
    let bytes = DocxFiller::new().render(&template, data).unwrap();
    rendered_part(&bytes, "word/document.xml")
}

fn item_root(names_and_qty: &[(&str, i64)]) -> BandData {
    let mut root = BandData::new("Root");
    for (name, qty) in names_and_qty {
        root.add_child(
            BandData::new("Item")
                .with_parameter("name", (*name).into())
                .with_parameter("qty", ParameterValue::Integer(*qty)),
        );
    }
    root
}

#[test]
fn untemplated_document_is_untouched() {
    let body = format!(
        r#"{}{}<w:sectPr><w:type w:val="nextPage"/></w:sectPr>"#,
        paragraph("plain heading"),
        r#"<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>styled</w:t></w:r><w:hyperlink r:id="rId9"><w:r><w:t>link</w:t></w:r></w:hyperlink></w:p>"#
    );
    let before = Document::parse(document_part(&body).as_bytes()).unwrap();
    let after = render(&body, &BandData::new("Root"));
    assert_eq!(before, after);
}

#[test]
fn fragmented_alias_is_merged_and_substituted() {
    let body = "<w:p>\
        <w:r><w:t>${</w:t></w:r>\
        <w:r><w:t>Main.qty</w:t></w:r>\
        <w:r><w:t>}</w:t></w:r>\
        </w:p>";
    let mut root = BandData::new("Root");
    root.add_child(BandData::new("Main").with_parameter("qty", ParameterValue::Integer(12)));
    let doc = render(body, &root);
    assert_eq!(doc.plain_text(), "12");
}

#[test]
fn path_alias_resolves_first_instance() {
    let mut root = BandData::new("Root");
    let mut main = BandData::new("Main");
    for amount in [10i64, 20, 30] {
        main.add_child(
            BandData::new("Detail").with_parameter("amount", ParameterValue::Integer(amount)),
        );
    }
    root.add_child(main);

    let doc = render(&paragraph("${Main.Detail.amount}"), &root);
    assert_eq!(doc.plain_text(), "10");
}

fn item_table_body() -> String {
    format!(
        "<w:tbl>{}{}{}</w:tbl>",
        table_row("Items ##band=Item"),
        table_row("${name}: ${qty}"),
        table_row("end of items")
    )
}

#[test]
fn table_expands_one_row_per_instance() {
    let doc = render(
        &item_table_body(),
        &item_root(&[("bolt", 100), ("nut", 250), ("washer", 5), ("screw", 42), ("pin", 1)]),
    );
    let docfill_docx::Block::Table(table) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(table.rows.len(), 7);
    assert_eq!(table.rows[0].plain_text(), "Items ");
    assert_eq!(table.rows[1].plain_text(), "bolt: 100");
    assert_eq!(table.rows[5].plain_text(), "pin: 1");
    assert_eq!(table.rows[6].plain_text(), "end of items");
}

#[test]
fn table_with_single_instance() {
    let doc = render(&item_table_body(), &item_root(&[("bolt", 7)]));
    let docfill_docx::Block::Table(table) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[1].plain_text(), "bolt: 7");
}

#[test]
fn table_with_no_instances_drops_template_row() {
    let doc = render(&item_table_body(), &item_root(&[]));
    let docfill_docx::Block::Table(table) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].plain_text(), "Items ");
    assert_eq!(table.rows[1].plain_text(), "end of items");
}

#[test]
fn single_row_table_expands_from_its_marker_row() {
    // marker and aliases share the only row
    let body = format!("<w:tbl>{}</w:tbl>", table_row("##band=Item ${name}"));
    let doc = render(&body, &item_root(&[("bolt", 1), ("nut", 2)]));
    let docfill_docx::Block::Table(table) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].plain_text(), " bolt");
    assert_eq!(table.rows[1].plain_text(), " nut");
}

#[test]
fn bare_alias_in_static_band_table_row_stays_literal() {
    // the row phase owns bare aliases; a static row never gets one
    // filled, and the document phase must not abort on it either
    let body = format!(
        "<w:tbl>{}{}{}</w:tbl>",
        table_row("##band=Item"),
        table_row("${name}"),
        table_row("see ${note}")
    );
    let doc = render(&body, &item_root(&[("bolt", 1)]));
    let docfill_docx::Block::Table(table) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[1].plain_text(), "bolt");
    assert_eq!(table.rows[2].plain_text(), "see ${note}");
}

#[test]
fn malformed_alias_in_template_row_stays_literal() {
    let body = format!(
        "<w:tbl>{}{}</w:tbl>",
        table_row("##band=Item"),
        table_row("${name} ${a..b}")
    );
    let doc = render(&body, &item_root(&[("bolt", 1)]));
    let docfill_docx::Block::Table(table) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(table.rows[1].plain_text(), "bolt ${a..b}");
}

#[test]
fn pathed_alias_in_row_resolves_from_root() {
    // the in-row phase fills ${name}; ${Item.qty} keeps first-instance
    // semantics in every clone
    let body = format!(
        "<w:tbl>{}{}</w:tbl>",
        table_row("##band=Item"),
        table_row("${name} ${Item.qty}")
    );
    let doc = render(&body, &item_root(&[("a", 1), ("b", 2)]));
    let docfill_docx::Block::Table(table) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(table.rows[1].plain_text(), "a 1");
    assert_eq!(table.rows[2].plain_text(), "b 1");
}

#[test]
fn nested_band_table_expands_per_clone() {
    let inner = format!(
        "<w:tbl>{}{}</w:tbl>",
        table_row("##band=Line"),
        table_row("- ${product}")
    );
    let body = format!(
        "<w:tbl>{}<w:tr><w:tc>{}{}</w:tc></w:tr></w:tbl>",
        table_row("##band=Order"),
        paragraph("order ${code}"),
        inner
    );

    let mut root = BandData::new("Root");
    let mut order = BandData::new("Order").with_parameter("code", "O-1".into());
    order.add_child(BandData::new("Line").with_parameter("product", "bolt".into()));
    order.add_child(BandData::new("Line").with_parameter("product", "nut".into()));
    root.add_child(order);

    let doc = render(&body, &root);
    let docfill_docx::Block::Table(outer) = &doc.blocks[0] else {
        panic!("Expected table");
    };
    assert_eq!(outer.rows.len(), 2);
    assert_eq!(outer.rows[1].plain_text(), "order O-1- bolt- nut");
    let nested = outer.rows[1]
        .cells[0]
        .blocks
        .iter()
        .find_map(|b| match b {
            docfill_docx::Block::Table(t) => Some(t),
            _ => None,
        })
        .expect("nested table");
    // marker row + one row per Line instance
    assert_eq!(nested.rows.len(), 3);
    assert_eq!(nested.rows[1].plain_text(), "- bolt");
    assert_eq!(nested.rows[2].plain_text(), "- nut");
}

#[test]
fn unknown_band_aborts_with_template_name() {
    let template =
        Template::from_bytes("report", &create_template_docx(&paragraph("${Ghost.x}"))).unwrap();
    let err = DocxFiller::new()
        .render(&template, &BandData::new("Root"))
        .unwrap_err();
    let FillError::Render { name, source } = err else {
        panic!("Expected wrapped render error");
    };
    assert_eq!(name, "report");
    assert!(matches!(*source, FillError::BandNotFound(_)));
}

#[test]
fn missing_parameter_aborts_in_expanded_row() {
    let body = format!(
        "<w:tbl>{}{}</w:tbl>",
        table_row("##band=Item"),
        table_row("${absent}")
    );
    let template = Template::from_bytes("t", &create_template_docx(&body)).unwrap();
    let err = DocxFiller::new()
        .render(&template, &item_root(&[("a", 1)]))
        .unwrap_err();
    let FillError::Render { source, .. } = err else {
        panic!("Expected wrapped render error");
    };
    assert!(matches!(*source, FillError::ParameterMissing { .. }));
}

#[test]
fn headers_and_footers_get_alias_substitution() {
    let parts = [
        (
            "word/document.xml",
            document_part(&paragraph("body ${title}")),
        ),
        ("word/header1.xml", header_part(&paragraph("top ${title}"))),
    ];
    let borrowed: Vec<(&str, &str)> = parts.iter().map(|(p, c)| (*p, c.as_str())).collect();
    let bytes = create_docx_with_parts(&borrowed);
    let template = Template::from_bytes("t", &bytes).unwrap();

    let root = BandData::new("Root").with_parameter("title", "Q3".into());
    let rendered = DocxFiller::new().render(&template, &root).unwrap();

    assert_eq!(
        rendered_part(&rendered, "word/document.xml").plain_text(),
        "body Q3"
    );
    assert_eq!(
        rendered_part(&rendered, "word/header1.xml").plain_text(),
        "top Q3"
    );
}

struct TagInliner {
    pattern: Regex,
}

impl ContentInliner for TagInliner {
    fn tag_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn inline(
        &self,
        value: &ParameterValue,
        fragment: &mut TextFragment,
        _captures: &regex::Captures<'_>,
    ) -> docfill_docx::Result<()> {
        if let ParameterValue::Content(bytes) = value {
            fragment.text = format!("[content:{} bytes]", bytes.len());
        }
        Ok(())
    }
}

#[test]
fn inliner_claims_fragment_and_short_circuits() {
    let mut root = BandData::new("Root")
        .with_parameter("chart", ParameterValue::Content(vec![1, 2, 3, 4]))
        .with_parameter("after", "ignored".into());
    root.set_field_format("Root.chart", "${image}");

    let mut filler = DocxFiller::new();
    filler.register_inliner(Box::new(TagInliner {
        pattern: Regex::new(r"\$\{image\}").unwrap(),
    }));

    let template = Template::from_bytes(
        "t",
        &create_template_docx(&paragraph("${chart} and ${after}")),
    )
    .unwrap();
    let bytes = filler.render(&template, &root).unwrap();
    let doc = rendered_part(&bytes, "word/document.xml");
    // the claimed fragment is rewritten wholesale; trailing aliases in
    // the same fragment are gone with it
    assert_eq!(doc.plain_text(), "[content:4 bytes]");
}

#[test]
fn null_value_is_not_offered_to_inliners() {
    let mut root = BandData::new("Root").with_parameter("chart", ParameterValue::Null);
    root.set_field_format("Root.chart", "${image}");

    let mut filler = DocxFiller::new();
    filler.register_inliner(Box::new(TagInliner {
        pattern: Regex::new(r"\$\{image\}").unwrap(),
    }));

    let template =
        Template::from_bytes("t", &create_template_docx(&paragraph("x${chart}y"))).unwrap();
    let bytes = filler.render(&template, &root).unwrap();
    let doc = rendered_part(&bytes, "word/document.xml");
    assert_eq!(doc.plain_text(), "xy");
}

#[test]
fn content_value_without_inliner_renders_empty() {
    let root = BandData::new("Root")
        .with_parameter("chart", ParameterValue::Content(vec![9, 9]));
    let doc = render(&paragraph("x${chart}y"), &root);
    assert_eq!(doc.plain_text(), "xy");
}

#[test]
fn rendered_archive_keeps_unrelated_parts() {
    let parts = [
        ("word/document.xml", document_part(&paragraph("${v}"))),
        ("word/styles.xml", "<w:styles/>".to_string()),
        ("word/media/image1.png", "PNGDATA".to_string()),
    ];
    let borrowed: Vec<(&str, &str)> = parts.iter().map(|(p, c)| (*p, c.as_str())).collect();
    let template = Template::from_bytes("t", &create_docx_with_parts(&borrowed)).unwrap();

    let root = BandData::new("Root").with_parameter("v", "ok".into());
    let rendered = DocxFiller::new().render(&template, &root).unwrap();
    let archive = DocxArchive::from_reader(Cursor::new(rendered.as_slice())).unwrap();

    assert_eq!(archive.get("word/styles.xml"), Some("<w:styles/>".as_bytes()));
    assert_eq!(archive.get("word/media/image1.png"), Some("PNGDATA".as_bytes()));
}
