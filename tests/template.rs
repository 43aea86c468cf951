//! Rendering tests for the Word template processor.
//!
mod common;
use common::*;
use jiaoan::docx::{Package, extract_text};
use jiaoan::prelude::*;
use jiaoan::template::{CompiledTemplate, ProcessorConfig};
use serde_json::json;
use std::fs;

#[cfg(test)]
mod template_tests {
    use super::*;

    #[test]
    fn test_scenario_renders_two_rows_in_order() {
        let processor = default_processor();
        let document = processor
            .render(&valid_data(&scenario_payload()))
            .expect("render succeeds");

        let rows = activity_rows(document.bytes());
        assert_eq!(
            rows,
            vec![
                strings(&["Intro", "Play music", "Listen", "Spark interest"]),
                strings(&["Reading", "Guide reading", "Read aloud", "Build comprehension"]),
            ]
        );
        assert_eq!(document.report().rows_for("learning_activities"), 2);
        assert!(document.report().warnings.is_empty());
    }

    #[test]
    fn test_row_count_matches_activity_count() {
        let processor = default_processor();
        for count in [0, 1, 7] {
            let document = processor
                .render(&valid_data(&numbered_payload(count)))
                .expect("render succeeds");
            assert_eq!(activity_rows(document.bytes()).len(), count, "N = {}", count);
        }
    }

    #[test]
    fn test_duplicate_rows_are_not_merged() {
        let row = ("练习", "出示练习", "独立完成", "巩固新知");
        let document = default_processor()
            .render(&valid_data(&payload_with_activities(&[row, row, row])))
            .unwrap();
        let rows = activity_rows(document.bytes());
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r == &strings(&["练习", "出示练习", "独立完成", "巩固新知"])));
    }

    #[test]
    fn test_scalars_and_reflections_are_filled() {
        let document = default_processor()
            .render(&valid_data(&scenario_payload()))
            .unwrap();
        let text = extract_text(document.bytes()).unwrap();
        assert!(text.contains("思维发展型课堂教学设计"));
        assert!(text.contains("Spring Lesson"));
        assert!(text.contains("以朗读带动品析"));
        assert!(!text.contains("{{"));
        assert!(!text.contains("{%"));
        assert_eq!(
            reflection_rows(document.bytes()),
            vec![strings(&["认知冲突", "春天为什么“欣欣然”？"])]
        );
    }

    #[test]
    fn test_rendering_is_byte_identical() {
        let processor = default_processor();
        let data = valid_data(&numbered_payload(4));
        let first = processor.render(&data).unwrap();
        let second = processor.render(&data).unwrap();
        assert_eq!(first.bytes(), second.bytes());

        let fresh = default_processor().render(&data).unwrap();
        assert_eq!(first.bytes(), fresh.bytes());
    }

    #[test]
    fn test_missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateProcessor::open(dir.path().join("missing.docx")).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
    }

    #[test]
    fn test_garbage_template_is_malformed() {
        let err = TemplateProcessor::builder(b"not a docx".to_vec())
            .build()
            .unwrap_err();
        assert!(matches!(err, TemplateError::Malformed(_)));
    }

    #[test]
    fn test_unterminated_placeholder_names_the_region() {
        let err = TemplateProcessor::builder(
            Package::from_document_body(&para("{{ lesson_name"))
                .to_bytes()
                .unwrap(),
        )
        .build()
        .unwrap_err();
        match err {
            TemplateError::Render { region, message } => {
                assert_eq!(region, "word/document.xml");
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_placeholder_renders_empty_with_warning() {
        let body = para("[{{ lesson_name }}|{{ school_motto }}]");
        let document = processor_for_body(&body, false)
            .render(&valid_data(&scenario_payload()))
            .unwrap();

        assert_eq!(extract_text(document.bytes()).unwrap(), "[Spring Lesson|]");
        let warnings = &document.report().warnings;
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].placeholder, "school_motto");
    }

    #[test]
    fn test_strict_mode_rejects_unknown_placeholder() {
        let body = para("{{ school_motto }}");
        let err = processor_for_body(&body, true)
            .render(&valid_data(&scenario_payload()))
            .unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnboundPlaceholder {
                placeholder: "school_motto".to_string(),
                part: "word/document.xml".to_string(),
            }
        );
    }

    #[test]
    fn test_marker_rows_repeat_enclosed_rows() {
        let body = table(&[
            row(&["训练点类型", "具体描述"]),
            row(&["{%tr for p in reflection_thinking_points %}"]),
            row(&["{{ p.point_type }}", "{{ p.description }}"]),
            row(&["{%tr endfor %}"]),
        ]);
        let mut payload = scenario_payload();
        payload["reflection_thinking_points"] = json!([
            {"point_type": "认知冲突", "description": "甲"},
            {"point_type": "思维图示", "description": "乙"},
            {"point_type": "变式运用", "description": "丙"},
        ]);

        let document = processor_for_body(&body, true)
            .render(&valid_data(&payload))
            .unwrap();
        assert_eq!(
            reflection_rows(document.bytes()),
            vec![
                strings(&["认知冲突", "甲"]),
                strings(&["思维图示", "乙"]),
                strings(&["变式运用", "丙"]),
            ]
        );
    }

    #[test]
    fn test_unclosed_marker_row_is_a_render_error() {
        let body = table(&[
            row(&["{%tr for p in reflection_thinking_points %}"]),
            row(&["{{ p.point_type }}"]),
        ]);
        let bytes = Package::from_document_body(&body).to_bytes().unwrap();
        let err = TemplateProcessor::builder(bytes).build().unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }

    #[test]
    fn test_placeholder_split_across_runs_is_rendered() {
        let body = concat!(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>课例：{{ lesson</w:t></w:r>",
            "<w:proofErr w:type=\"spellStart\"/>",
            "<w:r><w:t>_na</w:t></w:r><w:r><w:t>me }}</w:t></w:r></w:p>"
        );
        let document = processor_for_body(body, true)
            .render(&valid_data(&scenario_payload()))
            .unwrap();
        assert_eq!(extract_text(document.bytes()).unwrap(), "课例：Spring Lesson");
    }

    #[test]
    fn test_split_placeholder_keeps_neighbouring_runs() {
        let drawing = concat!(
            "<w:r><w:drawing><wp:inline><a:graphic><a:graphicData>",
            "<pic:pic><pic:blipFill><a:blip r:embed=\"rId9\"/></pic:blipFill></pic:pic>",
            "</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"
        );
        let body = [
            "<w:p><w:r><w:t>Title: {{ lesson_</w:t></w:r>",
            "<w:r><w:rPr><w:i/></w:rPr><w:t>name }}</w:t></w:r>",
            drawing,
            "</w:p>",
        ]
        .concat();
        let document = processor_for_body(&body, true)
            .render(&valid_data(&scenario_payload()))
            .unwrap();

        let xml = Package::from_bytes(document.bytes())
            .unwrap()
            .main_document()
            .unwrap();
        assert!(xml.contains(drawing), "drawing run was dropped: {}", xml);
        assert!(xml.contains("<w:rPr><w:i/></w:rPr>"));
        assert_eq!(extract_text(document.bytes()).unwrap(), "Title: Spring Lesson");
    }

    #[test]
    fn test_leading_whitespace_in_values_is_preserved() {
        let mut payload = scenario_payload();
        payload["lesson_name"] = json!("  indented");
        let body = "<w:p><w:r><w:t>{{ lesson_name }}</w:t></w:r></w:p>";
        let document = processor_for_body(body, true)
            .render(&valid_data(&payload))
            .unwrap();

        let xml = Package::from_bytes(document.bytes())
            .unwrap()
            .main_document()
            .unwrap();
        assert!(xml.contains(r#"<w:t xml:space="preserve">  indented</w:t>"#), "{}", xml);
    }

    #[test]
    fn test_values_are_escaped_and_newlines_become_breaks() {
        let mut payload = scenario_payload();
        payload["summary"] = json!("a < b & c\n第二行");
        let document = processor_for_body(&para("{{ summary }}"), true)
            .render(&valid_data(&payload))
            .unwrap();

        let xml = Package::from_bytes(document.bytes())
            .unwrap()
            .main_document()
            .unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
        assert!(xml.contains("<w:br/>"));
        assert_eq!(extract_text(document.bytes()).unwrap(), "a < b & c\n第二行");
    }

    #[test]
    fn test_objectives_array_is_numbered() {
        let mut payload = scenario_payload();
        payload["learning_objectives"] = json!(r#"["朗读课文", {"objective": "品味修辞"}]"#);
        let document = processor_for_body(&para("{{ learning_objectives }}"), true)
            .render(&valid_data(&payload))
            .unwrap();
        assert_eq!(
            extract_text(document.bytes()).unwrap(),
            "1. 朗读课文\n2. 品味修辞"
        );
    }

    #[test]
    fn test_header_parts_are_rendered() {
        let header = concat!(
            "<w:hdr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
            "<w:p><w:r><w:t>{{ teacher_school }}</w:t></w:r></w:p></w:hdr>"
        );
        let bytes = Package::from_document_body(&para("{{ lesson_name }}"))
            .with_part("word/header1.xml", header)
            .to_bytes()
            .unwrap();
        let document = TemplateProcessor::builder(bytes)
            .build()
            .unwrap()
            .render(&valid_data(&scenario_payload()))
            .unwrap();

        let rendered = Package::from_bytes(document.bytes()).unwrap();
        let header = rendered.xml_part("word/header1.xml").unwrap();
        assert!(header.contains("实验中学"));
    }

    #[test]
    fn test_binding_table_renames_placeholders() {
        let body = [
            para("{{ title }}"),
            table(&[
                row(&["环节名称", "活动意图"]),
                row(&[
                    "{% for step in steps %}{{ step.name }}{% endfor %}",
                    "{% for step in steps %}{{ step.why }}{% endfor %}",
                ]),
            ]),
        ]
        .concat();
        let bindings = BindingTable::default()
            .rename("lesson_name", "title")
            .rename_list("learning_activities", "steps")
            .rename_column("learning_activities", "activity_intent", "why");

        let bytes = Package::from_document_body(&body).to_bytes().unwrap();
        let processor = TemplateProcessor::builder(bytes)
            .with_binding_table(bindings)
            .strict(true)
            .build()
            .unwrap();
        let document = processor.render(&valid_data(&scenario_payload())).unwrap();

        assert!(extract_text(document.bytes()).unwrap().starts_with("Spring Lesson"));
        assert_eq!(
            activity_rows(document.bytes()),
            vec![
                strings(&["Intro", "Spark interest"]),
                strings(&["Reading", "Build comprehension"]),
            ]
        );
    }

    #[test]
    fn test_write_to_creates_parent_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("outputs").join("lesson.docx");
        let document = default_processor()
            .render(&valid_data(&scenario_payload()))
            .unwrap();

        document.write_to(&target).expect("write succeeds");

        assert_eq!(fs::read(&target).unwrap(), document.bytes());
        let entries: Vec<_> = fs::read_dir(target.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_template_file_is_never_modified() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.docx");
        let original = default_template().unwrap();
        fs::write(&template_path, &original).unwrap();

        let processor = TemplateProcessor::open(&template_path).unwrap();
        let document = processor.render(&valid_data(&scenario_payload())).unwrap();
        document.write_to(dir.path().join("out.docx")).unwrap();

        assert_eq!(fs::read(&template_path).unwrap(), original);
        assert_ne!(document.bytes(), original.as_slice());
    }

    #[test]
    fn test_compiled_template_renders_identically() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("default.bin");
        let artifact = artifact.to_str().unwrap();

        let processor = default_processor();
        processor.compiled().save(artifact).unwrap();
        let loaded = CompiledTemplate::from_file(artifact).unwrap();
        assert_eq!(&loaded, processor.compiled());

        let data = valid_data(&scenario_payload());
        let from_artifact = TemplateProcessor::builder(loaded).build().unwrap();
        assert_eq!(
            from_artifact.render(&data).unwrap().bytes(),
            processor.render(&data).unwrap().bytes()
        );
    }

    #[test]
    fn test_processor_config_round_trip() {
        let processor = TemplateProcessor::builder(default_template().unwrap())
            .with_config(ProcessorConfig {
                strict: true,
                ..ProcessorConfig::default()
            })
            .build()
            .unwrap();
        assert!(processor.config().strict);
        assert!(processor.render(&valid_data(&scenario_payload())).is_ok());
    }

    #[test]
    fn test_processor_is_shareable_across_threads() {
        let processor = std::sync::Arc::new(default_processor());
        let handles: Vec<_> = (1..=4)
            .map(|n| {
                let processor = processor.clone();
                std::thread::spawn(move || {
                    let document = processor.render(&valid_data(&numbered_payload(n))).unwrap();
                    activity_rows(document.bytes()).len()
                })
            })
            .collect();
        let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, vec![1, 2, 3, 4]);
    }
}
